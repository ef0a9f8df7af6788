use chrono::{SecondsFormat, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use rusqlite::{params, Connection, OptionalExtension};

use crate::data::DBConnection;
use crate::error::{ApiError, ApiResult};
use crate::goals::data::OkResponse;

use super::data::*;
use super::helpers::*;

fn checked_credentials(request: &CredentialsRequest) -> ApiResult<(String, String)> {
    let username = normalize_username(&request.username);
    if let Some(message) = validate_credentials(&username, &request.password) {
        return Err(ApiError::validation(message));
    }
    Ok((username, request.password.clone()))
}

fn find_user(connection: &Connection, username: &str) -> ApiResult<Option<(i64, String)>> {
    let row = connection
        .query_row(
            "SELECT id, password_hash FROM users WHERE username = ?1",
            params![username],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row)
}

#[post("/register", format = "json", data = "<request>")]
pub fn register(
    request: Json<CredentialsRequest>,
    db_connection: &State<DBConnection>,
) -> ApiResult<(Status, Json<AuthResponse>)> {
    let (username, password) = checked_credentials(&request)?;
    let connection = db_connection.lock()?;

    if find_user(&connection, &username)?.is_some() {
        return Err(ApiError::conflict("username already exists"));
    }

    connection.execute(
        "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
        params![
            username,
            hash_password(&password),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        ],
    )?;
    let user_id = connection.last_insert_rowid();
    let token = create_session(&connection, user_id)?;

    Ok((
        Status::Created,
        Json(AuthResponse {
            token,
            user: AuthUser {
                id: user_id,
                username,
                session_id: 0,
            },
        }),
    ))
}

#[post("/login", format = "json", data = "<request>")]
pub fn login(
    request: Json<CredentialsRequest>,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<AuthResponse>> {
    let (username, password) = checked_credentials(&request)?;
    let connection = db_connection.lock()?;

    // Unknown user and wrong password answer identically.
    let (user_id, password_hash) = find_user(&connection, &username)?
        .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;
    if !verify_password(&password, &password_hash) {
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let token = create_session(&connection, user_id)?;
    Ok(Json(AuthResponse {
        token,
        user: AuthUser {
            id: user_id,
            username,
            session_id: 0,
        },
    }))
}

#[get("/me")]
pub fn me(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}

#[post("/logout")]
pub fn logout(user: AuthUser, db_connection: &State<DBConnection>) -> ApiResult<Json<OkResponse>> {
    let connection = db_connection.lock()?;
    delete_session(&connection, user.session_id)?;
    Ok(Json(OkResponse { ok: true }))
}
