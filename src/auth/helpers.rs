use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

use super::data::AuthUser;

const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

pub fn normalize_username(value: &str) -> String {
    value.trim().to_string()
}

/// Credential rules shared by register and login; returns the rejection
/// message, if any.
pub fn validate_credentials(username: &str, password: &str) -> Option<&'static str> {
    if username.is_empty() || password.is_empty() {
        return Some("username and password are required");
    }
    if username.chars().count() < 3 {
        return Some("username must be at least 3 characters");
    }
    if username.chars().count() > 50 {
        return Some("username is too long");
    }
    if password.chars().count() < 8 {
        return Some("password must be at least 8 characters");
    }
    None
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn sha256_hex(input: &str) -> String {
    hex(&Sha256::digest(input.as_bytes()))
}

/// Fresh bearer token. Only its SHA-256 digest is ever stored.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub fn hash_token(token: &str) -> String {
    sha256_hex(token)
}

/// Salted digest stored as `salt:hash`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = sha256_hex(&format!("{}{}", salt, password));
    format!("{}:{}", salt, digest)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once(':') {
        Some((salt, digest)) => sha256_hex(&format!("{}{}", salt, password)) == digest,
        None => false,
    }
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn session_ttl_days() -> i64 {
    std::env::var("SESSION_TTL_DAYS")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_SESSION_TTL_DAYS)
}

fn session_expiry() -> String {
    (Utc::now() + Duration::days(session_ttl_days())).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Opens a session for `user_id` and returns the raw token, which the client
/// sees exactly once.
pub fn create_session(connection: &Connection, user_id: i64) -> ApiResult<String> {
    let token = generate_token();
    connection.execute(
        "INSERT INTO sessions (user_id, token_hash, expires_at, last_used_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, hash_token(&token), session_expiry(), now_stamp()],
    )?;
    Ok(token)
}

/// Resolves a bearer token to its user. Expired sessions are deleted on
/// sight; live ones get their `last_used_at` touched.
pub fn authenticate_token(connection: &Connection, token: &str) -> ApiResult<AuthUser> {
    let row = connection
        .query_row(
            "SELECT s.id, s.user_id, s.expires_at, u.username
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = ?1",
            params![hash_token(token)],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let (session_id, user_id, expires_at, username) =
        row.ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let expires = DateTime::parse_from_rfc3339(&expires_at)?;
    if expires <= Utc::now() {
        debug!("session {} expired, deleting", session_id);
        connection.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
        return Err(ApiError::unauthorized("Session expired"));
    }

    connection.execute(
        "UPDATE sessions SET last_used_at = ?1 WHERE id = ?2",
        params![now_stamp(), session_id],
    )?;

    Ok(AuthUser {
        id: user_id,
        username,
        session_id,
    })
}

pub fn delete_session(connection: &Connection, session_id: i64) -> ApiResult<()> {
    connection.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
    Ok(())
}

/// Startup sweep for sessions that expired while the server was down.
pub fn purge_expired_sessions(connection: &Connection) -> rusqlite::Result<()> {
    let purged = connection.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![now_stamp()],
    )?;
    if purged > 0 {
        info!("purged {} expired sessions", purged);
    }
    Ok(())
}
