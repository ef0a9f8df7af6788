use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};

use crate::data::DBConnection;
use crate::error::ApiError;

use super::data::AuthUser;
use super::helpers;

fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = ApiError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let db_connection = match request.rocket().state::<DBConnection>() {
            Some(state) => state,
            None => {
                return Outcome::Error((
                    Status::InternalServerError,
                    ApiError::internal("database state missing"),
                ))
            }
        };

        let token = match bearer_token(request.headers().get_one("Authorization")) {
            Some(token) => token,
            None => {
                return Outcome::Error((
                    Status::Unauthorized,
                    ApiError::unauthorized("Unauthorized"),
                ))
            }
        };

        let connection = match db_connection.lock() {
            Ok(connection) => connection,
            Err(e) => {
                return Outcome::Error((Status::InternalServerError, ApiError::from(e)))
            }
        };

        match helpers::authenticate_token(&connection, token) {
            Ok(user) => Outcome::Success(user),
            Err(e) => Outcome::Error((e.status(), e)),
        }
    }
}
