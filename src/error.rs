use std::error::Error;
use std::fmt;
use std::io::Cursor;
use std::sync::PoisonError;

use log::error;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use serde::Serialize;

/// Error taxonomy for API operations. `Validation` rejects the request before
/// any mutation, `NotFound` covers both unknown ids and ids owned by another
/// user (deliberately indistinguishable), `Internal` wraps storage and lock
/// failures.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Unauthorized(String),
    NotFound,
    Conflict(String),
    Internal(String),
}

/// JSON error body shared by the responder and the catchers.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn validation(what: impl Into<String>) -> ApiError {
        ApiError::Validation(what.into())
    }

    pub fn unauthorized(what: impl Into<String>) -> ApiError {
        ApiError::Unauthorized(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> ApiError {
        ApiError::Conflict(what.into())
    }

    pub fn internal(what: impl Into<String>) -> ApiError {
        ApiError::Internal(what.into())
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::NotFound => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    /// Message exposed to the client. Internal details never leave the server.
    fn message(&self) -> &str {
        match self {
            ApiError::Validation(what)
            | ApiError::Unauthorized(what)
            | ApiError::Conflict(what) => what,
            ApiError::NotFound => "not found",
            ApiError::Internal(_) => "internal server error",
        }
    }
}

impl Error for ApiError {}
impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::Internal(what) => write!(f, "internal error: {}", what),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl<T> From<PoisonError<T>> for ApiError {
    fn from(e: PoisonError<T>) -> ApiError {
        ApiError::Internal(e.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> ApiError {
        ApiError::Internal(e.to_string())
    }
}

impl From<chrono::ParseError> for ApiError {
    fn from(e: chrono::ParseError) -> ApiError {
        ApiError::Internal(e.to_string())
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
        if let ApiError::Internal(what) = &self {
            error!("internal error: {}", what);
        }
        let body = serde_json::to_string(&ErrorBody {
            error: self.message().to_string(),
        })
        .map_err(|_| Status::InternalServerError)?;

        Response::build()
            .status(self.status())
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
