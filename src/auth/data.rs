use serde::{Deserialize, Serialize};

/// Authenticated caller, resolved from the bearer token by the request guard.
#[derive(Serialize, Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub session_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}
