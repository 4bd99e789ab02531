use serde::{Deserialize, Serialize};

use crate::users::dto::UserResponse;

fn default_role() -> String {
    "user".into()
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    pub website: Option<String>,
    pub age: Option<i32>,
    pub photo: Option<String>,
}

/// Request body for JSON login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-grant form (`username` carries the email).
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

/// Response returned after register, login or token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64, // seconds
    pub user: UserResponse,
}
