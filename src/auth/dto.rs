use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Request body for registration. Fields are optional so that a missing field
/// maps to `InvalidInput` for that field rather than a generic body rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: PublicUser,
}

impl RegisterRequest {
    /// Username: 3+ chars after trimming. Password: 6+ chars.
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let username = self
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| u.chars().count() >= 3)
            .ok_or(ApiError::InvalidInput("username"))?;
        let password = self
            .password
            .filter(|p| p.chars().count() >= 6)
            .ok_or(ApiError::InvalidInput("password"))?;
        Ok((username, password))
    }
}
