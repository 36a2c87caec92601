use serde::{Deserialize, Serialize};

use crate::auth::Role;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Body for the endpoints that only take an address
/// (forgot password, resend verification).
#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "accessToken", alias = "jwt")]
    pub token: String,
}

/// Free-text acknowledgement. The backend sometimes answers with a bare
/// string and sometimes with `{"message": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageResponse {
    Text(String),
    Object {
        #[serde(default)]
        message: Option<String>,
    },
}

impl MessageResponse {
    pub fn into_message(self) -> Option<String> {
        match self {
            MessageResponse::Text(text) => Some(text),
            MessageResponse::Object { message } => message,
        }
    }
}
