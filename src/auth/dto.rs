use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The account profile as the server reports it. The cached copy held by the
/// session is always replaced wholesale after a successful fetch or update,
/// never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub daily_calorie_limit: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Response of a successful credential exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Request body for account registration. Registration alone does not
/// establish a session; the caller logs in afterwards.
#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub daily_calorie_limit: u32,
}

/// Request body for updating the daily calorie target.
#[derive(Debug, Serialize)]
pub struct UserUpdateRequest {
    pub daily_calorie_limit: u32,
}
