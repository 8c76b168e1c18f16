use reqwest::StatusCode;
use thiserror::Error;

/// Failure taxonomy for every remote-facing operation in the crate.
///
/// Cancellation of a confirmation prompt is deliberately not here: declining
/// a delete is a silent outcome, not an error (see `meals::mutate`).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport never reached the server. Never retried automatically.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// Bad input caught client-side before any network call.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Signup succeeded but the follow-up login did not. The account exists
    /// server-side; callers should retry login, never re-signup.
    #[error("account created, but logging in failed: {source}")]
    LoginAfterSignup {
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// True when the server rejected our credentials. A profile fetch
    /// failing this way means the session token is no longer valid.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ApiError::Http { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }

    /// Human-readable message for display. The remote API wraps its error
    /// messages as `{"detail": "..."}`; fall back to the raw body, then to
    /// the Display impl.
    pub fn detail(&self) -> String {
        if let ApiError::Http { body, .. } = self {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
                if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
                    return detail.to_string();
                }
            }
            if !body.is_empty() {
                return body.clone();
            }
        }
        self.to_string()
    }
}
