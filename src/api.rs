use async_trait::async_trait;

use crate::auth::dto::{SignupRequest, TokenResponse, User};
use crate::error::ApiError;
use crate::meals::dto::{Meal, MealUpload};

/// Boundary to the remote nutrition API. The session manager, ledger,
/// history aggregator and mutation coordinator all talk to the server
/// through this seam; `client::HttpApi` is the production implementation.
///
/// Implementations attach the stored bearer token and the viewer locale to
/// every call and map failures onto `ApiError`. They never retry.
#[async_trait]
pub trait MealApi: Send + Sync {
    /// Replace the bearer token used for subsequent requests.
    fn set_token(&self, token: Option<String>);

    /// Exchange credentials for a session token.
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError>;

    /// Register an account. Does not establish a session.
    async fn signup(&self, req: &SignupRequest) -> Result<User, ApiError>;

    /// Fetch the profile of the current token's user.
    async fn fetch_me(&self) -> Result<User, ApiError>;

    /// Push a new daily calorie target; returns the updated profile.
    async fn update_me(&self, daily_calorie_limit: u32) -> Result<User, ApiError>;

    /// Meals recorded today.
    async fn today_meals(&self) -> Result<Vec<Meal>, ApiError>;

    /// The full meal history.
    async fn meal_history(&self) -> Result<Vec<Meal>, ApiError>;

    /// Upload a meal photo for analysis and recording.
    async fn upload_meal(&self, upload: &MealUpload) -> Result<Meal, ApiError>;

    /// Delete one meal by id.
    async fn delete_meal(&self, meal_id: i64) -> Result<(), ApiError>;
}
