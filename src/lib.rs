//! Client-side session and nutrition-ledger manager for a meal-photo
//! calorie tracker: authentication lifecycle, a cached profile synced with
//! the remote calorie target, per-day calorie ledgers aggregated from meal
//! records, and confirmation-gated mutations against server state.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod meals;
pub mod token;

pub use api::MealApi;
pub use auth::{Session, SessionStatus, User};
pub use client::HttpApi;
pub use config::AppConfig;
pub use error::ApiError;
pub use meals::{
    DeleteConfirmer, DeleteOutcome, DeleteState, Meal, MealHistory, MealType, MealUpload,
    MutationCoordinator, TodayLedger,
};
pub use token::TokenStore;
