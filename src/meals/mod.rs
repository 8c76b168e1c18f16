pub mod dto;
pub mod history;
pub mod ledger;
pub mod mutate;

pub use dto::{Meal, MealType, MealUpload};
pub use history::{local_day, DayBucket, MealHistory};
pub use ledger::TodayLedger;
pub use mutate::{DeleteConfirmer, DeleteOutcome, DeleteState, MutationCoordinator};
