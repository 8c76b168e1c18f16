use tracing::debug;

use crate::api::MealApi;
use crate::error::ApiError;
use crate::meals::dto::Meal;

/// In-memory ledger of the current day's meals with derived calorie totals.
///
/// `load` is an idempotent full replace: the list is swapped wholesale with
/// whatever the server reports for today, never merged incrementally.
#[derive(Debug, Default)]
pub struct TodayLedger {
    meals: Vec<Meal>,
}

impl TodayLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, api: &dyn MealApi) -> Result<(), ApiError> {
        let meals = api.today_meals().await?;
        debug!(count = meals.len(), "today's meals loaded");
        self.meals = meals;
        Ok(())
    }

    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }

    pub fn total_calories(&self) -> u32 {
        self.meals.iter().map(|m| m.calories).sum()
    }

    /// Signed remaining budget against `target`. Negative means the target
    /// was exceeded; that is a valid, displayable state, not an error.
    pub fn remaining(&self, target: u32) -> i64 {
        i64::from(target) - i64::from(self.total_calories())
    }

    /// Remove one meal by identity. Only called after the server confirmed
    /// the delete; never speculatively.
    pub fn remove_local(&mut self, meal_id: i64) {
        self.meals.retain(|m| m.id != meal_id);
    }
}
