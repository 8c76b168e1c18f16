use time::{Date, OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::api::MealApi;
use crate::error::ApiError;
use crate::meals::dto::Meal;

/// Calendar date of `ts` in the viewer's timezone. This conversion is the
/// single grouping key for history buckets: a meal recorded at 23:30 UTC
/// belongs to the next local day for a UTC+9 viewer.
pub fn local_day(ts: OffsetDateTime, offset: UtcOffset) -> Date {
    ts.to_offset(offset).date()
}

/// One local calendar day's worth of meals with derived totals.
#[derive(Debug)]
pub struct DayBucket {
    pub date: Date,
    meals: Vec<Meal>,
}

impl DayBucket {
    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    pub fn total_calories(&self) -> u32 {
        self.meals.iter().map(|m| m.calories).sum()
    }

    /// Signed difference against the current target. History is always
    /// compared against the target as configured now; target history is
    /// not tracked.
    pub fn delta(&self, target: u32) -> i64 {
        i64::from(target) - i64::from(self.total_calories())
    }
}

/// Full meal history grouped into per-local-day buckets.
///
/// Bucket order is the insertion order of the first-seen date in the
/// fetched set, not necessarily chronological; callers wanting a
/// chronological display sort explicitly.
#[derive(Debug)]
pub struct MealHistory {
    offset: UtcOffset,
    buckets: Vec<DayBucket>,
}

impl MealHistory {
    pub fn new(offset: UtcOffset) -> Self {
        Self {
            offset,
            buckets: Vec::new(),
        }
    }

    pub async fn load(&mut self, api: &dyn MealApi) -> Result<(), ApiError> {
        let meals = api.meal_history().await?;
        debug!(count = meals.len(), "meal history loaded");
        self.buckets = group_by_local_day(meals, self.offset);
        Ok(())
    }

    pub fn buckets(&self) -> &[DayBucket] {
        &self.buckets
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Remove one meal by identity from whichever bucket holds it. A bucket
    /// emptied by the removal disappears entirely.
    pub fn remove_local(&mut self, meal_id: i64) {
        for bucket in &mut self.buckets {
            bucket.meals.retain(|m| m.id != meal_id);
        }
        self.buckets.retain(|b| !b.meals.is_empty());
    }
}

fn group_by_local_day(meals: Vec<Meal>, offset: UtcOffset) -> Vec<DayBucket> {
    let mut buckets: Vec<DayBucket> = Vec::new();
    for meal in meals {
        let date = local_day(meal.created_at, offset);
        match buckets.iter_mut().find(|b| b.date == date) {
            Some(bucket) => bucket.meals.push(meal),
            None => buckets.push(DayBucket {
                date,
                meals: vec![meal],
            }),
        }
    }
    buckets
}
