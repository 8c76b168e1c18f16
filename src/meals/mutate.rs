use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::api::MealApi;
use crate::error::ApiError;
use crate::meals::dto::{Meal, MealUpload};
use crate::meals::history::MealHistory;
use crate::meals::ledger::TodayLedger;

/// Confirmation seam for destructive mutations. The CLI asks on stdin;
/// tests answer with canned values.
#[async_trait]
pub trait DeleteConfirmer: Send + Sync {
    async fn confirm(&self, meal_id: i64) -> bool;
}

/// Per-meal mutation status. A meal is `PendingDelete` from the moment its
/// delete request is sent until the server answers; concurrent delete
/// attempts on distinct meals are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteState {
    Idle,
    PendingDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Server confirmed; the meal was removed locally.
    Deleted,
    /// The user declined, or a delete for this meal was already in flight.
    /// No network call was issued, no state changed.
    Cancelled,
}

/// Executes meal mutations against the server and reconciles local state.
///
/// Deletes are strictly sequential per meal: confirmation, then the network
/// call, then local removal. There is no optimistic removal before the
/// server acknowledges and no automatic retry; on failure the meal simply
/// stays visible.
#[derive(Debug, Default)]
pub struct MutationCoordinator {
    states: HashMap<i64, DeleteState>,
}

impl MutationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, meal_id: i64) -> DeleteState {
        self.states
            .get(&meal_id)
            .copied()
            .unwrap_or(DeleteState::Idle)
    }

    pub async fn delete_meal(
        &mut self,
        api: &dyn MealApi,
        confirmer: &dyn DeleteConfirmer,
        ledger: &mut TodayLedger,
        history: &mut MealHistory,
        meal_id: i64,
    ) -> Result<DeleteOutcome, ApiError> {
        if self.state(meal_id) == DeleteState::PendingDelete {
            debug!(meal_id, "delete already in flight, ignoring");
            return Ok(DeleteOutcome::Cancelled);
        }
        if !confirmer.confirm(meal_id).await {
            debug!(meal_id, "delete declined");
            return Ok(DeleteOutcome::Cancelled);
        }

        self.states.insert(meal_id, DeleteState::PendingDelete);
        let result = api.delete_meal(meal_id).await;
        self.states.remove(&meal_id);

        match result {
            Ok(()) => {
                info!(meal_id, "meal deleted");
                ledger.remove_local(meal_id);
                history.remove_local(meal_id);
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                warn!(meal_id, error = %e, "meal delete failed, keeping local state");
                Err(e)
            }
        }
    }

    /// Upload a meal photo for server-side analysis, then re-fetch today's
    /// ledger so the new record (with its analyzed calories) shows up.
    pub async fn upload_meal(
        &mut self,
        api: &dyn MealApi,
        ledger: &mut TodayLedger,
        upload: &MealUpload,
    ) -> Result<Meal, ApiError> {
        let created = api.upload_meal(upload).await?;
        info!(
            meal_id = created.id,
            meal_type = %created.meal_type,
            calories = created.calories,
            "meal recorded"
        );
        ledger.load(api).await?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{meal, FakeApi};
    use crate::meals::dto::MealType;
    use bytes::Bytes;
    use std::sync::atomic::Ordering;
    use time::UtcOffset;

    struct Answer(bool);

    #[async_trait]
    impl DeleteConfirmer for Answer {
        async fn confirm(&self, _meal_id: i64) -> bool {
            self.0
        }
    }

    async fn loaded_state(api: &FakeApi) -> (TodayLedger, MealHistory) {
        let mut ledger = TodayLedger::new();
        ledger.load(api).await.expect("load today");
        let mut history = MealHistory::new(UtcOffset::UTC);
        history.load(api).await.expect("load history");
        (ledger, history)
    }

    #[tokio::test]
    async fn confirmed_delete_removes_from_ledger_and_history() {
        let api = FakeApi::new();
        api.authenticate("alice");
        api.set_meals(vec![meal(1, 500), meal(2, 700)]);
        let (mut ledger, mut history) = loaded_state(&api).await;
        assert_eq!(ledger.total_calories(), 1200);
        assert_eq!(ledger.remaining(2000), 800);

        let mut coordinator = MutationCoordinator::new();
        let outcome = coordinator
            .delete_meal(&api, &Answer(true), &mut ledger, &mut history, 2)
            .await
            .expect("delete");

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(ledger.total_calories(), 500);
        assert_eq!(ledger.remaining(2000), 1500);
        // The only bucket held both meals; one remains.
        assert_eq!(history.buckets().len(), 1);
        assert_eq!(history.buckets()[0].meals().len(), 1);
    }

    #[tokio::test]
    async fn deleting_the_last_meal_of_a_day_drops_its_bucket() {
        let api = FakeApi::new();
        api.authenticate("alice");
        api.set_meals(vec![meal(1, 500)]);
        let (mut ledger, mut history) = loaded_state(&api).await;

        let mut coordinator = MutationCoordinator::new();
        coordinator
            .delete_meal(&api, &Answer(true), &mut ledger, &mut history, 1)
            .await
            .expect("delete");

        assert!(ledger.is_empty());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn declined_confirmation_issues_no_network_call() {
        let api = FakeApi::new();
        api.authenticate("alice");
        api.set_meals(vec![meal(1, 500), meal(2, 700)]);
        let (mut ledger, mut history) = loaded_state(&api).await;
        let before = ledger.meals().to_vec();

        let mut coordinator = MutationCoordinator::new();
        let outcome = coordinator
            .delete_meal(&api, &Answer(false), &mut ledger, &mut history, 2)
            .await
            .expect("decline is not an error");

        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ledger.meals(), before.as_slice());
        assert_eq!(coordinator.state(2), DeleteState::Idle);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_meal_visible() {
        let api = FakeApi::new();
        api.authenticate("alice");
        api.set_meals(vec![meal(1, 500)]);
        api.fail_delete_with(500);
        let (mut ledger, mut history) = loaded_state(&api).await;

        let mut coordinator = MutationCoordinator::new();
        let err = coordinator
            .delete_meal(&api, &Answer(true), &mut ledger, &mut history, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Http { .. }));
        assert_eq!(ledger.meals().len(), 1);
        assert_eq!(history.buckets().len(), 1);
        assert_eq!(coordinator.state(1), DeleteState::Idle);
    }

    #[tokio::test]
    async fn upload_records_and_reloads_today() {
        let api = FakeApi::new();
        api.authenticate("alice");
        let (mut ledger, _history) = loaded_state(&api).await;
        assert!(ledger.is_empty());

        let upload = MealUpload {
            meal_type: MealType::Lunch,
            file_name: "ramen.jpg".into(),
            content_type: "image/jpeg".into(),
            body: Bytes::from_static(b"not really a jpeg"),
        };
        let mut coordinator = MutationCoordinator::new();
        let created = coordinator
            .upload_meal(&api, &mut ledger, &upload)
            .await
            .expect("upload");

        assert_eq!(created.meal_type, MealType::Lunch);
        assert_eq!(ledger.meals().len(), 1);
        assert_eq!(ledger.meals()[0].id, created.id);
    }
}
