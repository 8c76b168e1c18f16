use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::MealApi;
use crate::auth::dto::{SignupRequest, User};
use crate::error::ApiError;
use crate::token::TokenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
    /// A non-auth failure left the session in a surfaced-error state; the
    /// token is kept and a later refresh may recover.
    Error,
}

/// Owns the authentication token, the cached profile and the derived
/// session status. All mutation goes through the operations below; the
/// profile fetch is the source of truth for whether a token is still valid.
///
/// Every token change bumps `generation`; in-flight profile fetches carry
/// the generation they were issued for and results tagged with a superseded
/// generation are discarded, so a stale fetch never overwrites newer state.
pub struct Session {
    api: Arc<dyn MealApi>,
    store: TokenStore,
    token: Option<String>,
    user: Option<User>,
    status: SessionStatus,
    loading: bool,
    generation: u64,
}

impl Session {
    /// Create the session at process start, restoring the persisted token
    /// if one exists. A restored token triggers the initial profile
    /// refresh; if the server rejects it the session comes up anonymous.
    pub async fn restore(api: Arc<dyn MealApi>, store: TokenStore) -> Self {
        let mut session = Self {
            api,
            store,
            token: None,
            user: None,
            status: SessionStatus::Anonymous,
            loading: false,
            generation: 0,
        };
        if let Some(token) = session.store.load() {
            session.set_token(Some(token));
            if let Err(e) = session.refresh_profile().await {
                warn!(error = %e, "profile refresh on startup failed");
            }
        }
        session
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Exchange credentials for a token, persist it and fetch the profile.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        self.loading = true;
        let result = self.login_inner(username, password).await;
        self.loading = false;
        result
    }

    async fn login_inner(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self.api.login(username, password).await?;
        info!(username, "credentials accepted");
        let generation = self.set_token(Some(response.access_token));
        let fetched = self.api.fetch_me().await;
        self.apply_profile(generation, fetched)
    }

    /// Register an account, then log in with the same credentials. Signup
    /// alone does not establish a session. If registration succeeds but the
    /// follow-up login fails, the error is `LoginAfterSignup`: the account
    /// exists and the caller should retry login, not signup.
    pub async fn signup(
        &mut self,
        username: &str,
        password: &str,
        daily_calorie_limit: u32,
    ) -> Result<(), ApiError> {
        if daily_calorie_limit == 0 {
            return Err(ApiError::Validation(
                "daily calorie target must be at least 1".into(),
            ));
        }
        self.loading = true;
        let result = self.signup_inner(username, password, daily_calorie_limit).await;
        self.loading = false;
        result
    }

    async fn signup_inner(
        &mut self,
        username: &str,
        password: &str,
        daily_calorie_limit: u32,
    ) -> Result<(), ApiError> {
        let request = SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
            daily_calorie_limit,
        };
        let created = self.api.signup(&request).await?;
        info!(user_id = created.id, username, "account registered");

        self.login_inner(username, password)
            .await
            .map_err(|e| ApiError::LoginAfterSignup {
                source: Box::new(e),
            })
    }

    /// Re-fetch the profile for the current token. On success the cached
    /// user is replaced wholesale; a 401/403 means the token is no longer
    /// valid and silently drops the session back to anonymous. This is the
    /// only path that may force a logout.
    pub async fn refresh_profile(&mut self) -> Result<(), ApiError> {
        self.loading = true;
        let result = self.refresh_inner().await;
        self.loading = false;
        result
    }

    async fn refresh_inner(&mut self) -> Result<(), ApiError> {
        if self.token.is_none() {
            self.user = None;
            self.status = SessionStatus::Anonymous;
            return Ok(());
        }
        let generation = self.generation;
        let fetched = self.api.fetch_me().await;
        self.apply_profile(generation, fetched)
    }

    /// Push a new calorie target, then re-sync the cached profile. The
    /// local value is never trusted until the server echoes it back.
    pub async fn update_calorie_target(&mut self, new_limit: u32) -> Result<(), ApiError> {
        if new_limit == 0 {
            return Err(ApiError::Validation(
                "daily calorie target must be at least 1".into(),
            ));
        }
        self.loading = true;
        let result = self.update_inner(new_limit).await;
        self.loading = false;
        result
    }

    async fn update_inner(&mut self, new_limit: u32) -> Result<(), ApiError> {
        self.api.update_me(new_limit).await?;
        info!(new_limit, "calorie target updated");
        self.refresh_inner().await
    }

    /// Clear token and profile. Purely local, no network call.
    pub fn logout(&mut self) {
        self.clear_session();
        info!("logged out");
    }

    /// Apply the outcome of a profile fetch issued under `generation`.
    /// Results from a superseded generation are discarded.
    pub(crate) fn apply_profile(
        &mut self,
        generation: u64,
        fetched: Result<User, ApiError>,
    ) -> Result<(), ApiError> {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "discarding stale profile fetch result"
            );
            return Ok(());
        }
        match fetched {
            Ok(user) => {
                debug!(user_id = user.id, username = %user.username, "profile refreshed");
                self.user = Some(user);
                self.status = SessionStatus::Authenticated;
                Ok(())
            }
            Err(e) if e.is_auth() => {
                warn!(error = %e, "session token rejected by server, dropping session");
                self.clear_session();
                Ok(())
            }
            Err(e) => {
                self.status = SessionStatus::Error;
                Err(e)
            }
        }
    }

    /// Install a new token (or none), bump the generation and keep the
    /// persisted copy and the gateway in sync.
    fn set_token(&mut self, token: Option<String>) -> u64 {
        self.generation += 1;
        let persisted = match &token {
            Some(t) => self.store.save(t),
            None => self.store.clear(),
        };
        if let Err(e) = persisted {
            warn!(error = %e, "failed to update persisted session token");
        }
        self.api.set_token(token.clone());
        self.token = token;
        self.generation
    }

    fn clear_session(&mut self) {
        self.set_token(None);
        self.user = None;
        self.status = SessionStatus::Anonymous;
    }
}
