use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;

use crate::api::MealApi;
use crate::auth::dto::{SignupRequest, TokenResponse, User, UserUpdateRequest};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::meals::dto::{Meal, MealUpload};

/// Production gateway to the remote nutrition API.
///
/// Attaches the stored bearer token and the viewer locale to every outgoing
/// request, maps transport failures to `ApiError::Network` and non-success
/// statuses to `ApiError::Http`. Never retries; retries are the caller's
/// business.
pub struct HttpApi {
    http: Client,
    base_url: String,
    locale: String,
    token: RwLock<Option<String>>,
}

impl HttpApi {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            locale: config.locale.clone(),
            token: RwLock::new(None),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT_LANGUAGE, &self.locale);
        let token = self.token.read().ok().and_then(|t| t.as_ref().cloned());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(%status, "request rejected");
        Err(ApiError::Http { status, body })
    }
}

#[async_trait]
impl MealApi for HttpApi {
    fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let builder = self
            .request(Method::POST, "auth/login/token")
            .form(&[("username", username), ("password", password)]);
        Ok(self.send(builder).await?.json().await?)
    }

    async fn signup(&self, req: &SignupRequest) -> Result<User, ApiError> {
        let builder = self.request(Method::POST, "auth/signup").json(req);
        Ok(self.send(builder).await?.json().await?)
    }

    async fn fetch_me(&self) -> Result<User, ApiError> {
        let builder = self.request(Method::GET, "users/me");
        Ok(self.send(builder).await?.json().await?)
    }

    async fn update_me(&self, daily_calorie_limit: u32) -> Result<User, ApiError> {
        let builder = self
            .request(Method::PUT, "users/me")
            .json(&UserUpdateRequest {
                daily_calorie_limit,
            });
        Ok(self.send(builder).await?.json().await?)
    }

    async fn today_meals(&self) -> Result<Vec<Meal>, ApiError> {
        let builder = self.request(Method::GET, "meals/today");
        Ok(self.send(builder).await?.json().await?)
    }

    async fn meal_history(&self) -> Result<Vec<Meal>, ApiError> {
        let builder = self.request(Method::GET, "meals");
        Ok(self.send(builder).await?.json().await?)
    }

    async fn upload_meal(&self, upload: &MealUpload) -> Result<Meal, ApiError> {
        let part = Part::bytes(upload.body.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = Form::new()
            .text("meal_type", upload.meal_type.as_str())
            .part("file", part);
        let builder = self.request(Method::POST, "meals").multipart(form);
        Ok(self.send(builder).await?.json().await?)
    }

    async fn delete_meal(&self, meal_id: i64) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("meals/{meal_id}"));
        self.send(builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> HttpApi {
        HttpApi::new(&AppConfig {
            api_base_url: "http://localhost:8000/api/v1/".into(),
            locale: "ja-JP".into(),
        })
        .expect("build client")
    }

    #[test]
    fn requests_carry_locale_and_join_the_base_url() {
        let api = api();
        let request = api
            .request(Method::GET, "users/me")
            .build()
            .expect("build request");

        assert_eq!(request.url().as_str(), "http://localhost:8000/api/v1/users/me");
        assert_eq!(
            request.headers().get(ACCEPT_LANGUAGE).unwrap(),
            "ja-JP"
        );
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_token_is_attached_once_set_and_removed_when_cleared() {
        let api = api();
        api.set_token(Some("tok-123".into()));
        let request = api
            .request(Method::GET, "meals/today")
            .build()
            .expect("build request");
        assert_eq!(
            request
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .unwrap(),
            "Bearer tok-123"
        );

        api.set_token(None);
        let request = api
            .request(Method::GET, "meals/today")
            .build()
            .expect("build request");
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }
}
