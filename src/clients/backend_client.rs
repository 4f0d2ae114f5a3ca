use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::models::{LoginResult, NewContent, SavedContent, UserRecord, UserUpsert};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error talking to the backend: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl BackendError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Status { status: 401, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::Status { status: 404, .. })
    }
}

/// The remote REST service that owns accounts and saved content.
/// Every authenticated call carries the caller's bearer token.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, BackendError>;
    async fn logout(&self, token: &str) -> Result<(), BackendError>;
    async fn current_session(&self, token: &str) -> Result<UserRecord, BackendError>;
    async fn fetch_user(&self, token: &str, user_id: i64) -> Result<UserRecord, BackendError>;
    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>, BackendError>;
    async fn create_user(&self, token: &str, user: &UserUpsert) -> Result<UserRecord, BackendError>;
    async fn update_user(
        &self,
        token: &str,
        user_id: i64,
        user: &UserUpsert,
    ) -> Result<UserRecord, BackendError>;
    async fn delete_user(&self, token: &str, user_id: i64) -> Result<(), BackendError>;
    async fn increment_trial_usage(&self, token: &str, user_id: i64) -> Result<(), BackendError>;
    async fn list_contents(&self, token: &str) -> Result<Vec<SavedContent>, BackendError>;
    async fn fetch_content(&self, token: &str, content_id: &str) -> Result<SavedContent, BackendError>;
    async fn create_content(&self, token: &str, content: &NewContent) -> Result<SavedContent, BackendError>;
    async fn update_content(
        &self,
        token: &str,
        content_id: &str,
        content: &NewContent,
    ) -> Result<SavedContent, BackendError>;
    async fn delete_content(&self, token: &str, content_id: &str) -> Result<(), BackendError>;
}

pub struct RestBackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestBackendClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, BackendError> {
        // A trailing slash keeps `Url::join` from dropping the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        Ok(RestBackendClient {
            http,
            base_url: Url::parse(&normalized)?,
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> Result<RequestBuilder, BackendError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let builder = self.http.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BackendError::Status { status: status.as_u16(), body })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, BackendError> {
        let response = self.request(Method::GET, path, Some(token))?.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self.request(method, path, Some(token))?.json(body).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn send_empty(&self, method: Method, path: &str, token: &str) -> Result<(), BackendError> {
        let response = self.request(method, path, Some(token))?.send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl BackendApi for RestBackendClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, BackendError> {
        let response = self
            .request(Method::POST, "auth/login", None)?
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn logout(&self, token: &str) -> Result<(), BackendError> {
        self.send_empty(Method::POST, "auth/logout", token).await
    }

    async fn current_session(&self, token: &str) -> Result<UserRecord, BackendError> {
        self.get_json("auth/me", token).await
    }

    async fn fetch_user(&self, token: &str, user_id: i64) -> Result<UserRecord, BackendError> {
        self.get_json(&format!("users/{}", user_id), token).await
    }

    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>, BackendError> {
        self.get_json("users", token).await
    }

    async fn create_user(&self, token: &str, user: &UserUpsert) -> Result<UserRecord, BackendError> {
        self.send_json(Method::POST, "users", token, user).await
    }

    async fn update_user(
        &self,
        token: &str,
        user_id: i64,
        user: &UserUpsert,
    ) -> Result<UserRecord, BackendError> {
        self.send_json(Method::PUT, &format!("users/{}", user_id), token, user).await
    }

    async fn delete_user(&self, token: &str, user_id: i64) -> Result<(), BackendError> {
        self.send_empty(Method::DELETE, &format!("users/{}", user_id), token).await
    }

    async fn increment_trial_usage(&self, token: &str, user_id: i64) -> Result<(), BackendError> {
        self.send_empty(Method::POST, &format!("users/{}/trial-usage", user_id), token).await
    }

    async fn list_contents(&self, token: &str) -> Result<Vec<SavedContent>, BackendError> {
        self.get_json("contents", token).await
    }

    async fn fetch_content(&self, token: &str, content_id: &str) -> Result<SavedContent, BackendError> {
        self.get_json(&format!("contents/{}", content_id), token).await
    }

    async fn create_content(&self, token: &str, content: &NewContent) -> Result<SavedContent, BackendError> {
        self.send_json(Method::POST, "contents", token, content).await
    }

    async fn update_content(
        &self,
        token: &str,
        content_id: &str,
        content: &NewContent,
    ) -> Result<SavedContent, BackendError> {
        self.send_json(Method::PUT, &format!("contents/{}", content_id), token, content).await
    }

    async fn delete_content(&self, token: &str, content_id: &str) -> Result<(), BackendError> {
        self.send_empty(Method::DELETE, &format!("contents/{}", content_id), token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_under_base_prefix() {
        let client = RestBackendClient::new(reqwest::Client::new(), "https://api.example.com/v1/").unwrap();
        let url = client.base_url.join("users/7/trial-usage").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/7/trial-usage");

        let client = RestBackendClient::new(reqwest::Client::new(), "https://api.example.com/v1").unwrap();
        assert_eq!(client.base_url.as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn classifies_status_errors() {
        let err = BackendError::Status { status: 401, body: String::new() };
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
    }
}
