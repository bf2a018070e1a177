//! Access to the wall's HTTP API.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use wall_core::domain::{Post, PostPatch};
use wall_shared::dto::{CreatePostRequest, MessageResponse};

use crate::error::ClientError;

/// Operations the client performs against the post service.
#[async_trait]
pub trait WallApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Post>, ClientError>;

    async fn create(&self, request: CreatePostRequest) -> Result<Post, ClientError>;

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, ClientError>;

    async fn delete(&self, id: Uuid) -> Result<(), ClientError>;
}

/// [`WallApi`] over HTTP, rooted at e.g. `http://localhost:8080`.
#[derive(Debug, Clone)]
pub struct HttpWallApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWallApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn posts_url(&self) -> String {
        format!("{}/api/posts", self.base_url)
    }

    fn post_url(&self, id: Uuid) -> String {
        format!("{}/api/posts/{}", self.base_url, id)
    }
}

/// Decode a success body, or turn an error status into [`ClientError::Api`]
/// carrying the server's stated reason.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message: error_reason(status, &body),
    })
}

fn error_reason(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["error", "message", "detail"]
                .iter()
                .find_map(|key| json.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

#[async_trait]
impl WallApi for HttpWallApi {
    async fn list(&self) -> Result<Vec<Post>, ClientError> {
        let response = self.http.get(self.posts_url()).send().await?;
        read_json(response).await
    }

    async fn create(&self, request: CreatePostRequest) -> Result<Post, ClientError> {
        let response = self.http.post(self.posts_url()).json(&request).send().await?;
        read_json(response).await
    }

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, ClientError> {
        let response = self.http.patch(self.post_url(id)).json(&patch).send().await?;
        read_json(response).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        let response = self.http.delete(self.post_url(id)).send().await?;
        let _: MessageResponse = read_json(response).await?;
        Ok(())
    }
}
