pub mod error;
pub mod models;

pub use error::ApiError;
pub use models::Rating;

use std::sync::Arc;
use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;
use yt_oauth::OAuthManager;

use models::{
    ChannelListResponse, CommentThreadInsert, InsertedResource, SearchListResponse,
    SubscriptionInsert,
};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Environment variable overriding the API base address (used with mock servers)
pub const API_BASE_ENV: &str = "YOUTUBE_API_BASE";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the bearer token for each request comes from
#[derive(Clone)]
pub enum Credential {
    Static(String),
    Managed(Arc<Mutex<OAuthManager>>),
}

impl Credential {
    async fn bearer(&self) -> Result<String, ApiError> {
        match self {
            Credential::Static(token) => Ok(token.clone()),
            Credential::Managed(manager) => manager
                .lock()
                .await
                .access_token()
                .await
                .map_err(|err| ApiError::Auth(err.to_string())),
        }
    }
}

impl From<OAuthManager> for Credential {
    fn from(manager: OAuthManager) -> Self {
        Credential::Managed(Arc::new(Mutex::new(manager)))
    }
}

#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl YouTubeClient {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// Client against `YOUTUBE_API_BASE`, or the public endpoint when unset
    pub fn from_env(credential: Credential) -> Result<Self, ApiError> {
        let base =
            std::env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::new(base, credential)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/youtube/v3/{}", self.base_url, resource)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let token = self.credential.bearer().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// `videos.rate`
    pub async fn rate_video(&self, video_id: &str, rating: Rating) -> Result<(), ApiError> {
        debug!(video_id, rating = rating.as_str(), "videos.rate");
        let request = self
            .http
            .post(self.endpoint("videos/rate"))
            .query(&[("id", video_id), ("rating", rating.as_str())])
            .body(Vec::new());
        self.send(request).await?;
        Ok(())
    }

    /// `subscriptions.insert`; returns the new subscription ID
    pub async fn insert_subscription(&self, channel_id: &str) -> Result<String, ApiError> {
        debug!(channel_id, "subscriptions.insert");
        let request = self
            .http
            .post(self.endpoint("subscriptions"))
            .query(&[("part", "snippet")])
            .json(&SubscriptionInsert::channel(channel_id));
        let inserted: InsertedResource = self.send_json(request).await?;
        Ok(inserted.id)
    }

    /// `commentThreads.insert`; returns the new thread ID
    pub async fn insert_comment_thread(&self, video_id: &str, text: &str) -> Result<String, ApiError> {
        debug!(video_id, "commentThreads.insert");
        let request = self
            .http
            .post(self.endpoint("commentThreads"))
            .query(&[("part", "snippet")])
            .json(&CommentThreadInsert::top_level(video_id, text));
        let inserted: InsertedResource = self.send_json(request).await?;
        Ok(inserted.id)
    }

    /// `channels.list?forHandle=`; `handle` may include the leading `@`
    pub async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, ApiError> {
        let handle = handle.trim_start_matches('@');
        let request = self
            .http
            .get(self.endpoint("channels"))
            .query(&[("part", "id"), ("forHandle", handle)]);
        let list: ChannelListResponse = self.send_json(request).await?;
        Ok(list.items.into_iter().next().map(|item| item.id))
    }

    /// `search.list` restricted to channels; the first hit's channel ID
    pub async fn search_channel(&self, query: &str) -> Result<Option<String>, ApiError> {
        let request = self.http.get(self.endpoint("search")).query(&[
            ("part", "snippet"),
            ("q", query),
            ("type", "channel"),
            ("maxResults", "1"),
        ]);
        let list: SearchListResponse = self.send_json(request).await?;
        Ok(list
            .items
            .into_iter()
            .next()
            .and_then(|item| item.snippet)
            .and_then(|snippet| snippet.channel_id))
    }
}
