use async_trait::async_trait;
use yt_data_client::{ApiError, Rating, YouTubeClient};

use crate::resolver::ChannelDirectory;

/// The three write operations the executor performs.
///
/// `subscribe` and `comment` return the ID of the created resource.
#[async_trait]
pub trait YouTubeActions: Send + Sync {
    async fn like(&self, video_id: &str) -> Result<(), ApiError>;
    async fn subscribe(&self, channel_id: &str) -> Result<String, ApiError>;
    async fn comment(&self, video_id: &str, text: &str) -> Result<String, ApiError>;
}

#[async_trait]
impl YouTubeActions for YouTubeClient {
    async fn like(&self, video_id: &str) -> Result<(), ApiError> {
        self.rate_video(video_id, Rating::Like).await
    }

    async fn subscribe(&self, channel_id: &str) -> Result<String, ApiError> {
        self.insert_subscription(channel_id).await
    }

    async fn comment(&self, video_id: &str, text: &str) -> Result<String, ApiError> {
        self.insert_comment_thread(video_id, text).await
    }
}

#[async_trait]
impl ChannelDirectory for YouTubeClient {
    async fn channel_for_handle(&self, handle: &str) -> Result<Option<String>, ApiError> {
        self.channel_id_for_handle(handle).await
    }

    async fn search_channel(&self, query: &str) -> Result<Option<String>, ApiError> {
        YouTubeClient::search_channel(self, query).await
    }
}
