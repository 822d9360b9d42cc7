use serde::{Deserialize, Serialize};

/// Rating sent to `videos.rate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Like,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Like => "like",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionInsert<'a> {
    pub snippet: SubscriptionSnippet<'a>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionSnippet<'a> {
    #[serde(rename = "resourceId")]
    pub resource_id: ResourceId<'a>,
}

#[derive(Debug, Serialize)]
pub struct ResourceId<'a> {
    pub kind: &'a str,
    #[serde(rename = "channelId")]
    pub channel_id: &'a str,
}

impl<'a> SubscriptionInsert<'a> {
    pub fn channel(channel_id: &'a str) -> Self {
        Self {
            snippet: SubscriptionSnippet {
                resource_id: ResourceId {
                    kind: "youtube#channel",
                    channel_id,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentThreadInsert<'a> {
    pub snippet: CommentThreadSnippet<'a>,
}

#[derive(Debug, Serialize)]
pub struct CommentThreadSnippet<'a> {
    #[serde(rename = "videoId")]
    pub video_id: &'a str,
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: TopLevelComment<'a>,
}

#[derive(Debug, Serialize)]
pub struct TopLevelComment<'a> {
    pub snippet: CommentSnippet<'a>,
}

#[derive(Debug, Serialize)]
pub struct CommentSnippet<'a> {
    #[serde(rename = "textOriginal")]
    pub text_original: &'a str,
}

impl<'a> CommentThreadInsert<'a> {
    pub fn top_level(video_id: &'a str, text: &'a str) -> Self {
        Self {
            snippet: CommentThreadSnippet {
                video_id,
                top_level_comment: TopLevelComment {
                    snippet: CommentSnippet {
                        text_original: text,
                    },
                },
            },
        }
    }
}

/// Any inserted resource; only the ID is kept
#[derive(Debug, Clone, Deserialize)]
pub struct InsertedResource {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelItem {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSnippet {
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
}
