//! Traits shared by platforms with similar shapes, so callers can treat them interchangeably.

use crate::media::MediaFile;
use crate::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// A message in a chat, channel, or conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MessageRef {
    /// Channel, chat, or recipient the message lives in.
    pub channel: String,
    /// The message ID (a Slack `ts`, a Telegram message ID, a WhatsApp `wamid`).
    pub id: String,
}

impl MessageRef {
    /// Creates a reference to message `id` in `channel`.
    pub fn new(channel: impl Into<String>, id: impl Into<String>) -> MessageRef {
        MessageRef {
            channel: channel.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.id)
    }
}

/// Chat platforms: Slack, Telegram and WhatsApp.
#[async_trait]
pub trait Messaging {
    /// Sends `content` to `channel`.
    async fn create_post(&self, content: &str, channel: &str) -> Result<MessageRef, Error>;

    /// Replies to (or threads under) `message`.
    async fn reply(&self, message: &MessageRef, content: &str) -> Result<MessageRef, Error>;

    /// Platform-specific statistics for a channel, chat, or business account, as raw JSON.
    async fn community_stats(&self, id: &str) -> Result<serde_json::Value, Error>;
}

/// Who can see a video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Privacy {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl Privacy {
    /// The lowercase name both TikTok and YouTube accept.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
        }
    }
}

/// A video to publish.
#[derive(Debug)]
pub struct PostData {
    /// The video itself.
    pub video: MediaFile,
    #[allow(missing_docs)]
    pub title: String,
    #[allow(missing_docs)]
    pub description: String,
    #[allow(missing_docs)]
    pub tags: Vec<String>,
    #[allow(missing_docs)]
    pub privacy: Privacy,
    /// Publish later instead of immediately.
    pub schedule_time: Option<DateTime<Utc>>,
}

impl PostData {
    /// A public, untagged, unscheduled post.
    pub fn new(video: MediaFile, title: impl Into<String>) -> PostData {
        PostData {
            video,
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            privacy: Privacy::default(),
            schedule_time: None,
        }
    }
}

/// Metadata changes. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct UpdateData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub privacy: Option<Privacy>,
}

/// Counters for one post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostStats {
    #[allow(missing_docs)]
    pub views: i64,
    #[allow(missing_docs)]
    pub likes: i64,
    #[allow(missing_docs)]
    pub comments: i64,
    /// Shares, or favourites on YouTube.
    pub shares: i64,
    /// `(likes + comments + shares) / views * 100`, or 0 with no views.
    pub engagement: f64,
    /// Audience breakdown, when the platform reports one.
    pub demographics: Option<serde_json::Value>,
}

impl PostStats {
    /// Builds stats from raw counters, computing [`PostStats::engagement`].
    #[must_use]
    pub fn from_counts(views: i64, likes: i64, comments: i64, shares: i64) -> PostStats {
        PostStats {
            views,
            likes,
            comments,
            shares,
            engagement: engagement_rate(views, likes + comments + shares),
            demographics: None,
        }
    }
}

/// Interactions per view as a percentage.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn engagement_rate(views: i64, interactions: i64) -> f64 {
    if views > 0 {
        interactions as f64 / views as f64 * 100.0
    } else {
        0.0
    }
}

/// A search hit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentItem {
    #[allow(missing_docs)]
    pub id: String,
    #[allow(missing_docs)]
    pub title: String,
    #[allow(missing_docs)]
    pub description: String,
    /// Public link to the content.
    pub url: String,
    /// Author username or channel title.
    pub author: String,
    /// Zeroed when the search endpoint doesn't report counters.
    pub stats: PostStats,
}

/// Video platforms: TikTok and YouTube.
#[async_trait]
pub trait SocialPlatform {
    /// Uploads and publishes a video, returning its ID.
    async fn create_post(&self, post: PostData) -> Result<String, Error>;

    /// Replies to `comment_id` on `post_id`, returning the reply's ID.
    async fn reply_to_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<String, Error>;

    /// Counters for a post.
    async fn post_stats(&self, post_id: &str) -> Result<PostStats, Error>;

    /// Searches public videos.
    async fn search(&self, query: &str) -> Result<Vec<ContentItem>, Error>;

    /// Deletes a video.
    async fn delete(&self, post_id: &str) -> Result<(), Error>;

    /// Changes a video's metadata.
    async fn update(&self, post_id: &str, data: UpdateData) -> Result<(), Error>;
}
