//! TikTok open API (v2) video management.

use crate::client::RequestExt;
use crate::platform::{ContentItem, PostData, PostStats, SocialPlatform, UpdateData};
use crate::{Client, Error};
use async_trait::async_trait;
use reqwest::multipart::Form;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const API_URL: &str = "https://open-api.tiktok.com/v2/";

#[derive(Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Deserialize)]
struct Uploaded {
    video_id: String,
}

#[derive(Deserialize)]
struct Replied {
    comment_id: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Counts {
    view_count: i64,
    like_count: i64,
    comment_count: i64,
    share_count: i64,
}

impl Counts {
    fn into_stats(self) -> PostStats {
        PostStats::from_counts(
            self.view_count,
            self.like_count,
            self.comment_count,
            self.share_count,
        )
    }
}

#[derive(Deserialize)]
struct StatsData {
    #[serde(default)]
    stats: Counts,
    #[serde(default)]
    demographics: Option<Value>,
}

#[derive(Deserialize)]
struct SearchData {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Deserialize)]
struct Video {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    share_url: String,
    #[serde(default)]
    author: VideoAuthor,
    #[serde(default)]
    stats: Counts,
}

#[derive(Deserialize, Default)]
struct VideoAuthor {
    #[serde(default)]
    username: String,
}

/// TikTok client. Requests carry both a user access token and the app's API key.
#[derive(Debug, Clone)]
pub struct TikTok {
    client: Client,
    access_token: String,
    api_key: String,
}

impl TikTok {
    /// Creates a client using `access_token` and `api_key`.
    #[must_use]
    pub fn new(access_token: impl Into<String>, api_key: impl Into<String>) -> TikTok {
        TikTok::with_client(Client::new(), access_token, api_key)
    }

    /// Like [`TikTok::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(
        client: Client,
        access_token: impl Into<String>,
        api_key: impl Into<String>,
    ) -> TikTok {
        TikTok {
            client: client.based(API_URL),
            access_token: access_token.into(),
            api_key: api_key.into(),
        }
    }

    /// Changes the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> TikTok {
        self.client = self.client.with_base_url(base_url);
        self
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.access_token)
            .header("x-api-key", &self.api_key)
    }
}

#[async_trait]
impl SocialPlatform for TikTok {
    #[tracing::instrument(skip(self, post), fields(title = %post.title))]
    async fn create_post(&self, post: PostData) -> Result<String, Error> {
        let mut form = Form::new()
            .part("video", post.video.into_part()?)
            .text("title", post.title)
            .text("description", post.description);
        for tag in post.tags {
            form = form.text("tags", tag);
        }
        form = form.text("privacy_level", post.privacy.as_str());
        if let Some(at) = post.schedule_time {
            form = form.text("schedule_time", at.to_rfc3339());
        }

        let Data {
            data: Uploaded { video_id },
        } = self
            .authed(self.client.post("video/upload/"))
            .multipart(form)
            .send_json()
            .await?;
        tracing::info!(%video_id, "uploaded video");
        Ok(video_id)
    }

    #[tracing::instrument(skip(self, text))]
    async fn reply_to_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<String, Error> {
        let Data {
            data: Replied { comment_id },
        } = self
            .authed(self.client.post("comment/reply/"))
            .json(&json!({
                "video_id": post_id,
                "comment_id": comment_id,
                "text": text,
            }))
            .send_json()
            .await?;
        Ok(comment_id)
    }

    #[tracing::instrument(skip(self))]
    async fn post_stats(&self, post_id: &str) -> Result<PostStats, Error> {
        let Data { data }: Data<StatsData> = self
            .authed(self.client.get("video/stats/"))
            .query(&[("video_id", post_id)])
            .send_json()
            .await?;
        let mut stats = data.stats.into_stats();
        stats.demographics = data.demographics;
        Ok(stats)
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<ContentItem>, Error> {
        let Data { data }: Data<SearchData> = self
            .authed(self.client.get("search/videos/"))
            .query(&[("query", query)])
            .send_json()
            .await?;
        Ok(data
            .videos
            .into_iter()
            .map(|video| ContentItem {
                id: video.id,
                title: video.title,
                description: video.description,
                url: video.share_url,
                author: video.author.username,
                stats: video.stats.into_stats(),
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, post_id: &str) -> Result<(), Error> {
        self.authed(self.client.delete("video/delete/"))
            .json(&json!({ "video_id": post_id }))
            .send_checked()
            .await?;
        tracing::info!(%post_id, "deleted video");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, post_id: &str, data: UpdateData) -> Result<(), Error> {
        let mut body = Map::new();
        body.insert("video_id".into(), json!(post_id));
        if let Some(title) = data.title {
            body.insert("title".into(), json!(title));
        }
        if let Some(description) = data.description {
            body.insert("description".into(), json!(description));
        }
        if let Some(tags) = data.tags {
            body.insert("tags".into(), json!(tags));
        }
        if let Some(privacy) = data.privacy {
            body.insert("privacy_level".into(), json!(privacy.as_str()));
        }

        self.authed(self.client.put("video/update/"))
            .json(&body)
            .send_checked()
            .await?;
        Ok(())
    }
}
