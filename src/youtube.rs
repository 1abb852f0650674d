//! YouTube Data API v3 video management.

use crate::client::RequestExt;
use crate::platform::{ContentItem, PostData, PostStats, SocialPlatform, UpdateData};
use crate::{Client, Error};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

const API_URL: &str = "https://www.googleapis.com/youtube/v3/";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoMetadata<'a> {
    snippet: Snippet<'a>,
    status: Status<'a>,
}

#[derive(Serialize)]
struct Snippet<'a> {
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    privacy_status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish_at: Option<String>,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct StatisticsItem {
    #[serde(default)]
    statistics: Statistics,
}

/// The API reports counters as decimal strings.
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Statistics {
    view_count: String,
    like_count: String,
    comment_count: String,
    favorite_count: String,
}

fn count(s: &str) -> i64 {
    s.parse().unwrap_or(0)
}

#[derive(Deserialize)]
struct SearchResult {
    id: SearchId,
    #[serde(default)]
    snippet: SearchSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    #[serde(default)]
    video_id: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SearchSnippet {
    title: String,
    description: String,
    channel_title: String,
}

/// YouTube client authenticated with an OAuth access token.
#[derive(Debug, Clone)]
pub struct YouTube {
    api: Client,
    upload: Client,
    access_token: String,
}

impl YouTube {
    /// Creates a client using `access_token`.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> YouTube {
        YouTube::with_client(Client::new(), access_token)
    }

    /// Like [`YouTube::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(client: Client, access_token: impl Into<String>) -> YouTube {
        YouTube {
            api: client.based(API_URL),
            upload: client.based(UPLOAD_URL),
            access_token: access_token.into(),
        }
    }

    /// Changes the Data API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> YouTube {
        self.api = self.api.with_base_url(base_url);
        self
    }

    /// Changes the media upload base URL.
    #[must_use]
    pub fn with_upload_base_url(mut self, base_url: impl Into<String>) -> YouTube {
        self.upload = self.upload.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl SocialPlatform for YouTube {
    /// Uploads with `uploadType=multipart`: a JSON metadata part followed by the video.
    #[tracing::instrument(skip(self, post), fields(title = %post.title))]
    async fn create_post(&self, post: PostData) -> Result<String, Error> {
        let metadata = serde_json::to_string(&VideoMetadata {
            snippet: Snippet {
                title: &post.title,
                description: &post.description,
                tags: &post.tags,
            },
            status: Status {
                privacy_status: post.privacy.as_str(),
                publish_at: post.schedule_time.map(|at| at.to_rfc3339()),
            },
        })?;
        let form = Form::new()
            .part("metadata", Part::text(metadata).mime_str("application/json")?)
            .part("media", post.video.into_part()?);

        let Created { id } = self
            .upload
            .post("videos")
            .query(&[("uploadType", "multipart"), ("part", "snippet,status")])
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send_json()
            .await?;
        tracing::info!(video_id = %id, "uploaded video");
        Ok(id)
    }

    /// YouTube threads replies by parent comment alone; `post_id` is unused.
    #[tracing::instrument(skip(self, text))]
    async fn reply_to_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<String, Error> {
        let Created { id } = self
            .api
            .post("comments")
            .query(&[("part", "snippet")])
            .bearer_auth(&self.access_token)
            .json(&json!({
                "snippet": { "parentId": comment_id, "textOriginal": text },
            }))
            .send_json()
            .await?;
        Ok(id)
    }

    #[tracing::instrument(skip(self))]
    async fn post_stats(&self, post_id: &str) -> Result<PostStats, Error> {
        let Items { items } = self
            .api
            .get("videos")
            .query(&[("part", "statistics"), ("id", post_id)])
            .bearer_auth(&self.access_token)
            .send_json::<Items<StatisticsItem>>()
            .await?;
        let stats = items.into_iter().next().ok_or(Error::NotFound)?.statistics;
        Ok(PostStats::from_counts(
            count(&stats.view_count),
            count(&stats.like_count),
            count(&stats.comment_count),
            count(&stats.favorite_count),
        ))
    }

    /// Search results carry no counters, so every hit's stats are zeroed.
    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<ContentItem>, Error> {
        let Items { items } = self
            .api
            .get("search")
            .query(&[("part", "snippet"), ("q", query), ("type", "video")])
            .bearer_auth(&self.access_token)
            .send_json::<Items<SearchResult>>()
            .await?;
        Ok(items
            .into_iter()
            .map(|item| ContentItem {
                url: format!("{}{}", WATCH_URL, item.id.video_id),
                id: item.id.video_id,
                title: item.snippet.title,
                description: item.snippet.description,
                author: item.snippet.channel_title,
                stats: PostStats::default(),
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, post_id: &str) -> Result<(), Error> {
        self.api
            .delete("videos")
            .query(&[("id", post_id)])
            .bearer_auth(&self.access_token)
            .send_checked()
            .await?;
        tracing::info!(%post_id, "deleted video");
        Ok(())
    }

    /// Only the fields set in `data` are sent; `status` is included when privacy is set.
    #[tracing::instrument(skip(self))]
    async fn update(&self, post_id: &str, data: UpdateData) -> Result<(), Error> {
        let mut snippet = Map::new();
        if let Some(title) = data.title {
            snippet.insert("title".into(), json!(title));
        }
        if let Some(description) = data.description {
            snippet.insert("description".into(), json!(description));
        }
        if let Some(tags) = data.tags {
            snippet.insert("tags".into(), json!(tags));
        }
        let mut body = json!({ "id": post_id, "snippet": snippet });
        let part = match data.privacy {
            Some(privacy) => {
                body["status"] = json!({ "privacyStatus": privacy.as_str() });
                "snippet,status"
            }
            None => "snippet",
        };

        self.api
            .put("videos")
            .query(&[("part", part)])
            .bearer_auth(&self.access_token)
            .json(&body)
            .send_checked()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{count, Snippet, Status, VideoMetadata};

    #[test]
    fn counts_parse_leniently() {
        assert_eq!(count("1234"), 1234);
        assert_eq!(count(""), 0);
        assert_eq!(count("n/a"), 0);
    }

    #[test]
    fn metadata_shape() {
        let tags = vec!["rust".to_owned()];
        let value = serde_json::to_value(VideoMetadata {
            snippet: Snippet {
                title: "t",
                description: "d",
                tags: &tags,
            },
            status: Status {
                privacy_status: "unlisted",
                publish_at: None,
            },
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "snippet": { "title": "t", "description": "d", "tags": ["rust"] },
                "status": { "privacyStatus": "unlisted" },
            })
        );
    }
}
