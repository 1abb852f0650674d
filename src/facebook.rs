//! Facebook Graph API (v18.0): page posts, photos, comments and insights.

use crate::graph::{send_graph, GraphAuth, InsightsData};
use crate::media::MediaFile;
use crate::{Client, Error};
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

const GRAPH_URL: &str = "https://graph.facebook.com/v18.0/";
const POST_METRICS: &str = "post_impressions,post_impressions_unique,post_reactions_by_type_total,post_clicks,post_engaged_users";
const PAGE_FIELDS: &str =
    "id,name,category,category_list,about,description,fan_count,followers_count,link";
/// Page metrics requested by [`Facebook::page_insights`] when none are given.
pub const DEFAULT_PAGE_METRICS: &[&str] = &[
    "page_impressions",
    "page_impressions_unique",
    "page_engaged_users",
    "page_fan_adds",
];

/// Result of a write call.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Response {
    /// ID of the created object. Absent for deletes.
    #[serde(default)]
    pub id: String,
    /// Set by deletes.
    #[serde(default)]
    pub success: bool,
    /// For photos: the ID of the feed story the photo was published in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

/// A comment on a post or another comment.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Comment {
    /// Comment ID.
    pub id: String,
    /// Comment text.
    #[serde(default)]
    pub message: String,
    /// ISO 8601 creation time.
    #[serde(default)]
    pub created_time: String,
    /// The commenter. Only visible with page-level permissions.
    #[serde(default)]
    pub from: Option<CommentAuthor>,
}

/// Who wrote a comment.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct CommentAuthor {
    pub id: String,
    pub name: String,
}

/// A page of comments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Comments {
    /// Comments on this page.
    #[serde(default)]
    pub data: Vec<Comment>,
    /// Cursors for the neighbouring pages.
    #[serde(default)]
    pub paging: Option<Paging>,
}

/// Cursor pagination.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Paging {
    /// Cursors into the result set.
    #[serde(default)]
    pub cursors: Cursors,
    /// URL of the next page, if there is one.
    #[serde(default)]
    pub next: Option<String>,
}

/// Before/after cursors.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Cursors {
    #[serde(default)]
    pub before: String,
    #[serde(default)]
    pub after: String,
}

/// One insights series.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Metric name, e.g. `page_impressions`.
    pub name: String,
    /// Values in the order the API returned them. Breakdown metrics hold JSON objects.
    pub values: Vec<serde_json::Value>,
}

impl Metric {
    /// The most recent value as an integer, if it is one.
    #[must_use]
    pub fn latest(&self) -> Option<i64> {
        self.values.last().and_then(serde_json::Value::as_i64)
    }
}

/// Page details.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_list: Vec<Category>,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fan_count: i64,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub link: String,
}

/// A page category.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Facebook Graph API client for a page or user access token.
#[derive(Debug, Clone)]
pub struct Facebook {
    client: Client,
    auth: GraphAuth,
}

impl Facebook {
    /// Creates a client using `access_token`.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Facebook {
        Facebook::with_client(Client::new(), access_token)
    }

    /// Like [`Facebook::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(client: Client, access_token: impl Into<String>) -> Facebook {
        Facebook {
            client: client.based(GRAPH_URL),
            auth: GraphAuth {
                access_token: access_token.into(),
                app_secret: None,
            },
        }
    }

    /// Signs every request with `appsecret_proof`, for apps that require it.
    #[must_use]
    pub fn with_app_secret(mut self, app_secret: impl Into<String>) -> Facebook {
        self.auth.app_secret = Some(app_secret.into());
        self
    }

    /// Changes the Graph API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Facebook {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Posts to a page feed. `page_id` may be `me`.
    #[tracing::instrument(skip(self))]
    pub async fn create_post(
        &self,
        page_id: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<Response, Error> {
        let mut form = vec![("message", message)];
        if let Some(link) = link.filter(|l| !l.is_empty()) {
            form.push(("link", link));
        }
        self.write(&format!("{}/feed", page_id), &form).await
    }

    /// Schedules a page post for `publish_at` (unix seconds).
    #[tracing::instrument(skip(self))]
    pub async fn create_scheduled_post(
        &self,
        page_id: &str,
        message: &str,
        publish_at: i64,
    ) -> Result<Response, Error> {
        let publish_at = publish_at.to_string();
        self.write(
            &format!("{}/feed", page_id),
            &[
                ("message", message),
                ("published", "false"),
                ("scheduled_publish_time", &publish_at),
            ],
        )
        .await
    }

    /// Uploads a photo to a page, optionally with a caption.
    #[tracing::instrument(skip(self, photo))]
    pub async fn upload_photo(
        &self,
        page_id: &str,
        message: &str,
        photo: MediaFile,
    ) -> Result<Response, Error> {
        let mut form = Form::new();
        for (key, value) in self.auth.query() {
            form = form.text(key, value);
        }
        if !message.is_empty() {
            form = form.text("message", message.to_owned());
        }
        form = form.part("source", photo.into_part()?);

        let response: Response =
            send_graph(self.client.post(&format!("{}/photos", page_id)).multipart(form)).await?;
        tracing::info!(id = %response.id, "uploaded photo");
        Ok(response)
    }

    /// Comments on a post.
    #[tracing::instrument(skip(self))]
    pub async fn comment_on_post(&self, post_id: &str, message: &str) -> Result<Response, Error> {
        self.write(&format!("{}/comments", post_id), &[("message", message)])
            .await
    }

    /// Replies to a comment. Replies are comments whose parent is a comment.
    pub async fn reply_to_comment(
        &self,
        comment_id: &str,
        message: &str,
    ) -> Result<Response, Error> {
        self.comment_on_post(comment_id, message).await
    }

    /// Comments on a post. A `limit` of 0 uses the API default.
    #[tracing::instrument(skip(self))]
    pub async fn comments(&self, post_id: &str, limit: u32) -> Result<Comments, Error> {
        let mut request = self
            .client
            .get(&format!("{}/comments", post_id))
            .query(&self.auth.query());
        if limit > 0 {
            request = request.query(&[("limit", limit)]);
        }
        send_graph(request).await
    }

    /// Impressions, reactions, clicks and engaged users for a post.
    #[tracing::instrument(skip(self))]
    pub async fn post_insights(&self, post_id: &str) -> Result<Vec<Metric>, Error> {
        self.insights(post_id, POST_METRICS, None).await
    }

    /// Page metrics over `period` (`day`, `week`, `days_28`). Empty `metrics` means
    /// [`DEFAULT_PAGE_METRICS`]; an empty period is left to the API.
    #[tracing::instrument(skip(self))]
    pub async fn page_insights(
        &self,
        page_id: &str,
        metrics: &[&str],
        period: &str,
    ) -> Result<Vec<Metric>, Error> {
        let metrics = if metrics.is_empty() {
            DEFAULT_PAGE_METRICS.join(",")
        } else {
            metrics.join(",")
        };
        let period = Some(period).filter(|p| !p.is_empty());
        self.insights(page_id, &metrics, period).await
    }

    /// Page details.
    #[tracing::instrument(skip(self))]
    pub async fn page_info(&self, page_id: &str) -> Result<Page, Error> {
        send_graph(
            self.client
                .get(page_id)
                .query(&[("fields", PAGE_FIELDS)])
                .query(&self.auth.query()),
        )
        .await
    }

    /// Deletes a post.
    #[tracing::instrument(skip(self))]
    pub async fn delete_post(&self, post_id: &str) -> Result<Response, Error> {
        let response = send_graph(self.client.delete(post_id).query(&self.auth.query())).await?;
        tracing::info!(%post_id, "deleted post");
        Ok(response)
    }

    async fn insights(
        &self,
        object_id: &str,
        metrics: &str,
        period: Option<&str>,
    ) -> Result<Vec<Metric>, Error> {
        let mut request = self
            .client
            .get(&format!("{}/insights", object_id))
            .query(&[("metric", metrics)])
            .query(&self.auth.query());
        if let Some(period) = period {
            request = request.query(&[("period", period)]);
        }
        let data: InsightsData = send_graph(request).await?;
        Ok(data
            .data
            .into_iter()
            .map(|metric| Metric {
                name: metric.name,
                values: metric.values.into_iter().map(|v| v.value).collect(),
            })
            .collect())
    }

    async fn write(&self, path: &str, form: &[(&str, &str)]) -> Result<Response, Error> {
        let response: Response = send_graph(
            self.client
                .post(path)
                .query(&self.auth.query())
                .form(form),
        )
        .await?;
        tracing::info!(id = %response.id, path, "created");
        Ok(response)
    }
}
