//! Dribbble API v2: shots, comments, likes, and follows.

use crate::client::RequestExt;
use crate::media::MediaFile;
use crate::{Client, Error};
use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

const API_URL: &str = "https://api.dribbble.com/v2/";

/// A shot.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Shot {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub team_id: Option<u64>,
    /// Low resolution image URL.
    #[serde(default, rename = "low_profile")]
    pub low: Option<String>,
    /// Normal resolution image URL.
    #[serde(default)]
    pub normal: Option<String>,
    /// High resolution image URL.
    #[serde(default, rename = "high_profile")]
    pub high: Option<String>,
}

/// A comment on a shot.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Comment {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub shot_id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Counters for a shot.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ShotStats {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub rebounds: u64,
    pub attachments: u64,
}

#[derive(Deserialize)]
struct ShotWithStats {
    #[serde(default)]
    statistics: ShotStats,
}

/// Dribbble client authenticated with an OAuth access token.
#[derive(Debug, Clone)]
pub struct Dribbble {
    client: Client,
    access_token: String,
}

impl Dribbble {
    /// Creates a client using `access_token`.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Dribbble {
        Dribbble::with_client(Client::new(), access_token)
    }

    /// Like [`Dribbble::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(client: Client, access_token: impl Into<String>) -> Dribbble {
        Dribbble {
            client: client.based(API_URL),
            access_token: access_token.into(),
        }
    }

    /// Changes the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Dribbble {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Uploads a new shot.
    #[tracing::instrument(skip(self, description, image))]
    pub async fn create_shot(
        &self,
        title: &str,
        description: &str,
        tags: &[&str],
        image: MediaFile,
    ) -> Result<Shot, Error> {
        let mut form = Form::new()
            .part("image", image.into_part()?)
            .text("title", title.to_owned())
            .text("description", description.to_owned());
        for tag in tags {
            form = form.text("tags[]", (*tag).to_owned());
        }

        let shot: Shot = self
            .client
            .post("shots")
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send_created()
            .await?;
        tracing::info!(shot_id = shot.id, "created shot");
        Ok(shot)
    }

    /// Replies to a comment on a shot.
    #[tracing::instrument(skip(self, body))]
    pub async fn reply_to_comment(
        &self,
        shot_id: u64,
        comment_id: u64,
        body: &str,
    ) -> Result<Comment, Error> {
        self.client
            .post(&format!("shots/{}/comments/{}/replies", shot_id, comment_id))
            .bearer_auth(&self.access_token)
            .json(&json!({ "body": body }))
            .send_created()
            .await
    }

    /// Counters for a shot.
    #[tracing::instrument(skip(self))]
    pub async fn shot_stats(&self, shot_id: u64) -> Result<ShotStats, Error> {
        let ShotWithStats { statistics } = self
            .client
            .get(&format!("shots/{}", shot_id))
            .bearer_auth(&self.access_token)
            .send_json()
            .await?;
        Ok(statistics)
    }

    /// Lists shots, one page at a time.
    #[tracing::instrument(skip(self))]
    pub async fn list_shots(
        &self,
        page: u32,
        per_page: u32,
        timeframe: &str,
    ) -> Result<Vec<Shot>, Error> {
        self.client
            .get("shots")
            .bearer_auth(&self.access_token)
            .query(&[("page", page), ("per_page", per_page)])
            .query(&[("timeframe", timeframe)])
            .send_json()
            .await
    }

    /// Follows a user.
    #[tracing::instrument(skip(self))]
    pub async fn follow_user(&self, user_id: u64) -> Result<(), Error> {
        self.client
            .put(&format!("users/{}/follow", user_id))
            .bearer_auth(&self.access_token)
            .send_checked()
            .await?;
        Ok(())
    }

    /// Likes a shot.
    #[tracing::instrument(skip(self))]
    pub async fn like_shot(&self, shot_id: u64) -> Result<(), Error> {
        self.client
            .post(&format!("shots/{}/like", shot_id))
            .bearer_auth(&self.access_token)
            .send_expecting(&[StatusCode::CREATED])
            .await?;
        Ok(())
    }
}
