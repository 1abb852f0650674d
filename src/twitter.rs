//! Twitter API v2: tweets and recent search, plus background posting loops.

use crate::client::RequestExt;
use crate::{Client, Error};
use chrono::{DateTime, Utc};
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::num::ParseIntError;

pub mod automation;

const API_URL: &str = "https://api.twitter.com/2/";

/// A tweet ID.
///
/// Tweet IDs are snowflakes: they're sent as strings but order numerically, so `"10"` is newer
/// than `"9"`.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TweetId(pub u64);

impl TryFrom<String> for TweetId {
    type Error = ParseIntError;

    fn try_from(s: String) -> Result<TweetId, ParseIntError> {
        s.parse()
    }
}

impl From<TweetId> for String {
    fn from(id: TweetId) -> String {
        id.to_string()
    }
}

/// A tweet.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Tweet {
    /// The tweet's ID.
    pub id: TweetId,
    /// The tweet's text.
    pub text: String,
    /// Only present when requested through `tweet.fields`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Only present when requested through `tweet.fields`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    /// Only present when requested through `tweet.fields`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

/// Twitter API client, authenticated with an app or user bearer token.
#[derive(Debug, Clone)]
pub struct Twitter {
    client: Client,
    bearer_token: String,
}

impl Twitter {
    /// Creates a client using `bearer_token` for every request.
    #[must_use]
    pub fn new(bearer_token: impl Into<String>) -> Twitter {
        Twitter::with_client(Client::new(), bearer_token)
    }

    /// Like [`Twitter::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(client: Client, bearer_token: impl Into<String>) -> Twitter {
        Twitter {
            client: client.based(API_URL),
            bearer_token: bearer_token.into(),
        }
    }

    /// Changes the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Twitter {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Posts a tweet.
    #[tracing::instrument(skip(self))]
    pub async fn create_tweet(&self, text: &str) -> Result<Tweet, Error> {
        self.post_tweet(json!({ "text": text })).await
    }

    /// Posts a reply to `tweet_id`.
    #[tracing::instrument(skip(self))]
    pub async fn reply_to_tweet(&self, tweet_id: TweetId, text: &str) -> Result<Tweet, Error> {
        self.post_tweet(json!({
            "text": text,
            "reply": { "in_reply_to_tweet_id": tweet_id },
        }))
        .await
    }

    /// Fetches a tweet.
    #[tracing::instrument(skip(self))]
    pub async fn tweet(&self, tweet_id: TweetId) -> Result<Tweet, Error> {
        let Data { data } = self
            .client
            .get(&format!("tweets/{}", tweet_id))
            .bearer_auth(&self.bearer_token)
            .send_json()
            .await?;
        Ok(data)
    }

    /// Deletes a tweet.
    #[tracing::instrument(skip(self))]
    pub async fn delete_tweet(&self, tweet_id: TweetId) -> Result<(), Error> {
        self.client
            .delete(&format!("tweets/{}", tweet_id))
            .bearer_auth(&self.bearer_token)
            .send_checked()
            .await?;
        tracing::info!(%tweet_id, "deleted tweet");
        Ok(())
    }

    /// Searches the last seven days of tweets, newest first. `max_results` of 0 leaves the limit
    /// to the API.
    #[tracing::instrument(skip(self))]
    pub async fn search_recent(&self, query: &str, max_results: u32) -> Result<Vec<Tweet>, Error> {
        let mut request = self
            .client
            .get("tweets/search/recent")
            .bearer_auth(&self.bearer_token)
            .query(&[("query", query)]);
        if max_results > 0 {
            request = request.query(&[("max_results", max_results)]);
        }
        let SearchResponse { data } = request.send_json().await?;
        Ok(data)
    }

    async fn post_tweet(&self, body: serde_json::Value) -> Result<Tweet, Error> {
        let Data { data }: Data<Tweet> = self
            .client
            .post("tweets")
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send_json()
            .await?;
        tracing::info!(tweet_id = %data.id, "created tweet");
        Ok(data)
    }
}
