//! Pinterest API v5: pins, comments, analytics, boards, follows, and OAuth.

use crate::client::RequestExt;
use crate::media::MediaFile;
use crate::{Client, Error};
use reqwest::multipart::Form;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const API_URL: &str = "https://api.pinterest.com/v5/";
const AUTHORIZE_URL: &str = "https://www.pinterest.com/oauth/";
const DEFAULT_TIMEFRAME: &str = "30days";
const DEFAULT_SEARCH_LIMIT: u32 = 25;

/// A pin.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Pin {
    /// Assigned by Pinterest; leave empty when creating.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Where the pin links to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub board_id: String,
    /// A media ID from [`Pinterest::upload_image`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub media_source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
}

/// A comment on a pin.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub pin_id: String,
}

/// Analytics counters. Which ones are set depends on the object.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
#[allow(missing_docs)]
pub struct Stats {
    pub followers: i64,
    pub following: i64,
    pub pins: i64,
    pub likes: i64,
    pub comments: i64,
    pub saves: i64,
    pub impressions: i64,
    pub engagements: i64,
    pub clicks: i64,
    pub video_views: i64,
}

/// A board.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Board {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// `PUBLIC`, `PROTECTED`, or `SECRET`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub privacy: String,
}

/// OAuth token response.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct Uploaded {
    media_id: String,
}

/// Pinterest client authenticated with a user access token.
#[derive(Debug, Clone)]
pub struct Pinterest {
    client: Client,
    access_token: String,
}

impl Pinterest {
    /// Creates a client using `access_token`.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Pinterest {
        Pinterest::with_client(Client::new(), access_token)
    }

    /// Like [`Pinterest::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(client: Client, access_token: impl Into<String>) -> Pinterest {
        Pinterest {
            client: client.based(API_URL),
            access_token: access_token.into(),
        }
    }

    /// Changes the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Pinterest {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Creates a pin.
    #[tracing::instrument(skip(self, pin), fields(board_id = %pin.board_id))]
    pub async fn create_pin(&self, pin: &Pin) -> Result<Pin, Error> {
        let pin: Pin = self.send(self.client.post("pins").json(pin)).await?;
        tracing::info!(pin_id = %pin.id, "created pin");
        Ok(pin)
    }

    /// Uploads an image and returns the media ID to reference as [`Pin::media_source`].
    #[tracing::instrument(skip(self, image))]
    pub async fn upload_image(&self, image: MediaFile) -> Result<String, Error> {
        let form = Form::new().part("file", image.into_part()?);
        let Uploaded { media_id } = self.send(self.client.post("media").multipart(form)).await?;
        tracing::info!(%media_id, "uploaded image");
        Ok(media_id)
    }

    /// Comments on a pin.
    #[tracing::instrument(skip(self))]
    pub async fn comments(&self, pin_id: &str) -> Result<Vec<Comment>, Error> {
        let Items { items } = self
            .send(self.client.get(&format!("pins/{}/comments", pin_id)))
            .await?;
        Ok(items)
    }

    /// Adds a comment to a pin.
    #[tracing::instrument(skip(self))]
    pub async fn add_comment(&self, pin_id: &str, text: &str) -> Result<Comment, Error> {
        self.send(
            self.client
                .post(&format!("pins/{}/comments", pin_id))
                .json(&json!({ "text": text })),
        )
        .await
    }

    /// Replies to a comment: a comment on the pin with a parent.
    #[tracing::instrument(skip(self))]
    pub async fn reply_to_comment(
        &self,
        pin_id: &str,
        parent_comment_id: &str,
        text: &str,
    ) -> Result<Comment, Error> {
        self.send(
            self.client
                .post(&format!("pins/{}/comments", pin_id))
                .json(&json!({ "text": text, "parent_comment_id": parent_comment_id })),
        )
        .await
    }

    /// Analytics for a pin. An empty timeframe means `30days`.
    pub async fn pin_stats(&self, pin_id: &str, timeframe: &str) -> Result<Stats, Error> {
        self.analytics(&format!("pins/{}/analytics", pin_id), timeframe)
            .await
    }

    /// Analytics for a board. An empty timeframe means `30days`.
    pub async fn board_stats(&self, board_id: &str, timeframe: &str) -> Result<Stats, Error> {
        self.analytics(&format!("boards/{}/analytics", board_id), timeframe)
            .await
    }

    /// Analytics for the authenticated account. An empty timeframe means `30days`.
    pub async fn user_stats(&self, timeframe: &str) -> Result<Stats, Error> {
        self.analytics("user/analytics", timeframe).await
    }

    /// The authenticated account, as raw JSON.
    #[tracing::instrument(skip(self))]
    pub async fn user_info(&self) -> Result<Value, Error> {
        self.send(self.client.get("user_account")).await
    }

    /// Searches pins. A `limit` of 0 means 25.
    #[tracing::instrument(skip(self))]
    pub async fn search_pins(&self, query: &str, limit: u32) -> Result<Vec<Pin>, Error> {
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };
        let Items { items } = self
            .send(
                self.client
                    .get("pins/search")
                    .query(&[("query", query)])
                    .query(&[("limit", limit)]),
            )
            .await?;
        Ok(items)
    }

    /// Creates a board.
    #[tracing::instrument(skip(self, board), fields(name = %board.name))]
    pub async fn create_board(&self, board: &Board) -> Result<Board, Error> {
        let board: Board = self.send(self.client.post("boards").json(board)).await?;
        tracing::info!(board_id = %board.id, "created board");
        Ok(board)
    }

    /// Updates a board's non-empty fields.
    #[tracing::instrument(skip(self, board))]
    pub async fn update_board(&self, board_id: &str, board: &Board) -> Result<Board, Error> {
        self.send(
            self.client
                .patch(&format!("boards/{}", board_id))
                .json(board),
        )
        .await
    }

    /// The authenticated account's boards.
    #[tracing::instrument(skip(self))]
    pub async fn boards(&self) -> Result<Vec<Board>, Error> {
        let Items { items } = self.send(self.client.get("boards")).await?;
        Ok(items)
    }

    /// Follows a user.
    #[tracing::instrument(skip(self))]
    pub async fn follow_user(&self, username: &str) -> Result<(), Error> {
        self.authed(self.client.post("user/follows/users/"))
            .json(&json!({ "username": username }))
            .send_checked()
            .await?;
        Ok(())
    }

    /// Unfollows a user.
    #[tracing::instrument(skip(self))]
    pub async fn unfollow_user(&self, username: &str) -> Result<(), Error> {
        self.authed(self.client.delete(&format!("user/follows/users/{}", username)))
            .send_checked()
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn analytics(&self, path: &str, timeframe: &str) -> Result<Stats, Error> {
        let timeframe = if timeframe.is_empty() {
            DEFAULT_TIMEFRAME
        } else {
            timeframe
        };
        self.send(self.client.get(path).query(&[("timeframe", timeframe)]))
            .await
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.access_token)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, Error> {
        self.authed(request).send_json().await
    }
}

/// Pinterest OAuth for an app.
#[derive(Debug, Clone)]
pub struct PinterestOAuth {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl PinterestOAuth {
    /// Creates an OAuth helper for the app `client_id`.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> PinterestOAuth {
        PinterestOAuth {
            client: Client::new().with_base_url(API_URL),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Changes the API base URL the token exchange is sent to.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> PinterestOAuth {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// The URL to send a user to for authorizing `scopes`.
    #[must_use]
    pub fn auth_url(&self, state: &str, scopes: &[&str]) -> String {
        let scope = scopes.join(",");
        Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map(String::from)
        .unwrap_or_default()
    }

    /// Exchanges an authorization code for tokens.
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        self.client
            .post("oauth/token")
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send_json()
            .await
    }
}
