//! Google OAuth 2.0 sign-in: login URL, code exchange, refresh, user info, ID token checks.

use crate::client::RequestExt;
use crate::{Client, Error};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const OAUTH_URL: &str = "https://oauth2.googleapis.com/";
const API_URL: &str = "https://www.googleapis.com/";

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// An OAuth token.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Token {
    #[allow(missing_docs)]
    pub access_token: String,
    #[allow(missing_docs)]
    #[serde(default)]
    pub token_type: String,
    /// Only returned for offline access, and not always on refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, as reported by Google.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// OpenID Connect ID token, when the `openid` scope was granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// When the access token expires, computed from `expires_in` on receipt. Lifetimes too
    /// large to represent leave this unset.
    #[serde(skip)]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    fn stamp_expiry(mut self) -> Token {
        self.expiry = self
            .expires_in
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        self
    }

    /// Whether the access token has expired. Tokens without a known expiry never do.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiry.map_or(false, |expiry| Utc::now() >= expiry)
    }
}

/// Profile of the signed-in user.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
#[allow(missing_docs)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub verified_email: bool,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub picture: String,
    pub locale: String,
}

/// Random URL-safe state for CSRF protection: 32 bytes, base64 encoded.
#[must_use]
pub fn generate_state_token() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::encode_config(bytes, base64::URL_SAFE)
}

/// OAuth configuration for one Google app.
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    oauth: Client,
    api: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl GoogleOAuth {
    /// Creates a configuration. An empty `scopes` means [`DEFAULT_SCOPES`].
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: &[&str],
    ) -> GoogleOAuth {
        GoogleOAuth::with_client(Client::new(), client_id, client_secret, redirect_uri, scopes)
    }

    /// Like [`GoogleOAuth::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(
        client: Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: &[&str],
    ) -> GoogleOAuth {
        let scopes = if scopes.is_empty() {
            DEFAULT_SCOPES
        } else {
            scopes
        };
        GoogleOAuth {
            oauth: client.based(OAUTH_URL),
            api: client.based(API_URL),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes: scopes.iter().map(|&s| s.to_owned()).collect(),
        }
    }

    /// Changes the base URL for token, refresh, and token info requests.
    #[must_use]
    pub fn with_oauth_base_url(mut self, base_url: impl Into<String>) -> GoogleOAuth {
        self.oauth = self.oauth.with_base_url(base_url);
        self
    }

    /// Changes the base URL for user info requests.
    #[must_use]
    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> GoogleOAuth {
        self.api = self.api.with_base_url(base_url);
        self
    }

    /// The scopes this configuration requests.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The consent page URL for online access.
    #[must_use]
    pub fn login_url(&self, state: &str) -> String {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "online"),
            ],
        )
        .map(String::from)
        .unwrap_or_default()
    }

    /// Exchanges an authorization code for a token.
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<Token, Error> {
        let token: Token = self
            .oauth
            .post("token")
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send_json()
            .await?;
        Ok(token.stamp_expiry())
    }

    /// Gets a fresh access token. Google usually omits the refresh token here, in which case
    /// `refresh_token` is carried over.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Token, Error> {
        let mut token: Token = self
            .oauth
            .post("token")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send_json()
            .await?;
        if token.refresh_token.as_deref().map_or(true, str::is_empty) {
            token.refresh_token = Some(refresh_token.to_owned());
        }
        Ok(token.stamp_expiry())
    }

    /// The signed-in user's profile.
    #[tracing::instrument(skip_all)]
    pub async fn user_info(&self, token: &Token) -> Result<UserInfo, Error> {
        self.api
            .get("oauth2/v2/userinfo")
            .bearer_auth(&token.access_token)
            .send_json()
            .await
    }

    /// Checks an ID token with Google's token info endpoint and returns its claims.
    #[tracing::instrument(skip_all)]
    pub async fn verify_id_token(&self, id_token: &str) -> Result<Map<String, Value>, Error> {
        let response = self
            .oauth
            .get("tokeninfo")
            .query(&[("id_token", id_token)])
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "ID token rejected");
            return Err(Error::InvalidIdToken);
        }
        Ok(response.json().await?)
    }
}
