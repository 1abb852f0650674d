//! Reddit API for script apps: password-grant login, then posting, commenting, and reading.

use crate::client::RequestExt;
use crate::{Client, Error};
use chrono::{DateTime, Duration, Utc};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value;

const AUTH_URL: &str = "https://www.reddit.com/";
const API_URL: &str = "https://oauth.reddit.com/";

/// What a submission links to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostKind {
    /// A text post.
    SelfText(String),
    /// A link post.
    Link(String),
}

/// Vote direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum VoteDirection {
    Up,
    Down,
    /// Removes an existing vote.
    Clear,
}

impl VoteDirection {
    fn as_str(self) -> &'static str {
        match self {
            VoteDirection::Up => "1",
            VoteDirection::Down => "-1",
            VoteDirection::Clear => "0",
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

#[derive(Deserialize)]
struct JsonEnvelope<T> {
    json: JsonBody<T>,
}

#[derive(Deserialize)]
struct JsonBody<T> {
    #[serde(default)]
    errors: Vec<Value>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct Submitted {
    id: String,
}

#[derive(Deserialize)]
struct Things {
    #[serde(default)]
    things: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    data: ThingData,
}

#[derive(Deserialize)]
struct ThingData {
    id: String,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Value>,
}

/// Entry point for logging in.
#[derive(Debug, Clone)]
pub struct Reddit {
    auth: Client,
    api: Client,
}

impl Reddit {
    /// Creates a `Reddit` that logs in against the public endpoints.
    #[must_use]
    pub fn new() -> Reddit {
        Reddit::with_client(Client::new())
    }

    /// Like [`Reddit::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(client: Client) -> Reddit {
        Reddit {
            auth: client.based(AUTH_URL),
            api: client.based(API_URL),
        }
    }

    /// Changes the token endpoint's base URL.
    #[must_use]
    pub fn with_auth_base_url(mut self, base_url: impl Into<String>) -> Reddit {
        self.auth = self.auth.with_base_url(base_url);
        self
    }

    /// Changes the OAuth API base URL sessions use.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Reddit {
        self.api = self.api.with_base_url(base_url);
        self
    }

    /// Logs in with the password grant, returning a [`RedditSession`].
    ///
    /// The session does not refresh itself; log in again once [`RedditSession::is_expired`].
    #[tracing::instrument(skip(self, client_secret, password))]
    pub async fn login(
        &self,
        client_id: &str,
        client_secret: &str,
        username: &str,
        password: &str,
        user_agent: &str,
    ) -> Result<RedditSession, Error> {
        let token: TokenResponse = self
            .auth
            .post("api/v1/access_token")
            .basic_auth(client_id, Some(client_secret))
            .header(USER_AGENT, user_agent)
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ])
            .send_json()
            .await?;
        tracing::info!(expires_in = token.expires_in, "logged in");

        Ok(RedditSession {
            client: self.api.clone(),
            access_token: token.access_token,
            expires_at: expires_at(Utc::now(), token.expires_in),
            user_agent: user_agent.to_owned(),
        })
    }
}

/// `now + expires_in` seconds, saturating at the latest representable time.
fn expires_at(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl Default for Reddit {
    fn default() -> Reddit {
        Reddit::new()
    }
}

/// Logged-in session.
#[derive(Debug, Clone)]
pub struct RedditSession {
    client: Client,
    access_token: String,
    expires_at: DateTime<Utc>,
    user_agent: String,
}

impl RedditSession {
    /// When the access token stops working.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Submits a post and returns its ID (without the `t3_` prefix).
    #[tracing::instrument(skip(self))]
    pub async fn submit(&self, subreddit: &str, title: &str, kind: &PostKind) -> Result<String, Error> {
        let (kind, field, content) = match kind {
            PostKind::SelfText(text) => ("self", "text", text.as_str()),
            PostKind::Link(url) => ("link", "url", url.as_str()),
        };
        let Submitted { id } = self
            .json_call(
                self.client.post("api/submit").form(&[
                    ("api_type", "json"),
                    ("sr", subreddit),
                    ("title", title),
                    ("kind", kind),
                    (field, content),
                ]),
            )
            .await?;
        tracing::info!(%id, "submitted post");
        Ok(id)
    }

    /// Replies to a post or comment. `thing_id` must carry its type prefix (`t1_`, `t3_`).
    #[tracing::instrument(skip(self, text))]
    pub async fn reply(&self, thing_id: &str, text: &str) -> Result<String, Error> {
        let Things { things } = self
            .json_call(self.client.post("api/comment").form(&[
                ("api_type", "json"),
                ("text", text),
                ("thing_id", thing_id),
            ]))
            .await?;
        let id = things
            .into_iter()
            .next()
            .ok_or(Error::InvalidResponse("things"))?
            .data
            .id;
        tracing::info!(%id, "replied");
        Ok(id)
    }

    /// Subreddit details (`/r/{subreddit}/about`).
    #[tracing::instrument(skip(self))]
    pub async fn subreddit_about(&self, subreddit: &str) -> Result<Value, Error> {
        self.get(&format!("r/{}/about", subreddit), &[]).await
    }

    /// A post's listing entry. The `t3_` prefix is added when missing.
    #[tracing::instrument(skip(self))]
    pub async fn post_info(&self, post_id: &str) -> Result<Value, Error> {
        let fullname = if post_id.starts_with("t3_") {
            post_id.to_owned()
        } else {
            format!("t3_{}", post_id)
        };
        self.get("api/info", &[("id", &fullname)]).await
    }

    /// A user's profile (`/user/{username}/about`).
    #[tracing::instrument(skip(self))]
    pub async fn user_about(&self, username: &str) -> Result<Value, Error> {
        self.get(&format!("user/{}/about", username), &[]).await
    }

    /// A post and its comment tree: Reddit returns a two-element array of listings.
    #[tracing::instrument(skip(self))]
    pub async fn comments(&self, subreddit: &str, post_id: &str) -> Result<Vec<Value>, Error> {
        let post_id = post_id.strip_prefix("t3_").unwrap_or(post_id);
        self.get(&format!("r/{}/comments/{}", subreddit, post_id), &[])
            .await
    }

    /// Votes on a post or comment by fullname.
    #[tracing::instrument(skip(self))]
    pub async fn vote(&self, id: &str, direction: VoteDirection) -> Result<(), Error> {
        self.authed(self.client.post("api/vote"))
            .form(&[("id", id), ("dir", direction.as_str())])
            .send_checked()
            .await?;
        Ok(())
    }

    /// Searches all of Reddit, or one subreddit.
    #[tracing::instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        subreddit: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Value>, Error> {
        let limit = limit.to_string();
        let listing: Listing = match subreddit.filter(|s| !s.is_empty()) {
            Some(subreddit) => {
                self.get(
                    &format!("r/{}/search", subreddit),
                    &[("q", query), ("limit", &limit), ("restrict_sr", "true")],
                )
                .await?
            }
            None => {
                self.get("search", &[("q", query), ("limit", &limit)])
                    .await?
            }
        };
        Ok(listing.data.children)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.access_token)
            .header(USER_AGENT, &self.user_agent)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        self.authed(self.client.get(path))
            .query(query)
            .send_json()
            .await
    }

    /// Calls an `api_type=json` endpoint, surfacing its `errors` array.
    async fn json_call<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, Error> {
        let JsonEnvelope { json } = self.authed(request).send_json::<JsonEnvelope<T>>().await?;
        if !json.errors.is_empty() {
            return Err(Error::Platform {
                platform: "reddit",
                message: Value::Array(json.errors).to_string(),
            });
        }
        json.data.ok_or(Error::InvalidResponse("json.data"))
    }
}

#[cfg(test)]
mod tests {
    use super::expires_at;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    #[test]
    fn expiry_saturates() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(expires_at(now, 3600), now + Duration::hours(1));
        assert_eq!(expires_at(now, i64::MAX), DateTime::<Utc>::MAX_UTC);
    }
}
