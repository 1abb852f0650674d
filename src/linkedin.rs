//! LinkedIn v2: OAuth, profiles, UGC posts and media uploads.

use crate::client::RequestExt;
use crate::media::{self, MediaFile};
use crate::{Client, Error};
use derive_more::{Display, From, Into};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

pub mod jobs;

const API_URL: &str = "https://api.linkedin.com/v2/";
const OAUTH_URL: &str = "https://www.linkedin.com/oauth/v2/";
const RESTLI_PROTOCOL_VERSION: (&str, &str) = ("X-Restli-Protocol-Version", "2.0.0");
const UPLOAD_MECHANISM: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

/// A LinkedIn URN, such as `urn:li:person:abc123` or `urn:li:digitalmediaAsset:C4E...`.
#[derive(Clone, Debug, Default, Deserialize, Display, Eq, From, Hash, Into, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Urn(pub String);

impl Urn {
    /// The last `:`-separated segment, e.g. `123` for `urn:li:organization:123`.
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.rsplit(':').next().unwrap_or_default()
    }
}

/// Who a post is published as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Author {
    /// The member the access token belongs to.
    Me,
    /// A member by ID.
    Person(String),
    /// A company page by ID.
    Organization(String),
}

/// Kind of media attached to a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// A still image.
    Image,
    /// A video.
    Video,
}

impl MediaKind {
    fn recipe(self) -> &'static str {
        match self {
            MediaKind::Image => "urn:li:digitalmediaRecipe:feedshare-image",
            MediaKind::Video => "urn:li:digitalmediaRecipe:feedshare-video",
        }
    }

    fn category(self) -> &'static str {
        match self {
            MediaKind::Image => "IMAGE",
            MediaKind::Video => "VIDEO",
        }
    }
}

/// Where to PUT media bytes, and the asset they become.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTicket {
    /// The digital media asset URN, referenced when publishing.
    pub asset: Urn,
    /// Signed URL that accepts the raw bytes.
    pub upload_url: String,
}

/// OAuth token response.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,
    /// Seconds until `access_token` expires.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Only issued to apps with programmatic refresh enabled.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until `refresh_token` expires.
    #[serde(default)]
    pub refresh_token_expires_in: Option<u64>,
    /// Granted scopes, comma separated.
    #[serde(default)]
    pub scope: Option<String>,
}

/// The authenticated member's profile, with localized fields resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    /// Member ID, as used in `urn:li:person:{id}`.
    pub id: String,
    /// Localized first name.
    pub first_name: String,
    /// Localized last name.
    pub last_name: String,
    /// Localized headline.
    pub headline: String,
}

/// A company page the member administers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyPage {
    /// Organization ID, as used in `urn:li:organization:{id}`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Localized description, if the page has one.
    pub description: String,
}

/// ID of a created UGC post.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PostResponse {
    /// The post URN, e.g. `urn:li:share:123`.
    pub id: String,
}

/// A multi-locale string: `{"localized": {"en_US": "..."}, "preferredLocale": {...}}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Localized {
    #[serde(default)]
    localized: HashMap<String, String>,
    #[serde(default)]
    preferred_locale: Option<Locale>,
}

#[derive(Debug, Deserialize)]
struct Locale {
    #[serde(default)]
    language: String,
    #[serde(default)]
    country: String,
}

impl Localized {
    /// The preferred locale's value, otherwise the first one by locale key.
    fn resolve(&self) -> String {
        if let Some(locale) = &self.preferred_locale {
            let key = format!("{}_{}", locale.language, locale.country);
            if let Some(value) = self.localized.get(&key) {
                return value.clone();
            }
        }
        let mut keys = self.localized.keys().collect::<Vec<_>>();
        keys.sort();
        keys.first()
            .and_then(|k| self.localized.get(*k))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfile {
    id: String,
    #[serde(default)]
    first_name: Localized,
    #[serde(default)]
    last_name: Localized,
    #[serde(default)]
    headline: Localized,
}

#[derive(Debug, Deserialize)]
struct Elements<T> {
    #[serde(default = "Vec::new")]
    elements: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationAcl {
    organization_target: Urn,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Organization {
    #[serde(default)]
    localized_name: Option<String>,
    #[serde(default)]
    name: Option<Localized>,
    #[serde(default)]
    description: Option<Localized>,
}

#[derive(Debug, Deserialize)]
struct RegisterUploadResponse {
    value: RegisterUploadValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterUploadValue {
    #[serde(default)]
    asset: Option<Urn>,
    #[serde(default)]
    upload_mechanism: HashMap<String, UploadRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest {
    #[serde(default)]
    upload_url: Option<String>,
}

/// LinkedIn API client.
#[derive(Debug, Clone)]
pub struct LinkedIn {
    api: Client,
    oauth: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    access_token: Option<String>,
    member_id: Option<String>,
}

impl LinkedIn {
    /// Creates a client for the given app. Set a token with [`LinkedIn::with_access_token`]
    /// before calling anything other than the OAuth methods.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> LinkedIn {
        LinkedIn::with_client(Client::new(), client_id, client_secret, redirect_uri)
    }

    /// Like [`LinkedIn::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(
        client: Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> LinkedIn {
        LinkedIn {
            api: client.based(API_URL),
            oauth: client.based(OAUTH_URL),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            access_token: None,
            member_id: None,
        }
    }

    /// Sets the bearer token used by everything except the OAuth calls.
    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> LinkedIn {
        self.access_token = Some(access_token.into());
        self
    }

    /// Sets the member ID [`Author::Me`] resolves to, saving a profile lookup per post.
    #[must_use]
    pub fn with_member_id(mut self, member_id: impl Into<String>) -> LinkedIn {
        self.member_id = Some(member_id.into());
        self
    }

    /// Changes the REST API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> LinkedIn {
        self.api = self.api.with_base_url(base_url);
        self
    }

    /// Changes the OAuth base URL.
    #[must_use]
    pub fn with_oauth_base_url(mut self, base_url: impl Into<String>) -> LinkedIn {
        self.oauth = self.oauth.with_base_url(base_url);
        self
    }

    /// The URL to send a member to for authorizing `scopes`.
    #[must_use]
    pub fn auth_url(&self, scopes: &[&str]) -> String {
        let scope = scopes.join(" ");
        Url::parse_with_params(
            &format!("{}authorization", self.oauth.base_url()),
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
            ],
        )
        .map(String::from)
        .unwrap_or_default()
    }

    /// Exchanges an authorization code for an access token.
    #[tracing::instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    /// Exchanges a refresh token for a new access token.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse, Error> {
        let mut form = params.to_vec();
        form.push(("client_id", self.client_id.as_str()));
        form.push(("client_secret", self.client_secret.as_str()));
        self.oauth.post("accessToken").form(&form).send_json().await
    }

    /// The authenticated member's profile.
    #[tracing::instrument(skip(self))]
    pub async fn user_profile(&self) -> Result<UserProfile, Error> {
        let raw: RawProfile = self
            .api
            .get("me")
            .bearer_auth(self.token()?)
            .query(&[(
                "projection",
                "(id,firstName,lastName,profilePicture,headline)",
            )])
            .send_json()
            .await?;
        Ok(UserProfile {
            first_name: raw.first_name.resolve(),
            last_name: raw.last_name.resolve(),
            headline: raw.headline.resolve(),
            id: raw.id,
        })
    }

    /// Company pages the member administers. Pages whose details can't be fetched are skipped.
    #[tracing::instrument(skip(self))]
    pub async fn company_pages(&self) -> Result<Vec<CompanyPage>, Error> {
        let token = self.token()?;
        let acls: Elements<OrganizationAcl> = self
            .api
            .get("organizationAcls")
            .bearer_auth(token)
            .query(&[("q", "roleAssignee"), ("role", "ADMINISTRATOR")])
            .send_json()
            .await?;

        let mut pages = Vec::with_capacity(acls.elements.len());
        for acl in acls.elements {
            let id = acl.organization_target.id().to_owned();
            let result: Result<Organization, Error> = self
                .api
                .get(&format!("organizations/{}", id))
                .bearer_auth(token)
                .send_json()
                .await;
            match result {
                Ok(org) => pages.push(CompanyPage {
                    name: org
                        .localized_name
                        .or_else(|| org.name.map(|n| n.resolve()))
                        .unwrap_or_default(),
                    description: org.description.map(|d| d.resolve()).unwrap_or_default(),
                    id,
                }),
                Err(err) => tracing::warn!(%id, %err, "skipping organization"),
            }
        }
        Ok(pages)
    }

    /// Publishes a text-only post.
    #[tracing::instrument(skip(self))]
    pub async fn create_text_post(&self, text: &str, author: &Author) -> Result<PostResponse, Error> {
        let author = self.author_urn(author).await?;
        let share = json!({
            "shareCommentary": { "text": text },
            "shareMediaCategory": "NONE",
        });
        self.ugc_post(&author, share).await
    }

    /// Registers an upload of `kind` owned by `owner`.
    #[tracing::instrument(skip(self))]
    pub async fn register_upload(&self, kind: MediaKind, owner: &Author) -> Result<UploadTicket, Error> {
        let owner = self.author_urn(owner).await?;
        self.register_upload_as(kind, &owner).await
    }

    async fn register_upload_as(&self, kind: MediaKind, owner: &Urn) -> Result<UploadTicket, Error> {
        let body = json!({
            "registerUploadRequest": {
                "recipes": [kind.recipe()],
                "owner": owner,
                "serviceRelationships": [{
                    "relationshipType": "OWNER",
                    "identifier": "urn:li:userGeneratedContent",
                }],
            }
        });

        let RegisterUploadResponse { mut value } = self
            .api
            .post("assets")
            .bearer_auth(self.token()?)
            .query(&[("action", "registerUpload")])
            .json(&body)
            .send_json()
            .await?;

        let upload_url = value
            .upload_mechanism
            .remove(UPLOAD_MECHANISM)
            .and_then(|m| m.upload_url)
            .ok_or(Error::InvalidResponse("uploadUrl"))?;
        let asset = value.asset.ok_or(Error::InvalidResponse("asset"))?;
        tracing::info!(%asset, "registered upload");
        Ok(UploadTicket { asset, upload_url })
    }

    /// PUTs the media bytes to the ticket's upload URL.
    #[tracing::instrument(skip(self, media))]
    pub async fn upload_media(&self, ticket: &UploadTicket, media: MediaFile) -> Result<(), Error> {
        media::put_raw(&self.api, &ticket.upload_url, media).await
    }

    /// Publishes a post referencing an uploaded asset.
    #[tracing::instrument(skip(self))]
    pub async fn create_media_post(
        &self,
        text: &str,
        asset: &Urn,
        kind: MediaKind,
        author: &Author,
    ) -> Result<PostResponse, Error> {
        let author = self.author_urn(author).await?;
        self.ugc_post(&author, media_share(text, asset, kind)).await
    }

    /// Register, upload, and publish an image in one go.
    pub async fn post_with_image(
        &self,
        text: &str,
        image: MediaFile,
        author: &Author,
    ) -> Result<PostResponse, Error> {
        self.post_with_media(text, image, MediaKind::Image, author)
            .await
    }

    /// Register, upload, and publish a video in one go.
    pub async fn post_with_video(
        &self,
        text: &str,
        video: MediaFile,
        author: &Author,
    ) -> Result<PostResponse, Error> {
        self.post_with_media(text, video, MediaKind::Video, author)
            .await
    }

    #[tracing::instrument(skip(self, media))]
    async fn post_with_media(
        &self,
        text: &str,
        media: MediaFile,
        kind: MediaKind,
        author: &Author,
    ) -> Result<PostResponse, Error> {
        // resolve once so `Me` costs at most one profile lookup
        let author = self.author_urn(author).await?;
        let ticket = self.register_upload_as(kind, &author).await?;
        self.upload_media(&ticket, media).await?;
        self.ugc_post(&author, media_share(text, &ticket.asset, kind))
            .await
    }

    async fn ugc_post(&self, author: &Urn, share: serde_json::Value) -> Result<PostResponse, Error> {
        let body = json!({
            "author": author,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": share,
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC",
            },
        });
        tracing::debug!(%body, "ugc post");

        let post: PostResponse = self
            .api
            .post("ugcPosts")
            .bearer_auth(self.token()?)
            .header(RESTLI_PROTOCOL_VERSION.0, RESTLI_PROTOCOL_VERSION.1)
            .json(&body)
            .send_json()
            .await?;
        tracing::info!(id = %post.id, "created post");
        Ok(post)
    }

    async fn author_urn(&self, author: &Author) -> Result<Urn, Error> {
        Ok(match author {
            Author::Person(id) => Urn(format!("urn:li:person:{}", id)),
            Author::Organization(id) => Urn(format!("urn:li:organization:{}", id)),
            Author::Me => match self.member_id.as_deref().filter(|m| !m.is_empty()) {
                Some(id) => Urn(format!("urn:li:person:{}", id)),
                None => Urn(format!("urn:li:person:{}", self.user_profile().await?.id)),
            },
        })
    }

    fn token(&self) -> Result<&str, Error> {
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingCredentials("access token"))
    }
}

fn media_share(text: &str, asset: &Urn, kind: MediaKind) -> serde_json::Value {
    json!({
        "shareCommentary": { "text": text },
        "shareMediaCategory": kind.category(),
        "media": [{
            "status": "READY",
            "description": { "text": text },
            "media": asset,
            "title": { "text": text },
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::{LinkedIn, Localized, Urn};

    #[test]
    fn urn_id_is_last_segment() {
        assert_eq!(Urn("urn:li:organization:123".into()).id(), "123");
        assert_eq!(Urn("abc".into()).id(), "abc");
    }

    #[test]
    fn localized_prefers_preferred_locale() {
        let name: Localized = serde_json::from_str(
            r#"{"localized":{"de_DE":"Hallo","en_US":"Hello"},
                "preferredLocale":{"country":"US","language":"en"}}"#,
        )
        .unwrap();
        assert_eq!(name.resolve(), "Hello");

        let name: Localized =
            serde_json::from_str(r#"{"localized":{"fr_FR":"Salut","de_DE":"Hallo"}}"#).unwrap();
        assert_eq!(name.resolve(), "Hallo");

        assert_eq!(Localized::default().resolve(), "");
    }

    #[test]
    fn auth_url_joins_scopes_with_spaces() {
        let url = LinkedIn::new("id", "secret", "https://example.com/cb")
            .auth_url(&["r_liteprofile", "w_member_social"]);
        assert!(url.starts_with("https://www.linkedin.com/oauth/v2/authorization?"));
        assert!(url.contains("scope=r_liteprofile+w_member_social"));
        assert!(url.contains("client_id=id"));
    }
}
