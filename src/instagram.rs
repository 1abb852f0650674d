//! Instagram Graph API (v17.0): OAuth, publishing through media containers, and insights.

use crate::client::RequestExt;
use crate::graph::{GraphAuth, InsightsData};
use crate::media::{self, PollPolicy};
use crate::{Client, Error};
use chrono::{DateTime, Datelike, FixedOffset, Weekday};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const GRAPH_URL: &str = "https://graph.facebook.com/v17.0/";
const OAUTH_URL: &str = "https://api.instagram.com/";
const AUTHORIZE_URL: &str = "https://api.instagram.com/oauth/authorize";
const SCOPES: &str =
    "user_profile,user_media,instagram_graph_user_profile,instagram_graph_user_media";
const MEDIA_INSIGHT_METRICS: &str =
    "engagement,impressions,reach,saved,video_views,likes,comments,shares";
const USER_INSIGHT_METRICS: &str = "follower_count,profile_views,reach,impressions,website_clicks";

/// Instagram API client.
#[derive(Debug, Clone)]
pub struct Instagram {
    graph: Client,
    oauth: Client,
    app_id: String,
    app_secret: String,
    redirect_uri: String,
    access_token: Option<String>,
    user_id: Option<String>,
    poll: PollPolicy,
}

/// OAuth token response.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,
    /// The Instagram user the token belongs to. Only present on code exchange.
    #[serde(default)]
    pub user_id: Option<u64>,
    /// Seconds until the token expires.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Usually `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
}

/// A media container or a published media object.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct MediaResponse {
    /// Container ID before publishing, media ID after.
    pub id: String,
    /// Where to check processing status, if the API handed one out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_url: Option<String>,
}

/// Engagement metrics for one media object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct MediaInsights {
    pub engagement: i64,
    pub impressions: i64,
    pub reach: i64,
    pub saved: i64,
    pub video_views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub stories_replies: i64,
}

/// Account level metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct UserInsights {
    /// Latest `follower_count` value.
    pub followers: i64,
    /// Latest `follower_count` value minus the one before it.
    pub followers_delta: i64,
    pub profile_views: i64,
    pub reach: i64,
    pub impressions: i64,
    pub website_clicks: i64,
}

/// Aggregated engagement over the account's recent media.
///
/// `total_*` fields sum the per-media insights, `avg_*` fields divide them by `posts_analyzed`.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct EngagementReport {
    pub period_days: u32,
    pub posts_analyzed: usize,
    pub followers: i64,
    pub followers_delta: i64,
    pub profile_views: i64,
    pub total_engagement: i64,
    pub total_impressions: i64,
    pub total_reach: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_saved: i64,
    pub avg_engagement: f64,
    pub avg_impressions: f64,
    pub avg_reach: f64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    /// Average engagement per post as a percentage of followers.
    pub engagement_rate: f64,
    /// Weekday with the most posts, or `"Unknown"`.
    pub most_engaging_day: String,
    /// `"Not enough data"` below three posts.
    pub engagement_trend: String,
}

#[derive(Debug, Deserialize)]
struct RecentMedia {
    #[serde(default)]
    data: Vec<RecentMediaItem>,
}

#[derive(Debug, Deserialize)]
struct RecentMediaItem {
    id: String,
    #[serde(default)]
    timestamp: String,
}

impl Instagram {
    /// Creates a client for the given Facebook app. Call [`Instagram::with_access_token`] before
    /// anything other than the OAuth calls.
    #[must_use]
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Instagram {
        Instagram::with_client(Client::new(), app_id, app_secret, redirect_uri)
    }

    /// Like [`Instagram::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(
        client: Client,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Instagram {
        Instagram {
            graph: client.based(GRAPH_URL),
            oauth: client.based(OAUTH_URL),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            redirect_uri: redirect_uri.into(),
            access_token: None,
            user_id: None,
            poll: PollPolicy::default(),
        }
    }

    /// Sets the access token and Instagram user ID used by authenticated calls.
    #[must_use]
    pub fn with_access_token(
        mut self,
        access_token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Instagram {
        self.access_token = Some(access_token.into());
        self.user_id = Some(user_id.into());
        self
    }

    /// Changes the Graph API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Instagram {
        self.graph = self.graph.with_base_url(base_url);
        self
    }

    /// Changes the base URL used for the OAuth code exchange.
    #[must_use]
    pub fn with_oauth_base_url(mut self, base_url: impl Into<String>) -> Instagram {
        self.oauth = self.oauth.with_base_url(base_url);
        self
    }

    /// Changes how media containers are polled while processing.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Instagram {
        self.poll = poll;
        self
    }

    /// The URL to send a user to for authorizing this app.
    #[must_use]
    pub fn auth_url(&self) -> String {
        Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.app_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", SCOPES),
                ("response_type", "code"),
            ],
        )
        .map(String::from)
        .unwrap_or_default()
    }

    /// Exchanges an authorization code for a short-lived access token.
    #[tracing::instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let token: TokenResponse = self
            .oauth
            .post("oauth/access_token")
            .form(&[
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
            ])
            .send_json()
            .await?;
        tracing::info!(user_id = ?token.user_id, "exchanged code");
        Ok(token)
    }

    /// Exchanges the configured short-lived token for a long-lived one.
    #[tracing::instrument(skip(self))]
    pub async fn long_lived_token(&self) -> Result<TokenResponse, Error> {
        let access_token = self.token()?;
        self.graph
            .get("access_token")
            .query(&[
                ("grant_type", "ig_exchange_token"),
                ("client_secret", self.app_secret.as_str()),
                ("access_token", access_token),
            ])
            .send_json()
            .await
    }

    /// Refreshes the configured long-lived token.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<TokenResponse, Error> {
        let access_token = self.token()?;
        self.graph
            .get("refresh_access_token")
            .query(&[
                ("grant_type", "ig_refresh_token"),
                ("access_token", access_token),
            ])
            .send_json()
            .await
    }

    /// Publishes a single image from a public URL.
    #[tracing::instrument(skip(self))]
    pub async fn post_image(&self, image_url: &str, caption: &str) -> Result<MediaResponse, Error> {
        let container = self
            .create_container(&[("image_url", image_url), ("caption", caption)])
            .await?;
        if let Some(status_url) = container.status_url.as_deref().filter(|u| !u.is_empty()) {
            self.wait_for_media_processing(status_url).await?;
        }
        self.publish(&container.id).await
    }

    /// Publishes a reel from a public video URL, waiting for Instagram to finish processing the
    /// video first.
    #[tracing::instrument(skip(self))]
    pub async fn post_reel(
        &self,
        video_url: &str,
        caption: &str,
        cover_url: Option<&str>,
        share_to_feed: bool,
    ) -> Result<MediaResponse, Error> {
        let mut params = vec![
            ("media_type", "REELS"),
            ("video_url", video_url),
            ("caption", caption),
        ];
        if let Some(cover_url) = cover_url.filter(|u| !u.is_empty()) {
            params.push(("thumb_url", cover_url));
        }
        if share_to_feed {
            params.push(("share_to_feed", "true"));
        }

        let container = self.create_container(&params).await?;
        self.wait_for_container(&container, true).await?;
        self.publish(&container.id).await
    }

    /// Publishes a carousel. URLs ending in `.mp4` become video items, everything else an image.
    /// Items keep their input order.
    #[tracing::instrument(skip(self))]
    pub async fn post_carousel(
        &self,
        media_urls: &[&str],
        caption: &str,
    ) -> Result<MediaResponse, Error> {
        if media_urls.is_empty() {
            return Err(Error::EmptyCarousel);
        }

        let mut children = Vec::with_capacity(media_urls.len());
        for url in media_urls.iter().copied() {
            let is_video = url.to_lowercase().ends_with(".mp4");
            let (media_type, param) = if is_video {
                ("VIDEO", "video_url")
            } else {
                ("IMAGE", "image_url")
            };
            let child = self
                .create_container(&[
                    ("media_type", media_type),
                    (param, url),
                    ("is_carousel_item", "true"),
                ])
                .await?;
            self.wait_for_container(&child, is_video).await?;
            children.push(child.id);
        }

        let children = children.join(",");
        let carousel = self
            .create_container(&[
                ("media_type", "CAROUSEL"),
                ("caption", caption),
                ("children", &children),
            ])
            .await?;
        self.publish(&carousel.id).await
    }

    /// Polls `status_url` until processing finishes, fails, or the poll policy runs out.
    #[tracing::instrument(skip(self))]
    pub async fn wait_for_media_processing(&self, status_url: &str) -> Result<(), Error> {
        media::wait_for_status_url(&self.graph, self.poll, status_url).await
    }

    /// Engagement metrics for one media object.
    #[tracing::instrument(skip(self))]
    pub async fn media_insights(&self, media_id: &str) -> Result<MediaInsights, Error> {
        let auth = self.auth()?;
        let data: InsightsData = self
            .graph
            .get(&format!("{}/insights", media_id))
            .query(&[("metric", MEDIA_INSIGHT_METRICS)])
            .query(&auth.query())
            .send_json()
            .await?;

        let mut insights = MediaInsights::default();
        for metric in &data.data {
            let Some(value) = metric.int(0) else { continue };
            let field = match metric.name.as_str() {
                "engagement" => &mut insights.engagement,
                "impressions" => &mut insights.impressions,
                "reach" => &mut insights.reach,
                "saved" => &mut insights.saved,
                "video_views" => &mut insights.video_views,
                "likes" => &mut insights.likes,
                "comments" => &mut insights.comments,
                "shares" => &mut insights.shares,
                "stories_replies" => &mut insights.stories_replies,
                _ => continue,
            };
            *field = value;
        }
        Ok(insights)
    }

    /// Account metrics over `period` (`day`, `week`, `days_28`...). An empty period means `day`.
    #[tracing::instrument(skip(self))]
    pub async fn user_insights(&self, period: &str) -> Result<UserInsights, Error> {
        let auth = self.auth()?;
        let user_id = self.user()?;
        let period = if period.is_empty() { "day" } else { period };

        let data: InsightsData = self
            .graph
            .get(&format!("{}/insights", user_id))
            .query(&[("metric", USER_INSIGHT_METRICS), ("period", period)])
            .query(&auth.query())
            .send_json()
            .await?;

        let mut insights = UserInsights::default();
        for metric in &data.data {
            let Some(value) = metric.int(0) else { continue };
            match metric.name.as_str() {
                "follower_count" => {
                    insights.followers = value;
                    if let Some(previous) = metric.int(1) {
                        insights.followers_delta = value - previous;
                    }
                }
                "profile_views" => insights.profile_views = value,
                "reach" => insights.reach = value,
                "impressions" => insights.impressions = value,
                "website_clicks" => insights.website_clicks = value,
                _ => {}
            }
        }
        Ok(insights)
    }

    /// Builds an [`EngagementReport`] over the most recent `days` media objects (30 when zero).
    ///
    /// Media whose insights can't be fetched are left out of the totals but still counted, and a
    /// failed account insights call reads as zero followers.
    #[tracing::instrument(skip(self))]
    #[allow(clippy::cast_precision_loss)]
    pub async fn user_engagement(&self, days: u32) -> Result<EngagementReport, Error> {
        let auth = self.auth()?;
        let user_id = self.user()?;
        let days = if days == 0 { 30 } else { days };

        let recent: RecentMedia = self
            .graph
            .get(&format!("{}/media", user_id))
            .query(&[
                ("fields", "id,media_type,timestamp".to_owned()),
                ("limit", days.to_string()),
            ])
            .query(&auth.query())
            .send_json()
            .await?;

        let insights = futures::future::join_all(
            recent
                .data
                .iter()
                .map(|item| self.media_insights(&item.id)),
        )
        .await;

        let mut report = EngagementReport {
            period_days: days,
            posts_analyzed: recent.data.len(),
            ..EngagementReport::default()
        };
        for (item, result) in recent.data.iter().zip(insights) {
            match result {
                Ok(insights) => {
                    report.total_engagement += insights.engagement;
                    report.total_impressions += insights.impressions;
                    report.total_reach += insights.reach;
                    report.total_likes += insights.likes;
                    report.total_comments += insights.comments;
                    report.total_saved += insights.saved;
                }
                Err(err) => tracing::warn!(media_id = %item.id, %err, "skipping media insights"),
            }
        }

        let user = match self.user_insights("day").await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(%err, "user insights unavailable");
                UserInsights::default()
            }
        };
        report.followers = user.followers;
        report.followers_delta = user.followers_delta;
        report.profile_views = user.profile_views;

        if report.posts_analyzed > 0 {
            let count = report.posts_analyzed as f64;
            report.avg_engagement = report.total_engagement as f64 / count;
            report.avg_impressions = report.total_impressions as f64 / count;
            report.avg_reach = report.total_reach as f64 / count;
            report.avg_likes = report.total_likes as f64 / count;
            report.avg_comments = report.total_comments as f64 / count;
            if report.followers > 0 {
                report.engagement_rate = report.avg_engagement / report.followers as f64 * 100.0;
            }
        }

        let timestamps = recent
            .data
            .iter()
            .map(|item| item.timestamp.as_str())
            .collect::<Vec<_>>();
        report.most_engaging_day = most_engaging_day(&timestamps);
        report.engagement_trend = if timestamps.len() < 3 {
            "Not enough data".into()
        } else {
            "Stable".into()
        };
        Ok(report)
    }

    async fn create_container(&self, params: &[(&str, &str)]) -> Result<MediaResponse, Error> {
        let auth = self.auth()?;
        let container: MediaResponse = self
            .graph
            .post(&format!("{}/media", self.user()?))
            .query(params)
            .query(&auth.query())
            .send_json()
            .await?;
        tracing::info!(container_id = %container.id, "created media container");
        Ok(container)
    }

    /// Waits on the status URL when there is one; video containers without one are polled
    /// directly.
    async fn wait_for_container(&self, container: &MediaResponse, is_video: bool) -> Result<(), Error> {
        if let Some(status_url) = container.status_url.as_deref().filter(|u| !u.is_empty()) {
            return self.wait_for_media_processing(status_url).await;
        }
        if is_video {
            let auth = self.auth()?.query();
            return media::wait_for_processing(self.poll, || {
                self.graph
                    .get(&container.id)
                    .query(&[("fields", "status_code")])
                    .query(&auth)
            })
            .await;
        }
        Ok(())
    }

    async fn publish(&self, creation_id: &str) -> Result<MediaResponse, Error> {
        let auth = self.auth()?;
        let published: MediaResponse = self
            .graph
            .post(&format!("{}/media_publish", self.user()?))
            .query(&[("creation_id", creation_id)])
            .query(&auth.query())
            .send_json()
            .await?;
        tracing::info!(media_id = %published.id, "published media");
        Ok(published)
    }

    fn token(&self) -> Result<&str, Error> {
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingCredentials("access token"))
    }

    fn user(&self) -> Result<&str, Error> {
        self.user_id
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(Error::MissingCredentials("user ID"))
    }

    fn auth(&self) -> Result<GraphAuth, Error> {
        Ok(GraphAuth {
            access_token: self.token()?.to_owned(),
            app_secret: Some(self.app_secret.clone()),
        })
    }
}

/// The weekday most of the timestamps fall on. Ties go to the earlier day of the week.
fn most_engaging_day(timestamps: &[&str]) -> String {
    let mut counts: HashMap<Weekday, usize> = HashMap::new();
    for timestamp in timestamps {
        if let Some(parsed) = parse_timestamp(timestamp) {
            *counts.entry(parsed.weekday()).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(a_day, a), (b_day, b)| {
            a.cmp(b).then_with(|| {
                b_day
                    .num_days_from_monday()
                    .cmp(&a_day.num_days_from_monday())
            })
        })
        .map_or_else(|| "Unknown".to_owned(), |(day, _)| weekday_name(day).to_owned())
}

/// Graph API timestamps look like `2023-08-01T12:34:56+0000`, which isn't quite RFC 3339.
fn parse_timestamp(timestamp: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(timestamp))
        .ok()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
