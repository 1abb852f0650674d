use postly::instagram::Instagram;
use postly::{Error, PollPolicy};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "17841400000000000";

fn instagram(server: &MockServer, max_attempts: u32) -> Instagram {
    Instagram::new("app-id", "app-secret", "https://example.invalid/cb")
        .with_access_token("token", USER_ID)
        .with_base_url(server.uri())
        .with_poll_policy(PollPolicy {
            interval: Duration::from_millis(5),
            max_attempts,
        })
}

async fn mount_container(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/{}/media", USER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, container: &str, status: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", container)))
        .and(query_param("fields", "status_code"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status_code": status, "id": container })),
        )
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_publish(server: &MockServer, creation_id: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/{}/media_publish", USER_ID)))
        .and(query_param("creation_id", creation_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "media-1" })))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn reel_publishes_once_processing_finishes() {
    let server = MockServer::start().await;
    mount_container(&server, "c1").await;
    Mock::given(method("GET"))
        .and(path("/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status_code": "IN_PROGRESS" })))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    mount_status(&server, "c1", "FINISHED", 1).await;
    mount_publish(&server, "c1", 1).await;

    let published = instagram(&server, 10)
        .post_reel("https://cdn.example.invalid/reel.mp4", "caption", None, true)
        .await
        .unwrap();
    assert_eq!(published.id, "media-1");

    let create = &server.received_requests().await.unwrap()[0];
    let query = create.url.query_pairs().collect::<Vec<_>>();
    assert!(query.iter().any(|(k, v)| k == "media_type" && v == "REELS"));
    assert!(query.iter().any(|(k, v)| k == "share_to_feed" && v == "true"));
    assert!(query.iter().any(|(k, _)| k == "appsecret_proof"));
    assert!(!query.iter().any(|(k, _)| k == "thumb_url"));
}

#[tokio::test]
async fn processing_error_stops_polling() {
    let server = MockServer::start().await;
    mount_container(&server, "c1").await;
    mount_status(&server, "c1", "ERROR", 1).await;
    mount_publish(&server, "c1", 0).await;

    let err = instagram(&server, 10)
        .post_reel("https://cdn.example.invalid/reel.mp4", "caption", None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MediaProcessing(body) if body.contains("ERROR")));
}

#[tokio::test]
async fn polling_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    mount_container(&server, "c1").await;
    mount_status(&server, "c1", "IN_PROGRESS", 3).await;
    mount_publish(&server, "c1", 0).await;

    let err = instagram(&server, 3)
        .post_reel("https://cdn.example.invalid/reel.mp4", "caption", None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MediaProcessingTimeout { attempts: 3 }));
}

#[tokio::test]
async fn image_follows_status_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/media", USER_ID)))
        .and(query_param("image_url", "https://cdn.example.invalid/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c2",
            "status_url": format!("{}/status/c2", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status_code": "FINISHED" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_publish(&server, "c2", 1).await;

    let published = instagram(&server, 5)
        .post_image("https://cdn.example.invalid/a.jpg", "hello")
        .await
        .unwrap();
    assert_eq!(published.id, "media-1");
}

#[tokio::test]
async fn carousel_keeps_item_order() {
    let server = MockServer::start().await;
    for (url, id) in [
        ("https://cdn.example.invalid/1.jpg", "child-1"),
        ("https://cdn.example.invalid/2.jpg", "child-2"),
    ] {
        Mock::given(method("POST"))
            .and(path(format!("/{}/media", USER_ID)))
            .and(query_param("image_url", url))
            .and(query_param("is_carousel_item", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id })))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path(format!("/{}/media", USER_ID)))
        .and(query_param("media_type", "CAROUSEL"))
        .and(query_param("children", "child-1,child-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "carousel" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_publish(&server, "carousel", 1).await;

    instagram(&server, 5)
        .post_carousel(
            &[
                "https://cdn.example.invalid/1.jpg",
                "https://cdn.example.invalid/2.jpg",
            ],
            "two pictures",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_carousel_is_rejected() {
    let server = MockServer::start().await;
    let err = instagram(&server, 5)
        .post_carousel(&[], "nothing")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyCarousel));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn publishing_needs_a_token() {
    let err = Instagram::new("app-id", "app-secret", "https://example.invalid/cb")
        .post_image("https://cdn.example.invalid/a.jpg", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingCredentials(_)));
}

#[tokio::test]
async fn api_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/media", USER_ID)))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad image_url"))
        .mount(&server)
        .await;

    let err = instagram(&server, 5)
        .post_image("not a url", "hello")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(matches!(err, Error::Api { body, .. } if body == "bad image_url"));
}

#[tokio::test]
async fn non_string_status_code_is_invalid() {
    let server = MockServer::start().await;
    mount_container(&server, "c1").await;
    Mock::given(method("GET"))
        .and(path("/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status_code": 5 })))
        .expect(1)
        .mount(&server)
        .await;
    mount_publish(&server, "c1", 0).await;

    let err = instagram(&server, 10)
        .post_reel("https://cdn.example.invalid/reel.mp4", "caption", None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse("status_code")));
}

fn metrics(pairs: &[(&str, i64)]) -> serde_json::Value {
    json!({
        "data": pairs
            .iter()
            .map(|(name, value)| json!({ "name": name, "period": "lifetime", "values": [{ "value": value }] }))
            .collect::<Vec<_>>(),
    })
}

async fn mount_media_insights(server: &MockServer, media_id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/insights", media_id)))
        .and(query_param("access_token", "token"))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_user_insights(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/insights", USER_ID)))
        .and(query_param("period", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "name": "follower_count", "values": [{ "value": 200 }, { "value": 190 }] },
                { "name": "profile_views", "values": [{ "value": 12 }] },
                { "name": "website_clicks", "values": [{ "value": 3 }] },
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn media_insights_map_by_metric_name() {
    let server = MockServer::start().await;
    mount_media_insights(
        &server,
        "m1",
        ResponseTemplate::new(200).set_body_json(metrics(&[
            ("engagement", 10),
            ("impressions", 100),
            ("reach", 80),
            ("saved", 2),
            ("video_views", 55),
        ])),
    )
    .await;

    let insights = instagram(&server, 1).media_insights("m1").await.unwrap();
    assert_eq!(insights.engagement, 10);
    assert_eq!(insights.impressions, 100);
    assert_eq!(insights.reach, 80);
    assert_eq!(insights.saved, 2);
    assert_eq!(insights.video_views, 55);
    assert_eq!(insights.likes, 0);
}

#[tokio::test]
async fn media_insights_errors_surface() {
    let server = MockServer::start().await;
    mount_media_insights(&server, "m1", ResponseTemplate::new(500).set_body_string("boom")).await;

    let err = instagram(&server, 1).media_insights("m1").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn user_insights_default_to_daily_with_follower_delta() {
    let server = MockServer::start().await;
    mount_user_insights(&server).await;

    let insights = instagram(&server, 1).user_insights("").await.unwrap();
    assert_eq!(insights.followers, 200);
    assert_eq!(insights.followers_delta, 10);
    assert_eq!(insights.profile_views, 12);
    assert_eq!(insights.website_clicks, 3);
}

#[tokio::test]
async fn engagement_report_skips_failed_insights() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/media", USER_ID)))
        .and(query_param("limit", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "m1", "media_type": "IMAGE", "timestamp": "2023-08-01T12:00:00+0000" },
                { "id": "m2", "media_type": "IMAGE", "timestamp": "2023-08-02T12:00:00+0000" },
                { "id": "m3", "media_type": "VIDEO", "timestamp": "2023-08-08T12:00:00+0000" },
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_media_insights(
        &server,
        "m1",
        ResponseTemplate::new(200).set_body_json(metrics(&[
            ("engagement", 10),
            ("impressions", 100),
            ("likes", 6),
        ])),
    )
    .await;
    mount_media_insights(&server, "m2", ResponseTemplate::new(500)).await;
    mount_media_insights(
        &server,
        "m3",
        ResponseTemplate::new(200).set_body_json(metrics(&[
            ("engagement", 20),
            ("impressions", 200),
            ("likes", 9),
        ])),
    )
    .await;
    mount_user_insights(&server).await;

    let report = instagram(&server, 1).user_engagement(7).await.unwrap();
    assert_eq!(report.posts_analyzed, 3);
    assert_eq!(report.total_engagement, 30);
    assert_eq!(report.total_impressions, 300);
    assert_eq!(report.total_likes, 15);
    assert!((report.avg_engagement - 10.0).abs() < f64::EPSILON);
    assert!((report.avg_impressions - 100.0).abs() < f64::EPSILON);
    assert_eq!(report.followers, 200);
    assert_eq!(report.followers_delta, 10);
    assert!((report.engagement_rate - 5.0).abs() < 1e-9);
    assert_eq!(report.most_engaging_day, "Tuesday");
    assert_eq!(report.engagement_trend, "Stable");
}
