use postly::google::{GoogleOAuth, Token};
use postly::linkedin::LinkedIn;
use postly::pinterest::PinterestOAuth;
use postly::Error;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn google(server: &MockServer) -> GoogleOAuth {
    GoogleOAuth::new("gid", "gsecret", "https://example.invalid/cb", &[])
        .with_oauth_base_url(server.uri())
        .with_api_base_url(server.uri())
}

#[tokio::test]
async fn google_exchange_sets_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2F0Ab"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.a",
            "token_type": "Bearer",
            "expires_in": 3599,
            "refresh_token": "1//r",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = google(&server).exchange_code("4/0Ab").await.unwrap();
    assert_eq!(token.access_token, "ya29.a");
    assert!(token.expiry.is_some());
    assert!(!token.is_expired());
}

#[tokio::test]
async fn google_refresh_keeps_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.b",
            "token_type": "Bearer",
            "expires_in": 3599,
        })))
        .mount(&server)
        .await;

    let token = google(&server).refresh_token("1//r").await.unwrap();
    assert_eq!(token.refresh_token.as_deref(), Some("1//r"));
}

#[tokio::test]
async fn google_user_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/v2/userinfo"))
        .and(header("authorization", "Bearer ya29.a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1",
            "email": "ada@example.invalid",
            "verified_email": true,
            "name": "Ada",
        })))
        .mount(&server)
        .await;

    let token = Token {
        access_token: "ya29.a".into(),
        ..Token::default()
    };
    let user = google(&server).user_info(&token).await.unwrap();
    assert_eq!(user.email, "ada@example.invalid");
    assert!(user.verified_email);
}

#[tokio::test]
async fn google_rejected_id_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .and(query_param("id_token", "good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "aud": "gid", "sub": "1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .and(query_param("id_token", "bad"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_token" })))
        .mount(&server)
        .await;

    let oauth = google(&server);
    let claims = oauth.verify_id_token("good").await.unwrap();
    assert_eq!(claims["sub"], "1");
    assert!(matches!(oauth.verify_id_token("bad").await, Err(Error::InvalidIdToken)));
}

#[tokio::test]
async fn pinterest_exchange_uses_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        // base64("pid:psecret")
        .and(header("authorization", "Basic cGlkOnBzZWNyZXQ="))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "pina_x",
            "refresh_token": "pinr_x",
            "expires_in": 2_592_000,
            "scope": "pins:read",
        })))
        .mount(&server)
        .await;

    let oauth = PinterestOAuth::new("pid", "psecret", "https://example.invalid/cb")
        .with_base_url(server.uri());
    let url = oauth.auth_url("st", &["boards:read", "pins:read"]);
    assert!(url.starts_with("https://www.pinterest.com/oauth/?client_id=pid"));
    assert!(url.contains("scope=boards%3Aread%2Cpins%3Aread"));

    let token = oauth.exchange_code("c0de").await.unwrap();
    assert_eq!(token.access_token, "pina_x");
    assert_eq!(token.expires_in, Some(2_592_000));
}

#[tokio::test]
async fn linkedin_token_exchange_posts_a_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accessToken"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("client_secret=lsecret"))
        .and(body_string_contains("code=AQT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AQV",
            "expires_in": 5_184_000,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = LinkedIn::new("lid", "lsecret", "https://example.invalid/cb")
        .with_oauth_base_url(server.uri())
        .exchange_code("AQT")
        .await
        .unwrap();
    assert_eq!(token.access_token, "AQV");
}
