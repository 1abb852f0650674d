use postly::slack::Slack;
use postly::telegram::{MediaType, Telegram};
use postly::whatsapp::WhatsApp;
use postly::{Error, MessageRef, Messaging};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn slack_replies_in_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(header("authorization", "Bearer xoxb-test"))
        .and(body_partial_json(json!({ "channel": "C1", "thread_ts": "1700.0001" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "channel": "C1", "ts": "1700.0002",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let slack = Slack::new("xoxb-test").with_base_url(server.uri());
    let reply = slack
        .reply(&MessageRef::new("C1", "1700.0001"), "on it")
        .await
        .unwrap();
    assert_eq!(reply, MessageRef::new("C1", "1700.0002"));
}

#[tokio::test]
async fn slack_not_ok_is_a_platform_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "error": "channel_not_found" })),
        )
        .mount(&server)
        .await;

    let err = Slack::new("xoxb-test")
        .with_base_url(server.uri())
        .create_post("hello", "C404")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Platform { platform: "slack", message } if message == "channel_not_found"
    ));
}

#[tokio::test]
async fn slack_message_stats_skip_the_parent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .and(query_param("latest", "1.1"))
        .and(query_param("inclusive", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "messages": [{ "ts": "1.1", "text": "parent" }],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/conversations.replies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "messages": [{ "ts": "1.1" }, { "ts": "1.2" }, { "ts": "1.3" }],
        })))
        .mount(&server)
        .await;

    let stats = Slack::new("xoxb-test")
        .with_base_url(server.uri())
        .message_stats(&MessageRef::new("C1", "1.1"))
        .await
        .unwrap();
    assert_eq!(stats.message["text"], "parent");
    assert_eq!(stats.thread_reply_count(), 2);
}

#[tokio::test]
async fn slack_channel_stats_survive_missing_member_scope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "channel": { "id": "C1", "name": "general" },
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/conversations.members"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "error": "missing_scope" })),
        )
        .mount(&server)
        .await;

    let stats: Value = Slack::new("xoxb-test")
        .with_base_url(server.uri())
        .community_stats("C1")
        .await
        .unwrap();
    assert_eq!(stats["channel_info"]["name"], "general");
    assert_eq!(stats["member_count"], Value::Null);
}

#[tokio::test]
async fn telegram_token_is_part_of_the_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_partial_json(json!({ "chat_id": "-100", "reply_to_message_id": 41 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "result": { "message_id": 42 },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let telegram = Telegram::new("123:abc").with_base_url(server.uri());
    let sent = telegram
        .reply(&MessageRef::new("-100", "41"), "pong")
        .await
        .unwrap();
    assert_eq!(sent, MessageRef::new("-100", "42"));
}

#[tokio::test]
async fn telegram_media_and_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendPhoto"))
        .and(body_partial_json(json!({ "photo": "https://cdn.example.invalid/cat.jpg" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false, "description": "Bad Request: chat not found",
        })))
        .mount(&server)
        .await;

    let err = Telegram::new("123:abc")
        .with_base_url(server.uri())
        .send_media("-1", MediaType::Photo, "https://cdn.example.invalid/cat.jpg", "cat")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Platform { platform: "telegram", .. }));
}

#[tokio::test]
async fn whatsapp_reply_quotes_the_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/555/messages"))
        .and(header("authorization", "Bearer wa-token"))
        .and(body_partial_json(json!({
            "messaging_product": "whatsapp",
            "to": "15550001111",
            "type": "text",
            "text": { "body": "thanks" },
            "context": { "message_id": "wamid.1" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": "wamid.2" }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let whatsapp = WhatsApp::new("wa-token", "555").with_base_url(server.uri());
    let sent = whatsapp
        .reply(&MessageRef::new("15550001111", "wamid.1"), "thanks")
        .await
        .unwrap();
    assert_eq!(sent.id, "wamid.2");
}

#[tokio::test]
async fn whatsapp_media_uses_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/555/messages"))
        .and(body_partial_json(json!({
            "type": "document",
            "document": { "link": "https://cdn.example.invalid/a.pdf" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })))
        .mount(&server)
        .await;

    let err = WhatsApp::new("wa-token", "555")
        .with_base_url(server.uri())
        .send_media(
            "15550001111",
            "document".parse().unwrap(),
            "https://cdn.example.invalid/a.pdf",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse("messages")));
}

#[tokio::test]
async fn telegram_chat_stats_combine_two_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getChatMemberCount"))
        .and(body_partial_json(json!({ "chat_id": "-100" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": 314 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getChat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "result": { "id": -100, "title": "crabs", "type": "supergroup" },
        })))
        .mount(&server)
        .await;

    let telegram = Telegram::new("123:abc").with_base_url(server.uri());
    let stats = telegram.chat_stats("-100").await.unwrap();
    assert_eq!(stats.member_count, 314);
    assert_eq!(stats.chat_info["title"], "crabs");

    let stats = telegram.community_stats("-100").await.unwrap();
    assert_eq!(stats["member_count"], 314);
}

#[tokio::test]
async fn telegram_http_errors_carry_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getChatMemberCount"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let err = Telegram::new("123:abc")
        .with_base_url(server.uri())
        .chat_stats("-100")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { status: 401, body } if body == "Unauthorized"));
}
