use postly::threads::ThreadService;
use postly::Error;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer) -> ThreadService {
    ThreadService::new(server.uri(), "svc-token")
}

#[tokio::test]
async fn create_thread_expects_created() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .and(header("authorization", "Bearer svc-token"))
        .and(body_json(json!({ "title": "Hello", "content": "First!", "author_id": "u1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t1",
            "title": "Hello",
            "content": "First!",
            "author_id": "u1",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let thread = service(&server)
        .create_thread("Hello", "First!", "u1")
        .await
        .unwrap();
    assert_eq!(thread.id, "t1");
    assert!(thread.created_at.is_some());
}

#[tokio::test]
async fn create_thread_rejects_plain_ok() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "t1" })))
        .mount(&server)
        .await;

    let err = service(&server)
        .create_thread("Hello", "First!", "u1")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn missing_thread_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/threads/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/replies/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let threads = service(&server);
    assert!(matches!(threads.thread("nope").await, Err(Error::NotFound)));
    assert!(matches!(threads.delete_reply("nope").await, Err(Error::NotFound)));
}

#[tokio::test]
async fn update_sends_only_non_empty_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/threads/t1"))
        .and(body_json(json!({ "content": "edited" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "t1", "content": "edited" })))
        .expect(1)
        .mount(&server)
        .await;

    let thread = service(&server).update_thread("t1", "", "edited").await.unwrap();
    assert_eq!(thread.content, "edited");
}

#[tokio::test]
async fn nested_replies_carry_parent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads/t1/replies"))
        .and(body_json(json!({
            "thread_id": "t1",
            "content": "agreed",
            "author_id": "u2",
            "parent_id": "r1",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "r2", "thread_id": "t1", "content": "agreed", "parent_id": "r1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = service(&server)
        .create_reply("t1", "agreed", "u2", Some("r1"))
        .await
        .unwrap();
    assert_eq!(reply.parent_id.as_deref(), Some("r1"));
}

#[tokio::test]
async fn listing_and_search_paginate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/threads/search"))
        .and(query_param("q", "rust"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "t9", "title": "Rust" }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/t1/replies"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "r1", "content": "a" },
            { "id": "r2", "content": "b", "parent_id": "r1" },
        ])))
        .mount(&server)
        .await;

    let threads = service(&server);
    let found = threads.search_threads("rust", 2, 5).await.unwrap();
    assert_eq!(found[0].id, "t9");
    let replies = threads.replies("t1", 1, 20).await.unwrap();
    assert_eq!(replies.len(), 2);
    assert!(replies[0].parent_id.is_none());
}

#[tokio::test]
async fn reply_needs_created_and_an_existing_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads/t1/replies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "r1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/gone/replies"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let service = service(&server);
    let err = service
        .create_reply("t1", "hi", "u1", None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(200));
    let err = service
        .create_reply("gone", "hi", "u1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound));
}
