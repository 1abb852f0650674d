//! Client for a REST discussion service: threads and their (optionally nested) replies.
//!
//! Paths are relative to the service's base URL: `threads`, `threads/{id}`,
//! `threads/{id}/replies`, `threads/search`, and `replies/{id}`.

use crate::client::{check_status, expect_status, RequestExt};
use crate::{Client, Error};
use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A discussion thread.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A reply to a thread.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Reply {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_id: String,
    /// The reply this one is nested under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Thread service client authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct ThreadService {
    client: Client,
    token: String,
}

fn require(value: &str, field: &'static str) -> Result<(), Error> {
    if value.is_empty() {
        Err(Error::EmptyField(field))
    } else {
        Ok(())
    }
}

impl ThreadService {
    /// Creates a client for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> ThreadService {
        ThreadService::with_client(Client::new(), base_url, token)
    }

    /// Like [`ThreadService::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> ThreadService {
        ThreadService {
            client: client.with_base_url(base_url),
            token: token.into(),
        }
    }

    /// Starts a thread.
    #[tracing::instrument(skip(self, content))]
    pub async fn create_thread(
        &self,
        title: &str,
        content: &str,
        author_id: &str,
    ) -> Result<Thread, Error> {
        require(title, "title")?;
        require(content, "content")?;
        let thread: Thread = self
            .authed(self.client.post("threads"))
            .json(&json!({ "title": title, "content": content, "author_id": author_id }))
            .send_created()
            .await?;
        tracing::info!(thread_id = %thread.id, "created thread");
        Ok(thread)
    }

    /// Fetches a thread.
    #[tracing::instrument(skip(self))]
    pub async fn thread(&self, thread_id: &str) -> Result<Thread, Error> {
        require(thread_id, "thread ID")?;
        self.fetch(self.client.get(&format!("threads/{}", thread_id)))
            .await
    }

    /// Changes a thread's title, content, or both. Empty arguments are left unchanged, but at
    /// least one must be given.
    #[tracing::instrument(skip(self, content))]
    pub async fn update_thread(
        &self,
        thread_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Thread, Error> {
        require(thread_id, "thread ID")?;
        let mut body = Map::new();
        if !title.is_empty() {
            body.insert("title".into(), json!(title));
        }
        if !content.is_empty() {
            body.insert("content".into(), json!(content));
        }
        if body.is_empty() {
            return Err(Error::EmptyField("title and content"));
        }
        self.fetch(
            self.client
                .put(&format!("threads/{}", thread_id))
                .json(&Value::Object(body)),
        )
        .await
    }

    /// Deletes a thread.
    #[tracing::instrument(skip(self))]
    pub async fn delete_thread(&self, thread_id: &str) -> Result<(), Error> {
        require(thread_id, "thread ID")?;
        self.send(self.client.delete(&format!("threads/{}", thread_id)))
            .await?;
        tracing::info!(%thread_id, "deleted thread");
        Ok(())
    }

    /// Lists threads, one page at a time.
    #[tracing::instrument(skip(self))]
    pub async fn list_threads(&self, page: u32, limit: u32) -> Result<Vec<Thread>, Error> {
        self.fetch(
            self.client
                .get("threads")
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }

    /// Replies to a thread, nested under `parent_id` when given.
    #[tracing::instrument(skip(self, content))]
    pub async fn create_reply(
        &self,
        thread_id: &str,
        content: &str,
        author_id: &str,
        parent_id: Option<&str>,
    ) -> Result<Reply, Error> {
        require(thread_id, "thread ID")?;
        require(content, "content")?;
        let mut body = json!({
            "thread_id": thread_id,
            "content": content,
            "author_id": author_id,
        });
        if let Some(parent_id) = parent_id.filter(|id| !id.is_empty()) {
            body["parent_id"] = json!(parent_id);
        }

        let response = self
            .send(
                self.client
                    .post(&format!("threads/{}/replies", thread_id))
                    .json(&body),
            )
            .await?;
        let reply: Reply = expect_status(response, &[StatusCode::CREATED])
            .await?
            .json()
            .await?;
        tracing::info!(reply_id = %reply.id, "created reply");
        Ok(reply)
    }

    /// A thread's replies, one page at a time.
    #[tracing::instrument(skip(self))]
    pub async fn replies(&self, thread_id: &str, page: u32, limit: u32) -> Result<Vec<Reply>, Error> {
        require(thread_id, "thread ID")?;
        self.fetch(
            self.client
                .get(&format!("threads/{}/replies", thread_id))
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }

    /// Replaces a reply's content.
    #[tracing::instrument(skip(self, content))]
    pub async fn update_reply(&self, reply_id: &str, content: &str) -> Result<Reply, Error> {
        require(reply_id, "reply ID")?;
        require(content, "content")?;
        self.fetch(
            self.client
                .put(&format!("replies/{}", reply_id))
                .json(&json!({ "content": content })),
        )
        .await
    }

    /// Deletes a reply.
    #[tracing::instrument(skip(self))]
    pub async fn delete_reply(&self, reply_id: &str) -> Result<(), Error> {
        require(reply_id, "reply ID")?;
        self.send(self.client.delete(&format!("replies/{}", reply_id)))
            .await?;
        Ok(())
    }

    /// Searches thread titles and content.
    #[tracing::instrument(skip(self))]
    pub async fn search_threads(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Thread>, Error> {
        require(query, "search query")?;
        self.fetch(
            self.client
                .get("threads/search")
                .query(&[("q", query)])
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token).timeout(REQUEST_TIMEOUT)
    }

    /// Sends a request, mapping 404 to [`Error::NotFound`] and other failures to [`Error::Api`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        let response = self.authed(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }
        check_status(response).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        Ok(self.send(request).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::ThreadService;
    use crate::Error;

    #[tokio::test]
    async fn empty_fields_fail_before_sending() {
        // nothing listens here; reaching the network would be a request error instead
        let threads = ThreadService::new("http://127.0.0.1:9", "token");
        assert!(matches!(
            threads.create_thread("", "body", "me").await,
            Err(Error::EmptyField("title"))
        ));
        assert!(matches!(
            threads.create_thread("title", "", "me").await,
            Err(Error::EmptyField("content"))
        ));
        assert!(matches!(
            threads.update_thread("1", "", "").await,
            Err(Error::EmptyField(_))
        ));
        assert!(matches!(
            threads.create_reply("", "body", "me", None).await,
            Err(Error::EmptyField("thread ID"))
        ));
        assert!(matches!(
            threads.search_threads("", 1, 10).await,
            Err(Error::EmptyField("search query"))
        ));
    }
}
