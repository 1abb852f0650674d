//! Slack Web API: posting, threading, and conversation stats.

use crate::client::RequestExt;
use crate::platform::{MessageRef, Messaging};
use crate::{Client, Error};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const API_URL: &str = "https://slack.com/api/";

/// A message and its thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageStats {
    /// The message as returned by `conversations.history`.
    pub message: Value,
    /// Thread replies, not including the parent message.
    pub thread_replies: Vec<Value>,
}

impl MessageStats {
    /// Number of replies in the thread.
    #[must_use]
    pub fn thread_reply_count(&self) -> usize {
        self.thread_replies.len()
    }
}

/// Channel info plus member count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelStats {
    /// The channel as returned by `conversations.info`.
    pub channel_info: Value,
    /// Members on the first page of `conversations.members`. `None` if the bot can't list
    /// members.
    pub member_count: Option<usize>,
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct Posted {
    ts: String,
    channel: Option<String>,
}

#[derive(Deserialize)]
struct Messages {
    #[serde(default)]
    messages: Vec<Value>,
}

#[derive(Deserialize)]
struct ChannelInfo {
    channel: Value,
}

#[derive(Deserialize)]
struct Members {
    #[serde(default)]
    members: Vec<String>,
}

/// Slack client authenticated with a bot token.
#[derive(Debug, Clone)]
pub struct Slack {
    client: Client,
    bot_token: String,
}

impl Slack {
    /// Creates a client using `bot_token` (`xoxb-...`).
    #[must_use]
    pub fn new(bot_token: impl Into<String>) -> Slack {
        Slack::with_client(Client::new(), bot_token)
    }

    /// Like [`Slack::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(client: Client, bot_token: impl Into<String>) -> Slack {
        Slack {
            client: client.based(API_URL),
            bot_token: bot_token.into(),
        }
    }

    /// Changes the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Slack {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Fetches a message and its thread replies.
    #[tracing::instrument(skip(self))]
    pub async fn message_stats(&self, message: &MessageRef) -> Result<MessageStats, Error> {
        let Messages { messages } = self
            .call(self.client.get("conversations.history").query(&[
                ("channel", message.channel.as_str()),
                ("latest", message.id.as_str()),
                ("limit", "1"),
                ("inclusive", "true"),
            ]))
            .await?;
        let message_json = messages
            .into_iter()
            .next()
            .ok_or(Error::InvalidResponse("messages"))?;

        let replies: Result<Messages, Error> = self
            .call(self.client.get("conversations.replies").query(&[
                ("channel", message.channel.as_str()),
                ("ts", message.id.as_str()),
            ]))
            .await;
        let thread_replies = match replies {
            // the parent message comes first
            Ok(Messages { messages }) => messages.into_iter().skip(1).collect(),
            Err(err) => {
                tracing::warn!(%err, "thread replies unavailable");
                Vec::new()
            }
        };

        Ok(MessageStats {
            message: message_json,
            thread_replies,
        })
    }

    /// Channel info and member count.
    #[tracing::instrument(skip(self))]
    pub async fn channel_stats(&self, channel: &str) -> Result<ChannelStats, Error> {
        let ChannelInfo { channel: info } = self
            .call(self.client.get("conversations.info").query(&[("channel", channel)]))
            .await?;
        let members: Result<Members, Error> = self
            .call(self.client.get("conversations.members").query(&[("channel", channel)]))
            .await;
        let member_count = match members {
            Ok(Members { members }) => Some(members.len()),
            Err(err) => {
                tracing::warn!(%err, "member list unavailable");
                None
            }
        };
        Ok(ChannelStats {
            channel_info: info,
            member_count,
        })
    }

    async fn post_message(&self, body: Value, channel: &str) -> Result<MessageRef, Error> {
        let posted: Posted = self
            .call(self.client.post("chat.postMessage").json(&body))
            .await?;
        let message = MessageRef::new(posted.channel.as_deref().unwrap_or(channel), posted.ts);
        tracing::info!(%message, "posted message");
        Ok(message)
    }

    /// Sends a request and checks Slack's `ok` flag before decoding.
    async fn call<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, Error> {
        let body = request
            .bearer_auth(&self.bot_token)
            .send_checked()
            .await?
            .text()
            .await?;
        let envelope: Envelope = serde_json::from_str(&body)?;
        if !envelope.ok {
            return Err(Error::Platform {
                platform: "slack",
                message: envelope.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Messaging for Slack {
    #[tracing::instrument(skip(self, content))]
    async fn create_post(&self, content: &str, channel: &str) -> Result<MessageRef, Error> {
        self.post_message(json!({ "channel": channel, "text": content }), channel)
            .await
    }

    /// Posts `content` in the thread under `message`.
    #[tracing::instrument(skip(self, content))]
    async fn reply(&self, message: &MessageRef, content: &str) -> Result<MessageRef, Error> {
        self.post_message(
            json!({
                "channel": message.channel,
                "text": content,
                "thread_ts": message.id,
            }),
            &message.channel,
        )
        .await
    }

    async fn community_stats(&self, id: &str) -> Result<Value, Error> {
        Ok(serde_json::to_value(self.channel_stats(id).await?)?)
    }
}
