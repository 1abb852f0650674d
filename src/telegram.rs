//! Telegram Bot API.

use crate::client::RequestExt;
use crate::platform::{MessageRef, Messaging};
use crate::{Client, Error};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

const API_URL: &str = "https://api.telegram.org/";

/// Kinds of media [`Telegram::send_media`] can send by URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum MediaType {
    Photo,
    Video,
    Document,
    Audio,
}

impl MediaType {
    fn method(self) -> &'static str {
        match self {
            MediaType::Photo => "sendPhoto",
            MediaType::Video => "sendVideo",
            MediaType::Document => "sendDocument",
            MediaType::Audio => "sendAudio",
        }
    }

    fn field(self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
            MediaType::Document => "document",
            MediaType::Audio => "audio",
        }
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<MediaType, Error> {
        match s {
            "photo" => Ok(MediaType::Photo),
            "video" => Ok(MediaType::Video),
            "document" => Ok(MediaType::Document),
            "audio" => Ok(MediaType::Audio),
            _ => Err(Error::UnsupportedMediaType(s.to_owned())),
        }
    }
}

/// Member count and chat details.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatStats {
    /// From `getChatMemberCount`.
    pub member_count: u64,
    /// The chat as returned by `getChat`.
    pub chat_info: Value,
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Telegram bot client.
#[derive(Debug, Clone)]
pub struct Telegram {
    client: Client,
    bot_token: String,
}

impl Telegram {
    /// Creates a client for the bot with `bot_token`.
    #[must_use]
    pub fn new(bot_token: impl Into<String>) -> Telegram {
        Telegram::with_client(Client::new(), bot_token)
    }

    /// Like [`Telegram::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(client: Client, bot_token: impl Into<String>) -> Telegram {
        let bot_token = bot_token.into();
        Telegram {
            client: bot_client(&client, API_URL, &bot_token),
            bot_token,
        }
    }

    /// Changes the API root (the part before `bot<token>/`).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Telegram {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.client = bot_client(&self.client, &base_url, &self.bot_token);
        self
    }

    /// Sends a photo, video, document, or audio file by URL.
    #[tracing::instrument(skip(self))]
    pub async fn send_media(
        &self,
        chat_id: &str,
        media_type: MediaType,
        media_url: &str,
        caption: &str,
    ) -> Result<MessageRef, Error> {
        let mut body = json!({ "chat_id": chat_id, "caption": caption });
        body[media_type.field()] = json!(media_url);
        self.send(media_type.method(), chat_id, &body).await
    }

    /// Member count and chat details.
    #[tracing::instrument(skip(self))]
    pub async fn chat_stats(&self, chat_id: &str) -> Result<ChatStats, Error> {
        let body = json!({ "chat_id": chat_id });
        let member_count = self.call("getChatMemberCount", &body).await?;
        let chat_info = self.call("getChat", &body).await?;
        Ok(ChatStats {
            member_count,
            chat_info,
        })
    }

    async fn send(&self, method: &str, chat_id: &str, body: &Value) -> Result<MessageRef, Error> {
        let SentMessage { message_id } = self.call(method, body).await?;
        let message = MessageRef::new(chat_id, message_id.to_string());
        tracing::info!(%message, "sent message");
        Ok(message)
    }

    /// Calls a bot method and unwraps `result`, turning `ok: false` into an error.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, Error> {
        let envelope: Envelope = self.client.post(method).json(body).send_json().await?;
        if !envelope.ok {
            return Err(Error::Platform {
                platform: "telegram",
                message: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".into()),
            });
        }
        let result = envelope.result.ok_or(Error::InvalidResponse("result"))?;
        Ok(serde_json::from_value(result)?)
    }
}

/// The token is part of the base URL so that request logging only ever shows method names.
fn bot_client(client: &Client, root: &str, bot_token: &str) -> Client {
    client
        .clone()
        .with_base_url(format!("{}bot{}/", root, bot_token))
}

#[async_trait]
impl Messaging for Telegram {
    #[tracing::instrument(skip(self, content))]
    async fn create_post(&self, content: &str, chat_id: &str) -> Result<MessageRef, Error> {
        self.send(
            "sendMessage",
            chat_id,
            &json!({ "chat_id": chat_id, "text": content }),
        )
        .await
    }

    #[tracing::instrument(skip(self, content))]
    async fn reply(&self, message: &MessageRef, content: &str) -> Result<MessageRef, Error> {
        let reply_to: Value = message
            .id
            .parse::<i64>()
            .map_or_else(|_| json!(message.id), |id| json!(id));
        self.send(
            "sendMessage",
            &message.channel,
            &json!({
                "chat_id": message.channel,
                "text": content,
                "reply_to_message_id": reply_to,
            }),
        )
        .await
    }

    async fn community_stats(&self, id: &str) -> Result<Value, Error> {
        Ok(serde_json::to_value(self.chat_stats(id).await?)?)
    }
}
