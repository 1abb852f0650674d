//! WhatsApp Business Cloud API, served from the Graph API (v17.0).

use crate::client::RequestExt;
use crate::platform::{MessageRef, Messaging};
use crate::{Client, Error};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;

const GRAPH_URL: &str = "https://graph.facebook.com/v17.0/";

/// Kinds of media [`WhatsApp::send_media`] can send by URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum MediaType {
    Image,
    Audio,
    Document,
    Video,
}

impl MediaType {
    fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Audio => "audio",
            MediaType::Document => "document",
            MediaType::Video => "video",
        }
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<MediaType, Error> {
        match s {
            "image" => Ok(MediaType::Image),
            "audio" => Ok(MediaType::Audio),
            "document" => Ok(MediaType::Document),
            "video" => Ok(MediaType::Video),
            _ => Err(Error::UnsupportedMediaType(s.to_owned())),
        }
    }
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Deserialize)]
struct SentMessage {
    id: String,
}

/// WhatsApp client sending from one business phone number.
#[derive(Debug, Clone)]
pub struct WhatsApp {
    client: Client,
    access_token: String,
    phone_number_id: String,
}

impl WhatsApp {
    /// Creates a client that sends from `phone_number_id`.
    #[must_use]
    pub fn new(access_token: impl Into<String>, phone_number_id: impl Into<String>) -> WhatsApp {
        WhatsApp::with_client(Client::new(), access_token, phone_number_id)
    }

    /// Like [`WhatsApp::new`], reusing an existing [`Client`].
    #[must_use]
    pub fn with_client(
        client: Client,
        access_token: impl Into<String>,
        phone_number_id: impl Into<String>,
    ) -> WhatsApp {
        WhatsApp {
            client: client.based(GRAPH_URL),
            access_token: access_token.into(),
            phone_number_id: phone_number_id.into(),
        }
    }

    /// Changes the Graph API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> WhatsApp {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Sends an image, audio clip, document, or video by URL.
    #[tracing::instrument(skip(self))]
    pub async fn send_media(
        &self,
        recipient: &str,
        media_type: MediaType,
        media_url: &str,
    ) -> Result<MessageRef, Error> {
        let mut body = envelope(recipient, media_type.as_str());
        body[media_type.as_str()] = json!({ "link": media_url });
        self.send(recipient, &body).await
    }

    /// Insights for a WhatsApp Business Account, as raw JSON.
    #[tracing::instrument(skip(self))]
    pub async fn account_insights(&self, waba_id: &str) -> Result<Value, Error> {
        self.client
            .get(&format!("{}/insights", waba_id))
            .bearer_auth(&self.access_token)
            .send_json()
            .await
    }

    async fn send(&self, recipient: &str, body: &Value) -> Result<MessageRef, Error> {
        let SendResponse { messages } = self
            .client
            .post(&format!("{}/messages", self.phone_number_id))
            .bearer_auth(&self.access_token)
            .json(body)
            .send_json()
            .await?;
        let id = messages
            .into_iter()
            .next()
            .ok_or(Error::InvalidResponse("messages"))?
            .id;
        let message = MessageRef::new(recipient, id);
        tracing::info!(%message, "sent message");
        Ok(message)
    }
}

fn envelope(recipient: &str, kind: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": recipient,
        "type": kind,
    })
}

#[async_trait]
impl Messaging for WhatsApp {
    /// Sends a text message to the phone number `recipient`.
    #[tracing::instrument(skip(self, content))]
    async fn create_post(&self, content: &str, recipient: &str) -> Result<MessageRef, Error> {
        let mut body = envelope(recipient, "text");
        body["text"] = json!({ "body": content });
        self.send(recipient, &body).await
    }

    /// Sends a text message quoting `message`. The reference's channel is the recipient's phone
    /// number.
    #[tracing::instrument(skip(self, content))]
    async fn reply(&self, message: &MessageRef, content: &str) -> Result<MessageRef, Error> {
        let mut body = envelope(&message.channel, "text");
        body["text"] = json!({ "body": content });
        body["context"] = json!({ "message_id": message.id });
        self.send(&message.channel, &body).await
    }

    async fn community_stats(&self, id: &str) -> Result<Value, Error> {
        self.account_insights(id).await
    }
}
