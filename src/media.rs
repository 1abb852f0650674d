//! Media upload sources and the container processing poll loop.

use crate::client::RequestExt;
use crate::{Client, Error};
use bytes::Bytes;
use reqwest::multipart::Part;
use reqwest::{Body, Method, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// A file to upload, either held in memory or streamed from disk.
#[derive(Debug)]
pub struct MediaFile {
    stream: Body,
    filename: String,
    content_type: String,
    content_length: u64,
}

impl MediaFile {
    /// Create a `MediaFile` from a buffer.
    ///
    /// # Panics
    ///
    /// Panics if the length of `content` overflows a [`u64`].
    pub fn new(
        content: impl Into<Bytes>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> MediaFile {
        let content: Bytes = content.into();
        MediaFile {
            content_length: content.len().try_into().unwrap(),
            stream: content.into(),
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Create a `MediaFile` from a file on disk. The file is streamed, not read into memory.
    #[cfg(feature = "fs")]
    pub async fn from_path(
        path: impl AsRef<std::path::Path>,
        content_type: impl Into<String>,
    ) -> Result<MediaFile, std::io::Error> {
        use tokio::fs::File;
        use tokio_util::codec::{BytesCodec, FramedRead};

        let filename = path
            .as_ref()
            .file_name()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("file")
            .to_owned();

        let file = File::open(path).await?;
        let content_length = file.metadata().await?.len();
        let stream = Body::wrap_stream(FramedRead::new(file, BytesCodec::new()));

        Ok(MediaFile {
            stream,
            filename,
            content_type: content_type.into(),
            content_length,
        })
    }

    /// The filename sent with multipart uploads.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The MIME type of the content.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The length of the content in bytes.
    #[must_use]
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub(crate) fn into_part(self) -> Result<Part, Error> {
        Ok(Part::stream_with_length(self.stream, self.content_length)
            .file_name(self.filename)
            .mime_str(&self.content_type)?)
    }

    pub(crate) fn into_body(self) -> (Body, String, u64) {
        (self.stream, self.content_type, self.content_length)
    }
}

/// How often and how many times to check a media container before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before each status check.
    pub interval: Duration,
    /// Number of status checks before [`Error::MediaProcessingTimeout`].
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    /// Two seconds between checks, thirty checks: one minute in total.
    fn default() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Processing state reported for a media container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ContainerStatus {
    /// `FINISHED`: ready to publish.
    Finished,
    /// `ERROR`: processing failed.
    Error,
    /// `IN_PROGRESS`.
    InProgress,
    /// `EXPIRED`: the container was not published within 24 hours.
    Expired,
    /// `PUBLISHED`.
    Published,
    /// Anything else.
    Other(String),
}

impl From<String> for ContainerStatus {
    fn from(s: String) -> ContainerStatus {
        match s.as_str() {
            "FINISHED" => ContainerStatus::Finished,
            "ERROR" => ContainerStatus::Error,
            "IN_PROGRESS" => ContainerStatus::InProgress,
            "EXPIRED" => ContainerStatus::Expired,
            "PUBLISHED" => ContainerStatus::Published,
            _ => ContainerStatus::Other(s),
        }
    }
}

#[derive(Deserialize)]
struct StatusResponse {
    status_code: Option<serde_json::Value>,
}

impl StatusResponse {
    /// `None` unless `status_code` is a string.
    fn status(&self) -> Option<ContainerStatus> {
        match &self.status_code {
            Some(serde_json::Value::String(s)) => Some(ContainerStatus::from(s.clone())),
            _ => None,
        }
    }
}

/// Checks `request` until the reported `status_code` is `FINISHED` or `ERROR`.
///
/// Each attempt sleeps for `policy.interval` first. Only `FINISHED` and `ERROR` end the loop
/// early; every other status counts as still processing.
pub(crate) async fn wait_for_processing<F>(policy: PollPolicy, request: F) -> Result<(), Error>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        let body = request().send_checked().await?.text().await?;
        let status: StatusResponse = serde_json::from_str(&body)?;
        match status.status() {
            Some(ContainerStatus::Finished) => {
                tracing::info!(attempt, "media processing finished");
                return Ok(());
            }
            Some(ContainerStatus::Error) => return Err(Error::MediaProcessing(body)),
            Some(status) => tracing::debug!(attempt, ?status, "media still processing"),
            None => return Err(Error::InvalidResponse("status_code")),
        }
    }

    Err(Error::MediaProcessingTimeout {
        attempts: policy.max_attempts,
    })
}

/// Polls a server-provided status URL.
pub(crate) async fn wait_for_status_url(
    client: &Client,
    policy: PollPolicy,
    status_url: &str,
) -> Result<(), Error> {
    wait_for_processing(policy, || client.absolute(Method::GET, status_url)).await
}

/// PUTs the raw bytes of `media` to a signed upload URL. 200, 201 and 204 count as success.
pub(crate) async fn put_raw(client: &Client, upload_url: &str, media: MediaFile) -> Result<(), Error> {
    let (body, content_type, content_length) = media.into_body();
    client
        .absolute(Method::PUT, upload_url)
        .header(reqwest::header::CONTENT_TYPE, content_type)
        .header(reqwest::header::CONTENT_LENGTH, content_length)
        .body(body)
        .send_expecting(&[StatusCode::OK, StatusCode::CREATED, StatusCode::NO_CONTENT])
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ContainerStatus, MediaFile, PollPolicy, StatusResponse};
    use std::time::Duration;

    #[test]
    fn default_policy_is_one_minute() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 30);
        assert_eq!(
            policy.interval * policy.max_attempts,
            Duration::from_secs(60)
        );
    }

    #[test]
    fn status_codes_decode() {
        let status: StatusResponse =
            serde_json::from_str(r#"{"status_code":"IN_PROGRESS","id":"1"}"#).unwrap();
        assert_eq!(status.status(), Some(ContainerStatus::InProgress));
        let status: StatusResponse = serde_json::from_str(r#"{"status_code":"WAT"}"#).unwrap();
        assert_eq!(status.status(), Some(ContainerStatus::Other("WAT".into())));
        let status: StatusResponse = serde_json::from_str(r#"{"id":"1"}"#).unwrap();
        assert_eq!(status.status(), None);
        let status: StatusResponse = serde_json::from_str(r#"{"status_code":5}"#).unwrap();
        assert_eq!(status.status(), None);
    }

    #[test]
    fn media_file_from_buffer() {
        let media = MediaFile::new(&b"abcd"[..], "a.png", "image/png");
        assert_eq!(media.content_length(), 4);
        assert_eq!(media.filename(), "a.png");
        assert_eq!(media.content_type(), "image/png");
    }
}
