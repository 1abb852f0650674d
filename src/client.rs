use crate::Error;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

macro_rules! request_impl {
    ($($f:ident),* $(,)*) => {
        $(
            #[inline]
            pub(crate) fn $f(&self, path: &str) -> RequestBuilder {
                tracing::info!(path, concat!("Client::", stringify!($f)));
                self.client.$f(format!("{}{}", self.base_url, path))
            }
        )*
    };
}

/// HTTP client shared by every platform wrapper.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) base_url: Cow<'static, str>,
    pub(crate) client: reqwest::Client,
}

impl Client {
    /// Creates a new `Client` with no base URL, a `postly` user agent and a 30 second request
    /// timeout.
    #[must_use]
    #[allow(clippy::missing_panics_doc)] // tested to not panic
    pub fn new() -> Client {
        const USER_AGENT: &str = concat!("postly/", env!("CARGO_PKG_VERSION"));

        Client::from_reqwest(
            reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap(),
        )
    }

    /// Wraps an existing [`reqwest::Client`], e.g. to share a connection pool with the rest of an
    /// application.
    #[must_use]
    pub fn from_reqwest(client: reqwest::Client) -> Client {
        Client {
            base_url: Cow::Borrowed(""),
            client,
        }
    }

    /// Returns this client with a different base URL. A trailing slash is added if missing.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Client {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = Cow::Owned(base_url);
        self
    }

    pub(crate) fn based(&self, base_url: &'static str) -> Client {
        Client {
            base_url: Cow::Borrowed(base_url),
            client: self.client.clone(),
        }
    }

    /// The base URL request paths are appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[inline]
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::info!(%method, path, "Client::request");
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    /// Request against a full URL handed out by the server (status URLs, signed upload URLs).
    #[inline]
    pub(crate) fn absolute(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::info!(%method, "Client::absolute");
        self.client.request(method, url)
    }

    request_impl!(delete, get, patch, post, put);
}

impl Default for Client {
    fn default() -> Client {
        Client::new()
    }
}

/// Sending helpers that turn non-success statuses into [`Error::Api`] with the body attached.
pub(crate) trait RequestExt {
    async fn send_checked(self) -> Result<Response, Error>;

    async fn send_json<T: DeserializeOwned>(self) -> Result<T, Error>;

    /// Like [`RequestExt::send_json`], for endpoints that answer `201 Created` and nothing else.
    async fn send_created<T: DeserializeOwned>(self) -> Result<T, Error>;

    /// Sends the request and fails with [`Error::Api`] unless the status is one of `accepted`.
    async fn send_expecting(self, accepted: &[StatusCode]) -> Result<Response, Error>;
}

impl RequestExt for RequestBuilder {
    async fn send_checked(self) -> Result<Response, Error> {
        check_status(self.send().await?).await
    }

    async fn send_json<T: DeserializeOwned>(self) -> Result<T, Error> {
        Ok(self.send_checked().await?.json().await?)
    }

    async fn send_created<T: DeserializeOwned>(self) -> Result<T, Error> {
        Ok(self
            .send_expecting(&[StatusCode::CREATED])
            .await?
            .json()
            .await?)
    }

    async fn send_expecting(self, accepted: &[StatusCode]) -> Result<Response, Error> {
        expect_status(self.send().await?, accepted).await
    }
}

/// Like [`check_status`], but only the statuses in `accepted` count as success.
pub(crate) async fn expect_status(
    response: Response,
    accepted: &[StatusCode],
) -> Result<Response, Error> {
    let response = check_status(response).await?;
    let status = response.status();
    if accepted.contains(&status) {
        return Ok(response);
    }
    tracing::warn!(%status, "unexpected success status");
    Err(Error::Api {
        status: status.as_u16(),
        body: response.text().await.unwrap_or_default(),
    })
}

pub(crate) async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, "request failed");
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}
