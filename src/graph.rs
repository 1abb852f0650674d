//! Pieces shared by the Facebook and Instagram Graph API clients.

use crate::client::RequestExt;
use crate::Error;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;

/// Access token plus optional app secret, rendered as Graph API query parameters.
#[derive(Debug, Clone)]
pub(crate) struct GraphAuth {
    pub(crate) access_token: String,
    pub(crate) app_secret: Option<String>,
}

impl GraphAuth {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("access_token", self.access_token.clone())];
        if let Some(secret) = self.app_secret.as_deref().filter(|s| !s.is_empty()) {
            query.push(("appsecret_proof", appsecret_proof(secret, &self.access_token)));
        }
        query
    }
}

/// `hex(HMAC-SHA256(key = app secret, message = access token))`.
pub(crate) fn appsecret_proof(app_secret: &str, access_token: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()).unwrap();
    mac.update(access_token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// The `{"data": [{"name", "period", "values": [{"value"}]}]}` shape of insights responses.
#[derive(Debug, Deserialize)]
pub(crate) struct InsightsData {
    #[serde(default)]
    pub(crate) data: Vec<InsightMetric>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsightMetric {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) values: Vec<InsightValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsightValue {
    #[serde(default)]
    pub(crate) value: serde_json::Value,
}

impl InsightMetric {
    /// The `n`th value as an integer. Non-numeric values (breakdown objects) read as `None`.
    pub(crate) fn int(&self, n: usize) -> Option<i64> {
        self.values.get(n).and_then(|v| v.value.as_i64())
    }
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<GraphError>,
}

/// Sends a Graph API request and decodes the body, treating an `error` object in a success
/// response as a failure.
pub(crate) async fn send_graph<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, Error> {
    let body = request.send_checked().await?.text().await?;
    if let Ok(ErrorEnvelope { error: Some(error) }) = serde_json::from_str(&body) {
        return Err(Error::Platform {
            platform: "facebook",
            message: error.message,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::{appsecret_proof, GraphAuth, InsightsData};

    #[test]
    fn proof_is_hmac_sha256_hex() {
        // RFC 4231, test case 2
        assert_eq!(
            appsecret_proof("Jefe", "what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn auth_query_adds_proof_only_with_secret() {
        let auth = GraphAuth {
            access_token: "tok".into(),
            app_secret: None,
        };
        assert_eq!(auth.query(), vec![("access_token", "tok".to_owned())]);

        let auth = GraphAuth {
            access_token: "tok".into(),
            app_secret: Some("sec".into()),
        };
        let query = auth.query();
        assert_eq!(query.len(), 2);
        assert_eq!(query[1].0, "appsecret_proof");
        assert_eq!(query[1].1, appsecret_proof("sec", "tok"));
    }

    #[test]
    fn insight_values_read_as_ints() {
        let data: InsightsData = serde_json::from_str(
            r#"{"data":[
                {"name":"reach","period":"day","values":[{"value":12},{"value":10}]},
                {"name":"breakdown","values":[{"value":{"a":1}}]},
                {"name":"empty","values":[]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(data.data[0].int(0), Some(12));
        assert_eq!(data.data[0].int(1), Some(10));
        assert_eq!(data.data[1].int(0), None);
        assert_eq!(data.data[2].int(0), None);
    }
}
