//! Authenticated HTTP transport
//!
//! The node never composes credentials itself. It hands a [`JsonRequest`] and
//! a credential profile name to an [`AuthenticatedHttpClient`], which injects
//! whatever authentication the profile describes.

use crate::error::TransportError;
use crate::CREDENTIAL_NAME;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Header carrying the API key for the conversion service
pub const API_KEY_HEADER: &str = "CLIENT-API-KEY";

/// JSON POST request handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl JsonRequest {
    /// Request with `Accept` and `Content-Type` set to `application/json`
    pub fn new(url: Url, body: Value) -> Self {
        Self {
            url,
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }
}

/// Transport capability supplied by the host
#[async_trait]
pub trait AuthenticatedHttpClient: Send + Sync {
    /// POST `request` using the credential profile `credential`
    ///
    /// Returns the decoded JSON response body. Any failure, including a
    /// non-2xx status, is a [`TransportError`].
    async fn post(&self, credential: &str, request: JsonRequest) -> Result<Value, TransportError>;
}

/// How a credential profile authenticates requests
#[derive(Clone)]
pub enum Credential {
    /// Static key sent in a request header
    ApiKey { header: String, key: String },
}

impl Credential {
    /// API key in the conversion service's header
    pub fn api_key(key: impl Into<String>) -> Self {
        Credential::ApiKey {
            header: API_KEY_HEADER.to_string(),
            key: key.into(),
        }
    }

    fn apply(&self, headers: &mut HeaderMap) -> Result<(), TransportError> {
        match self {
            Credential::ApiKey { header, key } => {
                let name = HeaderName::from_bytes(header.as_bytes())
                    .map_err(|_| TransportError::new(format!("Invalid credential header: {header}")))?;
                let mut value = HeaderValue::from_str(key)
                    .map_err(|_| TransportError::new("Invalid API key: not a valid header value"))?;
                value.set_sensitive(true);
                headers.insert(name, value);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .field("key", &"<redacted>")
                .finish(),
        }
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug, Clone, Default)]
pub struct HttpClientBuilder {
    credentials: HashMap<String, Credential>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    /// Register a credential profile
    pub fn credential(mut self, name: impl Into<String>, credential: Credential) -> Self {
        self.credentials.insert(name.into(), credential);
        self
    }

    /// Register the conversion API key under the node's credential profile
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.credential(CREDENTIAL_NAME, Credential::api_key(key))
    }

    /// Client-side deadline for each call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// User-Agent of the HTTP client itself (not the rendered page)
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, TransportError> {
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .as_deref()
            .unwrap_or(crate::CLIENT_USER_AGENT);
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|_| TransportError::new("Invalid User-Agent: not a valid header value"))?;
        headers.insert(USER_AGENT, user_agent);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder
            .build()
            .map_err(|e| TransportError::new(format!("Failed to create HTTP client: {e}")))?;

        Ok(HttpClient {
            inner,
            credentials: self.credentials,
        })
    }
}

/// [`AuthenticatedHttpClient`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    credentials: HashMap<String, Credential>,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }
}

#[async_trait]
impl AuthenticatedHttpClient for HttpClient {
    async fn post(&self, credential: &str, request: JsonRequest) -> Result<Value, TransportError> {
        let profile = self
            .credentials
            .get(credential)
            .ok_or_else(|| TransportError::new(format!("Credentials not found: {credential}")))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::new(format!("Invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::new(format!("Invalid value for header {name}")))?;
            headers.insert(name, value);
        }
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        profile.apply(&mut headers)?;

        tracing::debug!(url = %request.url, credential, "POST");

        let response = self
            .inner
            .post(request.url)
            .headers(headers)
            .json(&request.body)
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        response.json::<Value>().await.map_err(|e| {
            TransportError::new(format!("Failed to decode response body as JSON: {e}"))
        })
    }
}

/// Error for a non-2xx response, using the API's own message when it sends one
fn status_error(status: u16, body: &str) -> TransportError {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["message", "error", "detail"]
            .iter()
            .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
    });

    match detail {
        Some(detail) => {
            TransportError::new(format!("Request failed with status code {status}: {detail}"))
        }
        None => TransportError::new(format!("Request failed with status code {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_with_api_message() {
        let err = status_error(401, r#"{"message":"Invalid API key"}"#);
        assert_eq!(
            err.to_string(),
            "Request failed with status code 401: Invalid API key"
        );

        let err = status_error(422, r#"{"error":"url is required"}"#);
        assert_eq!(
            err.to_string(),
            "Request failed with status code 422: url is required"
        );
    }

    #[test]
    fn test_status_error_without_api_message() {
        assert_eq!(
            status_error(502, "<html>Bad Gateway</html>").to_string(),
            "Request failed with status code 502"
        );
        assert_eq!(
            status_error(500, r#"{"code":17}"#).to_string(),
            "Request failed with status code 500"
        );
    }

    #[test]
    fn test_json_request_headers() {
        let url = Url::parse("https://pdfmunk.com/api/v1/url-to-html").unwrap();
        let req = JsonRequest::new(url, Value::Null);
        assert!(req
            .headers
            .contains(&("Accept".to_string(), "application/json".to_string())));
        assert!(req
            .headers
            .contains(&("Content-Type".to_string(), "application/json".to_string())));
    }

    #[test]
    fn test_credential_debug_redacts_key() {
        let debug = format!("{:?}", Credential::api_key("secret-key"));
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains(API_KEY_HEADER));
    }

    #[test]
    fn test_credential_apply() {
        let mut headers = HeaderMap::new();
        Credential::api_key("k").apply(&mut headers).unwrap();
        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "k");

        let bad = Credential::api_key("line\nbreak");
        assert!(bad.apply(&mut HeaderMap::new()).is_err());
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        let err = HttpClient::builder()
            .user_agent("bad\nagent")
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid User-Agent: not a valid header value"
        );
        assert!(HttpClient::builder().user_agent("Custom/1.0").build().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_credential_profile() {
        let client = HttpClient::builder().build().unwrap();
        let url = Url::parse("http://127.0.0.1:9/url-to-html").unwrap();
        let err = client
            .post("missing", JsonRequest::new(url, Value::Null))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Credentials not found: missing");
    }
}
