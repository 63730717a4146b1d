//! JSON and preview requests against the filedrop server.
//!
//! [`Backend`] is the seam used by the gate, PIN and preview controllers.
//! [`HttpBackend`] implements it with `gloo-net` (window `fetch`).

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::TransportError;

/// A received HTTP response, body not yet read.
#[async_trait(?Send)]
pub trait ApiResponse {
    /// HTTP status code.
    fn status(&self) -> u16;

    /// Declared `content-type` header, if any.
    fn content_type(&self) -> Option<String>;

    /// Read the whole body as text.
    async fn text(&self) -> Result<String, TransportError>;

    /// Whether the status is 2xx.
    fn ok(&self) -> bool {
        (200..300).contains(&self.status())
    }
}

/// HTTP client used by the controllers.
#[async_trait(?Send)]
pub trait Backend {
    type Response: ApiResponse;

    /// `GET url`, same-origin credentials.
    async fn get(&self, url: &str) -> Result<Self::Response, TransportError>;

    /// `POST url` with a JSON body.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Self::Response, TransportError>;
}

/// Error body returned by the server on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

/// Parse a response body as JSON, `None` when it cannot be read or parsed.
pub async fn read_json<T: DeserializeOwned>(response: &impl ApiResponse) -> Option<T> {
    let text = response.text().await.ok()?;
    serde_json::from_str(&text).ok()
}

/// Server-provided `error` text, or `fallback`.
pub async fn error_message(response: &impl ApiResponse, fallback: &str) -> String {
    read_json::<ErrorBody>(response)
        .await
        .and_then(|body| body.error)
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// [`Backend`] over the browser's `fetch`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpBackend;

#[async_trait(?Send)]
impl ApiResponse for Response {
    fn status(&self) -> u16 {
        Response::status(self)
    }

    fn content_type(&self) -> Option<String> {
        self.headers().get("content-type")
    }

    async fn text(&self) -> Result<String, TransportError> {
        Response::text(self)
            .await
            .map_err(|e| TransportError::Body(e.to_string()))
    }
}

#[async_trait(?Send)]
impl Backend for HttpBackend {
    type Response = Response;

    async fn get(&self, url: &str) -> Result<Response, TransportError> {
        Request::get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Response, TransportError> {
        let request = Request::post(url)
            .json(body)
            .map_err(|e| TransportError::Request(e.to_string()))?;

        request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))
    }
}
