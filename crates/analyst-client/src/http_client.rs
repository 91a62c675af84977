use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use analyst_types::{
    AdminSessionInfo, ChatRequest, ChatResponse, CleanupResponse, DocumentInfo, ErrorBody,
    HealthResponse, ServiceInfo, SessionInfo, StatusResponse,
};

use crate::{ApiClient, ClientError, Result};

/// HTTP client for a remote Business Analyst backend
pub struct HttpApiClient {
    base_url: String,
    ws_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = normalize_base(base_url, &["http", "https"])?;
        let ws_url = derive_ws_url(&base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url,
            ws_url,
            client,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the WebSocket base URL (defaults to the API URL with a ws scheme).
    pub fn with_ws_url(mut self, ws_url: &str) -> Result<Self> {
        self.ws_url = normalize_base(ws_url, &["ws", "wss"])?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut request = self.client.post(self.url(path)).timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    fn name(&self) -> &'static str {
        "http"
    }

    fn websocket_url(&self, session_id: &str) -> Option<String> {
        Some(format!(
            "{}/ws/chat/{}",
            self.ws_url,
            urlencoding::encode(session_id)
        ))
    }

    async fn health_check(&self) -> Result<HealthResponse> {
        self.get_json("/health").await
    }

    async fn service_info(&self) -> Result<ServiceInfo> {
        self.get_json("/").await
    }

    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        tracing::debug!(
            session_id = request.session_id.as_deref().unwrap_or(""),
            "sending chat turn"
        );
        self.post_json("/api/chat", Some(&request)).await
    }

    async fn session_info(&self, session_id: &str) -> Result<SessionInfo> {
        self.get_json(&format!("/api/session/{}", urlencoding::encode(session_id)))
            .await
    }

    async fn reset_session(&self, session_id: &str) -> Result<StatusResponse> {
        self.post_json::<(), _>(
            &format!("/api/session/{}/reset", urlencoding::encode(session_id)),
            None,
        )
        .await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        self.get_json("/api/documents").await
    }

    async fn download_document(&self, filename: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url(&format!(
                "/api/documents/{}",
                urlencoding::encode(filename)
            )))
            .header(ACCEPT, "*/*")
            .timeout(self.timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn delete_document(&self, filename: &str) -> Result<StatusResponse> {
        let response = self
            .client
            .delete(self.url(&format!(
                "/api/documents/{}",
                urlencoding::encode(filename)
            )))
            .timeout(self.timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<StatusResponse>().await?)
    }

    async fn list_admin_sessions(&self) -> Result<Vec<AdminSessionInfo>> {
        self.get_json("/api/admin/sessions").await
    }

    async fn cleanup_sessions(&self) -> Result<CleanupResponse> {
        self.post_json::<(), _>("/api/admin/cleanup", None).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        });

    tracing::error!(status = status.as_u16(), url = %url, message = %message, "API request failed");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

fn normalize_base(raw: &str, schemes: &[&str]) -> Result<String> {
    let parsed = Url::parse(raw.trim())?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(ClientError::InvalidUrl(format!(
            "URL must use one of {:?}, got: {}",
            schemes,
            parsed.scheme()
        )));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn derive_ws_url(base_url: &str) -> String {
    if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_follows_api_scheme() {
        let client = HttpApiClient::new("https://ba.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://ba.example.com");
        assert_eq!(
            client.websocket_url("s 1").as_deref(),
            Some("wss://ba.example.com/ws/chat/s%201")
        );

        let client = HttpApiClient::new("http://localhost:8000").unwrap();
        assert_eq!(
            client.websocket_url("abc").as_deref(),
            Some("ws://localhost:8000/ws/chat/abc")
        );
    }

    #[test]
    fn test_ws_url_override() {
        let client = HttpApiClient::new("http://localhost:8000")
            .unwrap()
            .with_ws_url("ws://realtime:9000/")
            .unwrap();
        assert_eq!(
            client.websocket_url("abc").as_deref(),
            Some("ws://realtime:9000/ws/chat/abc")
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(matches!(
            HttpApiClient::new("ftp://example.com"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(HttpApiClient::new("not a url").is_err());
        assert!(HttpApiClient::new("http://localhost")
            .unwrap()
            .with_ws_url("http://localhost")
            .is_err());
    }

    #[tokio::test]
    async fn test_api_error_uses_detail_field() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"LLM provider unavailable"}"#)
            .create_async()
            .await;

        let client = HttpApiClient::new(&server.url()).unwrap();
        let err = client
            .send_chat(ChatRequest::new("hi", None))
            .await
            .unwrap_err();

        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "LLM provider unavailable");
            }
            other => panic!("Expected API error, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/documents/missing.docx")
            .with_status(404)
            .with_body("not here")
            .create_async()
            .await;

        let client = HttpApiClient::new(&server.url()).unwrap();
        let err = client.download_document("missing.docx").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("not here"));
    }

    #[tokio::test]
    async fn test_chat_request_carries_json_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"ok","session_id":"s1","progress":0.2,"document_ready":false}"#)
            .create_async()
            .await;

        let client = HttpApiClient::new(&server.url()).unwrap();
        let response = client
            .send_chat(ChatRequest::new("hi", Some("s1".to_string())))
            .await
            .unwrap();
        assert_eq!(response.session_id, "s1");
        assert_eq!(response.progress, 0.2);
        mock.assert_async().await;
    }
}
