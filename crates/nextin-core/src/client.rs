//! HTTP client for the remote analysis service
//!
//! Requires the `client` feature. Requests are sent once with a fixed
//! timeout; nothing is retried.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use std::time::Duration;
use thiserror::Error;

use crate::types::{AnalysisResult, Loose};

pub const DEFAULT_API_URL: &str = "https://website-analyzer-backend.onrender.com";
/// Analyses are slow; the service is given a full minute
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid analysis service URL '{0}'")]
    BaseUrl(String),
    #[error("the analysis service did not answer within {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("{0}")]
    Rejected(String),
    #[error("analysis service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response from the analysis service: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// One entry of `GET /api/recent`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentAnalysis {
    #[serde(default)]
    pub id: Loose,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub overall_score: Loose,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, JsonValue>,
}

impl ServiceHealth {
    /// A missing status counts as healthy; the endpoint answered.
    pub fn is_healthy(&self) -> bool {
        match self.status.as_deref().map(str::to_ascii_lowercase) {
            None => true,
            Some(status) => matches!(status.as_str(), "ok" | "healthy" | "up" | "pass"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    analysis: Option<AnalysisResult>,
    #[serde(default)]
    error: Option<String>,
}

pub struct AnalyzerClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AnalyzerClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        match url::Url::parse(&base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(ApiError::BaseUrl(config.base_url)),
        }

        let http = reqwest::Client::builder()
            .user_agent(format!("nextin-core/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http,
            base_url,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit `url` for analysis and wait for the finished report
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult, ApiError> {
        let response: AnalyzeResponse = self
            .request(Method::POST, "/api/analyze", Some(json!({ "url": url })))
            .await?;
        match response {
            AnalyzeResponse {
                success: true,
                analysis: Some(analysis),
                ..
            } => Ok(analysis),
            AnalyzeResponse { error, .. } => Err(ApiError::Rejected(
                error.unwrap_or_else(|| "Analysis failed".to_string()),
            )),
        }
    }

    /// Fetch a stored analysis by id
    pub async fn analysis(&self, id: &str) -> Result<AnalysisResult, ApiError> {
        let id: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
        let mut body: JsonValue = self
            .request(Method::GET, &format!("/api/analysis/{id}"), None)
            .await?;
        reject_unsuccessful(&body)?;

        let wrapped = ["analysis", "data"]
            .into_iter()
            .find_map(|key| body.get_mut(key).filter(|v| v.is_object()).map(JsonValue::take));
        let payload = wrapped.unwrap_or(body);
        serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Recently analyzed sites, newest first as the service orders them
    pub async fn recent(&self) -> Result<Vec<RecentAnalysis>, ApiError> {
        let mut body: JsonValue = self.request(Method::GET, "/api/recent", None).await?;
        reject_unsuccessful(&body)?;

        let list = if body.is_array() {
            body
        } else {
            ["data", "analyses", "recent"]
                .into_iter()
                .find_map(|key| body.get_mut(key).filter(|v| v.is_array()).map(JsonValue::take))
                .unwrap_or_else(|| JsonValue::Array(Vec::new()))
        };
        serde_json::from_value(list).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn health(&self) -> Result<ServiceHealth, ApiError> {
        self.request(Method::GET, "/api/health", None).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
    ) -> Result<T, ApiError> {
        tracing::info!(%method, path, "api request");
        let mut request = self.http.request(method.clone(), self.endpoint(path));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(%method, path, error = %e, "network error");
            self.transport_error(e)
        })?;
        let status = response.status();
        tracing::info!(status = status.as_u16(), path, "api response");

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), path, "api error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Network(err)
        }
    }
}

fn reject_unsuccessful(body: &JsonValue) -> Result<(), ApiError> {
    if body.get("success").and_then(JsonValue::as_bool) == Some(false) {
        let message = body
            .get("error")
            .and_then(JsonValue::as_str)
            .unwrap_or("request failed");
        return Err(ApiError::Rejected(message.to_string()));
    }
    Ok(())
}

/// Prefer the service's own `error` field over the status reason
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(JsonValue::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ListSection;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server) -> AnalyzerClient {
        AnalyzerClient::new(ClientConfig {
            base_url: server.url(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn analyze_returns_the_analysis() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .match_body(Matcher::Json(json!({"url": "https://example.com"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "analysis": {
                        "overall_score": 7.5,
                        "key_insights": ["Fast pages"]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let analysis = client_for(&server)
            .analyze("https://example.com")
            .await
            .unwrap();
        assert_eq!(analysis.overall_score.as_f64(), Some(7.5));
        assert_eq!(analysis.list(ListSection::KeyInsights), vec!["Fast pages"]);
    }

    #[tokio::test]
    async fn unsuccessful_analysis_is_rejected_with_service_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_body(r#"{"success": false, "error": "Site unreachable"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .analyze("https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Site unreachable"));
    }

    #[tokio::test]
    async fn missing_analysis_falls_back_to_generic_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .analyze("https://example.com")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Analysis failed");
    }

    #[tokio::test]
    async fn error_status_surfaces_json_error_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(500)
            .with_body(r#"{"error": "Scraper crashed"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .analyze("https://example.com")
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Scraper crashed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn recent_accepts_wrapped_lists() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/recent")
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "data": [
                        {"id": 3, "url": "https://a.example", "overall_score": 8, "created_at": "2024-05-01T10:00:00Z"},
                        {"id": "b7", "url": "https://b.example"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let recent = client_for(&server).recent().await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id.as_text().as_deref(), Some("3"));
        assert_eq!(recent[0].overall_score.as_f64(), Some(8.0));
        assert_eq!(recent[1].overall_score.as_f64(), None);
    }

    #[tokio::test]
    async fn stored_analysis_is_unwrapped() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/analysis/42")
            .with_status(200)
            .with_body(r#"{"success": true, "analysis": {"overall_score": "6"}}"#)
            .create_async()
            .await;

        let analysis = client_for(&server).analysis("42").await.unwrap();
        assert_eq!(analysis.overall_score.as_f64(), Some(6.0));
    }

    #[tokio::test]
    async fn health_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/health")
            .with_status(200)
            .with_body(r#"{"status": "OK", "uptime": 12}"#)
            .create_async()
            .await;

        let health = client_for(&server).health().await.unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.details.get("uptime"), Some(&json!(12)));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let client = AnalyzerClient::new(ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)));
    }

    #[test]
    fn rejects_non_http_base_urls() {
        let config = ClientConfig {
            base_url: "ftp://example.com".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(AnalyzerClient::new(config), Err(ApiError::BaseUrl(_))));
    }
}
