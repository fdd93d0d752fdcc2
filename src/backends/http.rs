//! HTTP scanning service backend.
//!
//! Posts a JSON scan request to a remote content-scanning service and decodes
//! its JSON answer.
//!
//! # Wire contract
//!
//! ```text
//! POST {base_url}{scan_path}
//! {"fileURL": "...", "reportID": "...", "fileKind": "image"}
//!
//! 200 OK
//! {"verdict": "infected", "threats": ["..."], "message": "...", "detail": {...}}
//! ```

use crate::core::{ScanRequest, ScanService, ServiceResponse, TransportError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// HTTP scanning service configuration.
#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    /// Base URL of the service, without a trailing slash.
    pub base_url: String,

    /// Path of the scan endpoint.
    pub scan_path: String,

    /// Path of the health endpoint.
    pub health_path: String,

    /// Bearer token, if the service requires one.
    pub api_key: Option<SecretString>,

    /// Transport-level request timeout.
    pub timeout: Duration,

    /// Service name used in logs and as the fallback scanner version.
    pub name: String,
}

impl HttpServiceConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            scan_path: "/scan".to_string(),
            health_path: "/health".to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
            name: "remote-scanner".to_string(),
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into().into()));
        self
    }

    /// Sets the scan endpoint path.
    pub fn with_scan_path(mut self, path: impl Into<String>) -> Self {
        self.scan_path = path.into();
        self
    }

    /// Sets the health endpoint path.
    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the service name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A scanning service reached over HTTP.
///
/// # Example
///
/// ```rust,ignore
/// use scangate::backends::{HttpScanService, HttpServiceConfig};
///
/// let config = HttpServiceConfig::new("https://scanner.internal").with_api_key("token");
/// let service = HttpScanService::new(config)?;
/// ```
#[derive(Debug)]
pub struct HttpScanService {
    config: HttpServiceConfig,
    client: reqwest::Client,
}

impl HttpScanService {
    /// Creates a new HTTP scanning service with the given configuration.
    pub fn new(config: HttpServiceConfig) -> Result<Self, crate::core::ScanGateError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                crate::core::ScanGateError::configuration(format!(
                    "Failed to create HTTP client: {}",
                    e
                ))
            })?;

        Ok(Self { config, client })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpServiceConfig {
        &self.config
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::timeout(&self.config.name, self.config.timeout)
        } else {
            TransportError::connection_failed(&self.config.name, error.to_string())
        }
    }

    fn check_status(&self, status: reqwest::StatusCode) -> Result<(), TransportError> {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited {
                service: self.config.name.clone(),
                retry_after: None,
            });
        }

        if !status.is_success() {
            return Err(TransportError::Status {
                service: self.config.name.clone(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ScanService for HttpScanService {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ServiceResponse, TransportError> {
        let url = format!("{}{}", self.config.base_url, self.config.scan_path);

        let response = self
            .authorize(self.client.post(&url).json(request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.check_status(response.status())?;

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        serde_json::from_slice::<ServiceResponse>(&body)
            .map_err(|e| TransportError::malformed(&self.config.name, e.to_string()))
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let url = format!("{}{}", self.config.base_url, self.config.health_path);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.check_status(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FileKind;

    fn request() -> ScanRequest {
        ScanRequest {
            file_url: "s3://evidence/f1.png".to_string(),
            report_id: "r1".to_string(),
            file_kind: FileKind::Image,
        }
    }

    #[test]
    fn test_config_builder() {
        let config = HttpServiceConfig::new("https://scanner.internal/")
            .with_api_key("secret")
            .with_timeout(Duration::from_secs(5))
            .with_name("edge");

        assert_eq!(config.base_url, "https://scanner.internal");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.name, "edge");
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[tokio::test]
    async fn test_scan_decodes_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/scan")
            .match_header("authorization", "Bearer token-1")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "fileURL": "s3://evidence/f1.png",
                "reportID": "r1",
                "fileKind": "image"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"verdict":"infected","threats":["Eicar-Test-Signature"],"message":"found","detail":{"engine":"clam"}}"#,
            )
            .create_async()
            .await;

        let service =
            HttpScanService::new(HttpServiceConfig::new(server.url()).with_api_key("token-1"))
                .unwrap();
        let response = service.scan(&request()).await.unwrap();

        assert_eq!(response.verdict, "infected");
        assert_eq!(response.threats, vec!["Eicar-Test-Signature"]);
        assert_eq!(response.detail["engine"], "clam");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_scan_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/scan")
            .with_status(503)
            .create_async()
            .await;

        let service = HttpScanService::new(HttpServiceConfig::new(server.url())).unwrap();
        let result = service.scan(&request()).await;

        assert!(matches!(result, Err(TransportError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_scan_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/scan")
            .with_status(429)
            .create_async()
            .await;

        let service = HttpScanService::new(HttpServiceConfig::new(server.url())).unwrap();
        let result = service.scan(&request()).await;

        assert!(matches!(result, Err(TransportError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_scan_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/scan")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let service = HttpScanService::new(HttpServiceConfig::new(server.url())).unwrap();
        let result = service.scan(&request()).await;

        assert!(matches!(result, Err(TransportError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(200)
            .create_async()
            .await;

        let service = HttpScanService::new(HttpServiceConfig::new(server.url())).unwrap();
        assert!(service.health_check().await.is_ok());
    }
}
