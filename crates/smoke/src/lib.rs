// Smoke test probes for the deployed demo application
//
// Two checks, each a single GET with a 5 second timeout:
// - /health must answer 200 with body "OK"
// - / must answer 200 with a body containing "Hello World"

use std::time::Duration;

use thiserror::Error;

/// Base URL used when none is given
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a check failed
#[derive(Debug, Error)]
pub enum SmokeError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Expected status 200, got {0}")]
    UnexpectedStatus(u16),

    #[error("Unexpected response body: {0:?}")]
    UnexpectedBody(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Outcome of one named check
#[derive(Debug)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub result: Result<(), SmokeError>,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// HTTP prober bound to one deployment's base URL
#[derive(Debug, Clone)]
pub struct SmokeClient {
    http: reqwest::Client,
    base_url: String,
}

impl SmokeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SmokeError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /health, expecting 200 and "OK" (surrounding whitespace ignored)
    pub async fn check_health(&self) -> Result<(), SmokeError> {
        let body = self.get_ok(&format!("{}/health", self.base_url)).await?;
        if body.trim() != "OK" {
            return Err(SmokeError::UnexpectedBody(body.trim().to_string()));
        }
        Ok(())
    }

    /// GET /, expecting 200 and a body containing "Hello World"
    pub async fn check_root(&self) -> Result<(), SmokeError> {
        let body = self.get_ok(&format!("{}/", self.base_url)).await?;
        if !body.contains("Hello World") {
            return Err(SmokeError::UnexpectedBody(body));
        }
        Ok(())
    }

    /// Run every check in order; a failing check does not stop the rest
    pub async fn run_all(&self) -> Vec<CheckOutcome> {
        vec![
            CheckOutcome {
                name: "Health Endpoint",
                result: self.check_health().await,
            },
            CheckOutcome {
                name: "Root Endpoint",
                result: self.check_root().await,
            },
        ]
    }

    async fn get_ok(&self, url: &str) -> Result<String, SmokeError> {
        let request_error = |source: reqwest::Error| SmokeError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.http.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SmokeError::UnexpectedStatus(status.as_u16()));
        }
        response.text().await.map_err(request_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn healthy_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Hello World from demo-app"))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let server = healthy_server().await;
        let client = SmokeClient::new(server.uri()).unwrap();

        let outcomes = client.run_all().await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(CheckOutcome::passed));
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url() {
        let server = healthy_server().await;
        let client = SmokeClient::new(format!("{}/", server.uri())).unwrap();

        assert!(client.check_health().await.is_ok());
        assert!(client.check_root().await.is_ok());
    }

    #[tokio::test]
    async fn test_health_rejects_wrong_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("DEGRADED"))
            .mount(&server)
            .await;

        let client = SmokeClient::new(server.uri()).unwrap();
        let err = client.check_health().await.unwrap_err();
        assert!(matches!(err, SmokeError::UnexpectedBody(body) if body == "DEGRADED"));
    }

    #[tokio::test]
    async fn test_root_rejects_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Hello World"))
            .mount(&server)
            .await;

        let client = SmokeClient::new(server.uri()).unwrap();
        let err = client.check_root().await.unwrap_err();
        assert!(matches!(err, SmokeError::UnexpectedStatus(503)));
    }

    #[tokio::test]
    async fn test_failed_check_does_not_stop_others() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Hello World"))
            .mount(&server)
            .await;

        let client = SmokeClient::new(server.uri()).unwrap();
        let outcomes = client.run_all().await;

        assert!(!outcomes[0].passed());
        assert!(outcomes[1].passed());
    }
}
