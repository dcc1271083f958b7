//! Prometheus adapter using the HTTP query API.
//!
//! This adapter runs PromQL queries against a Prometheus server (or any
//! server implementing the same API, such as Thanos Querier), which is where
//! the NVIDIA DCGM exporter's metrics typically end up.
//!
//! ## Endpoints Used
//!
//! - `GET /api/v1/query` - instant queries (current value, maximum value,
//!   GPU discovery)
//! - `GET /api/v1/query_range` - range queries (historical series)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use gpuwatch_adapters::prometheus::{PrometheusClient, RangeWindow};
//! use gpuwatch_types::QuerySpec;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrometheusClient::builder()
//!         .endpoint("https://thanos-querier.openshift-monitoring.svc:9091")
//!         .bearer_token("sha256~...")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let window = RangeWindow::new(Duration::from_secs(3600), Duration::from_secs(60));
//!     let spec = QuerySpec::range(r#"sum(DCGM_FI_DEV_POWER_USAGE{UUID="GPU-1"})"#);
//!     let response = client.fetch(&spec, window).await?;
//!     println!("{}", response.status);
//!     Ok(())
//! }
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::{Client, StatusCode};
use tracing::debug;

use gpuwatch_types::{PrometheusResponse, QuerySpec};

use crate::AdapterError;

/// Time window for range queries, ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    /// How far back the range reaches.
    pub span: Duration,
    /// Resolution step between points.
    pub step: Duration,
}

impl RangeWindow {
    pub fn new(span: Duration, step: Duration) -> Self {
        Self { span, step }
    }

    /// Start and end of the window in Unix seconds, for a given `now`.
    pub fn bounds(&self, now_secs: u64) -> (u64, u64) {
        (now_secs.saturating_sub(self.span.as_secs()), now_secs)
    }

    /// Step in whole seconds, never below one.
    pub fn step_secs(&self) -> u64 {
        self.step.as_secs().max(1)
    }
}

impl Default for RangeWindow {
    /// The last hour at one-minute resolution.
    fn default() -> Self {
        Self {
            span: Duration::from_secs(60 * 60),
            step: Duration::from_secs(60),
        }
    }
}

/// Prometheus HTTP API client.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    client: Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl PrometheusClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> PrometheusClientBuilder {
        PrometheusClientBuilder::default()
    }

    /// The base URL queries are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run an instant query.
    pub async fn query(&self, query: &str) -> Result<PrometheusResponse, AdapterError> {
        self.get("/api/v1/query", &[("query", query.to_string())])
            .await
    }

    /// Run a range query over `window`, ending now.
    pub async fn query_range(
        &self,
        query: &str,
        window: RangeWindow,
    ) -> Result<PrometheusResponse, AdapterError> {
        let params = range_params(query, window, now_secs());
        self.get("/api/v1/query_range", &params).await
    }

    /// Run a query spec, choosing the endpoint from `is_range`.
    pub async fn fetch(
        &self,
        spec: &QuerySpec,
        window: RangeWindow,
    ) -> Result<PrometheusResponse, AdapterError> {
        if spec.is_range {
            self.query_range(&spec.query_text, window).await
        } else {
            self.query(&spec.query_text).await
        }
    }

    async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<PrometheusResponse, AdapterError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(%url, query = %params[0].1, "prometheus request");

        let mut request = self.client.get(&url).query(params);
        if let Some(ref token) = self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        interpret(status, &body)
    }
}

/// Turn an HTTP status and body into a response or an error.
///
/// Prometheus reports query errors with a 4xx/5xx status and a JSON body, so
/// the body is decoded before the status is judged.
fn interpret(status: StatusCode, body: &str) -> Result<PrometheusResponse, AdapterError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AdapterError::Auth(format!("API returned status {}", status)));
    }

    match serde_json::from_str::<PrometheusResponse>(body) {
        Ok(parsed) if parsed.status == "error" => Err(AdapterError::Query {
            kind: parsed.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: parsed.error.unwrap_or_default(),
        }),
        Ok(parsed) if status.is_success() && parsed.is_success() => Ok(parsed),
        Ok(parsed) if status.is_success() => Err(AdapterError::Parse(format!(
            "unexpected response status '{}'",
            parsed.status
        ))),
        Err(e) if status.is_success() => Err(AdapterError::Parse(e.to_string())),
        _ => Err(AdapterError::Http(format!("API returned status {}", status))),
    }
}

fn range_params(query: &str, window: RangeWindow, now: u64) -> Vec<(&'static str, String)> {
    let (start, end) = window.bounds(now);
    vec![
        ("query", query.to_string()),
        ("start", start.to_string()),
        ("end", end.to_string()),
        ("step", window.step_secs().to_string()),
    ]
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Builder for PrometheusClient.
#[derive(Debug, Default)]
pub struct PrometheusClientBuilder {
    endpoint: Option<String>,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
}

impl PrometheusClientBuilder {
    /// Set the API base URL (e.g., "http://localhost:9090").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Send a bearer token with every request.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PrometheusClient, AdapterError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Client(e.to_string()))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:9090".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(PrometheusClient {
            client,
            endpoint,
            bearer_token: self.bearer_token.filter(|t| !t.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = PrometheusClient::builder().build().unwrap();
        assert_eq!(client.endpoint, "http://localhost:9090");
        assert!(client.bearer_token.is_none());
    }

    #[test]
    fn test_builder_custom() {
        let client = PrometheusClient::builder()
            .endpoint("https://thanos.local:9091/")
            .bearer_token("secret")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert_eq!(client.endpoint(), "https://thanos.local:9091");
        assert_eq!(client.bearer_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let client = PrometheusClient::builder().bearer_token("").build().unwrap();
        assert!(client.bearer_token.is_none());
    }

    #[test]
    fn test_range_window() {
        let window = RangeWindow::new(Duration::from_secs(600), Duration::from_millis(500));
        assert_eq!(window.bounds(1_000), (400, 1_000));
        assert_eq!(window.bounds(100), (0, 100));
        assert_eq!(window.step_secs(), 1);
        assert_eq!(RangeWindow::default().step_secs(), 60);
    }

    #[test]
    fn test_range_params() {
        let params = range_params("up", RangeWindow::default(), 10_000);
        assert_eq!(
            params,
            vec![
                ("query", "up".to_string()),
                ("start", "6400".to_string()),
                ("end", "10000".to_string()),
                ("step", "60".to_string()),
            ]
        );
    }

    #[test]
    fn test_interpret_success() {
        let body = r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#;
        let response = interpret(StatusCode::OK, body).unwrap();
        assert!(response.is_success());
        assert_eq!(response.results().map(|r| r.len()), Some(0));
    }

    #[test]
    fn test_interpret_query_error() {
        let body = r#"{"status":"error","errorType":"bad_data","error":"1:5: parse error"}"#;
        match interpret(StatusCode::BAD_REQUEST, body) {
            Err(AdapterError::Query { kind, message }) => {
                assert_eq!(kind, "bad_data");
                assert_eq!(message, "1:5: parse error");
            }
            other => panic!("expected query error, got {:?}", other),
        }
    }

    #[test]
    fn test_interpret_auth() {
        assert!(matches!(
            interpret(StatusCode::UNAUTHORIZED, ""),
            Err(AdapterError::Auth(_))
        ));
        assert!(matches!(
            interpret(StatusCode::FORBIDDEN, "{}"),
            Err(AdapterError::Auth(_))
        ));
    }

    #[test]
    fn test_interpret_garbage() {
        assert!(matches!(
            interpret(StatusCode::OK, "<html>"),
            Err(AdapterError::Parse(_))
        ));
        assert!(matches!(
            interpret(StatusCode::BAD_GATEWAY, "<html>"),
            Err(AdapterError::Http(_))
        ));
        assert!(matches!(
            interpret(StatusCode::OK, "{}"),
            Err(AdapterError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = PrometheusClient::builder()
            .endpoint("http://127.0.0.1:1")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        assert!(client.query("up").await.is_err());
    }
}
