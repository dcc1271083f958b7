//! Dashboard configuration.
//!
//! Settings come from an optional TOML file layered under `GPUWATCH_*`
//! environment variables. Command-line flags are applied on top by the binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use gpuwatch_adapters::prometheus::{PrometheusClient, RangeWindow};

use crate::data::catalog::{self, MetricSpec};
use crate::data::duration::parse_duration;
use crate::source::PollSettings;

/// Everything needed to start a dashboard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Prometheus (or Thanos Querier) base URL.
    pub endpoint: String,
    /// Bearer token sent with every query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Seconds between poll cycles.
    pub refresh_secs: u64,
    /// How far back range queries reach (e.g. "1h").
    pub range: String,
    /// Resolution of range queries (e.g. "60s").
    pub step: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Replaces the default metric catalog when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<MetricSpec>>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9090".to_string(),
            token: None,
            refresh_secs: 15,
            range: "1h".to_string(),
            step: "60s".to_string(),
            timeout_secs: 10,
            metrics: None,
        }
    }
}

impl DashboardConfig {
    /// Load from an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(Environment::with_prefix("GPUWATCH"))
            .build()
            .context("failed to read configuration")?;

        config
            .try_deserialize()
            .context("invalid configuration")
    }

    /// The metric catalog to display.
    pub fn catalog(&self) -> Result<Vec<MetricSpec>> {
        let metrics = match self.metrics {
            Some(ref metrics) => metrics.clone(),
            None => catalog::default_catalog(),
        };
        catalog::validate(&metrics)?;
        Ok(metrics)
    }

    pub fn poll_settings(&self) -> Result<PollSettings> {
        let span = parse_duration(&self.range).context("invalid range")?;
        let step = parse_duration(&self.step).context("invalid step")?;
        Ok(PollSettings {
            interval: Duration::from_secs(self.refresh_secs.max(1)),
            window: RangeWindow::new(span, step),
        })
    }

    pub fn client(&self) -> Result<PrometheusClient> {
        let mut builder = PrometheusClient::builder()
            .endpoint(&self.endpoint)
            .timeout(Duration::from_secs(self.timeout_secs.max(1)));
        if let Some(ref token) = self.token {
            builder = builder.bearer_token(token);
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpuwatch_types::UnitKind;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        let settings = config.poll_settings().unwrap();
        assert_eq!(settings.interval, Duration::from_secs(15));
        assert_eq!(settings.window, RangeWindow::default());
        assert_eq!(config.catalog().unwrap().len(), 8);
        assert!(config.client().is_ok());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
endpoint = "https://thanos.example:9091"
refresh_secs = 5
range = "30m"

[[metrics]]
key = "fan_speed"
title = "Fan speed"
query = 'sum(DCGM_FI_DEV_FAN_SPEED{{UUID="$UUID"}})'
static_max = 100
unit = "percentage"
"#
        )
        .unwrap();

        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.endpoint, "https://thanos.example:9091");
        assert_eq!(config.refresh_secs, 5);
        assert_eq!(config.step, "60s");

        let settings = config.poll_settings().unwrap();
        assert_eq!(settings.window.span, Duration::from_secs(1800));

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].unit, UnitKind::Percentage);
        assert_eq!(catalog[0].static_max, Some(100.0));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(DashboardConfig::load(Some(Path::new("/nonexistent/gpuwatch.toml"))).is_err());
    }

    #[test]
    fn test_invalid_durations() {
        let config = DashboardConfig {
            range: "forever".to_string(),
            ..Default::default()
        };
        assert!(config.poll_settings().is_err());
    }

    #[test]
    fn test_invalid_catalog() {
        let config = DashboardConfig {
            metrics: Some(Vec::new()),
            ..Default::default()
        };
        assert!(config.catalog().is_err());
    }
}
