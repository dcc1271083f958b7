//! # gpuwatch-adapters
//!
//! Adapters for querying GPU telemetry from metrics backends.
//!
//! This crate provides ready-to-use clients that fetch raw query results and
//! hand them back in the [`gpuwatch_types::PrometheusResponse`] shape, leaving
//! interpretation to the metric-card pipeline.
//!
//! ## Supported Systems
//!
//! - **Prometheus** (`prometheus` feature, default) - Instant and range queries
//!   via the Prometheus HTTP API, e.g. against a DCGM exporter scrape target
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gpuwatch_adapters::prometheus::{PrometheusClient, RangeWindow};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrometheusClient::builder()
//!         .endpoint("http://localhost:9090")
//!         .build()?;
//!
//!     let response = client.query("DCGM_FI_DEV_GPU_TEMP").await?;
//!     println!("{} series", response.results().map_or(0, |r| r.len()));
//!
//!     let history = client
//!         .query_range("DCGM_FI_DEV_GPU_TEMP", RangeWindow::default())
//!         .await?;
//!     println!("{:?}", history.status);
//!     Ok(())
//! }
//! ```

pub mod error;

#[cfg(feature = "prometheus")]
pub mod prometheus;

pub use error::AdapterError;

// Re-export types for convenience
pub use gpuwatch_types::{PrometheusResponse, QuerySpec};
