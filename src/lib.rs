//! # gpuwatch
//!
//! A terminal dashboard and library for GPU telemetry exported by NVIDIA DCGM
//! to Prometheus.
//!
//! For the selected GPU, every metric card polls three queries (current value,
//! optional maximum, history) and reconciles their results into one
//! display-ready [`MetricViewModel`](gpuwatch_types::MetricViewModel).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(pipeline)│    │(render) │    │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │  ▲ replies                                          │
//! │       ▼  │ retarget                                         │
//! │  ┌─────────┐                                                │
//! │  │ source  │◀── PrometheusSource | ChannelSource           │
//! │  │ (poller)│                                                │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Owns the GPU selection and every card; applies replies and
//!   drops the ones issued for a previous selection
//! - **[`source`]**: Telemetry source abstraction ([`TelemetrySource`] trait)
//!   with a background Prometheus poller and a channel-based source
//! - **[`data`]**: Extraction, unit humanizing, poll reconciliation and view
//!   model aggregation, plus the metric catalog and GPU selection
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**: File and environment configuration
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch the GPUs known to a local Prometheus
//! gpuwatch --endpoint http://localhost:9090
//!
//! # Start on a specific GPU with a 30 minute history
//! gpuwatch --gpu GPU-5c3d8e2a --range 30m --step 30s
//!
//! # Write the loaded dashboard to JSON and exit
//! gpuwatch --export gpus.json
//! ```
//!
//! ### As a library with the Prometheus poller
//!
//! ```no_run
//! use gpuwatch::data::default_catalog;
//! use gpuwatch::{App, PollSettings, PrometheusSource};
//! use gpuwatch_adapters::prometheus::PrometheusClient;
//!
//! # tokio_test::block_on(async {
//! let client = PrometheusClient::builder()
//!     .endpoint("http://localhost:9090")
//!     .build()
//!     .unwrap();
//! let source = PrometheusSource::spawn(client, default_catalog(), PollSettings::default());
//! let mut app = App::new(Box::new(source), default_catalog(), None);
//! app.reload_data();
//! # });
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use gpuwatch::data::default_catalog;
//! use gpuwatch::{App, ChannelSource, PollUpdate};
//!
//! let (tx, source) = ChannelSource::create("replay");
//! let mut app = App::new(Box::new(source), default_catalog(), None);
//!
//! tx.try_send(PollUpdate::Devices(Err("no backend".to_string()))).unwrap();
//! app.reload_data();
//! assert!(app.cards.iter().all(|card| card.view.error));
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::DashboardConfig;
pub use data::{GpuInfo, MetricCard, MetricSpec, SelectionContext, Target};
pub use source::{
    ChannelSource, PollSettings, PollUpdate, PrometheusSource, QueryOutcome, QueryRole,
    TelemetrySource,
};
