//! # gpuwatch-types
//!
//! Core types for GPU telemetry dashboards. This crate defines the data model
//! shared by the Prometheus adapter, the metric-card pipeline and any consumer
//! that renders the resulting view models.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable `serde` to read Prometheus responses and
//!   export view models as JSON
//! - **Backend agnostic values**: Samples and series carry plain numbers; the raw
//!   wire shape lives in [`response`] and is only touched by extractors
//! - **Absent is not zero**: Every value that may be unknown is an `Option`
//!
//! ## Features
//!
//! - `serde`: JSON serialization via serde (Prometheus responses, view models)
//!
//! ## Example
//!
//! ```rust
//! use gpuwatch_types::{PollResult, QueryTemplate, Sample, TimeSeries};
//!
//! let template = QueryTemplate::new(r#"sum(DCGM_FI_DEV_GPU_TEMP{UUID="$UUID"})"#);
//! let spec = template.instant("GPU-1234");
//! assert_eq!(spec.query_text, r#"sum(DCGM_FI_DEV_GPU_TEMP{UUID="GPU-1234"})"#);
//!
//! let mut poll = PollResult::<TimeSeries>::loading();
//! poll.resolve(TimeSeries::from_samples(vec![Sample::new(60, 41.0), Sample::new(120, 43.0)]));
//! assert!(!poll.loading);
//! assert_eq!(poll.data.unwrap().last().map(|s| s.value), Some(43.0));
//! ```

mod poll;
mod query;
pub mod response;
mod sample;
mod unit;
mod view;

pub use poll::*;
pub use query::*;
pub use response::PrometheusResponse;
pub use sample::*;
pub use unit::*;
pub use view::*;
