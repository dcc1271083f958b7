//! The metric-card data pipeline.
//!
//! This module turns raw Prometheus replies into one display-ready
//! [`MetricViewModel`](gpuwatch_types::MetricViewModel) per metric.
//!
//! ## Submodules
//!
//! - [`extract`]: Raw response to scalar sample or time series
//! - [`humanize`]: Unit-aware formatting of values ("1.5 GHz", "55.0%")
//! - [`reconcile`]: Folds the loading/error states of a metric's polls
//! - [`aggregate`]: Builds the view model from the three poll results
//! - [`catalog`]: Which metrics are shown and how they are queried
//! - [`selection`]: GPU discovery and the selected GPU
//! - [`card`]: Per-metric poll state and view model
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "30s", "1h")
//!
//! ## Data Flow
//!
//! ```text
//! PrometheusResponse (raw JSON)
//!        │
//!        ▼
//! extract_scalar() / extract_time_series()
//!        │
//!        ▼
//! MetricPolls (current, max, range)
//!        │
//!        ├──▶ reconcile() (loading / partial / full error)
//!        │
//!        └──▶ aggregate() ──▶ MetricViewModel
//! ```

pub mod aggregate;
pub mod card;
pub mod catalog;
pub mod duration;
pub mod extract;
pub mod humanize;
pub mod reconcile;
pub mod selection;

pub use aggregate::aggregate;
pub use card::{MetricCard, MetricPolls};
pub use catalog::{default_catalog, MetricQueries, MetricSpec};
pub use extract::{extract_scalar, extract_time_series};
pub use humanize::humanize;
pub use reconcile::{reconcile, PollState, PollStatus, Reconciliation};
pub use selection::{
    devices_from_response, Gate, GpuInfo, SelectionContext, Target, DISCOVERY_QUERY,
};
