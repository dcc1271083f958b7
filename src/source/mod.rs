//! Telemetry source abstraction.
//!
//! A source polls the metrics backend on its own schedule and hands replies
//! to the app, which owns all poll state. Sources never block the UI thread.

mod channel;
mod prometheus;

pub use channel::ChannelSource;
pub use prometheus::{PollSettings, PrometheusSource};

use std::fmt::Debug;

use gpuwatch_types::PrometheusResponse;

use crate::data::Target;

/// Which of a metric's three queries a reply answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryRole {
    /// Instant query for the current value.
    Current,
    /// Instant query for the maximum value.
    Max,
    /// Range query for the history.
    Range,
}

/// A raw reply, or the reason the query failed.
pub type QueryOutcome = Result<PrometheusResponse, String>;

/// One message from a source.
#[derive(Debug, Clone, PartialEq)]
pub enum PollUpdate {
    /// Reply to the GPU discovery query.
    Devices(QueryOutcome),
    /// Reply to one metric query.
    Reply {
        /// Selection generation the query was issued for.
        generation: u64,
        /// Index of the metric in the catalog.
        metric: usize,
        role: QueryRole,
        outcome: QueryOutcome,
    },
}

/// Trait for receiving telemetry replies from a backend.
///
/// # Example
///
/// ```
/// use gpuwatch::{ChannelSource, TelemetrySource};
///
/// let (_tx, mut source) = ChannelSource::create("test");
/// assert!(source.poll().is_none());
/// ```
pub trait TelemetrySource: Send + Debug {
    /// Take the next pending update.
    ///
    /// Returns `None` when nothing is pending. This method must not block.
    fn poll(&mut self) -> Option<PollUpdate>;

    /// Point all metric queries at a new entity.
    ///
    /// Any cycle in flight for the previous target is abandoned.
    fn retarget(&mut self, target: Target);

    /// Ask for a poll cycle as soon as possible.
    fn refresh(&mut self) {}

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The last transport-level error, if the most recent attempt failed.
    fn error(&self) -> Option<String>;
}
