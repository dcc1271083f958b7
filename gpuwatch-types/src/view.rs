//! The display-ready view model of one metric card.

use crate::{HumanizedValue, TimeSeries};

/// Reconciled, display-ready state of one metric.
///
/// Recomputed from scratch whenever any of its inputs change. Consumers must
/// render a placeholder for absent fields, never a zero.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricViewModel {
    /// Data is not available yet.
    pub loading: bool,
    /// The metric cannot be shown.
    pub error: bool,
    /// Humanized latest reading. Only set when neither loading nor in error.
    pub current_value: Option<HumanizedValue>,
    /// Latest reading relative to `domain_max`, in `[0, 100]`.
    /// Only set when neither loading nor in error.
    pub normalized_percent: Option<f64>,
    /// The value mapped to 100% on a utilization chart. Zero when unknown.
    pub domain_max: f64,
    /// The series to plot.
    pub series: TimeSeries,
}

impl MetricViewModel {
    /// A view model waiting for data.
    pub fn loading(domain_max: f64) -> Self {
        Self {
            loading: true,
            domain_max,
            ..Default::default()
        }
    }

    /// A view model for a metric that cannot be shown.
    pub fn unavailable(domain_max: f64) -> Self {
        Self {
            error: true,
            domain_max,
            ..Default::default()
        }
    }

    /// Returns true if the metric has settled into a displayable state
    /// (loaded, degraded, or in error).
    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    /// Returns true if derived fields may be read.
    pub fn is_ready(&self) -> bool {
        !self.loading && !self.error
    }
}
