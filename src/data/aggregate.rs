//! Metric view model aggregation.
//!
//! Folds the three polls of one metric into a [`MetricViewModel`]. The view
//! model is rebuilt from scratch on every call.

use gpuwatch_types::{MetricViewModel, PollResult, ScalarSample, TimeSeries, UnitKind};

use super::humanize::humanize;
use super::reconcile::{reconcile, PollState, PollStatus};

/// Headroom applied to the observed peak when no maximum is known.
pub const PEAK_HEADROOM: f64 = 1.2;

/// Build the view model of one metric.
///
/// - `scalar`: the current-value poll.
/// - `max`: the max-value poll. Ignored when `static_max` is set.
/// - `series`: the range poll.
///
/// Never panics and never divides by zero.
pub fn aggregate(
    scalar: &PollResult<ScalarSample>,
    max: Option<&PollResult<ScalarSample>>,
    series: &PollResult<TimeSeries>,
    static_max: Option<f64>,
    unit: UnitKind,
    explicit_unit: Option<&str>,
) -> MetricViewModel {
    let max = if static_max.is_some() { None } else { max };
    let placeholder_domain = static_max.unwrap_or(0.0);

    let reconciled = reconcile(
        PollStatus::of(scalar),
        max.map(PollStatus::of),
        PollStatus::of(series),
    );

    match reconciled.state {
        PollState::Polling | PollState::Idle => {
            return MetricViewModel::loading(placeholder_domain)
        }
        PollState::FullError => return MetricViewModel::unavailable(placeholder_domain),
        PollState::Loaded | PollState::PartialError => {}
    }

    let plotted = series.current().cloned().unwrap_or_default();

    let latest = if reconciled.failed_current {
        None
    } else {
        plotted
            .last()
            .map(|s| s.value)
            .filter(|v| v.is_finite())
            .or_else(|| {
                scalar
                    .current()
                    .map(|s| s.value)
                    .filter(|v| v.is_finite())
            })
    };

    let domain_max = static_max
        .or_else(|| {
            max.and_then(PollResult::current)
                .map(|s| s.value)
                .filter(|v| v.is_finite())
        })
        .or_else(|| plotted.peak().map(|peak| (peak * PEAK_HEADROOM).max(0.0)))
        .unwrap_or(0.0);

    let Some(latest) = latest else {
        if reconciled.any_failed() {
            return MetricViewModel {
                loading: false,
                error: false,
                current_value: None,
                normalized_percent: None,
                domain_max,
                series: plotted,
            };
        }
        return MetricViewModel::loading(placeholder_domain);
    };

    MetricViewModel {
        loading: false,
        error: false,
        current_value: Some(humanize(latest, unit, explicit_unit)),
        normalized_percent: normalize(latest, domain_max),
        domain_max,
        series: plotted,
    }
}

/// `latest` as a percentage of `domain_max`, clamped to `[0, 100]`.
pub fn normalize(latest: f64, domain_max: f64) -> Option<f64> {
    if domain_max > 0.0 && domain_max.is_finite() && latest.is_finite() {
        Some((latest * 100.0 / domain_max).clamp(0.0, 100.0))
    } else {
        None
    }
}
