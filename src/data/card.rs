//! A metric card: spec, poll states and the latest view model.

use tracing::{debug, warn};

use gpuwatch_types::{MetricViewModel, PollResult, ScalarSample, TimeSeries};

use super::aggregate::aggregate;
use super::catalog::MetricSpec;
use super::extract::{extract_scalar, extract_time_series};
use super::selection::Gate;
use crate::source::{QueryOutcome, QueryRole};

/// The three polls behind one card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricPolls {
    pub current: PollResult<ScalarSample>,
    pub max: PollResult<ScalarSample>,
    pub range: PollResult<TimeSeries>,
}

/// One card of the dashboard.
#[derive(Debug, Clone)]
pub struct MetricCard {
    pub spec: MetricSpec,
    pub polls: MetricPolls,
    pub view: MetricViewModel,
}

impl MetricCard {
    pub fn new(spec: MetricSpec) -> Self {
        let view = MetricViewModel::loading(spec.static_max.unwrap_or(0.0));
        let mut card = Self {
            spec,
            polls: MetricPolls::default(),
            view,
        };
        card.reset();
        card
    }

    /// Drop all data and wait for the first replies for a new entity.
    pub fn reset(&mut self) {
        self.polls.current.reset();
        self.polls.range.reset();
        if self.spec.has_max_poll() {
            self.polls.max.reset();
        } else {
            self.polls.max = PollResult::idle();
        }
    }

    /// Apply one query reply.
    pub fn apply(&mut self, role: QueryRole, outcome: QueryOutcome) {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                debug!(metric = %self.spec.key, ?role, error = %e, "query failed");
                match role {
                    QueryRole::Current => self.polls.current.fail(e),
                    QueryRole::Max => self.polls.max.fail(e),
                    QueryRole::Range => self.polls.range.fail(e),
                }
                return;
            }
        };

        match role {
            QueryRole::Current => self.polls.current.settle(extract_scalar(Some(&response))),
            QueryRole::Max => self.polls.max.settle(extract_scalar(Some(&response))),
            QueryRole::Range => {
                let mut series = extract_time_series(Some(&response));
                if !series.is_strictly_increasing() {
                    warn!(
                        metric = %self.spec.key,
                        samples = series.len(),
                        "range samples out of order; reordering"
                    );
                    series = series.into_strictly_increasing();
                }
                self.polls.range.resolve(series);
            }
        }
    }

    /// Recompute the view model. Returns true if it changed.
    pub fn refresh(&mut self, gate: Gate) -> bool {
        let placeholder_domain = self.spec.static_max.unwrap_or(0.0);
        let view = match gate {
            Gate::Loading => MetricViewModel::loading(placeholder_domain),
            Gate::Unavailable => MetricViewModel::unavailable(placeholder_domain),
            Gate::Open => aggregate(
                &self.polls.current,
                self.spec.has_max_poll().then_some(&self.polls.max),
                &self.polls.range,
                self.spec.static_max,
                self.spec.unit,
                self.spec.explicit_unit.as_deref(),
            ),
        };

        let changed = view != self.view;
        self.view = view;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::default_catalog;
    use gpuwatch_types::response::{QueryResult, RawSample};
    use gpuwatch_types::{PrometheusResponse, Sample};
    use std::collections::BTreeMap;

    fn instant(value: &str) -> QueryOutcome {
        Ok(PrometheusResponse::series(
            "vector",
            vec![QueryResult::instant(BTreeMap::new(), 100.0, value)],
        ))
    }

    fn matrix(points: &[(f64, &str)]) -> QueryOutcome {
        let values = points.iter().map(|&(t, v)| RawSample::new(t, v)).collect();
        Ok(PrometheusResponse::series(
            "matrix",
            vec![QueryResult::range(BTreeMap::new(), values)],
        ))
    }

    fn power_card() -> MetricCard {
        let spec = default_catalog()
            .into_iter()
            .find(|s| s.key == "power_usage")
            .unwrap();
        MetricCard::new(spec)
    }

    #[test]
    fn test_new_card_is_loading() {
        let mut card = power_card();
        assert!(card.polls.max.loading);
        card.refresh(Gate::Open);
        assert!(card.view.loading);
    }

    #[test]
    fn test_card_loads() {
        let mut card = power_card();
        card.apply(QueryRole::Current, instant("150"));
        card.apply(QueryRole::Max, instant("300"));
        card.apply(QueryRole::Range, matrix(&[(60.0, "100"), (120.0, "150")]));

        assert!(card.refresh(Gate::Open));
        assert!(card.view.is_ready());
        assert_eq!(card.view.normalized_percent, Some(50.0));
        assert_eq!(card.view.current_value.as_ref().unwrap().string, "150 W");

        // Nothing changed
        assert!(!card.refresh(Gate::Open));
    }

    #[test]
    fn test_card_reorders_series() {
        let mut card = power_card();
        card.apply(QueryRole::Range, matrix(&[(120.0, "2"), (60.0, "1"), (120.0, "3")]));
        let series = card.polls.range.data.as_ref().unwrap();
        assert_eq!(series.samples(), &[Sample::new(60, 1.0), Sample::new(120, 3.0)]);
    }

    #[test]
    fn test_card_failure_is_recorded() {
        let mut card = power_card();
        card.apply(QueryRole::Current, Err("timeout".to_string()));
        card.apply(QueryRole::Max, Err("timeout".to_string()));
        card.apply(QueryRole::Range, Err("timeout".to_string()));
        card.refresh(Gate::Open);
        assert!(card.view.error);
    }

    #[test]
    fn test_gate_overrides_polls() {
        let mut card = power_card();
        card.apply(QueryRole::Current, instant("150"));
        card.apply(QueryRole::Max, instant("300"));
        card.apply(QueryRole::Range, matrix(&[(60.0, "150")]));

        card.refresh(Gate::Unavailable);
        assert!(card.view.error);
        card.refresh(Gate::Loading);
        assert!(card.view.loading);
    }

    #[test]
    fn test_reset_clears_data() {
        let mut card = power_card();
        card.apply(QueryRole::Current, instant("150"));
        card.reset();
        assert!(card.polls.current.loading);
        assert!(card.polls.current.data.is_none());
    }

    #[test]
    fn test_static_card_keeps_max_idle() {
        let spec = default_catalog().into_iter().next().unwrap();
        let mut card = MetricCard::new(spec);
        assert!(card.polls.max.is_idle());
        card.apply(QueryRole::Current, instant("0.55"));
        card.apply(QueryRole::Range, matrix(&[(60.0, "0.55")]));
        card.refresh(Gate::Open);
        assert_eq!(card.view.current_value.as_ref().unwrap().string, "55.0%");
        let percent = card.view.normalized_percent.unwrap();
        assert!((percent - 55.0).abs() < 1e-9);
    }
}
