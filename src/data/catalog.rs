//! The metric catalog: which cards the dashboard shows and how each is queried.

use std::collections::HashSet;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use gpuwatch_types::{QuerySpec, QueryTemplate, UnitKind};

/// Definition of one metric card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Stable identifier, used in exports and logs.
    pub key: String,
    /// Card title.
    pub title: String,
    /// Template for the current-value and range queries.
    pub query: QueryTemplate,
    /// Template for the maximum-value query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_query: Option<QueryTemplate>,
    /// Fixed maximum, in the metric's raw units. Disables `max_query`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_max: Option<f64>,
    pub unit: UnitKind,
    /// Unit the raw readings arrive in, e.g. "MHz".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_unit: Option<String>,
}

/// The instantiated queries of one metric for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQueries {
    pub current: QuerySpec,
    pub max: Option<QuerySpec>,
    pub range: QuerySpec,
}

impl MetricSpec {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        query: impl Into<String>,
        unit: UnitKind,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            query: QueryTemplate::new(query),
            max_query: None,
            static_max: None,
            unit,
            explicit_unit: None,
        }
    }

    pub fn with_static_max(mut self, max: f64) -> Self {
        self.static_max = Some(max);
        self
    }

    pub fn with_max_query(mut self, query: impl Into<String>) -> Self {
        self.max_query = Some(QueryTemplate::new(query));
        self
    }

    pub fn with_explicit_unit(mut self, unit: impl Into<String>) -> Self {
        self.explicit_unit = Some(unit.into());
        self
    }

    /// Returns true if the maximum is polled rather than fixed.
    pub fn has_max_poll(&self) -> bool {
        self.static_max.is_none() && self.max_query.is_some()
    }

    /// Instantiate the queries for an entity.
    pub fn queries(&self, entity: &str) -> MetricQueries {
        MetricQueries {
            current: self.query.instant(entity),
            max: self
                .max_query
                .as_ref()
                .filter(|_| self.has_max_poll())
                .map(|q| q.instant(entity)),
            range: self.query.range(entity),
        }
    }
}

/// The default GPU cards, backed by the NVIDIA DCGM exporter.
pub fn default_catalog() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new(
            "gpu_utilization",
            "GPU utilization",
            r#"sum(DCGM_FI_PROF_GR_ENGINE_ACTIVE{UUID="$UUID"})"#,
            UnitKind::Ratio,
        )
        .with_static_max(1.0),
        MetricSpec::new(
            "memory_utilization",
            "Memory utilization",
            r#"sum(DCGM_FI_DEV_MEM_COPY_UTIL{UUID="$UUID"})"#,
            UnitKind::Percentage,
        )
        .with_static_max(100.0),
        MetricSpec::new(
            "encoder_utilization",
            "Encoder utilization",
            r#"sum(DCGM_FI_DEV_ENC_UTIL{UUID="$UUID"})"#,
            UnitKind::Percentage,
        )
        .with_static_max(100.0),
        MetricSpec::new(
            "decoder_utilization",
            "Decoder utilization",
            r#"sum(DCGM_FI_DEV_DEC_UTIL{UUID="$UUID"})"#,
            UnitKind::Percentage,
        )
        .with_static_max(100.0),
        MetricSpec::new(
            "power_usage",
            "Power consumption",
            r#"sum(DCGM_FI_DEV_POWER_USAGE{UUID="$UUID"})"#,
            UnitKind::Watts,
        )
        .with_max_query(r#"DCGM_FI_DEV_POWER_MGMT_LIMIT_MAX{UUID="$UUID"}"#),
        MetricSpec::new(
            "gpu_temperature",
            "GPU temperature",
            r#"sum(DCGM_FI_DEV_GPU_TEMP{UUID="$UUID"})"#,
            UnitKind::Degrees,
        )
        .with_static_max(110.0),
        MetricSpec::new(
            "sm_clock",
            "GPU clock speed",
            r#"sum(DCGM_FI_DEV_SM_CLOCK{UUID="$UUID"})"#,
            UnitKind::Hertz,
        )
        .with_max_query(r#"DCGM_FI_DEV_MAX_SM_CLOCK{UUID="$UUID"}"#)
        .with_explicit_unit("MHz"),
        MetricSpec::new(
            "memory_clock",
            "Memory clock speed",
            r#"sum(DCGM_FI_DEV_MEM_CLOCK{UUID="$UUID"})"#,
            UnitKind::Hertz,
        )
        .with_max_query(r#"DCGM_FI_DEV_MAX_MEM_CLOCK{UUID="$UUID"}"#)
        .with_explicit_unit("MHz"),
    ]
}

/// Check a catalog loaded from configuration.
pub fn validate(catalog: &[MetricSpec]) -> Result<()> {
    if catalog.is_empty() {
        bail!("metric catalog is empty");
    }

    let mut seen = HashSet::new();
    for spec in catalog {
        if !seen.insert(spec.key.as_str()) {
            bail!("duplicate metric key: {}", spec.key);
        }
        if !spec.query.has_placeholder() {
            bail!("metric {} query does not reference $UUID", spec.key);
        }
        if let Some(max) = spec.static_max {
            if !max.is_finite() || max <= 0.0 {
                bail!("metric {} has invalid static_max {}", spec.key, max);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 8);
        validate(&catalog).unwrap();
    }

    #[test]
    fn test_queries_for_static_max() {
        let spec = &default_catalog()[1];
        let q = spec.queries("GPU-abc");
        assert_eq!(
            q.current.query_text,
            r#"sum(DCGM_FI_DEV_MEM_COPY_UTIL{UUID="GPU-abc"})"#
        );
        assert!(!q.current.is_range);
        assert!(q.range.is_range);
        assert!(q.max.is_none());
    }

    #[test]
    fn test_queries_with_max_query() {
        let spec = default_catalog()
            .into_iter()
            .find(|s| s.key == "sm_clock")
            .unwrap();
        assert!(spec.has_max_poll());
        let q = spec.queries("GPU-1");
        let max = q.max.unwrap();
        assert_eq!(max.query_text, r#"DCGM_FI_DEV_MAX_SM_CLOCK{UUID="GPU-1"}"#);
        assert!(!max.is_range);
        assert_eq!(spec.explicit_unit.as_deref(), Some("MHz"));
    }

    #[test]
    fn test_static_max_overrides_max_query() {
        let spec = MetricSpec::new("p", "Power", r#"m{UUID="$UUID"}"#, UnitKind::Watts)
            .with_max_query(r#"limit{UUID="$UUID"}"#)
            .with_static_max(400.0);
        assert!(!spec.has_max_poll());
        assert!(spec.queries("g").max.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_catalogs() {
        assert!(validate(&[]).is_err());

        let a = MetricSpec::new("a", "A", r#"m{UUID="$UUID"}"#, UnitKind::Watts);
        assert!(validate(&[a.clone(), a.clone()]).is_err());

        let no_placeholder = MetricSpec::new("b", "B", "up", UnitKind::Watts);
        assert!(validate(&[no_placeholder]).is_err());

        let zero_max = a.with_static_max(0.0);
        assert!(validate(&[zero_max]).is_err());
    }

    #[test]
    fn test_deserialize_from_toml_shape() {
        let json = r#"{
            "key": "fan",
            "title": "Fan speed",
            "query": "sum(DCGM_FI_DEV_FAN_SPEED{UUID=\"$UUID\"})",
            "static_max": 100,
            "unit": "percentage"
        }"#;
        let spec: MetricSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.unit, UnitKind::Percentage);
        assert_eq!(spec.static_max, Some(100.0));
        assert!(spec.max_query.is_none());
    }
}
