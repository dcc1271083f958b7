//! Raw Prometheus HTTP API responses.
//!
//! These types mirror the JSON returned by `/api/v1/query` and
//! `/api/v1/query_range`. They are deliberately lenient: most fields are
//! optional so a partial or unexpected payload still deserializes, and the
//! extractors decide what is usable.

use std::collections::BTreeMap;

/// Top-level response envelope.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PrometheusResponse {
    /// "success" or "error".
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub data: Option<QueryData>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub error_type: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl PrometheusResponse {
    /// Returns true if the backend reported success.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// A successful response carrying series results.
    pub fn series(result_type: &str, result: Vec<QueryResult>) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(QueryData {
                result_type: result_type.to_string(),
                result: ResultPayload::Series(result),
            }),
            error_type: None,
            error: None,
        }
    }

    /// The series results, if the payload is a vector or matrix.
    pub fn results(&self) -> Option<&[QueryResult]> {
        match self.data.as_ref()?.result {
            ResultPayload::Series(ref r) => Some(r),
            ResultPayload::Sample(_) => None,
        }
    }
}

/// The `data` member of a successful response.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct QueryData {
    /// "vector", "matrix", "scalar" or "string".
    #[cfg_attr(feature = "serde", serde(default))]
    pub result_type: String,
    pub result: ResultPayload,
}

/// Result payload: a list of series, or one bare sample for scalar results.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ResultPayload {
    Series(Vec<QueryResult>),
    Sample(RawSample),
}

/// One labelled series.
///
/// Instant queries fill `value`, range queries fill `values`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryResult {
    #[cfg_attr(feature = "serde", serde(default))]
    pub metric: BTreeMap<String, String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub value: Option<RawSample>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub values: Option<Vec<RawSample>>,
}

impl QueryResult {
    /// An instant-vector series.
    pub fn instant(metric: BTreeMap<String, String>, timestamp: f64, value: &str) -> Self {
        Self {
            metric,
            value: Some(RawSample(timestamp, value.to_string())),
            values: None,
        }
    }

    /// A range-vector series.
    pub fn range(metric: BTreeMap<String, String>, values: Vec<RawSample>) -> Self {
        Self {
            metric,
            value: None,
            values: Some(values),
        }
    }

    /// Look up a label value.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.metric.get(name).map(String::as_str)
    }
}

/// A `[timestamp, "value"]` pair as sent on the wire.
///
/// The timestamp is fractional Unix seconds. The value is a string because
/// Prometheus encodes `NaN` and `+Inf` that way.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSample(pub f64, pub String);

impl RawSample {
    pub fn new(timestamp: f64, value: impl Into<String>) -> Self {
        Self(timestamp, value.into())
    }

    /// Parse the value, returning `None` if it is not a number.
    pub fn parse_value(&self) -> Option<f64> {
        self.1.trim().parse::<f64>().ok()
    }

    /// Timestamp truncated to whole seconds.
    pub fn whole_seconds(&self) -> i64 {
        self.0.floor() as i64
    }
}
