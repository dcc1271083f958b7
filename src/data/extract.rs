//! Result extraction.
//!
//! Converts raw Prometheus responses into the values the pipeline works with.
//! Extraction is total: anything ambiguous or malformed yields an absent
//! value, never an error.

use gpuwatch_types::response::{QueryResult, ResultPayload};
use gpuwatch_types::{PrometheusResponse, Sample, ScalarSample, TimeSeries};

/// Series results of a successful response.
fn series_results(raw: Option<&PrometheusResponse>) -> Option<&[QueryResult]> {
    raw.filter(|r| r.is_success())?.results()
}

/// Extract the single instantaneous sample of a response.
///
/// Returns `None` unless the response holds exactly one series with a
/// parseable value, or a bare scalar result.
pub fn extract_scalar(raw: Option<&PrometheusResponse>) -> Option<ScalarSample> {
    let data = raw.filter(|r| r.is_success())?.data.as_ref()?;

    let sample = match data.result {
        ResultPayload::Sample(ref sample) => sample,
        ResultPayload::Series(ref results) => match results.as_slice() {
            [only] => only.value.as_ref()?,
            _ => return None,
        },
    };

    let value = sample.parse_value()?;
    Some(ScalarSample::at(sample.whole_seconds(), value))
}

/// Extract the single time series of a range response.
///
/// Samples are kept in delivery order. Samples with an unparseable value are
/// skipped. Anything but exactly one series yields an empty series.
pub fn extract_time_series(raw: Option<&PrometheusResponse>) -> TimeSeries {
    let Some([only]) = series_results(raw) else {
        return TimeSeries::new();
    };

    only.values
        .iter()
        .flatten()
        .filter_map(|raw| {
            raw.parse_value()
                .map(|value| Sample::new(raw.whole_seconds(), value))
        })
        .collect()
}
