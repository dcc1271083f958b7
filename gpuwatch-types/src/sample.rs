//! Scalar samples and time series.

/// A single timestamped reading in a time series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Unix timestamp in whole seconds.
    pub timestamp: i64,
    /// The reading.
    pub value: f64,
}

impl Sample {
    /// Create a new sample.
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A single instantaneous reading, optionally timestamped.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalarSample {
    /// The reading.
    pub value: f64,
    /// Unix timestamp in whole seconds, when the backend reported one.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub timestamp: Option<i64>,
}

impl ScalarSample {
    /// Create a scalar without a timestamp.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            timestamp: None,
        }
    }

    /// Create a scalar with a timestamp.
    pub fn at(timestamp: i64, value: f64) -> Self {
        Self {
            value,
            timestamp: Some(timestamp),
        }
    }
}

/// An ordered, finite sequence of samples.
///
/// Each poll cycle replaces a series wholesale; it is never a live stream.
/// The intended invariant is strictly increasing timestamps, but a series
/// holds whatever order it was built with. Use [`TimeSeries::is_strictly_increasing`]
/// to check and [`TimeSeries::into_strictly_increasing`] to enforce it.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a series from samples, keeping their order.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// The most recent sample in delivery order.
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Iterate over the values only.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    /// Largest finite value in the series.
    ///
    /// NaN and infinite readings are ignored. Returns `None` for an empty
    /// series or one without any finite value.
    pub fn peak(&self) -> Option<f64> {
        self.values()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                Some(max) if max >= v => Some(max),
                _ => Some(v),
            })
    }

    /// Check that timestamps are strictly increasing.
    ///
    /// An empty or single-sample series is trivially ordered.
    pub fn is_strictly_increasing(&self) -> bool {
        self.samples
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    }

    /// Sort by timestamp and drop duplicate timestamps.
    ///
    /// The sort is stable, and for duplicate timestamps the sample delivered
    /// last wins.
    pub fn into_strictly_increasing(mut self) -> Self {
        self.samples.sort_by_key(|s| s.timestamp);
        let mut ordered: Vec<Sample> = Vec::with_capacity(self.samples.len());
        for sample in self.samples {
            match ordered.last_mut() {
                Some(prev) if prev.timestamp == sample.timestamp => *prev = sample,
                _ => ordered.push(sample),
            }
        }
        Self { samples: ordered }
    }
}

impl FromIterator<Sample> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TimeSeries {
    type Item = Sample;
    type IntoIter = std::vec::IntoIter<Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}
