//! Tri-state result of a periodically polled query.

/// The state of one polled query: data, loading and error are independent.
///
/// - `loading` set means a request is in flight; `data` may hold the previous
///   cycle's value or nothing at all.
/// - `error` set means the most recent completed cycle failed. A value from an
///   earlier successful cycle may still be present in `data`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PollResult<T> {
    /// Latest successfully received value, possibly stale.
    pub data: Option<T>,
    /// A request is in flight.
    pub loading: bool,
    /// Failure message of the most recent completed cycle.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl<T> Default for PollResult<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> PollResult<T> {
    /// A poll that has never been started.
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    /// A poll whose first request is in flight.
    pub fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    /// A completed poll with data.
    pub fn loaded(data: T) -> Self {
        Self {
            data: Some(data),
            loading: false,
            error: None,
        }
    }

    /// A completed poll that failed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            data: None,
            loading: false,
            error: Some(error.into()),
        }
    }

    /// Mark a new request as in flight, keeping any previous data.
    pub fn start(&mut self) {
        self.loading = true;
    }

    /// Record a successful cycle.
    pub fn resolve(&mut self, data: T) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
    }

    /// Record a successful cycle that may not have produced a value.
    ///
    /// An empty answer replaces the previous data: the backend has nothing
    /// for this cycle.
    pub fn settle(&mut self, data: Option<T>) {
        self.data = data;
        self.loading = false;
        self.error = None;
    }

    /// Record a failed cycle. Previous data is kept but is now stale.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.loading = false;
        self.error = Some(error.into());
    }

    /// Forget everything and wait for a fresh first response.
    pub fn reset(&mut self) {
        *self = Self::loading();
    }

    /// Returns true if the most recent completed cycle failed.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Returns true if the poll holds nothing: never started, or settled
    /// without a value.
    pub fn is_idle(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_none()
    }

    /// Data from the most recent cycle, or `None` if that cycle failed.
    ///
    /// A failed poll never exposes its stale value here.
    pub fn current(&self) -> Option<&T> {
        if self.is_failed() {
            None
        } else {
            self.data.as_ref()
        }
    }

    /// Map the data while keeping the loading and error state.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> PollResult<U> {
        PollResult {
            data: self.data.map(f),
            loading: self.loading,
            error: self.error,
        }
    }
}
