//! Poll reconciliation.
//!
//! A metric card polls up to three queries independently. This module folds
//! their loading/error states into one state for the card.

use gpuwatch_types::PollResult;

/// Unified state of a metric's polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No active poll has started or produced anything.
    Idle,
    /// At least one active poll is in flight.
    Polling,
    /// Every active poll completed successfully.
    Loaded,
    /// Some, but not all, active polls failed.
    PartialError,
    /// Every active poll failed.
    FullError,
}

/// Loading/error status of one poll, independent of its data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStatus {
    pub loading: bool,
    pub failed: bool,
    pub idle: bool,
}

impl PollStatus {
    pub fn of<T>(poll: &PollResult<T>) -> Self {
        Self {
            loading: poll.loading,
            failed: poll.is_failed(),
            idle: poll.is_idle(),
        }
    }
}

/// Result of reconciling a metric's polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub state: PollState,
    pub failed_current: bool,
    pub failed_max: bool,
    pub failed_range: bool,
}

impl Reconciliation {
    /// The card waits for data.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, PollState::Polling | PollState::Idle)
    }

    /// The card cannot be shown at all.
    pub fn is_error(&self) -> bool {
        self.state == PollState::FullError
    }

    pub fn any_failed(&self) -> bool {
        self.failed_current || self.failed_max || self.failed_range
    }
}

/// Reconcile the current, max and range poll states.
///
/// `max` is `None` when the metric has no max poll (static maximum).
/// Precedence: polling, then full error, then partial error, then idle.
pub fn reconcile(
    current: PollStatus,
    max: Option<PollStatus>,
    range: PollStatus,
) -> Reconciliation {
    let active = [Some(current), max, Some(range)];
    let active = active.iter().flatten();

    let total = active.clone().count();
    let failed = active.clone().filter(|s| s.failed).count();

    let state = if active.clone().any(|s| s.loading) {
        PollState::Polling
    } else if failed == total {
        PollState::FullError
    } else if failed > 0 {
        PollState::PartialError
    } else if active.clone().all(|s| s.idle) {
        PollState::Idle
    } else {
        PollState::Loaded
    };

    Reconciliation {
        state,
        failed_current: current.failed,
        failed_max: max.is_some_and(|m| m.failed),
        failed_range: range.failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOADING: PollStatus = PollStatus {
        loading: true,
        failed: false,
        idle: false,
    };
    const LOADED: PollStatus = PollStatus {
        loading: false,
        failed: false,
        idle: false,
    };
    const FAILED: PollStatus = PollStatus {
        loading: false,
        failed: true,
        idle: false,
    };
    const IDLE: PollStatus = PollStatus {
        loading: false,
        failed: false,
        idle: true,
    };

    #[test]
    fn test_any_loading_is_polling() {
        let r = reconcile(LOADED, Some(FAILED), LOADING);
        assert_eq!(r.state, PollState::Polling);
        assert!(r.is_loading());
        assert!(!r.is_error());
    }

    #[test]
    fn test_all_failed_is_full_error() {
        let r = reconcile(FAILED, Some(FAILED), FAILED);
        assert_eq!(r.state, PollState::FullError);
        assert!(r.is_error());

        let r = reconcile(FAILED, None, FAILED);
        assert_eq!(r.state, PollState::FullError);
    }

    #[test]
    fn test_single_failure_is_partial() {
        let r = reconcile(FAILED, Some(LOADED), LOADED);
        assert_eq!(r.state, PollState::PartialError);
        assert!(!r.is_error());
        assert!(r.failed_current);
        assert!(!r.failed_max);
        assert!(!r.failed_range);
    }

    #[test]
    fn test_inactive_max_is_ignored() {
        let r = reconcile(LOADED, None, LOADED);
        assert_eq!(r.state, PollState::Loaded);
        assert!(!r.any_failed());
    }

    #[test]
    fn test_idle_reads_as_loading() {
        let r = reconcile(IDLE, None, IDLE);
        assert_eq!(r.state, PollState::Idle);
        assert!(r.is_loading());

        let r = reconcile(LOADED, Some(IDLE), LOADED);
        assert_eq!(r.state, PollState::Loaded);
    }

    #[test]
    fn test_status_of_poll_result() {
        let mut poll = PollResult::<u8>::idle();
        assert_eq!(PollStatus::of(&poll), IDLE);
        poll.start();
        assert_eq!(PollStatus::of(&poll), LOADING);
        poll.fail("timeout");
        assert_eq!(PollStatus::of(&poll), FAILED);
    }
}
