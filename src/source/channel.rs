//! Channel-based telemetry source.
//!
//! Receives poll updates via a tokio mpsc channel. This is useful for tests
//! and for embedders that run their own polling loop.

use tokio::sync::mpsc;

use super::{PollUpdate, TelemetrySource};
use crate::data::Target;

/// A source fed by whoever holds the sending half of its channel.
///
/// Retargets are recorded rather than acted on, so the producer can follow
/// them via [`ChannelSource::retargets`].
///
/// # Example
///
/// ```
/// use gpuwatch::{ChannelSource, PollUpdate, TelemetrySource};
///
/// let (tx, mut source) = ChannelSource::create("synthetic");
/// tx.try_send(PollUpdate::Devices(Err("no backend".to_string()))).unwrap();
/// assert!(source.poll().is_some());
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<PollUpdate>,
    description: String,
    retargets: Vec<Target>,
    refreshes: usize,
    last_error: Option<String>,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of an mpsc channel
    /// * `source_description` - A description of where updates come from
    pub fn new(receiver: mpsc::Receiver<PollUpdate>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            retargets: Vec::new(),
            refreshes: 0,
            last_error: None,
        }
    }

    /// Create a channel pair for sending updates to a ChannelSource.
    pub fn create(source_description: &str) -> (mpsc::Sender<PollUpdate>, Self) {
        let (tx, rx) = mpsc::channel(256);
        (tx, Self::new(rx, source_description))
    }

    /// Every target received so far, oldest first.
    pub fn retargets(&self) -> &[Target] {
        &self.retargets
    }

    /// Number of refresh requests received.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }
}

impl TelemetrySource for ChannelSource {
    fn poll(&mut self) -> Option<PollUpdate> {
        match self.receiver.try_recv() {
            Ok(update) => Some(update),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.last_error = Some("Channel disconnected".to_string());
                None
            }
        }
    }

    fn retarget(&mut self, target: Target) {
        self.retargets.push(target);
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}
