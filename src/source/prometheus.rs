//! Prometheus-backed telemetry source.
//!
//! Spawns a background task that polls GPU discovery and every metric of the
//! catalog on a fixed interval, and makes the replies available via `poll()`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use gpuwatch_adapters::prometheus::{PrometheusClient, RangeWindow};
use gpuwatch_adapters::AdapterError;
use gpuwatch_types::PrometheusResponse;

use super::{PollUpdate, QueryRole, TelemetrySource};
use crate::data::{MetricSpec, Target, DISCOVERY_QUERY};

/// Polling cadence and range window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub window: RangeWindow,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            window: RangeWindow::default(),
        }
    }
}

/// A source that polls a Prometheus server.
///
/// # Example
///
/// ```no_run
/// use gpuwatch::data::default_catalog;
/// use gpuwatch::{PollSettings, PrometheusSource};
/// use gpuwatch_adapters::prometheus::PrometheusClient;
///
/// # tokio_test::block_on(async {
/// let client = PrometheusClient::builder()
///     .endpoint("http://localhost:9090")
///     .build()
///     .unwrap();
/// let source = PrometheusSource::spawn(client, default_catalog(), PollSettings::default());
/// # });
/// ```
#[derive(Debug)]
pub struct PrometheusSource {
    receiver: mpsc::Receiver<PollUpdate>,
    target: watch::Sender<Option<Target>>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
    task: JoinHandle<()>,
}

impl PrometheusSource {
    /// Spawn the polling task. Must be called within a tokio runtime.
    pub fn spawn(client: PrometheusClient, catalog: Vec<MetricSpec>, settings: PollSettings) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let (target_tx, target_rx) = watch::channel(None);
        let last_error = Arc::new(Mutex::new(None));
        let description = format!("prometheus: {}", client.endpoint());

        let poller = Poller {
            client,
            catalog,
            window: settings.window,
            tx,
            last_error: last_error.clone(),
        };
        let task = tokio::spawn(poller.run(settings.interval, target_rx));

        Self {
            receiver: rx,
            target: target_tx,
            description,
            last_error,
            task,
        }
    }
}

impl Drop for PrometheusSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TelemetrySource for PrometheusSource {
    fn poll(&mut self) -> Option<PollUpdate> {
        match self.receiver.try_recv() {
            Ok(update) => Some(update),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                *self.last_error.lock() = Some("Poller stopped".to_string());
                None
            }
        }
    }

    fn retarget(&mut self, target: Target) {
        self.target.send_replace(Some(target));
    }

    fn refresh(&mut self) {
        self.target.send_modify(|_| {});
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

struct Poller {
    client: PrometheusClient,
    catalog: Vec<MetricSpec>,
    window: RangeWindow,
    tx: mpsc::Sender<PollUpdate>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl Poller {
    async fn run(self, interval: Duration, mut target_rx: watch::Receiver<Option<Target>>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = target_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let target = target_rx.borrow_and_update().clone();

            tokio::select! {
                keep_going = self.cycle(target) => {
                    if !keep_going {
                        // Receiver dropped
                        break;
                    }
                }
                changed = target_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!("target changed; abandoning poll cycle");
                    ticker.reset_immediately();
                }
            }
        }
    }

    /// Run one poll cycle. Returns false once the app is gone.
    async fn cycle(&self, target: Option<Target>) -> bool {
        let devices = self.client.query(DISCOVERY_QUERY).await;
        match devices {
            Ok(_) => *self.last_error.lock() = None,
            Err(ref e) => {
                warn!(error = %e, "discovery query failed");
                *self.last_error.lock() = Some(e.to_string());
            }
        }
        if self
            .tx
            .send(PollUpdate::Devices(devices.map_err(|e| e.to_string())))
            .await
            .is_err()
        {
            return false;
        }

        let Some(target) = target else {
            return true;
        };

        debug!(gpu = %target.entity, generation = target.generation, "polling metrics");
        let replies = join_all(
            self.catalog
                .iter()
                .enumerate()
                .map(|(index, spec)| self.poll_metric(index, spec, &target)),
        )
        .await;

        for update in replies.into_iter().flatten() {
            if self.tx.send(update).await.is_err() {
                return false;
            }
        }
        true
    }

    async fn poll_metric(&self, index: usize, spec: &MetricSpec, target: &Target) -> Vec<PollUpdate> {
        let queries = spec.queries(&target.entity);

        let (current, max, range) = tokio::join!(
            self.client.fetch(&queries.current, self.window),
            async {
                match queries.max {
                    Some(ref q) => Some(self.client.fetch(q, self.window).await),
                    None => None,
                }
            },
            self.client.fetch(&queries.range, self.window),
        );

        let reply = |role: QueryRole, outcome: Result<PrometheusResponse, AdapterError>| {
            PollUpdate::Reply {
                generation: target.generation,
                metric: index,
                role,
                outcome: outcome.map_err(|e| e.to_string()),
            }
        };

        let mut updates = vec![
            reply(QueryRole::Current, current),
            reply(QueryRole::Range, range),
        ];
        if let Some(max) = max {
            updates.push(reply(QueryRole::Max, max));
        }
        updates
    }
}
