//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::data::{devices_from_response, MetricCard, MetricSpec, SelectionContext, Target};
use crate::source::{PollUpdate, TelemetrySource};
use crate::ui::Theme;

/// Cards per row of the dashboard grid.
pub const GRID_COLUMNS: usize = 4;

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Telemetry
    source: Box<dyn TelemetrySource>,
    pub selection: SelectionContext,
    pub cards: Vec<MetricCard>,
    pub load_error: Option<String>,

    // Navigation state
    pub focused: usize,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App showing one card per catalog entry.
    ///
    /// `preferred` is the UUID to select once discovery finds it.
    pub fn new(
        source: Box<dyn TelemetrySource>,
        catalog: Vec<MetricSpec>,
        preferred: Option<String>,
    ) -> Self {
        let mut app = Self {
            running: true,
            show_help: false,
            source,
            selection: SelectionContext::new(preferred),
            cards: catalog.into_iter().map(MetricCard::new).collect(),
            load_error: None,
            focused: 0,
            theme: Theme::default(),
            status_message: None,
        };
        app.refresh_views();
        app
    }

    /// Returns a description of the current telemetry source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Drain the source and recompute every card.
    ///
    /// Returns true if anything changed.
    pub fn reload_data(&mut self) -> bool {
        let mut received = false;
        while let Some(update) = self.source.poll() {
            received = true;
            self.apply_update(update);
        }

        self.load_error = self.source.error();
        let views_changed = self.refresh_views();
        received || views_changed
    }

    fn apply_update(&mut self, update: PollUpdate) {
        match update {
            PollUpdate::Devices(outcome) => {
                let devices = outcome.map(|raw| devices_from_response(&raw));
                if let Some(target) = self.selection.apply_devices(devices) {
                    self.retarget(target);
                }
            }
            PollUpdate::Reply {
                generation,
                metric,
                role,
                outcome,
            } => {
                if !self.selection.is_current(generation) {
                    debug!(
                        generation,
                        current = self.selection.generation(),
                        metric,
                        ?role,
                        "dropping stale reply"
                    );
                    return;
                }
                match self.cards.get_mut(metric) {
                    Some(card) => card.apply(role, outcome),
                    None => warn!(metric, "reply for unknown metric"),
                }
            }
        }
    }

    fn refresh_views(&mut self) -> bool {
        let gate = self.selection.gate();
        let mut changed = false;
        for card in &mut self.cards {
            changed |= card.refresh(gate);
        }
        changed
    }

    fn retarget(&mut self, target: Target) {
        for card in &mut self.cards {
            card.reset();
        }
        self.source.retarget(target);
        self.refresh_views();
    }

    /// Switch to the next discovered GPU.
    pub fn select_next_gpu(&mut self) {
        if let Some(target) = self.selection.select_next() {
            self.retarget(target);
        }
    }

    /// Switch to the previous discovered GPU.
    pub fn select_prev_gpu(&mut self) {
        if let Some(target) = self.selection.select_prev() {
            self.retarget(target);
        }
    }

    /// Ask the source for a new poll cycle.
    pub fn request_refresh(&mut self) {
        self.source.refresh();
        self.set_status_message("Refreshing...".to_string());
    }

    /// Returns true once no card is loading.
    pub fn is_settled(&self) -> bool {
        self.cards.iter().all(|card| card.view.is_settled())
    }

    pub fn focused_card(&self) -> Option<&MetricCard> {
        self.cards.get(self.focused)
    }

    /// Move card focus right, wrapping to the next row.
    pub fn focus_next(&mut self) {
        if !self.cards.is_empty() {
            self.focused = (self.focused + 1) % self.cards.len();
        }
    }

    /// Move card focus left, wrapping to the previous row.
    pub fn focus_prev(&mut self) {
        if !self.cards.is_empty() {
            self.focused = (self.focused + self.cards.len() - 1) % self.cards.len();
        }
    }

    /// Move card focus one row down.
    pub fn focus_down(&mut self) {
        if self.focused + GRID_COLUMNS < self.cards.len() {
            self.focused += GRID_COLUMNS;
        }
    }

    /// Move card focus one row up.
    pub fn focus_up(&mut self) {
        self.focused = self.focused.checked_sub(GRID_COLUMNS).unwrap_or(self.focused);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Build the JSON document written by [`App::export_state`].
    pub fn export_value(&self) -> serde_json::Value {
        let metrics: Vec<serde_json::Value> = self
            .cards
            .iter()
            .map(|card| {
                serde_json::json!({
                    "key": card.spec.key,
                    "title": card.spec.title,
                    "unit": card.spec.unit.name(),
                    "view": card.view,
                })
            })
            .collect();

        serde_json::json!({
            "source": self.source_description(),
            "gpu": self.selection.selected(),
            "gpu_count": self.selection.device_list().len(),
            "metrics": metrics,
        })
    }

    /// Export the selected GPU and every view model to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        use std::io::Write;

        let json = serde_json::to_string_pretty(&self.export_value())?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;

        info!(path = %path.display(), "exported dashboard state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{default_catalog, GpuInfo};
    use crate::source::{ChannelSource, QueryOutcome, QueryRole};
    use gpuwatch_types::response::{QueryResult, RawSample};
    use gpuwatch_types::PrometheusResponse;
    use std::collections::BTreeMap;
    use tokio::sync::mpsc;

    fn discovery(uuids: &[&str]) -> PollUpdate {
        let result = uuids
            .iter()
            .map(|uuid| {
                let mut labels = BTreeMap::new();
                labels.insert("UUID".to_string(), uuid.to_string());
                labels.insert("modelName".to_string(), "NVIDIA A100".to_string());
                QueryResult::instant(labels, 100.0, "0.5")
            })
            .collect();
        PollUpdate::Devices(Ok(PrometheusResponse::series("vector", result)))
    }

    fn instant(value: &str) -> QueryOutcome {
        Ok(PrometheusResponse::series(
            "vector",
            vec![QueryResult::instant(BTreeMap::new(), 100.0, value)],
        ))
    }

    fn matrix(value: &str) -> QueryOutcome {
        Ok(PrometheusResponse::series(
            "matrix",
            vec![QueryResult::range(
                BTreeMap::new(),
                vec![RawSample::new(60.0, value), RawSample::new(120.0, value)],
            )],
        ))
    }

    fn reply(generation: u64, metric: usize, role: QueryRole, outcome: QueryOutcome) -> PollUpdate {
        PollUpdate::Reply {
            generation,
            metric,
            role,
            outcome,
        }
    }

    /// One metric at 55% of a static 100 domain.
    fn single_metric_app() -> (mpsc::Sender<PollUpdate>, App) {
        let catalog: Vec<MetricSpec> = default_catalog()
            .into_iter()
            .filter(|s| s.key == "memory_utilization")
            .collect();
        let (tx, source) = ChannelSource::create("test");
        (tx, App::new(Box::new(source), catalog, None))
    }

    fn send_all(tx: &mpsc::Sender<PollUpdate>, updates: Vec<PollUpdate>) {
        for update in updates {
            tx.try_send(update).unwrap();
        }
    }

    #[test]
    fn test_cards_loading_until_discovery() {
        let (_tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), default_catalog(), None);
        assert_eq!(app.cards.len(), 8);
        assert!(app.cards.iter().all(|c| c.view.loading));
        assert!(!app.is_settled());
        assert!(!app.reload_data());
    }

    #[test]
    fn test_discovery_failure_marks_cards_unavailable() {
        let (tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), default_catalog(), None);
        tx.try_send(PollUpdate::Devices(Err("connection refused".to_string())))
            .unwrap();

        assert!(app.reload_data());
        assert!(app.cards.iter().all(|c| c.view.error));
        assert!(app.is_settled());
    }

    #[test]
    fn test_full_cycle_loads_card() {
        let (tx, mut app) = single_metric_app();
        send_all(&tx, vec![discovery(&["GPU-1"])]);
        app.reload_data();
        assert_eq!(app.selection.selected_uuid(), Some("GPU-1"));
        assert!(app.cards[0].view.loading);

        send_all(
            &tx,
            vec![
                reply(1, 0, QueryRole::Current, instant("55")),
                reply(1, 0, QueryRole::Range, matrix("55")),
            ],
        );
        assert!(app.reload_data());

        let view = &app.cards[0].view;
        assert!(view.is_ready());
        assert_eq!(view.normalized_percent, Some(55.0));
        assert_eq!(view.current_value.as_ref().unwrap().string, "55.0%");
        assert!(app.is_settled());
    }

    #[test]
    fn test_stale_replies_are_discarded() {
        let (tx, mut app) = single_metric_app();
        send_all(&tx, vec![discovery(&["GPU-1", "GPU-2"])]);
        app.reload_data();
        app.select_next_gpu();
        assert_eq!(app.selection.generation(), 2);

        // Late replies for GPU-1
        send_all(
            &tx,
            vec![
                reply(1, 0, QueryRole::Current, instant("99")),
                reply(1, 0, QueryRole::Range, matrix("99")),
            ],
        );
        app.reload_data();
        assert!(app.cards[0].view.loading);
        assert!(app.cards[0].polls.current.data.is_none());

        send_all(
            &tx,
            vec![
                reply(2, 0, QueryRole::Current, instant("10")),
                reply(2, 0, QueryRole::Range, matrix("10")),
            ],
        );
        app.reload_data();
        assert_eq!(app.cards[0].view.normalized_percent, Some(10.0));
    }

    #[test]
    fn test_selection_change_resets_cards() {
        let (tx, mut app) = single_metric_app();
        send_all(
            &tx,
            vec![
                discovery(&["GPU-1", "GPU-2"]),
                reply(1, 0, QueryRole::Current, instant("55")),
                reply(1, 0, QueryRole::Range, matrix("55")),
            ],
        );
        app.reload_data();
        assert!(app.cards[0].view.is_ready());

        app.select_prev_gpu();
        assert_eq!(app.selection.selected_uuid(), Some("GPU-2"));
        assert!(app.cards[0].view.loading);
        assert!(app.cards[0].view.current_value.is_none());
    }

    #[test]
    fn test_partial_failure_degrades() {
        let (tx, mut app) = single_metric_app();
        send_all(
            &tx,
            vec![
                discovery(&["GPU-1"]),
                reply(1, 0, QueryRole::Current, Err("timeout".to_string())),
                reply(1, 0, QueryRole::Range, matrix("40")),
            ],
        );
        app.reload_data();

        let view = &app.cards[0].view;
        assert!(!view.error);
        assert!(!view.loading);
        assert!(view.current_value.is_none());
        assert!(view.normalized_percent.is_none());
        assert_eq!(view.series.len(), 2);
    }

    #[test]
    fn test_unknown_metric_index_is_ignored() {
        let (tx, mut app) = single_metric_app();
        send_all(
            &tx,
            vec![
                discovery(&["GPU-1"]),
                reply(1, 42, QueryRole::Current, instant("1")),
            ],
        );
        app.reload_data();
        assert!(app.cards[0].view.loading);
    }

    #[test]
    fn test_preferred_gpu_selected() {
        let (tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), default_catalog(), Some("GPU-2".to_string()));
        send_all(&tx, vec![discovery(&["GPU-1", "GPU-2"])]);
        app.reload_data();
        assert_eq!(app.selection.selected_uuid(), Some("GPU-2"));
        assert_eq!(app.source_description(), "channel: test");
    }

    #[test]
    fn test_focus_navigation() {
        let (_tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), default_catalog(), None);

        app.focus_prev();
        assert_eq!(app.focused, 7);
        app.focus_next();
        assert_eq!(app.focused, 0);
        app.focus_down();
        assert_eq!(app.focused, 4);
        app.focus_down();
        assert_eq!(app.focused, 4);
        app.focus_up();
        assert_eq!(app.focused, 0);
        app.focus_up();
        assert_eq!(app.focused, 0);
        assert_eq!(app.focused_card().unwrap().spec.key, "gpu_utilization");
    }

    #[test]
    fn test_status_message() {
        let (_tx, mut app) = single_metric_app();
        assert!(app.get_status_message().is_none());
        app.set_status_message("hello".to_string());
        assert_eq!(app.get_status_message(), Some("hello"));
    }

    #[test]
    fn test_export_state() {
        let (tx, mut app) = single_metric_app();
        send_all(
            &tx,
            vec![
                discovery(&["GPU-1"]),
                reply(1, 0, QueryRole::Current, instant("55")),
                reply(1, 0, QueryRole::Range, matrix("55")),
            ],
        );
        app.reload_data();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        app.export_state(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["gpu"]["uuid"], "GPU-1");
        assert_eq!(value["gpu_count"], 1);
        assert_eq!(value["metrics"][0]["key"], "memory_utilization");
        assert_eq!(value["metrics"][0]["view"]["normalized_percent"], 55.0);

        let gpu: GpuInfo = serde_json::from_value(value["gpu"].clone()).unwrap();
        assert_eq!(gpu.model_name.as_deref(), Some("NVIDIA A100"));
    }
}
