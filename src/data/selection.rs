//! GPU discovery and selection.
//!
//! The selection decides which GPU every card's queries are built for. Each
//! change of the selected GPU bumps a generation counter, and replies issued
//! for an older generation are dropped by the app.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gpuwatch_types::{PollResult, PrometheusResponse};

/// Instant query listing every GPU reporting to the exporter.
pub const DISCOVERY_QUERY: &str = "DCGM_FI_PROF_GR_ENGINE_ACTIVE";

/// A GPU found by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

impl GpuInfo {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            pod: None,
            namespace: None,
            model_name: None,
            node_name: None,
        }
    }
}

/// Build the GPU list from a discovery response.
///
/// Series without a `UUID` label are ignored. GPUs are de-duplicated by UUID,
/// keeping the first occurrence.
pub fn devices_from_response(raw: &PrometheusResponse) -> Vec<GpuInfo> {
    let Some(results) = raw.results().filter(|_| raw.is_success()) else {
        return Vec::new();
    };

    let mut devices: Vec<GpuInfo> = Vec::new();
    for result in results {
        let Some(uuid) = result.label("UUID").filter(|u| !u.is_empty()) else {
            continue;
        };
        if devices.iter().any(|d| d.uuid == uuid) {
            continue;
        }
        let label = |name: &str| result.label(name).map(str::to_string);
        devices.push(GpuInfo {
            uuid: uuid.to_string(),
            pod: label("pod"),
            namespace: label("namespace"),
            model_name: label("modelName"),
            node_name: label("Hostname"),
        });
    }
    devices
}

/// The entity queries are built for, tagged with its selection generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub generation: u64,
    pub entity: String,
}

/// Whether cards may show their own poll state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// A GPU is selected; cards follow their polls.
    Open,
    /// Discovery is still running and nothing is selected.
    Loading,
    /// Discovery finished without a GPU to show.
    Unavailable,
}

/// Discovery results and the current selection for one dashboard session.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    devices: PollResult<Vec<GpuInfo>>,
    selected: Option<String>,
    preferred: Option<String>,
    generation: u64,
}

impl SelectionContext {
    /// Create a context waiting for its first discovery reply.
    pub fn new(preferred: Option<String>) -> Self {
        Self {
            devices: PollResult::loading(),
            selected: None,
            preferred: preferred.filter(|p| !p.is_empty()),
            generation: 0,
        }
    }

    pub fn devices(&self) -> &PollResult<Vec<GpuInfo>> {
        &self.devices
    }

    /// Known GPUs, possibly from an earlier discovery cycle.
    pub fn device_list(&self) -> &[GpuInfo] {
        self.devices.data.as_deref().unwrap_or_default()
    }

    pub fn selected_uuid(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected GPU, if it is still in the device list.
    pub fn selected(&self) -> Option<&GpuInfo> {
        let uuid = self.selected.as_deref()?;
        self.device_list().iter().find(|d| d.uuid == uuid)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The current target, if a GPU is selected.
    pub fn target(&self) -> Option<Target> {
        self.selected.as_ref().map(|entity| Target {
            generation: self.generation,
            entity: entity.clone(),
        })
    }

    /// Returns true if a reply for `generation` is still current.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn gate(&self) -> Gate {
        if self.selected.is_some() {
            Gate::Open
        } else if self.devices.loading {
            Gate::Loading
        } else {
            Gate::Unavailable
        }
    }

    /// Apply a discovery reply.
    ///
    /// Selects the preferred GPU (or the first one) when nothing is selected or
    /// the selected GPU disappeared. Returns the new target when the selection
    /// changed. An empty list keeps the current selection.
    pub fn apply_devices(&mut self, outcome: Result<Vec<GpuInfo>, String>) -> Option<Target> {
        let devices = match outcome {
            Ok(devices) => devices,
            Err(e) => {
                if self.selected.is_some() {
                    warn!(error = %e, "GPU discovery failed; keeping current selection");
                } else {
                    warn!(error = %e, "GPU discovery failed");
                }
                self.devices.fail(e);
                return None;
            }
        };

        let still_present = self
            .selected
            .as_deref()
            .is_some_and(|uuid| devices.iter().any(|d| d.uuid == uuid));

        let choice = if still_present || devices.is_empty() {
            None
        } else {
            self.preferred
                .as_deref()
                .and_then(|p| devices.iter().find(|d| d.uuid == p))
                .or_else(|| {
                    if let Some(ref p) = self.preferred {
                        warn!(preferred = %p, "preferred GPU not found; using the first GPU");
                    }
                    devices.first()
                })
                .map(|d| d.uuid.clone())
        };

        if devices.is_empty() && self.selected.is_some() {
            warn!("GPU discovery returned no devices; keeping current selection");
        }

        self.devices.resolve(devices);
        choice.map(|uuid| self.switch_to(uuid))
    }

    /// Select a GPU by UUID. Unknown or already selected GPUs are ignored.
    pub fn select(&mut self, uuid: &str) -> Option<Target> {
        if self.selected.as_deref() == Some(uuid) {
            return None;
        }
        if !self.device_list().iter().any(|d| d.uuid == uuid) {
            return None;
        }
        Some(self.switch_to(uuid.to_string()))
    }

    /// Select the next GPU in discovery order, wrapping around.
    pub fn select_next(&mut self) -> Option<Target> {
        self.step(1)
    }

    /// Select the previous GPU in discovery order, wrapping around.
    pub fn select_prev(&mut self) -> Option<Target> {
        let len = self.device_list().len();
        self.step(len.saturating_sub(1))
    }

    fn step(&mut self, offset: usize) -> Option<Target> {
        let devices = self.device_list();
        if devices.is_empty() {
            return None;
        }
        let position = self
            .selected
            .as_deref()
            .and_then(|uuid| devices.iter().position(|d| d.uuid == uuid))
            .unwrap_or(0);
        let uuid = devices[(position + offset) % devices.len()].uuid.clone();
        self.select(&uuid)
    }

    fn switch_to(&mut self, uuid: String) -> Target {
        self.generation += 1;
        info!(gpu = %uuid, generation = self.generation, "selected GPU");
        self.selected = Some(uuid);
        Target {
            generation: self.generation,
            entity: self.selected.clone().unwrap_or_default(),
        }
    }
}
