// Telos Engine: Wisdom Accumulator
// Seven fixed-weight dimensions tracked over time. The engine never invents
// the raw values: each update cycle takes a WisdomSamples from the external
// provider, clamps it, and folds it into per-dimension state, the weighted
// overall score, the dimension-coherence score, and the snapshot history.

use crate::atoms::constants::*;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::*;

use crate::engine::store::StateStore;

use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// ── Internal state ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WisdomState {
    dimensions: Vec<DimensionState>,
    overall_wisdom: f64,
    coherence: f64,
    evolution_rate: f64,
    cultivation_log: Vec<CultivationEvent>,
    snapshots: Vec<WisdomSnapshot>,
    last_update: DateTime<Utc>,
}

impl Default for WisdomState {
    fn default() -> Self {
        let now = Utc::now();
        WisdomState {
            dimensions: WisdomDimension::ALL
                .iter()
                .map(|_| DimensionState {
                    value: DIMENSION_BASELINE,
                    trend: 0.0,
                    last_update: now,
                    update_count: 0,
                    history: Vec::new(),
                    target: DIMENSION_TARGET,
                })
                .collect(),
            overall_wisdom: 0.0,
            coherence: 0.0,
            evolution_rate: 0.0,
            cultivation_log: Vec::new(),
            snapshots: Vec::new(),
            last_update: now,
        }
    }
}

/// Seven-dimensional wisdom accumulator.
pub struct WisdomTracker {
    inner: RwLock<WisdomState>,
}

impl Default for WisdomTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WisdomTracker {
    pub fn new() -> Self {
        WisdomTracker {
            inner: RwLock::new(WisdomState::default()),
        }
    }

    // ── Update cycle ────────────────────────────────────────────────────

    /// Fold one round of provider samples into every dimension, then
    /// recompute the derived scores and take a snapshot.
    pub fn update(&self, samples: &WisdomSamples) {
        let mut state = self.inner.write();
        let now = Utc::now();
        let values = samples.as_array();

        for (i, dim) in WisdomDimension::ALL.iter().enumerate() {
            let value = clamp_unit(values[i]);
            let slot = &mut state.dimensions[i];
            let old = slot.value;

            if !slot.history.is_empty() {
                slot.trend = value - old;
            }
            slot.history.push(value);
            if slot.history.len() > DIMENSION_HISTORY_CAP {
                slot.history.remove(0);
            }
            slot.value = value;
            slot.last_update = now;
            slot.update_count += 1;

            let delta = value - old;
            if delta.abs() > SIGNIFICANT_DELTA {
                debug!(
                    "[wisdom] Significant change in {}: {:.2} -> {:.2}",
                    dim.label(),
                    old,
                    value
                );
                state.cultivation_log.push(CultivationEvent {
                    timestamp: now,
                    kind: "dimension_change".to_string(),
                    dimension: *dim,
                    impact: delta,
                    description: format!("Significant change: {:.2} -> {:.2}", old, value),
                });
                if state.cultivation_log.len() > CULTIVATION_LOG_CAP {
                    state.cultivation_log.remove(0);
                }
            }
        }

        state.overall_wisdom = weighted_overall(&state.dimensions);
        state.coherence = dimension_coherence(&state.dimensions);
        state.evolution_rate = evolution_rate(&state.snapshots);

        let snapshot = WisdomSnapshot {
            timestamp: now,
            dimension_values: dimension_values(&state.dimensions),
            overall_wisdom: state.overall_wisdom,
            coherence: state.coherence,
        };
        state.snapshots.push(snapshot);
        if state.snapshots.len() > WISDOM_SNAPSHOT_CAP {
            state.snapshots.remove(0);
        }
        state.last_update = now;
    }

    /// Log an insight against a dimension and bump its value by `impact`,
    /// saturating at 1.0. Impact must be in [0, 1]; a negative impact is
    /// rejected so a dimension can never be pushed below zero.
    pub fn record_insight(
        &self,
        insight: &str,
        dimension: WisdomDimension,
        impact: f64,
    ) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&impact) {
            return Err(EngineError::validation(format!(
                "insight impact {} out of range [0, 1]",
                impact
            )));
        }

        let mut state = self.inner.write();
        let now = Utc::now();

        info!("[wisdom] Insight on {}: {}", dimension.label(), insight);
        state.cultivation_log.push(CultivationEvent {
            timestamp: now,
            kind: "insight".to_string(),
            dimension,
            impact,
            description: insight.to_string(),
        });
        if state.cultivation_log.len() > CULTIVATION_LOG_CAP {
            state.cultivation_log.remove(0);
        }

        let slot = &mut state.dimensions[dimension as usize];
        slot.value = (slot.value + impact).min(1.0);
        slot.last_update = now;
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn overall_wisdom(&self) -> f64 {
        self.inner.read().overall_wisdom
    }

    pub fn coherence(&self) -> f64 {
        self.inner.read().coherence
    }

    pub fn evolution_rate(&self) -> f64 {
        self.inner.read().evolution_rate
    }

    pub fn dimension(&self, dimension: WisdomDimension) -> DimensionState {
        self.inner.read().dimensions[dimension as usize].clone()
    }

    pub fn latest_snapshot(&self) -> Option<WisdomSnapshot> {
        self.inner.read().snapshots.last().cloned()
    }

    pub fn snapshot_count(&self) -> usize {
        self.inner.read().snapshots.len()
    }

    /// Most recent cultivation events, newest last.
    pub fn cultivation_events(&self, count: usize) -> Vec<CultivationEvent> {
        let state = self.inner.read();
        let skip = state.cultivation_log.len().saturating_sub(count);
        state.cultivation_log[skip..].to_vec()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn persist(&self, store: &StateStore) -> EngineResult<()> {
        let state = self.inner.read().clone();
        store.set_state(STATE_KEY_WISDOM_SNAPSHOT, &state)
    }

    pub fn restore(&self, store: &StateStore) -> EngineResult<()> {
        if let Some(state) = store.get_state::<WisdomState>(STATE_KEY_WISDOM_SNAPSHOT)? {
            info!(
                "[wisdom] Restored state: overall {:.3}, {} snapshots",
                state.overall_wisdom,
                state.snapshots.len()
            );
            *self.inner.write() = state;
        }
        Ok(())
    }
}

// ── Derived scores ─────────────────────────────────────────────────────────

fn dimension_values(dimensions: &[DimensionState]) -> [f64; 7] {
    let mut values = [0.0; 7];
    for (i, d) in dimensions.iter().enumerate().take(7) {
        values[i] = d.value;
    }
    values
}

/// Weighted sum over the seven dimensions.
fn weighted_overall(dimensions: &[DimensionState]) -> f64 {
    WisdomDimension::ALL
        .iter()
        .enumerate()
        .map(|(i, dim)| dimensions[i].value * dim.weight())
        .sum()
}

/// Variance of the dimension values mapped through exponential decay:
/// zero variance is perfect coherence 1.0.
fn dimension_coherence(dimensions: &[DimensionState]) -> f64 {
    let n = dimensions.len() as f64;
    let mean = dimensions.iter().map(|d| d.value).sum::<f64>() / n;
    let variance = dimensions
        .iter()
        .map(|d| (d.value - mean).powi(2))
        .sum::<f64>()
        / n;
    (-variance * COHERENCE_VARIANCE_SCALE).exp()
}

/// Wisdom delta per hour between the last two snapshots; 0 with fewer than
/// two, or when they share a timestamp.
fn evolution_rate(snapshots: &[WisdomSnapshot]) -> f64 {
    if snapshots.len() < 2 {
        return 0.0;
    }
    let current = &snapshots[snapshots.len() - 1];
    let previous = &snapshots[snapshots.len() - 2];
    let hours = (current.timestamp - previous.timestamp).num_milliseconds() as f64
        / 3_600_000.0;
    if hours == 0.0 {
        return 0.0;
    }
    (current.overall_wisdom - previous.overall_wisdom) / hours
}
