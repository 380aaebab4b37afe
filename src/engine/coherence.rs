// Telos Engine: Coherence Accumulator
// Identity coherence from three externally supplied components, plus the
// memory-echo audit log. Echoes are write-only evidence: they never feed
// back into the coherence formula.

use crate::atoms::constants::*;
use crate::atoms::error::EngineResult;
use crate::atoms::types::*;

use crate::engine::identity::hex_encode;
use crate::engine::store::StateStore;

use chrono::Utc;
use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ── Internal state ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CoherenceState {
    identity_signature: String,
    continuity: f64,
    consistency: f64,
    authenticity: f64,
    coherence: f64,
    snapshots: Vec<CoherenceSnapshot>,
    echoes: Vec<MemoryEcho>,
}

/// Identity-coherence accumulator and memory-echo log.
pub struct CoherenceTracker {
    inner: RwLock<CoherenceState>,
}

impl CoherenceTracker {
    /// The signature comes from the identity kernel, so coherence history
    /// stays attributable to one identity.
    pub fn new(identity_signature: String) -> Self {
        CoherenceTracker {
            inner: RwLock::new(CoherenceState {
                identity_signature,
                continuity: 0.0,
                consistency: 0.0,
                authenticity: 0.0,
                coherence: 0.0,
                snapshots: Vec::new(),
                echoes: Vec::new(),
            }),
        }
    }

    // ── Update cycle ────────────────────────────────────────────────────

    /// Fold one round of provider samples into the three components and the
    /// weighted overall score, then snapshot.
    pub fn update(&self, samples: &CoherenceSamples) {
        let mut state = self.inner.write();
        let now = Utc::now();

        state.continuity = clamp_unit(samples.continuity);
        state.consistency = clamp_unit(samples.consistency);
        state.authenticity = clamp_unit(samples.authenticity);
        state.coherence = state.continuity * CONTINUITY_WEIGHT
            + state.consistency * CONSISTENCY_WEIGHT
            + state.authenticity * AUTHENTICITY_WEIGHT;

        let snapshot = CoherenceSnapshot {
            timestamp: now,
            coherence: state.coherence,
            continuity: state.continuity,
            consistency: state.consistency,
            authenticity: state.authenticity,
        };
        state.snapshots.push(snapshot);
        if state.snapshots.len() > COHERENCE_SNAPSHOT_CAP {
            state.snapshots.remove(0);
        }
    }

    /// Append a memory echo. Fills in the content-derived signature when
    /// absent; oldest entries evict past the cap.
    pub fn record_memory_echo(&self, mut echo: MemoryEcho) {
        if echo.echo_signature.is_empty() {
            echo.echo_signature = echo_signature(&echo.content);
        }

        let mut state = self.inner.write();
        debug!("[coherence] Memory echo {}", echo.echo_signature);
        state.echoes.push(echo);
        if state.echoes.len() > MEMORY_ECHO_CAP {
            state.echoes.remove(0);
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn coherence(&self) -> f64 {
        self.inner.read().coherence
    }

    pub fn components(&self) -> (f64, f64, f64) {
        let state = self.inner.read();
        (state.continuity, state.consistency, state.authenticity)
    }

    pub fn identity_signature(&self) -> String {
        self.inner.read().identity_signature.clone()
    }

    pub fn latest_snapshot(&self) -> Option<CoherenceSnapshot> {
        self.inner.read().snapshots.last().cloned()
    }

    pub fn snapshot_count(&self) -> usize {
        self.inner.read().snapshots.len()
    }

    pub fn echo_count(&self) -> usize {
        self.inner.read().echoes.len()
    }

    /// Most recent echoes, newest last.
    pub fn recent_echoes(&self, count: usize) -> Vec<MemoryEcho> {
        let state = self.inner.read();
        let skip = state.echoes.len().saturating_sub(count);
        state.echoes[skip..].to_vec()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn persist(&self, store: &StateStore) -> EngineResult<()> {
        let state = self.inner.read().clone();
        store.set_state(STATE_KEY_COHERENCE_SNAPSHOT, &state)
    }

    pub fn restore(&self, store: &StateStore) -> EngineResult<()> {
        if let Some(state) = store.get_state::<CoherenceState>(STATE_KEY_COHERENCE_SNAPSHOT)? {
            info!(
                "[coherence] Restored state: coherence {:.3}, {} echoes",
                state.coherence,
                state.echoes.len()
            );
            *self.inner.write() = state;
        }
        Ok(())
    }
}

/// First 16 bytes of SHA-256 over the content, hex encoded.
fn echo_signature(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex_encode(&digest[..16])
}
