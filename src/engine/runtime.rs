// Telos Engine: Runtime
// Owns every component and drives them with independently timed periodic
// tasks. Each task is a plain tokio loop selecting between its interval
// tick and the shared stop signal. No component lock is ever held across a
// store or provider call; cycles take what they need, release, then write.
//
// stop() fires the signal, joins every task (the signal interrupts the
// tick wait, so shutdown is not bounded by the longest interval), then
// runs one final persistence flush so shutdown never loses more than the
// current cycle.

use crate::atoms::constants::*;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::EngineConfig;

use crate::engine::coherence::CoherenceTracker;
use crate::engine::goals::GoalBook;
use crate::engine::identity::IdentityKernel;
use crate::engine::interests::InterestMap;
use crate::engine::samples::SampleProvider;
use crate::engine::store::StateStore;
use crate::engine::wisdom::WisdomTracker;

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// ── Task bookkeeping ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Idle,
    Running,
    Stopping,
    Stopped,
}

type PhaseMap = Arc<Mutex<HashMap<&'static str, TaskPhase>>>;

const TASK_NAMES: [&str; 7] = [
    "goal_generation",
    "goal_pursuit",
    "progress_monitor",
    "persistence",
    "interest_decay",
    "curiosity",
    "metrics",
];

// ── Runtime ────────────────────────────────────────────────────────────────

pub struct Runtime {
    store: Arc<StateStore>,
    provider: Arc<dyn SampleProvider>,
    config: EngineConfig,
    identity: IdentityKernel,

    goals: Arc<GoalBook>,
    interests: Arc<InterestMap>,
    wisdom: Arc<WisdomTracker>,
    coherence: Arc<CoherenceTracker>,

    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
    phases: PhaseMap,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Runtime {
    /// Build the runtime: load (or initialize) the identity kernel and the
    /// engine config from the store, then construct every component.
    pub fn new(
        store: Arc<StateStore>,
        provider: Arc<dyn SampleProvider>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        let identity = match store.get_state::<IdentityKernel>(STATE_KEY_IDENTITY_KERNEL) {
            Ok(Some(kernel)) => kernel,
            Ok(None) => {
                let kernel = IdentityKernel::default();
                store.set_state(STATE_KEY_IDENTITY_KERNEL, &kernel)?;
                kernel
            }
            Err(e) if config.fall_back_to_empty => {
                warn!("[runtime] Identity kernel unreadable, starting fresh: {}", e);
                IdentityKernel::default()
            }
            Err(e) => return Err(e),
        };
        store.set_state(STATE_KEY_ENGINE_CONFIG, &config)?;

        let coherence = Arc::new(CoherenceTracker::new(identity.signature.clone()));

        let mut phases = HashMap::new();
        for name in TASK_NAMES {
            phases.insert(name, TaskPhase::Idle);
        }
        let (stop_tx, stop_rx) = watch::channel(false);

        Ok(Runtime {
            store,
            provider,
            config,
            identity,
            goals: Arc::new(GoalBook::new()),
            interests: Arc::new(InterestMap::new()),
            wisdom: Arc::new(WisdomTracker::new()),
            coherence,
            stop_tx,
            stop_rx,
            phases: Arc::new(Mutex::new(phases)),
            handles: Mutex::new(Vec::new()),
        })
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Restore persisted state, run goal generation once, then spawn the
    /// seven periodic tasks.
    pub async fn start(&self) -> EngineResult<()> {
        info!(
            "[runtime] Starting engine for '{}' ({})",
            self.identity.name,
            &self.identity.signature[..12.min(self.identity.signature.len())]
        );

        self.restore_components()?;
        if self.interests.metrics().active_interests == 0 {
            self.interests.seed_defaults();
        }

        // First generation pass runs immediately rather than one interval in.
        generation_cycle(&self.goals, &self.interests, &self.identity);

        self.spawn_generation();
        self.spawn_pursuit();
        self.spawn_monitor();
        self.spawn_persistence();
        self.spawn_decay();
        self.spawn_curiosity();
        self.spawn_metrics();

        Ok(())
    }

    /// Signal every task, wait for them to finish, then flush once more.
    /// The signal interrupts waits in progress, so this returns promptly
    /// regardless of how long the task intervals are.
    pub async fn stop(&self) {
        info!("[runtime] Stopping engine");
        let _ = self.stop_tx.send(true);
        {
            let mut phases = self.phases.lock();
            for phase in phases.values_mut() {
                if *phase == TaskPhase::Running {
                    *phase = TaskPhase::Stopping;
                }
            }
        }

        let handles: Vec<JoinHandle<()>> = self.handles.lock().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!("[runtime] Task join failed: {}", e);
            }
        }

        if let Err(e) = self.flush() {
            error!("[runtime] Final flush failed: {}", e);
        }
        info!("[runtime] Engine stopped");
    }

    fn restore_components(&self) -> EngineResult<()> {
        for (name, result) in [
            ("goals", self.goals.restore(&self.store)),
            ("interests", self.interests.restore(&self.store)),
            ("wisdom", self.wisdom.restore(&self.store)),
            ("coherence", self.coherence.restore(&self.store)),
        ] {
            match result {
                Ok(()) => {}
                Err(e) if self.config.fall_back_to_empty => {
                    warn!("[runtime] {} state unreadable, starting empty: {}", name, e);
                }
                Err(e) => {
                    return Err(EngineError::Config(format!(
                        "failed to restore {} state: {}",
                        name, e
                    )))
                }
            }
        }
        Ok(())
    }

    /// One full persistence pass. In-memory state stays authoritative; a
    /// failed write is retried on the next pass.
    pub fn flush(&self) -> EngineResult<()> {
        self.goals.persist(&self.store)?;
        self.interests.persist(&self.store)?;
        self.wisdom.persist(&self.store)?;
        self.coherence.persist(&self.store)?;
        store_identity(&self.store, &self.identity)?;
        debug!("[runtime] Flushed all component state");
        Ok(())
    }

    // ── Periodic tasks ──────────────────────────────────────────────────

    fn spawn_generation(&self) {
        let goals = self.goals.clone();
        let interests = self.interests.clone();
        let identity = self.identity.clone();
        let period = self.config.goal_generation_interval();
        self.spawn("goal_generation", period, move || {
            generation_cycle(&goals, &interests, &identity);
        });
    }

    fn spawn_pursuit(&self) {
        let goals = self.goals.clone();
        let period = self.config.goal_pursuit_interval();
        self.spawn("goal_pursuit", period, move || {
            goals.pursue_goals();
        });
    }

    fn spawn_monitor(&self) {
        let goals = self.goals.clone();
        let period = self.config.progress_monitor_interval();
        self.spawn("progress_monitor", period, move || {
            goals.monitor_progress();
        });
    }

    fn spawn_persistence(&self) {
        let goals = self.goals.clone();
        let interests = self.interests.clone();
        let wisdom = self.wisdom.clone();
        let coherence = self.coherence.clone();
        let store = self.store.clone();
        let period = self.config.persistence_interval();
        self.spawn("persistence", period, move || {
            for (name, result) in [
                ("goals", goals.persist(&store)),
                ("interests", interests.persist(&store)),
                ("wisdom", wisdom.persist(&store)),
                ("coherence", coherence.persist(&store)),
            ] {
                if let Err(e) = result {
                    warn!("[runtime] Persisting {} failed, will retry: {}", name, e);
                }
            }
        });
    }

    fn spawn_decay(&self) {
        let interests = self.interests.clone();
        let period = self.config.interest_decay_interval();
        self.spawn("interest_decay", period, move || {
            interests.decay();
        });
    }

    fn spawn_curiosity(&self) {
        let interests = self.interests.clone();
        let period = self.config.curiosity_interval();
        self.spawn("curiosity", period, move || {
            let level = interests.evolve_curiosity();
            debug!("[runtime] Curiosity level {:.2}", level);
        });
    }

    fn spawn_metrics(&self) {
        let provider = self.provider.clone();
        let wisdom = self.wisdom.clone();
        let coherence = self.coherence.clone();
        let mut stop = self.stop_rx.clone();
        let phases = self.phases.clone();
        let period = self.config.metric_update_interval();

        let handle = tokio::spawn(async move {
            phases.lock().insert("metrics", TaskPhase::Running);
            // First tick lands one full period in; startup work already ran.
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = interval.tick() => {
                        match provider.wisdom_samples().await {
                            Ok(samples) => wisdom.update(&samples),
                            Err(e) => warn!("[runtime] Wisdom samples unavailable: {}", e),
                        }
                        match provider.coherence_samples().await {
                            Ok(samples) => coherence.update(&samples),
                            Err(e) => warn!("[runtime] Coherence samples unavailable: {}", e),
                        }
                    }
                }
            }
            phases.lock().insert("metrics", TaskPhase::Stopped);
        });
        self.handles.lock().push(handle);
    }

    /// Spawn a synchronous periodic cycle wired to the stop signal. The
    /// signal races the tick, so a pending wait ends as soon as stop fires.
    fn spawn<F>(&self, name: &'static str, period: Duration, mut cycle: F)
    where
        F: FnMut() + Send + 'static,
    {
        let mut stop = self.stop_rx.clone();
        let phases = self.phases.clone();
        let handle = tokio::spawn(async move {
            phases.lock().insert(name, TaskPhase::Running);
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = interval.tick() => cycle(),
                }
            }
            phases.lock().insert(name, TaskPhase::Stopped);
        });
        self.handles.lock().push(handle);
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn goals(&self) -> &Arc<GoalBook> {
        &self.goals
    }

    pub fn interests(&self) -> &Arc<InterestMap> {
        &self.interests
    }

    pub fn wisdom(&self) -> &Arc<WisdomTracker> {
        &self.wisdom
    }

    pub fn coherence(&self) -> &Arc<CoherenceTracker> {
        &self.coherence
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn identity(&self) -> &IdentityKernel {
        &self.identity
    }

    pub fn task_phases(&self) -> HashMap<&'static str, TaskPhase> {
        self.phases.lock().clone()
    }
}

/// One generation pass: try the identity template list first; if nothing
/// came of it and there is room, derive a goal from the strongest interest.
fn generation_cycle(goals: &GoalBook, interests: &InterestMap, identity: &IdentityKernel) {
    if goals.generate_goals(identity).is_some() {
        return;
    }
    if goals.active_count() >= MAX_ACTIVE_GOALS {
        return;
    }
    if let Some(top) = interests.strongest_interests(1).into_iter().next() {
        let goal = interests.goal_from_interest(&top);
        goals.adopt_goal(goal);
    }
}

fn store_identity(store: &StateStore, identity: &IdentityKernel) -> EngineResult<()> {
    store.set_state(STATE_KEY_IDENTITY_KERNEL, identity)
}
