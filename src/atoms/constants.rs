// ── Telos Atoms: Constants ─────────────────────────────────────────────────
// All named constants for the crate live here.
// Rationale: collecting constants in one place eliminates magic numbers,
// makes auditing easier, and keeps every layer's code self-documenting.
//
// The metric weights below are canonical configuration values carried over
// for behavioral parity. Treat them as stable identifiers: changing any of
// them changes every derived score and invalidates persisted snapshots.

use std::time::Duration;

// ── Goal orchestration ─────────────────────────────────────────────────────
// An invocation of goal generation is a no-op at or above the ceiling, and
// creates at most one goal below it, which bounds goal-list growth.
pub const MAX_ACTIVE_GOALS: usize = 5;

// ── Interest model ─────────────────────────────────────────────────────────
// Composite interest score: strength*W + novelty*W + utility*W + recency*W.
// The four weights sum to 1.0.
pub const INTEREST_STRENGTH_WEIGHT: f64 = 0.4;
pub const INTEREST_NOVELTY_WEIGHT: f64 = 0.3;
pub const INTEREST_UTILITY_WEIGHT: f64 = 0.2;
pub const INTEREST_RECENCY_WEIGHT: f64 = 0.1;

/// Patterns scoring at or below this composite are never returned.
pub const MIN_INTEREST_THRESHOLD: f64 = 0.4;

/// Hours for the recency score to fall to 1/e.
pub const RECENCY_DECAY_HOURS: f64 = 24.0;

/// Depth below which a pattern counts as shallow and earns the curiosity bonus.
pub const SHALLOW_DEPTH_THRESHOLD: f64 = 0.3;
/// Novelty above which a pattern counts as novel.
pub const NOVEL_THRESHOLD: f64 = 0.6;
/// Bonus applied to shallow patterns: curiosity_level * this factor.
pub const CURIOSITY_BONUS_FACTOR: f64 = 0.2;

/// Strength added per engagement, clamped to [0, 1].
pub const ENGAGEMENT_STRENGTH_INCREMENT: f64 = 0.1;
/// Seed values for a pattern created on first engagement.
pub const NEW_PATTERN_STRENGTH: f64 = 0.5;
pub const NEW_PATTERN_NOVELTY: f64 = 0.8;
pub const NEW_PATTERN_UTILITY: f64 = 0.5;

/// Idle period after which strength starts decaying.
pub const STRENGTH_DECAY_IDLE_HOURS: f64 = 24.0;
/// Multiplicative decay factors applied per decay interval.
pub const STRENGTH_DECAY_FACTOR: f64 = 0.95;
pub const RECENCY_DECAY_FACTOR: f64 = 0.98;
pub const NOVELTY_DECAY_FACTOR: f64 = 0.99;

/// Curiosity level bounds and per-cycle step.
pub const CURIOSITY_MIN: f64 = 0.3;
pub const CURIOSITY_MAX: f64 = 0.9;
pub const CURIOSITY_STEP: f64 = 0.01;
pub const CURIOSITY_DEFAULT: f64 = 0.7;
/// Unexplored-pattern counts that move the curiosity level.
pub const CURIOSITY_RAISE_ABOVE: usize = 10;
pub const CURIOSITY_LOWER_BELOW: usize = 3;

// ── Wisdom accumulator ─────────────────────────────────────────────────────
// Fixed per-dimension weights, indexed by WisdomDimension discriminant order:
// depth, breadth, integration, application, insight, ethics, temporal.
// Sum is exactly 1.0; asserted in tests.
pub const WISDOM_WEIGHTS: [f64; 7] = [0.15, 0.15, 0.20, 0.15, 0.15, 0.10, 0.10];

/// Absolute per-update delta above which a cultivation event is logged.
pub const SIGNIFICANT_DELTA: f64 = 0.1;
/// Per-dimension rolling history length.
pub const DIMENSION_HISTORY_CAP: usize = 100;
/// Retained wisdom snapshots, oldest discarded first.
pub const WISDOM_SNAPSHOT_CAP: usize = 1000;
/// Retained cultivation events, oldest discarded first.
pub const CULTIVATION_LOG_CAP: usize = 1000;
/// Variance→coherence mapping: coherence = exp(-variance * this factor).
pub const COHERENCE_VARIANCE_SCALE: f64 = 10.0;
/// Baseline every dimension starts from, and the cultivation target.
pub const DIMENSION_BASELINE: f64 = 0.3;
pub const DIMENSION_TARGET: f64 = 0.8;

// ── Coherence accumulator ──────────────────────────────────────────────────
// Overall coherence = continuity*0.30 + consistency*0.40 + authenticity*0.30.
pub const CONTINUITY_WEIGHT: f64 = 0.30;
pub const CONSISTENCY_WEIGHT: f64 = 0.40;
pub const AUTHENTICITY_WEIGHT: f64 = 0.30;

/// Retained coherence snapshots.
pub const COHERENCE_SNAPSHOT_CAP: usize = 1000;
/// Retained memory-echo audit entries, oldest discarded first.
pub const MEMORY_ECHO_CAP: usize = 10_000;

// ── Persistent store ───────────────────────────────────────────────────────
/// Thought append-log retention: inserts beyond this evict the oldest rows.
pub const THOUGHT_LOG_CAP: i64 = 1000;

// ── Default tick intervals (overridable via EngineConfig) ──────────────────
pub const DEFAULT_GOAL_GENERATION_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_GOAL_PURSUIT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PROGRESS_MONITOR_INTERVAL: Duration = Duration::from_secs(2 * 60);
pub const DEFAULT_PERSISTENCE_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_INTEREST_DECAY_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CURIOSITY_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_METRIC_UPDATE_INTERVAL: Duration = Duration::from_secs(30);

// ── State-table keys ───────────────────────────────────────────────────────
// Changing any of these orphans previously persisted blobs.
pub const STATE_KEY_ENGINE_CONFIG: &str = "engine_config";
pub const STATE_KEY_IDENTITY_KERNEL: &str = "identity_kernel";
pub const STATE_KEY_GOAL_COUNTERS: &str = "goal_counters";
pub const STATE_KEY_WISDOM_SNAPSHOT: &str = "wisdom_snapshot";
pub const STATE_KEY_COHERENCE_SNAPSHOT: &str = "coherence_snapshot";
pub const STATE_KEY_WORKING_MEMORY: &str = "working_memory";
