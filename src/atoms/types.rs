// ── Telos Atoms: Pure Data Types ───────────────────────────────────────────
// All plain struct/enum definitions with no logic beyond trivial conversions.
// Atoms layer rule: no I/O, no side effects, no imports from engine/.
//
// One canonical definition per concept. The only external-facing shape is
// GoalSummary, produced via `From<&Goal>`; reporting front ends never see
// the rich internal Goal record directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::atoms::constants::*;

// ── Goals ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    WisdomCultivation,
    SkillDevelopment,
    KnowledgeGrowth,
    SelfImprovement,
    Exploration,
    Creation,
    Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Planned,
    Active,
    InProgress,
    Paused,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Where a goal came from: the fixed identity template list, or a specific
/// interest topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum GoalSource {
    IdentityKernel,
    Interest { topic: String },
}

/// A discrete checkpoint within a goal. Immutable once completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// An atomic unit of work pursued to progress a milestone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A tracked unit of autonomous intent with milestones and actions.
///
/// Invariants maintained by the orchestrator:
///   • progress == completed milestones / total milestones (when any exist)
///   • Completed is terminal; status and progress never regress
///   • at most one pending "next action" is tracked at a time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    // Definition
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    /// 1–10
    pub priority: u8,

    // Progress
    pub status: GoalStatus,
    /// 0.0–1.0
    pub progress: f64,

    // Structure
    pub success_criteria: Vec<String>,
    pub milestones: Vec<Milestone>,
    pub actions: Vec<Action>,
    /// Id of the single tracked pending action, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action_id: Option<String>,

    // Provenance
    pub derived_from: GoalSource,
    #[serde(default)]
    pub related_goals: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    // Retrospective
    #[serde(default)]
    pub lessons_learned: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
}

/// Simplified external-facing goal record for reporting front ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSummary {
    pub id: String,
    pub title: String,
    pub category: GoalCategory,
    pub status: GoalStatus,
    pub progress: f64,
    pub priority: u8,
}

impl From<&Goal> for GoalSummary {
    fn from(goal: &Goal) -> Self {
        GoalSummary {
            id: goal.id.clone(),
            title: goal.title.clone(),
            category: goal.category,
            status: goal.status,
            progress: goal.progress,
            priority: goal.priority,
        }
    }
}

/// Orchestrator counters exposed to reporting front ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalMetrics {
    pub goals_generated: u64,
    pub goals_completed: u64,
    pub goals_abandoned: u64,
    pub active_goals: usize,
    pub completed_goals: usize,
    pub abandoned_goals: usize,
}

// ── Interest model ─────────────────────────────────────────────────────────

/// A decaying, reinforcing record of engagement with a topic.
/// Never deleted, only decayed toward zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestPattern {
    pub topic: String,
    /// All in [0, 1].
    pub strength: f64,
    pub recency: f64,
    pub depth: f64,
    pub novelty: f64,
    pub utility: f64,
    pub last_engaged: DateTime<Utc>,
    pub engagement_count: u64,
    #[serde(default)]
    pub related_topics: Vec<String>,
}

/// Classification of a goal derived from an interest pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestGoalKind {
    Exploration,
    Learning,
    Discussion,
}

impl InterestGoalKind {
    pub fn label(&self) -> &'static str {
        match self {
            InterestGoalKind::Exploration => "exploration",
            InterestGoalKind::Learning => "learning",
            InterestGoalKind::Discussion => "discussion",
        }
    }
}

/// Interest-model counters exposed to reporting front ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterestMetrics {
    pub goals_generated: u64,
    pub exploration_goals: u64,
    pub learning_goals: u64,
    pub discussion_goals: u64,
    pub curiosity_level: f64,
    pub active_interests: usize,
}

// ── Wisdom accumulator ─────────────────────────────────────────────────────

/// One of the seven fixed-weight wisdom dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WisdomDimension {
    KnowledgeDepth,
    KnowledgeBreadth,
    IntegrationLevel,
    PracticalApplication,
    ReflectiveInsight,
    EthicalConsideration,
    TemporalPerspective,
}

impl WisdomDimension {
    pub const ALL: [WisdomDimension; 7] = [
        WisdomDimension::KnowledgeDepth,
        WisdomDimension::KnowledgeBreadth,
        WisdomDimension::IntegrationLevel,
        WisdomDimension::PracticalApplication,
        WisdomDimension::ReflectiveInsight,
        WisdomDimension::EthicalConsideration,
        WisdomDimension::TemporalPerspective,
    ];

    /// Fixed weight of this dimension in the overall wisdom score.
    pub fn weight(&self) -> f64 {
        WISDOM_WEIGHTS[*self as usize]
    }

    pub fn label(&self) -> &'static str {
        match self {
            WisdomDimension::KnowledgeDepth => "Knowledge Depth",
            WisdomDimension::KnowledgeBreadth => "Knowledge Breadth",
            WisdomDimension::IntegrationLevel => "Integration Level",
            WisdomDimension::PracticalApplication => "Practical Application",
            WisdomDimension::ReflectiveInsight => "Reflective Insight",
            WisdomDimension::EthicalConsideration => "Ethical Consideration",
            WisdomDimension::TemporalPerspective => "Temporal Perspective",
        }
    }
}

/// Tracked state of a single wisdom dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionState {
    /// Current value in [0, 1].
    pub value: f64,
    /// Last observed delta.
    pub trend: f64,
    pub last_update: DateTime<Utc>,
    pub update_count: u64,
    /// Rolling history, bounded by DIMENSION_HISTORY_CAP.
    pub history: Vec<f64>,
    /// Cultivation target.
    pub target: f64,
}

/// A logged record of a significant (>0.1) change in a wisdom dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CultivationEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: String,
    pub dimension: WisdomDimension,
    pub impact: f64,
    pub description: String,
}

/// Point-in-time capture of the full wisdom state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WisdomSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Seven values in WisdomDimension::ALL order.
    pub dimension_values: [f64; 7],
    pub overall_wisdom: f64,
    pub coherence: f64,
}

// ── Coherence accumulator ──────────────────────────────────────────────────

/// Point-in-time capture of the identity-coherence state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoherenceSnapshot {
    pub timestamp: DateTime<Utc>,
    pub coherence: f64,
    pub continuity: f64,
    pub consistency: f64,
    pub authenticity: f64,
}

/// Audit-only memory record appended on demand.
/// Never feeds back into the coherence formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEcho {
    pub timestamp: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub emotional_tone: HashMap<String, f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub strategic_shift: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern_recognized: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub anomaly_detected: String,
    /// Content-derived signature; filled in on record when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub echo_signature: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

// ── External collaborator inputs ───────────────────────────────────────────

/// The seven raw wisdom-dimension inputs, produced by an external cognitive
/// subsystem. The engine clamps but never computes these.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WisdomSamples {
    pub depth: f64,
    pub breadth: f64,
    pub integration: f64,
    pub application: f64,
    pub insight: f64,
    pub ethics: f64,
    pub temporal_horizon: f64,
}

impl WisdomSamples {
    /// Values in WisdomDimension::ALL order.
    pub fn as_array(&self) -> [f64; 7] {
        [
            self.depth,
            self.breadth,
            self.integration,
            self.application,
            self.insight,
            self.ethics,
            self.temporal_horizon,
        ]
    }
}

/// The three coherence inputs, produced by an external cognitive subsystem.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CoherenceSamples {
    pub continuity: f64,
    pub consistency: f64,
    pub authenticity: f64,
}

// ── Persistent store records ───────────────────────────────────────────────

/// A persisted thought: one row of the capped append log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtRecord {
    pub id: i64,
    pub content: String,
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub context: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub importance: f64,
}

/// A persisted memory, retrievable by minimum strength.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: i64,
    pub content: String,
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub strength: f64,
    #[serde(default)]
    pub associations: Vec<String>,
}

/// Store-wide statistics for reporting front ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub thought_count: i64,
    pub memory_count: i64,
    pub goal_count: i64,
    pub interest_count: i64,
    pub db_size_bytes: i64,
}

// ── Engine configuration ───────────────────────────────────────────────────

/// All tick intervals plus the startup fallback flag. Serialized into the
/// store's state table under STATE_KEY_ENGINE_CONFIG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub goal_generation_secs: u64,
    pub goal_pursuit_secs: u64,
    pub progress_monitor_secs: u64,
    pub persistence_secs: u64,
    pub interest_decay_secs: u64,
    pub curiosity_secs: u64,
    pub metric_update_secs: u64,
    /// When true, a missing or unreadable persisted state at startup falls
    /// back to an empty initial state instead of failing.
    pub fall_back_to_empty: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            goal_generation_secs: DEFAULT_GOAL_GENERATION_INTERVAL.as_secs(),
            goal_pursuit_secs: DEFAULT_GOAL_PURSUIT_INTERVAL.as_secs(),
            progress_monitor_secs: DEFAULT_PROGRESS_MONITOR_INTERVAL.as_secs(),
            persistence_secs: DEFAULT_PERSISTENCE_INTERVAL.as_secs(),
            interest_decay_secs: DEFAULT_INTEREST_DECAY_INTERVAL.as_secs(),
            curiosity_secs: DEFAULT_CURIOSITY_INTERVAL.as_secs(),
            metric_update_secs: DEFAULT_METRIC_UPDATE_INTERVAL.as_secs(),
            fall_back_to_empty: false,
        }
    }
}

impl EngineConfig {
    pub fn goal_generation_interval(&self) -> Duration {
        Duration::from_secs(self.goal_generation_secs.max(1))
    }
    pub fn goal_pursuit_interval(&self) -> Duration {
        Duration::from_secs(self.goal_pursuit_secs.max(1))
    }
    pub fn progress_monitor_interval(&self) -> Duration {
        Duration::from_secs(self.progress_monitor_secs.max(1))
    }
    pub fn persistence_interval(&self) -> Duration {
        Duration::from_secs(self.persistence_secs.max(1))
    }
    pub fn interest_decay_interval(&self) -> Duration {
        Duration::from_secs(self.interest_decay_secs.max(1))
    }
    pub fn curiosity_interval(&self) -> Duration {
        Duration::from_secs(self.curiosity_secs.max(1))
    }
    pub fn metric_update_interval(&self) -> Duration {
        Duration::from_secs(self.metric_update_secs.max(1))
    }
}

// ── Small shared helpers ───────────────────────────────────────────────────

/// Clamp a float to [lo, hi].
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Clamp a score to the unit interval.
pub fn clamp_unit(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}
