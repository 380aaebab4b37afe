// Telos: autonomous goal orchestration and self-assessment engine.
//
// Layering:
//   atoms/   pure constants, types, and errors (no I/O)
//   engine/  stateful components: store, identity, goals, interests,
//            wisdom, coherence, sample provider, runtime
//
// The crate exposes the engine as a library; the `telosd` binary is thin
// glue that opens the store and runs the runtime until interrupted.

pub mod atoms;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::{
    Action, ActionStatus, CoherenceSamples, CoherenceSnapshot, CultivationEvent,
    DimensionState, EngineConfig, Goal, GoalCategory, GoalMetrics, GoalSource, GoalStatus,
    GoalSummary, InterestGoalKind, InterestMetrics, InterestPattern, MemoryEcho,
    MemoryRecord, Milestone, StoreStats, ThoughtRecord, WisdomDimension, WisdomSamples,
    WisdomSnapshot,
};

pub use engine::coherence::CoherenceTracker;
pub use engine::goals::GoalBook;
pub use engine::identity::IdentityKernel;
pub use engine::interests::InterestMap;
pub use engine::runtime::{Runtime, TaskPhase};
pub use engine::samples::{SampleProvider, StaticSampleProvider};
pub use engine::store::StateStore;
pub use engine::wisdom::WisdomTracker;
