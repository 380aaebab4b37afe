// End-to-end engine tests: a real temp-file store, a scripted sample
// provider, and full runtime start/stop cycles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use telos::{
    CoherenceSamples, EngineConfig, EngineError, EngineResult, GoalStatus, MemoryEcho,
    Runtime, SampleProvider, StateStore, StaticSampleProvider, TaskPhase, WisdomSamples,
};

// ── Scripted providers ─────────────────────────────────────────────────────

/// Returns a climbing sequence of readings so successive metric cycles are
/// distinguishable.
struct ScriptedProvider {
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new() -> Self {
        ScriptedProvider {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SampleProvider for ScriptedProvider {
    async fn wisdom_samples(&self) -> EngineResult<WisdomSamples> {
        let step = self.calls.fetch_add(1, Ordering::Relaxed) as f64;
        let value = (0.4 + step * 0.05).min(1.0);
        Ok(WisdomSamples {
            depth: value,
            breadth: value,
            integration: value,
            application: value,
            insight: value,
            ethics: value,
            temporal_horizon: value,
        })
    }

    async fn coherence_samples(&self) -> EngineResult<CoherenceSamples> {
        Ok(CoherenceSamples {
            continuity: 1.0,
            consistency: 1.0,
            authenticity: 1.0,
        })
    }
}

struct FailingProvider;

#[async_trait]
impl SampleProvider for FailingProvider {
    async fn wisdom_samples(&self) -> EngineResult<WisdomSamples> {
        Err(EngineError::provider("cognitive subsystem offline"))
    }

    async fn coherence_samples(&self) -> EngineResult<CoherenceSamples> {
        Err(EngineError::provider("cognitive subsystem offline"))
    }
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        goal_generation_secs: 1,
        goal_pursuit_secs: 1,
        progress_monitor_secs: 1,
        persistence_secs: 1,
        interest_decay_secs: 1,
        curiosity_secs: 1,
        metric_update_secs: 1,
        fall_back_to_empty: false,
    }
}

// ── Goal lifecycle ─────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn goal_lifecycle_runs_to_completion() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(StateStore::open(dir.path().join("engine.db")).unwrap());
    let provider = Arc::new(StaticSampleProvider::default());

    let runtime = Runtime::new(store, provider, fast_config()).unwrap();
    runtime.start().await.unwrap();

    // Startup generation produced the first identity goal.
    let book = runtime.goals();
    let active = book.active_goals();
    assert_eq!(active.len(), 1);
    let goal_id = active[0].id.clone();

    // One pursuit pass activates the goal and attaches its seeded action.
    book.pursue_goals();
    let goal = book.goal(&goal_id).unwrap();
    assert_eq!(goal.status, GoalStatus::InProgress);
    let action_id = goal.next_action_id.clone().expect("tracked action");

    // Execute the action and every milestone externally.
    book.record_action_result(&goal_id, &action_id, "first insight extracted", true)
        .unwrap();
    let goal = book.goal(&goal_id).unwrap();
    assert!(goal.next_action_id.is_none());

    for milestone in &goal.milestones {
        book.complete_milestone(&goal_id, &milestone.id).unwrap();
    }

    // Progress tracks completed/total at every observation, and monitoring
    // is the only completion path.
    let finished = book.monitor_progress();
    assert_eq!(finished, 1);

    let goal = book.goal(&goal_id).unwrap();
    assert_eq!(goal.status, GoalStatus::Completed);
    assert!((goal.progress - 1.0).abs() < 1e-12);
    assert!(goal.completed_at.is_some());
    assert_eq!(goal.lessons_learned, vec!["first insight extracted".to_string()]);
    assert!(book.active_goals().iter().all(|g| g.id != goal_id));

    let metrics = book.metrics();
    assert_eq!(metrics.goals_completed, 1);

    runtime.stop().await;
}

// ── Metric flow ────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn metric_cycles_feed_wisdom_and_coherence() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(StateStore::open(dir.path().join("engine.db")).unwrap());
    let provider = Arc::new(ScriptedProvider::new());

    let runtime = Runtime::new(store, provider, fast_config()).unwrap();
    runtime.start().await.unwrap();

    // Let a few 1-second metric ticks land.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    runtime.stop().await;

    assert!(runtime.wisdom().snapshot_count() >= 1);
    // Uniform samples: overall equals the sample value, coherence is perfect.
    let snapshot = runtime.wisdom().latest_snapshot().unwrap();
    assert!((snapshot.coherence - 1.0).abs() < 1e-9);
    let value = snapshot.dimension_values[0];
    assert!((snapshot.overall_wisdom - value).abs() < 1e-9);

    assert!((runtime.coherence().coherence() - 1.0).abs() < 1e-12);
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_failure_skips_cycles_without_stopping() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(StateStore::open(dir.path().join("engine.db")).unwrap());
    let provider = Arc::new(FailingProvider);

    let runtime = Runtime::new(store, provider, fast_config()).unwrap();
    runtime.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    runtime.stop().await;

    // No metric ever landed, but every task still ran and stopped cleanly.
    assert_eq!(runtime.wisdom().snapshot_count(), 0);
    assert_eq!(runtime.coherence().snapshot_count(), 0);
    for (name, phase) in runtime.task_phases() {
        assert_eq!(phase, TaskPhase::Stopped, "task {} not stopped", name);
    }
}

// ── Durability ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.db");

    let (goal_id, signature) = {
        let store = Arc::new(StateStore::open(&path).unwrap());
        let provider = Arc::new(StaticSampleProvider::default());
        let runtime = Runtime::new(store, provider, fast_config()).unwrap();
        runtime.start().await.unwrap();

        runtime
            .interests()
            .record_engagement("storage engines", 0.7)
            .unwrap();
        runtime.coherence().record_memory_echo(MemoryEcho {
            timestamp: chrono::Utc::now(),
            content: "first run".to_string(),
            emotional_tone: Default::default(),
            strategic_shift: String::new(),
            pattern_recognized: String::new(),
            anomaly_detected: String::new(),
            echo_signature: String::new(),
            context: String::new(),
        });

        let goal_id = runtime.goals().active_goals()[0].id.clone();
        let signature = runtime.identity().signature.clone();
        runtime.stop().await;
        (goal_id, signature)
    };

    let store = Arc::new(StateStore::open(&path).unwrap());
    let provider = Arc::new(StaticSampleProvider::default());
    let runtime = Runtime::new(store, provider, fast_config()).unwrap();
    runtime.start().await.unwrap();

    assert_eq!(runtime.identity().signature, signature);
    assert!(runtime.goals().goal(&goal_id).is_some());
    let pattern = runtime.interests().pattern("storage engines").unwrap();
    assert_eq!(pattern.engagement_count, 1);
    assert_eq!(runtime.coherence().echo_count(), 1);

    runtime.stop().await;
}

// ── Thought retention ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn thought_log_retention_through_the_runtime() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(StateStore::open(dir.path().join("engine.db")).unwrap());
    let provider = Arc::new(StaticSampleProvider::default());
    let runtime = Runtime::new(store, provider, fast_config()).unwrap();

    for i in 0..1200 {
        runtime
            .store()
            .save_thought(&format!("thought {}", i), "stream", &[], &[], 0.5)
            .unwrap();
    }

    let stats = runtime.store().stats().unwrap();
    assert_eq!(stats.thought_count, 1000);

    let recent = runtime.store().recent_thoughts(2000).unwrap();
    assert_eq!(recent.len(), 1000);
    assert!(recent.iter().all(|t| {
        let n: u32 = t.content.trim_start_matches("thought ").parse().unwrap();
        n >= 200
    }));
}
