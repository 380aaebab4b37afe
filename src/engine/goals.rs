// Telos Engine: Goal Orchestrator
// The goal lifecycle state machine: generation from identity templates,
// pursuit, action results, milestone completion, progress monitoring,
// abandonment.
//
// Lifecycle: Planned → Active → InProgress → Completed, with Paused and
// Abandoned as side exits. Completed is terminal and is reached through
// exactly one path: monitor_progress observing progress == 1.0.
//
// All state lives behind one RwLock. Persistence clones under the read
// lock and writes after releasing it, so the store is never called with
// a lock held.

use crate::atoms::constants::*;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::*;

use crate::engine::identity::IdentityKernel;
use crate::engine::store::StateStore;

use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Internal state ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GoalCounters {
    generated: u64,
    completed: u64,
    abandoned: u64,
}

#[derive(Default)]
struct GoalState {
    active: Vec<Goal>,
    completed: Vec<Goal>,
    abandoned: Vec<Goal>,
    counters: GoalCounters,
}

/// Goal lifecycle orchestrator.
pub struct GoalBook {
    inner: RwLock<GoalState>,
}

impl Default for GoalBook {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalBook {
    pub fn new() -> Self {
        GoalBook {
            inner: RwLock::new(GoalState::default()),
        }
    }

    // ── Generation ──────────────────────────────────────────────────────

    /// Create at most one goal from the identity template list.
    ///
    /// A no-op at or above the active-goal ceiling. Templates whose title is
    /// already active are skipped silently; the first unused template wins.
    pub fn generate_goals(&self, kernel: &IdentityKernel) -> Option<GoalSummary> {
        let mut state = self.inner.write();

        if state.active.len() >= MAX_ACTIVE_GOALS {
            debug!(
                "[goals] Generation skipped, {} active goals at ceiling",
                state.active.len()
            );
            return None;
        }

        let template = kernel
            .goal_templates()
            .iter()
            .find(|t| !state.active.iter().any(|g| g.title == t.title))?;

        let mut goal = new_goal(
            template.title,
            template.description,
            template.category,
            template.priority,
            template
                .success_criteria
                .iter()
                .map(|c| c.to_string())
                .collect(),
            GoalSource::IdentityKernel,
        );
        decompose(&mut goal);

        info!("[goals] Generated goal '{}' ({})", goal.title, goal.id);
        state.counters.generated += 1;
        let summary = GoalSummary::from(&goal);
        state.active.push(goal);
        Some(summary)
    }

    /// Admit an externally built goal (interest-derived). Rejected silently
    /// at the ceiling or when the title is already active.
    pub fn adopt_goal(&self, mut goal: Goal) -> Option<GoalSummary> {
        let mut state = self.inner.write();

        if state.active.len() >= MAX_ACTIVE_GOALS {
            return None;
        }
        if state.active.iter().any(|g| g.title == goal.title) {
            return None;
        }

        if goal.milestones.is_empty() {
            decompose(&mut goal);
        }
        info!("[goals] Adopted goal '{}' ({})", goal.title, goal.id);
        state.counters.generated += 1;
        let summary = GoalSummary::from(&goal);
        state.active.push(goal);
        Some(summary)
    }

    // ── Pursuit ─────────────────────────────────────────────────────────

    /// Advance every active goal one step. Activation and action pickup
    /// happen in the same pass: a Planned goal becomes Active and, having
    /// just become Active, immediately picks up its first Pending action.
    pub fn pursue_goals(&self) {
        let mut state = self.inner.write();
        let now = Utc::now();

        for goal in state.active.iter_mut() {
            if goal.status == GoalStatus::Planned {
                goal.status = GoalStatus::Active;
                goal.updated_at = now;
                debug!("[goals] '{}' Planned -> Active", goal.title);
            }

            // Paused goals wait; terminal statuses never sit in active.
            let pursuing = matches!(goal.status, GoalStatus::Active | GoalStatus::InProgress);
            if pursuing && goal.next_action_id.is_none() {
                let next = goal
                    .actions
                    .iter_mut()
                    .find(|a| a.status == ActionStatus::Pending);
                if let Some(action) = next {
                    action.status = ActionStatus::InProgress;
                    action.scheduled_at = Some(now);
                    goal.next_action_id = Some(action.id.clone());
                    goal.status = GoalStatus::InProgress;
                    goal.updated_at = now;
                    debug!(
                        "[goals] '{}' pursuing action '{}'",
                        goal.title, action.title
                    );
                }
            }
        }
    }

    /// Record the outcome of an action executed externally.
    ///
    /// Success appends the result to lessons_learned, failure to challenges.
    /// A failed action never abandons the goal.
    pub fn record_action_result(
        &self,
        goal_id: &str,
        action_id: &str,
        result: &str,
        success: bool,
    ) -> EngineResult<()> {
        let mut state = self.inner.write();
        let now = Utc::now();

        let goal = state
            .active
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| EngineError::validation(format!("unknown goal id: {}", goal_id)))?;

        let action = goal
            .actions
            .iter_mut()
            .find(|a| a.id == action_id)
            .ok_or_else(|| {
                EngineError::validation(format!("unknown action id: {}", action_id))
            })?;

        action.status = if success {
            ActionStatus::Completed
        } else {
            ActionStatus::Failed
        };
        action.completed_at = Some(now);
        action.result = result.to_string();

        if goal.next_action_id.as_deref() == Some(action_id) {
            goal.next_action_id = None;
        }

        if success {
            goal.lessons_learned.push(result.to_string());
        } else {
            goal.challenges.push(result.to_string());
            warn!("[goals] Action failed on '{}': {}", goal.title, result);
        }
        goal.updated_at = now;

        Ok(())
    }

    /// Mark a milestone complete. Completed milestones never un-complete,
    /// so repeating the call is a no-op.
    pub fn complete_milestone(&self, goal_id: &str, milestone_id: &str) -> EngineResult<()> {
        let mut state = self.inner.write();
        let now = Utc::now();

        let goal = state
            .active
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| EngineError::validation(format!("unknown goal id: {}", goal_id)))?;

        let milestone = goal
            .milestones
            .iter_mut()
            .find(|m| m.id == milestone_id)
            .ok_or_else(|| {
                EngineError::validation(format!("unknown milestone id: {}", milestone_id))
            })?;

        if !milestone.completed {
            milestone.completed = true;
            milestone.completed_at = Some(now);
            goal.updated_at = now;
            info!(
                "[goals] Milestone '{}' complete on '{}'",
                milestone.title, goal.title
            );
        }
        Ok(())
    }

    // ── Monitoring ──────────────────────────────────────────────────────

    /// Recompute progress for every active goal and retire the ones that
    /// reached 1.0. The only path to Completed.
    pub fn monitor_progress(&self) -> usize {
        let mut state = self.inner.write();
        let now = Utc::now();

        for goal in state.active.iter_mut() {
            if goal.milestones.is_empty() {
                continue;
            }
            let done = goal.milestones.iter().filter(|m| m.completed).count();
            goal.progress = done as f64 / goal.milestones.len() as f64;
        }

        let mut finished = Vec::new();
        let mut remaining = Vec::new();
        for goal in state.active.drain(..) {
            if !goal.milestones.is_empty() && goal.progress >= 1.0 {
                finished.push(goal);
            } else {
                remaining.push(goal);
            }
        }
        state.active = remaining;

        let count = finished.len();
        for mut goal in finished {
            goal.status = GoalStatus::Completed;
            goal.progress = 1.0;
            goal.completed_at = Some(now);
            goal.updated_at = now;
            info!("[goals] Goal completed: '{}'", goal.title);
            state.counters.completed += 1;
            state.completed.push(goal);
        }
        count
    }

    /// Give up on a goal. External callers only; the engine never abandons
    /// on its own.
    pub fn abandon_goal(&self, goal_id: &str) -> EngineResult<()> {
        let mut state = self.inner.write();
        let now = Utc::now();

        let index = state
            .active
            .iter()
            .position(|g| g.id == goal_id)
            .ok_or_else(|| EngineError::validation(format!("unknown goal id: {}", goal_id)))?;

        let mut goal = state.active.remove(index);
        goal.status = GoalStatus::Abandoned;
        goal.updated_at = now;
        info!("[goals] Goal abandoned: '{}'", goal.title);
        state.counters.abandoned += 1;
        state.abandoned.push(goal);
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn active_goals(&self) -> Vec<GoalSummary> {
        self.inner.read().active.iter().map(GoalSummary::from).collect()
    }

    pub fn completed_goals(&self) -> Vec<GoalSummary> {
        self.inner
            .read()
            .completed
            .iter()
            .map(GoalSummary::from)
            .collect()
    }

    pub fn abandoned_goals(&self) -> Vec<GoalSummary> {
        self.inner
            .read()
            .abandoned
            .iter()
            .map(GoalSummary::from)
            .collect()
    }

    /// Full goal document by id, searched across all three lists.
    pub fn goal(&self, goal_id: &str) -> Option<Goal> {
        let state = self.inner.read();
        state
            .active
            .iter()
            .chain(state.completed.iter())
            .chain(state.abandoned.iter())
            .find(|g| g.id == goal_id)
            .cloned()
    }

    pub fn active_count(&self) -> usize {
        self.inner.read().active.len()
    }

    pub fn metrics(&self) -> GoalMetrics {
        let state = self.inner.read();
        GoalMetrics {
            goals_generated: state.counters.generated,
            goals_completed: state.counters.completed,
            goals_abandoned: state.counters.abandoned,
            active_goals: state.active.len(),
            completed_goals: state.completed.len(),
            abandoned_goals: state.abandoned.len(),
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Write every goal document and the counters to the store. State is
    /// cloned under the read lock first; the store is called lock-free.
    pub fn persist(&self, store: &StateStore) -> EngineResult<()> {
        let (goals, counters) = {
            let state = self.inner.read();
            let goals: Vec<Goal> = state
                .active
                .iter()
                .chain(state.completed.iter())
                .chain(state.abandoned.iter())
                .cloned()
                .collect();
            (goals, state.counters.clone())
        };

        for goal in &goals {
            store.save_goal(goal)?;
        }
        store.set_state(STATE_KEY_GOAL_COUNTERS, &counters)?;
        debug!("[goals] Persisted {} goal documents", goals.len());
        Ok(())
    }

    /// Reload all goals from the store, partitioned by status.
    pub fn restore(&self, store: &StateStore) -> EngineResult<()> {
        let goals = store.load_goals()?;
        let counters: GoalCounters = store
            .get_state(STATE_KEY_GOAL_COUNTERS)?
            .unwrap_or_default();

        let mut state = self.inner.write();
        state.active.clear();
        state.completed.clear();
        state.abandoned.clear();
        state.counters = counters;

        for goal in goals {
            match goal.status {
                GoalStatus::Completed => state.completed.push(goal),
                GoalStatus::Abandoned => state.abandoned.push(goal),
                _ => state.active.push(goal),
            }
        }
        info!(
            "[goals] Restored {} active, {} completed, {} abandoned",
            state.active.len(),
            state.completed.len(),
            state.abandoned.len()
        );
        Ok(())
    }
}

// ── Goal construction ──────────────────────────────────────────────────────

/// Build a fresh Planned goal with no structure yet.
pub(crate) fn new_goal(
    title: &str,
    description: &str,
    category: GoalCategory,
    priority: u8,
    success_criteria: Vec<String>,
    derived_from: GoalSource,
) -> Goal {
    let now = Utc::now();
    Goal {
        id: Uuid::new_v4().to_string(),
        created_at: now,
        updated_at: now,
        completed_at: None,
        title: title.to_string(),
        description: description.to_string(),
        category,
        priority: priority.clamp(1, 10),
        status: GoalStatus::Planned,
        progress: 0.0,
        success_criteria,
        milestones: Vec::new(),
        actions: Vec::new(),
        next_action_id: None,
        derived_from,
        related_goals: Vec::new(),
        metadata: Default::default(),
        lessons_learned: Vec::new(),
        challenges: Vec::new(),
    }
}

/// Decompose a goal into structure: one milestone per success criterion and
/// a single Pending action seeding work on the first milestone.
pub(crate) fn decompose(goal: &mut Goal) {
    for (i, criterion) in goal.success_criteria.iter().enumerate() {
        goal.milestones.push(Milestone {
            id: Uuid::new_v4().to_string(),
            title: criterion.clone(),
            completed: false,
            completed_at: None,
        });

        if i == 0 {
            goal.actions.push(Action {
                id: Uuid::new_v4().to_string(),
                title: format!("Begin work on: {}", criterion),
                description: format!("Take first steps toward achieving: {}", criterion),
                status: ActionStatus::Pending,
                scheduled_at: None,
                completed_at: None,
                result: String::new(),
                metadata: Default::default(),
            });
        }
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    /// A decomposed Planned goal for store and runtime tests.
    pub(crate) fn sample_goal(title: &str, criteria: &[&str]) -> Goal {
        let mut goal = new_goal(
            title,
            "test goal",
            GoalCategory::Exploration,
            5,
            criteria.iter().map(|c| c.to_string()).collect(),
            GoalSource::IdentityKernel,
        );
        decompose(&mut goal);
        goal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel() -> IdentityKernel {
        IdentityKernel::default()
    }

    #[test]
    fn generation_creates_one_goal_per_invocation() {
        let book = GoalBook::new();
        let k = kernel();

        let first = book.generate_goals(&k).expect("goal created");
        assert_eq!(first.status, GoalStatus::Planned);
        assert_eq!(book.active_count(), 1);

        // Next invocation skips the duplicate title and takes the next template.
        let second = book.generate_goals(&k).expect("second goal");
        assert_ne!(first.title, second.title);
        assert_eq!(book.active_count(), 2);
    }

    #[test]
    fn generation_is_noop_at_ceiling() {
        let book = GoalBook::new();
        let k = kernel();
        for _ in 0..MAX_ACTIVE_GOALS {
            book.generate_goals(&k).expect("under ceiling");
        }
        assert_eq!(book.active_count(), MAX_ACTIVE_GOALS);
        assert!(book.generate_goals(&k).is_none());
        assert_eq!(book.active_count(), MAX_ACTIVE_GOALS);
        assert_eq!(book.metrics().goals_generated, MAX_ACTIVE_GOALS as u64);
    }

    #[test]
    fn decomposition_matches_success_criteria() {
        let book = GoalBook::new();
        let summary = book.generate_goals(&kernel()).unwrap();
        let goal = book.goal(&summary.id).unwrap();

        assert_eq!(goal.milestones.len(), goal.success_criteria.len());
        assert_eq!(goal.actions.len(), 1);
        assert_eq!(goal.actions[0].status, ActionStatus::Pending);
        assert!(goal.actions[0].title.contains(&goal.success_criteria[0]));
        assert!(goal.next_action_id.is_none());
    }

    #[test]
    fn pursuit_activates_and_picks_first_pending_action() {
        let book = GoalBook::new();
        let summary = book.generate_goals(&kernel()).unwrap();

        // One pass both activates and attaches the first pending action.
        book.pursue_goals();
        let goal = book.goal(&summary.id).unwrap();
        assert_eq!(goal.status, GoalStatus::InProgress);
        let next = goal.next_action_id.as_deref().expect("tracked action");
        assert_eq!(next, goal.actions[0].id);
        assert_eq!(goal.actions[0].status, ActionStatus::InProgress);

        // No second pending action exists, so pursuing again changes nothing.
        book.pursue_goals();
        let again = book.goal(&summary.id).unwrap();
        assert_eq!(again.next_action_id.as_deref(), Some(goal.actions[0].id.as_str()));
    }

    #[test]
    fn action_results_accumulate_retrospective() {
        let book = GoalBook::new();
        let summary = book.generate_goals(&kernel()).unwrap();
        book.pursue_goals();

        let goal = book.goal(&summary.id).unwrap();
        let action_id = goal.next_action_id.clone().unwrap();

        book.record_action_result(&summary.id, &action_id, "found three patterns", true)
            .unwrap();

        let goal = book.goal(&summary.id).unwrap();
        assert!(goal.next_action_id.is_none());
        assert_eq!(goal.actions[0].status, ActionStatus::Completed);
        assert_eq!(goal.lessons_learned, vec!["found three patterns".to_string()]);
        assert!(goal.challenges.is_empty());
    }

    #[test]
    fn failed_action_never_abandons() {
        let book = GoalBook::new();
        let summary = book.generate_goals(&kernel()).unwrap();
        book.pursue_goals();

        let goal = book.goal(&summary.id).unwrap();
        let action_id = goal.next_action_id.clone().unwrap();

        book.record_action_result(&summary.id, &action_id, "dead end", false)
            .unwrap();

        let goal = book.goal(&summary.id).unwrap();
        assert_eq!(goal.actions[0].status, ActionStatus::Failed);
        assert_eq!(goal.challenges, vec!["dead end".to_string()]);
        assert_ne!(goal.status, GoalStatus::Abandoned);
        assert_eq!(book.active_count(), 1);
    }

    #[test]
    fn unknown_ids_are_validation_errors() {
        let book = GoalBook::new();
        let summary = book.generate_goals(&kernel()).unwrap();

        let err = book
            .record_action_result("nope", "nope", "", true)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let err = book
            .record_action_result(&summary.id, "nope", "", true)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let err = book.complete_milestone(&summary.id, "nope").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        // State untouched by the rejected calls.
        let goal = book.goal(&summary.id).unwrap();
        assert!(goal.lessons_learned.is_empty());
        assert!(goal.milestones.iter().all(|m| !m.completed));
    }

    #[test]
    fn progress_is_completed_over_total() {
        let book = GoalBook::new();
        let mut goal = tests_support::sample_goal("Four criteria", &["a", "b", "c", "d"]);
        goal.status = GoalStatus::Active;
        let id = goal.id.clone();
        let milestone_ids: Vec<String> = goal.milestones.iter().map(|m| m.id.clone()).collect();
        book.adopt_goal(goal).expect("adopted");

        book.complete_milestone(&id, &milestone_ids[0]).unwrap();
        book.complete_milestone(&id, &milestone_ids[1]).unwrap();
        book.pursue_goals();
        book.monitor_progress();

        let goal = book.goal(&id).unwrap();
        assert!((goal.progress - 0.5).abs() < 1e-9);
        assert_eq!(goal.status, GoalStatus::InProgress);
    }

    #[test]
    fn completion_is_terminal_and_only_via_monitoring() {
        let book = GoalBook::new();
        let goal = tests_support::sample_goal("Two criteria", &["a", "b"]);
        let id = goal.id.clone();
        let milestone_ids: Vec<String> = goal.milestones.iter().map(|m| m.id.clone()).collect();
        book.adopt_goal(goal).expect("adopted");

        for mid in &milestone_ids {
            book.complete_milestone(&id, mid).unwrap();
        }
        // All milestones done, but not completed until monitoring observes it.
        assert_eq!(book.goal(&id).unwrap().status, GoalStatus::Planned);

        let finished = book.monitor_progress();
        assert_eq!(finished, 1);

        let goal = book.goal(&id).unwrap();
        assert_eq!(goal.status, GoalStatus::Completed);
        assert!((goal.progress - 1.0).abs() < 1e-12);
        assert!(goal.completed_at.is_some());
        assert_eq!(book.active_count(), 0);
        assert_eq!(book.completed_goals().len(), 1);

        // Terminal: later monitoring and pursuit never touch it.
        book.pursue_goals();
        book.monitor_progress();
        let goal = book.goal(&id).unwrap();
        assert_eq!(goal.status, GoalStatus::Completed);
        assert!((goal.progress - 1.0).abs() < 1e-12);
        assert_eq!(book.metrics().goals_completed, 1);
    }

    #[test]
    fn completed_milestones_never_uncomplete() {
        let book = GoalBook::new();
        let goal = tests_support::sample_goal("Sticky milestone", &["a", "b"]);
        let id = goal.id.clone();
        let mid = goal.milestones[0].id.clone();
        book.adopt_goal(goal).expect("adopted");

        book.complete_milestone(&id, &mid).unwrap();
        let first_stamp = book.goal(&id).unwrap().milestones[0].completed_at;

        book.complete_milestone(&id, &mid).unwrap();
        let goal = book.goal(&id).unwrap();
        assert!(goal.milestones[0].completed);
        assert_eq!(goal.milestones[0].completed_at, first_stamp);
    }

    #[test]
    fn abandonment_moves_to_abandoned_list() {
        let book = GoalBook::new();
        let summary = book.generate_goals(&kernel()).unwrap();

        book.abandon_goal(&summary.id).unwrap();
        assert_eq!(book.active_count(), 0);
        assert_eq!(book.abandoned_goals().len(), 1);
        assert_eq!(book.metrics().goals_abandoned, 1);

        let err = book.abandon_goal(&summary.id).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn adoption_respects_ceiling_and_duplicate_titles() {
        let book = GoalBook::new();
        book.adopt_goal(tests_support::sample_goal("One", &["c"]))
            .expect("adopted");
        assert!(book
            .adopt_goal(tests_support::sample_goal("One", &["c"]))
            .is_none());

        for title in ["Two", "Three", "Four", "Five"] {
            book.adopt_goal(tests_support::sample_goal(title, &["c"]))
                .expect("under ceiling");
        }
        assert!(book
            .adopt_goal(tests_support::sample_goal("Six", &["c"]))
            .is_none());
        assert_eq!(book.active_count(), MAX_ACTIVE_GOALS);
    }

    #[test]
    fn persistence_round_trip() {
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let store = StateStore::open(dir.path().join("goals.db")).unwrap();

        let book = GoalBook::new();
        let summary = book.generate_goals(&kernel()).unwrap();
        book.pursue_goals();
        book.persist(&store).unwrap();

        let restored = GoalBook::new();
        restored.restore(&store).unwrap();
        assert_eq!(restored.active_count(), 1);
        let goal = restored.goal(&summary.id).unwrap();
        assert_eq!(goal.status, GoalStatus::InProgress);
        assert!(goal.next_action_id.is_some());
        assert_eq!(restored.metrics().goals_generated, 1);
    }
}
