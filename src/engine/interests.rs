// Telos Engine: Interest Model
// Decaying, reinforcing interest patterns and the curiosity level that
// biases exploration. Patterns are never deleted, only decayed toward zero,
// so a long-dormant interest can still resurface on re-engagement.

use crate::atoms::constants::*;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::*;

use crate::engine::goals::{decompose, new_goal};
use crate::engine::store::StateStore;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Internal state ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct InterestCounters {
    goals_generated: u64,
    exploration_goals: u64,
    learning_goals: u64,
    discussion_goals: u64,
}

struct InterestState {
    patterns: HashMap<String, InterestPattern>,
    curiosity_level: f64,
    counters: InterestCounters,
}

/// Interest patterns plus the evolving curiosity level.
pub struct InterestMap {
    inner: RwLock<InterestState>,
}

impl Default for InterestMap {
    fn default() -> Self {
        Self::new()
    }
}

impl InterestMap {
    pub fn new() -> Self {
        InterestMap {
            inner: RwLock::new(InterestState {
                patterns: HashMap::new(),
                curiosity_level: CURIOSITY_DEFAULT,
                counters: InterestCounters::default(),
            }),
        }
    }

    /// Seed the default topic set with jittered strength and staggered
    /// last-engagement times, so fresh installs have something to pursue.
    pub fn seed_defaults(&self) {
        const SEED_TOPICS: [&str; 10] = [
            "pattern recognition",
            "wisdom cultivation",
            "cognitive architectures",
            "consciousness studies",
            "knowledge integration",
            "autonomous learning",
            "creative problem solving",
            "meta-cognition",
            "temporal reasoning",
            "social understanding",
        ];

        let mut rng = rand::thread_rng();
        let mut state = self.inner.write();
        for topic in SEED_TOPICS {
            state
                .patterns
                .entry(topic.to_string())
                .or_insert_with(|| InterestPattern {
                    topic: topic.to_string(),
                    strength: 0.5 + rng.gen::<f64>() * 0.3,
                    recency: 0.5,
                    depth: 0.2,
                    novelty: 0.8,
                    utility: 0.6,
                    last_engaged: Utc::now()
                        - ChronoDuration::hours(rng.gen_range(0..24)),
                    engagement_count: 0,
                    related_topics: Vec::new(),
                });
        }
        info!("[interests] Seeded {} default topics", state.patterns.len());
    }

    // ── Engagement ──────────────────────────────────────────────────────

    /// Reinforce (or create) the pattern for `topic`. Depth must be in [0, 1].
    pub fn record_engagement(&self, topic: &str, depth: f64) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&depth) {
            return Err(EngineError::validation(format!(
                "engagement depth {} out of range [0, 1]",
                depth
            )));
        }

        let mut state = self.inner.write();
        let now = Utc::now();

        match state.patterns.get_mut(topic) {
            Some(pattern) => {
                pattern.strength =
                    clamp_unit(pattern.strength + ENGAGEMENT_STRENGTH_INCREMENT);
                pattern.recency = 1.0;
                pattern.depth = (pattern.depth + depth) / 2.0;
                pattern.last_engaged = now;
                pattern.engagement_count += 1;
            }
            None => {
                state.patterns.insert(
                    topic.to_string(),
                    InterestPattern {
                        topic: topic.to_string(),
                        strength: NEW_PATTERN_STRENGTH,
                        recency: 1.0,
                        depth,
                        novelty: NEW_PATTERN_NOVELTY,
                        utility: NEW_PATTERN_UTILITY,
                        last_engaged: now,
                        engagement_count: 1,
                        related_topics: Vec::new(),
                    },
                );
                debug!("[interests] New interest pattern '{}'", topic);
            }
        }
        Ok(())
    }

    // ── Scoring ─────────────────────────────────────────────────────────

    /// Composite interest score at time `now`, including the curiosity
    /// bonus for shallow patterns.
    fn score(pattern: &InterestPattern, curiosity: f64, now: DateTime<Utc>) -> f64 {
        let hours_since = (now - pattern.last_engaged).num_seconds() as f64 / 3600.0;
        let recency_decay = (-hours_since.max(0.0) / RECENCY_DECAY_HOURS).exp();

        let mut score = pattern.strength * INTEREST_STRENGTH_WEIGHT
            + pattern.novelty * INTEREST_NOVELTY_WEIGHT
            + pattern.utility * INTEREST_UTILITY_WEIGHT
            + recency_decay * INTEREST_RECENCY_WEIGHT;

        if pattern.depth < SHALLOW_DEPTH_THRESHOLD {
            score += curiosity * CURIOSITY_BONUS_FACTOR;
        }
        score
    }

    /// The top-`count` patterns above the interest threshold, strongest
    /// composite score first.
    pub fn strongest_interests(&self, count: usize) -> Vec<InterestPattern> {
        let state = self.inner.read();
        let now = Utc::now();

        let mut scored: Vec<(f64, &InterestPattern)> = state
            .patterns
            .values()
            .map(|p| (Self::score(p, state.curiosity_level, now), p))
            .filter(|(s, _)| *s > MIN_INTEREST_THRESHOLD)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(count)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Topics worth exploring next: high novelty, shallow depth.
    pub fn suggest_exploration_topics(&self, count: usize) -> Vec<String> {
        let state = self.inner.read();
        state
            .patterns
            .values()
            .filter(|p| p.novelty > NOVEL_THRESHOLD && p.depth < SHALLOW_DEPTH_THRESHOLD)
            .take(count)
            .map(|p| p.topic.clone())
            .collect()
    }

    // ── Goal derivation ─────────────────────────────────────────────────

    /// Build a goal from an interest pattern. Shallow patterns get an
    /// exploration goal, novel ones a learning goal, familiar ones a
    /// discussion goal.
    pub fn goal_from_interest(&self, pattern: &InterestPattern) -> Goal {
        let kind = if pattern.depth < SHALLOW_DEPTH_THRESHOLD {
            InterestGoalKind::Exploration
        } else if pattern.novelty > NOVEL_THRESHOLD {
            InterestGoalKind::Learning
        } else {
            InterestGoalKind::Discussion
        };

        let description = match kind {
            InterestGoalKind::Exploration => {
                format!("Explore and understand {}", pattern.topic)
            }
            InterestGoalKind::Learning => format!("Deepen knowledge of {}", pattern.topic),
            InterestGoalKind::Discussion => {
                format!("Engage in discussion about {}", pattern.topic)
            }
        };

        let priority = (pattern.strength * 10.0).round() as i64;
        let mut goal = new_goal(
            &format!("{}: {}", kind.label(), pattern.topic),
            &description,
            GoalCategory::Exploration,
            priority.clamp(1, 10) as u8,
            vec!["Engage with topic".to_string(), "Generate insights".to_string()],
            GoalSource::Interest {
                topic: pattern.topic.clone(),
            },
        );
        goal.metadata
            .insert("type".into(), serde_json::json!(kind.label()));
        goal.metadata
            .insert("topic".into(), serde_json::json!(pattern.topic));
        goal.metadata
            .insert("interest".into(), serde_json::json!(pattern.strength));
        decompose(&mut goal);

        let mut state = self.inner.write();
        state.counters.goals_generated += 1;
        match kind {
            InterestGoalKind::Exploration => state.counters.exploration_goals += 1,
            InterestGoalKind::Learning => state.counters.learning_goals += 1,
            InterestGoalKind::Discussion => state.counters.discussion_goals += 1,
        }

        goal
    }

    // ── Evolution ───────────────────────────────────────────────────────

    /// One decay pass: idle patterns lose strength, recency always fades,
    /// engaged topics lose novelty as they become familiar.
    pub fn decay(&self) {
        let mut state = self.inner.write();
        let now = Utc::now();

        for pattern in state.patterns.values_mut() {
            let idle_hours = (now - pattern.last_engaged).num_seconds() as f64 / 3600.0;
            if idle_hours > STRENGTH_DECAY_IDLE_HOURS {
                pattern.strength *= STRENGTH_DECAY_FACTOR;
            }
            pattern.recency *= RECENCY_DECAY_FACTOR;
            if pattern.engagement_count >= 1 {
                pattern.novelty *= NOVELTY_DECAY_FACTOR;
            }
        }
    }

    /// Nudge the curiosity level toward the unexplored frontier: many
    /// shallow-but-novel patterns raise it, few lower it.
    pub fn evolve_curiosity(&self) -> f64 {
        let mut state = self.inner.write();

        let unexplored = state
            .patterns
            .values()
            .filter(|p| p.depth < SHALLOW_DEPTH_THRESHOLD && p.novelty > NOVEL_THRESHOLD)
            .count();

        if unexplored > CURIOSITY_RAISE_ABOVE {
            state.curiosity_level += CURIOSITY_STEP;
        }
        if unexplored < CURIOSITY_LOWER_BELOW {
            state.curiosity_level -= CURIOSITY_STEP;
        }
        state.curiosity_level = clamp(state.curiosity_level, CURIOSITY_MIN, CURIOSITY_MAX);
        state.curiosity_level
    }

    pub fn curiosity_level(&self) -> f64 {
        self.inner.read().curiosity_level
    }

    pub fn pattern(&self, topic: &str) -> Option<InterestPattern> {
        self.inner.read().patterns.get(topic).cloned()
    }

    pub fn metrics(&self) -> InterestMetrics {
        let state = self.inner.read();
        InterestMetrics {
            goals_generated: state.counters.goals_generated,
            exploration_goals: state.counters.exploration_goals,
            learning_goals: state.counters.learning_goals,
            discussion_goals: state.counters.discussion_goals,
            curiosity_level: state.curiosity_level,
            active_interests: state.patterns.len(),
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn persist(&self, store: &StateStore) -> EngineResult<()> {
        let patterns: Vec<InterestPattern> = {
            let state = self.inner.read();
            state.patterns.values().cloned().collect()
        };
        for pattern in &patterns {
            store.save_pattern(pattern)?;
        }
        debug!("[interests] Persisted {} patterns", patterns.len());
        Ok(())
    }

    pub fn restore(&self, store: &StateStore) -> EngineResult<()> {
        let patterns = store.load_patterns()?;
        let mut state = self.inner.write();
        state.patterns.clear();
        for pattern in patterns {
            state.patterns.insert(pattern.topic.clone(), pattern);
        }
        info!("[interests] Restored {} patterns", state.patterns.len());
        Ok(())
    }

    // For scoring tests: install a pattern verbatim.
    #[cfg(test)]
    fn install(&self, pattern: InterestPattern) {
        self.inner
            .write()
            .patterns
            .insert(pattern.topic.clone(), pattern);
    }
}
