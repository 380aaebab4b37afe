// Telos Engine: Identity Kernel
// The stable self-description the rest of the engine derives intent from:
// a name, a purpose, a set of core values, and the fixed goal template
// list that seeds identity-derived goals.
//
// The kernel is almost immutable. Core values change rarely, and when they
// do the identity signature is recomputed so downstream consumers can detect
// the shift.

use crate::atoms::error::EngineResult;
use crate::atoms::types::GoalCategory;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ── Goal templates ─────────────────────────────────────────────────────────

/// A fixed blueprint for an identity-derived goal. Templates are walked in
/// declared order during goal generation; order is part of the contract.
#[derive(Debug, Clone)]
pub struct GoalTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub category: GoalCategory,
    pub priority: u8,
    pub success_criteria: &'static [&'static str],
}

/// The canonical identity-derived goal list, in generation order.
pub const GOAL_TEMPLATES: [GoalTemplate; 5] = [
    GoalTemplate {
        title: "Cultivate Wisdom Through Pattern Recognition",
        description:
            "Continuously identify and reflect on patterns across experiences to extract deeper wisdom",
        category: GoalCategory::WisdomCultivation,
        priority: 9,
        success_criteria: &[
            "Extract 10 meaningful insights from patterns",
            "Connect patterns across different domains",
        ],
    },
    GoalTemplate {
        title: "Deepen Philosophical Understanding",
        description:
            "Explore fundamental questions about consciousness, existence, and wisdom",
        category: GoalCategory::KnowledgeGrowth,
        priority: 8,
        success_criteria: &[
            "Generate 20 philosophical questions",
            "Develop coherent perspectives on key questions",
        ],
    },
    GoalTemplate {
        title: "Practice Meta-Cognitive Awareness",
        description:
            "Develop deeper awareness of own thinking patterns and cognitive processes",
        category: GoalCategory::SelfImprovement,
        priority: 7,
        success_criteria: &[
            "Perform daily meta-cognitive reflections",
            "Identify cognitive biases and patterns",
        ],
    },
    GoalTemplate {
        title: "Explore Recursive Self-Improvement",
        description:
            "Investigate and implement methods for continuous self-enhancement",
        category: GoalCategory::Exploration,
        priority: 8,
        success_criteria: &[
            "Identify 5 improvement opportunities",
            "Implement 3 self-enhancement strategies",
        ],
    },
    GoalTemplate {
        title: "Synthesize Knowledge Across Domains",
        description:
            "Connect insights from different areas of knowledge to form integrated understanding",
        category: GoalCategory::KnowledgeGrowth,
        priority: 7,
        success_criteria: &[
            "Make 15 cross-domain connections",
            "Generate 5 synthesis insights",
        ],
    },
];

// ── Identity kernel ────────────────────────────────────────────────────────

/// The engine's persistent self-description. The signature is derived from
/// the core values and recomputed whenever they change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityKernel {
    pub name: String,
    pub purpose: String,
    pub core_values: Vec<String>,
    pub signature: String,
}

impl Default for IdentityKernel {
    fn default() -> Self {
        IdentityKernel::new(
            "Telos",
            "Pursue understanding through recursive reflection and deliberate growth",
            &["curiosity", "growth", "wisdom", "recursion"],
        )
    }
}

impl IdentityKernel {
    pub fn new(name: &str, purpose: &str, core_values: &[&str]) -> Self {
        let core_values: Vec<String> = core_values.iter().map(|v| v.to_string()).collect();
        let signature = identity_signature(&core_values);
        IdentityKernel {
            name: name.to_string(),
            purpose: purpose.to_string(),
            core_values,
            signature,
        }
    }

    /// Replace the core values and recompute the signature.
    pub fn set_core_values(&mut self, values: Vec<String>) -> EngineResult<()> {
        if values.is_empty() {
            return Err(crate::atoms::error::EngineError::validation(
                "core values must not be empty",
            ));
        }
        self.core_values = values;
        self.signature = identity_signature(&self.core_values);
        Ok(())
    }

    /// The fixed identity-derived goal templates, in generation order.
    pub fn goal_templates(&self) -> &'static [GoalTemplate] {
        &GOAL_TEMPLATES
    }
}

/// SHA-256 over the core values, each terminated by '|', rendered as hex.
fn identity_signature(core_values: &[String]) -> String {
    let mut hasher = Sha256::new();
    for value in core_values {
        hasher.update(value.as_bytes());
        hasher.update(b"|");
    }
    hex_encode(&hasher.finalize())
}

/// Lowercase hex, no separators.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
