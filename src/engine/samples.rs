// Telos Engine: Sample Provider
// The seam between the engine and whatever cognitive subsystem measures it.
// The engine clamps and accumulates; it never computes the raw inputs.
// A provider error is logged by the metric cycle and that cycle is skipped.

use crate::atoms::error::EngineResult;
use crate::atoms::types::{CoherenceSamples, WisdomSamples};

use async_trait::async_trait;

#[async_trait]
pub trait SampleProvider: Send + Sync {
    /// The seven raw wisdom-dimension inputs for this cycle.
    async fn wisdom_samples(&self) -> EngineResult<WisdomSamples>;

    /// The three raw coherence inputs for this cycle.
    async fn coherence_samples(&self) -> EngineResult<CoherenceSamples>;
}

/// Provider that reports a fixed reading every cycle. Useful as a stand-in
/// until a real cognitive subsystem is wired up.
#[derive(Default)]
pub struct StaticSampleProvider {
    pub wisdom: WisdomSamples,
    pub coherence: CoherenceSamples,
}

#[async_trait]
impl SampleProvider for StaticSampleProvider {
    async fn wisdom_samples(&self) -> EngineResult<WisdomSamples> {
        Ok(self.wisdom)
    }

    async fn coherence_samples(&self) -> EngineResult<CoherenceSamples> {
        Ok(self.coherence)
    }
}
