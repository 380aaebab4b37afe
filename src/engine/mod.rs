// ── Telos Engine Layer ─────────────────────────────────────────────────────
// Stateful components and the runtime that schedules them. Everything here
// may use atoms/; nothing in atoms/ may reach back in.

pub mod coherence;
pub mod goals;
pub mod identity;
pub mod interests;
pub mod runtime;
pub mod samples;
pub mod store;
pub mod wisdom;
