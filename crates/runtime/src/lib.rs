//! Incremental streaming executor for doodle.
//!
//! The pipeline this crate owns:
//!
//! ```text
//! fragments ─▶ Runner buffer ─▶ speculative compile ─▶ reset + full replay
//! ```
//!
//! [`Runner`] is the per-attempt state machine (append, try to compile
//! the whole buffer, replay on success). [`Session`] is the lifecycle
//! controller around it: it starts attempts from a [`llm::ScriptSource`],
//! keeps at most one in flight, and delivers the completion callback on
//! clean end of stream.
//!
//! Every successful compile replays the entire cleaned program from a
//! freshly reset surface. The repeated drawing work is the price of
//! treating the frame as derived state: the program text is the only
//! authority, so a replay can never double-draw or show a half-applied
//! picture.

pub use runner::{Runner, clean_code};
pub use session::Session;

mod runner;
mod session;
