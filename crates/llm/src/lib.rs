//! The stream source boundary.
//!
//! Upstream, something turns a prompt into drawing-script text and
//! delivers it as an ordered sequence of opaque fragments over a
//! long-lived channel. This crate owns that boundary: the
//! [`ScriptSource`] trait, an HTTP implementation over a chunked
//! text-mode response body, and a scripted in-memory source for tests
//! and offline replay.
//!
//! Fragment boundaries carry no syntactic meaning: the full program is
//! exactly the concatenation of all fragments in delivery order. End of
//! stream is channel closure; a mid-stream failure is a stream `Err`
//! item. Prompt construction and model configuration live upstream of
//! this crate entirely.

pub use config::Config;
pub use http::HttpSource;
pub use reqwest::{self, Client};
pub use scripted::ScriptedSource;

use anyhow::Result;
use futures_core::Stream;

mod config;
mod http;
mod scripted;

/// A source of drawing-script fragments.
///
/// Implementations are cheap to clone; each [`ScriptSource::stream`] call
/// starts one independent generation attempt.
pub trait ScriptSource: Clone + Send + Sync + 'static {
    /// Start a generation for `prompt` and stream its fragments.
    ///
    /// Yields text fragments in delivery order. The stream ends on clean
    /// completion; a transport failure surfaces as an `Err` item, after
    /// which no further fragments follow.
    fn stream(&self, prompt: &str) -> impl Stream<Item = Result<String>> + Send + 'static;
}
