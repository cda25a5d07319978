//! Stream lifecycle: one attempt at a time.
//!
//! A [`Session`] owns the persistent surface and at most one live
//! generation attempt. Submitting a prompt aborts whatever was streaming
//! before, so two attempts never race for the same frame; the surface's
//! attempt generation catches anything an abort is too late to stop.

use crate::Runner;
use canvas::{SharedSurface, SurfaceBinding};
use futures_util::StreamExt;
use llm::ScriptSource;
use tokio::task::JoinHandle;

/// Single-flight controller for streaming generation attempts.
pub struct Session<S: ScriptSource> {
    source: S,
    surface: SharedSurface,
    current: Option<JoinHandle<()>>,
}

impl<S: ScriptSource> Session<S> {
    /// Create a session over `source`, drawing onto `surface`.
    pub fn new(source: S, surface: SharedSurface) -> Self {
        Self {
            source,
            surface,
            current: None,
        }
    }

    /// The surface this session draws onto.
    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    /// Whether an attempt is currently streaming.
    pub fn is_streaming(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start a new generation attempt, cancelling any live one first.
    ///
    /// `on_complete` receives the final cleaned program text, exactly
    /// once, and only if this attempt reaches a clean end of stream and
    /// its terminal replay succeeds. A cancelled attempt invokes nothing.
    pub fn submit(&mut self, prompt: &str, on_complete: impl FnOnce(String) + Send + 'static) {
        self.cancel();

        let seed = rand::random();
        let binding = self.surface.begin_attempt(seed);
        let runner = Runner::with_seed(binding, seed);
        let stream = self.source.stream(prompt);

        tracing::debug!(generation = self.surface.generation(), "attempt started");
        self.current = Some(tokio::spawn(attempt(stream, runner, on_complete)));
    }

    /// Cancel the live attempt, if any.
    ///
    /// The attempt's task is aborted and every outstanding binding is
    /// invalidated; an in-flight replay may run to completion but its
    /// effects land nowhere. No completion callback fires.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.abort();
            tracing::debug!("attempt cancelled");
        }
        self.surface.invalidate();
    }

    /// Wait for the live attempt to finish (or be aborted).
    pub async fn join(&mut self) {
        if let Some(handle) = self.current.take() {
            let _ = handle.await;
        }
    }
}

impl<S: ScriptSource> Drop for Session<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The fragment loop of one attempt.
///
/// Strictly sequential: the next fragment is requested only after the
/// previous one has been fully applied, so no fragment can arrive in the
/// middle of a replay.
async fn attempt(
    stream: impl futures_core::Stream<Item = anyhow::Result<String>>,
    mut runner: Runner<SurfaceBinding>,
    on_complete: impl FnOnce(String) + Send + 'static,
) {
    futures_util::pin_mut!(stream);
    while let Some(result) = stream.next().await {
        match result {
            Ok(fragment) => runner.push(&fragment),
            Err(e) => {
                // Mid-stream transport failure: discard the attempt, no
                // finish, no callback.
                tracing::error!("script stream failed: {e:?}");
                runner.canvas_mut().paint_error();
                return;
            }
        }
    }

    match runner.finish() {
        Ok(()) => {
            if runner.canvas().is_live() {
                on_complete(runner.code());
            }
        }
        Err(e) => {
            tracing::error!("attempt ended with a terminal fault: {e}");
            runner.canvas_mut().paint_error();
        }
    }
}
