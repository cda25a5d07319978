//! In-memory script source for tests and offline replay.

use crate::ScriptSource;
use anyhow::Result;
use async_stream::stream;
use futures_core::Stream;
use std::sync::Arc;

/// Replays a fixed fragment sequence, ignoring the prompt.
///
/// The counterpart of the upstream transport for tests and the CLI's
/// file-replay mode: fragments arrive in order with a task yield between
/// them, and the source can be told to fail mid-stream to exercise the
/// transport-error path.
#[derive(Clone)]
pub struct ScriptedSource {
    fragments: Arc<Vec<String>>,
    fail_after: Option<usize>,
}

impl ScriptedSource {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: Arc::new(fragments.into_iter().map(Into::into).collect()),
            fail_after: None,
        }
    }

    /// Split `source` into fragments of at most `size` characters.
    pub fn split_every(source: &str, size: usize) -> Self {
        let size = size.max(1);
        let chars: Vec<char> = source.chars().collect();
        Self::new(
            chars
                .chunks(size)
                .map(|c| c.iter().collect::<String>())
                .collect::<Vec<_>>(),
        )
    }

    /// Fail with a transport error after yielding `n` fragments.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl ScriptSource for ScriptedSource {
    fn stream(&self, _prompt: &str) -> impl Stream<Item = Result<String>> + Send + 'static {
        let fragments = self.fragments.clone();
        let fail_after = self.fail_after;
        stream! {
            for (i, fragment) in fragments.iter().enumerate() {
                if fail_after == Some(i) {
                    yield Err(anyhow::anyhow!("scripted transport error"));
                    return;
                }
                yield Ok(fragment.clone());
                tokio::task::yield_now().await;
            }
            if fail_after == Some(fragments.len()) {
                yield Err(anyhow::anyhow!("scripted transport error"));
            }
        }
    }
}
