//! The incremental runner.
//!
//! Owns the append-only buffer for one stream attempt and the
//! "attempt compile, on success reset and replay" step that turns
//! arbitrary fragment boundaries into a consistent picture.

use canvas::Canvas;
use script::{Program, ScriptError};

/// Replays the accumulated program against a canvas as fragments arrive.
///
/// One runner belongs to exactly one stream attempt. The buffer only ever
/// grows; starting over means constructing a new runner with a fresh
/// canvas binding.
pub struct Runner<C: Canvas> {
    buffer: String,
    canvas: C,
    seed: u64,
}

impl<C: Canvas> Runner<C> {
    /// Create a runner for a new attempt with a random replay seed.
    pub fn new(canvas: C) -> Self {
        Self::with_seed(canvas, rand::random())
    }

    /// Create a runner with a fixed replay seed.
    ///
    /// The seed pins `Math.random`, so every replay within this attempt
    /// draws the same picture prefix.
    pub fn with_seed(canvas: C, seed: u64) -> Self {
        Self {
            buffer: String::new(),
            canvas,
            seed,
        }
    }

    /// Append one fragment and, if the buffer now forms a compilable
    /// program, reset the surface and replay the whole program.
    ///
    /// Both failure modes are deliberately swallowed here: an incomplete
    /// program is the normal mid-stream state, and a runtime fault will
    /// usually resolve itself once more text arrives. They are kept apart
    /// in the logs; only the second is worth a warning.
    pub fn push(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
        let cleaned = clean_code(&self.buffer);
        let program = match Program::compile(&cleaned) {
            Ok(program) => program,
            Err(e) => {
                tracing::trace!("buffer not yet compilable: {e}");
                return;
            }
        };

        self.canvas.clear();
        if let Err(e) = program.run(&mut self.canvas, self.seed) {
            tracing::warn!("replay fault during streaming: {e}");
        }
    }

    /// Terminal pass on clean end-of-stream: reset, compile, replay.
    ///
    /// Never assumes earlier pushes left the surface populated; a push
    /// may have applied only a prefix, or nothing at all. Unlike
    /// [`Runner::push`], a failure here is returned to the caller: the
    /// stream ended and the program still does not work.
    pub fn finish(&mut self) -> Result<(), ScriptError> {
        let cleaned = clean_code(&self.buffer);
        self.canvas.clear();
        let program = Program::compile(&cleaned)
            .inspect_err(|e| tracing::error!("final program never became valid: {e}"))?;
        program
            .run(&mut self.canvas, self.seed)
            .inspect_err(|e| tracing::error!("final replay fault: {e}"))?;
        Ok(())
    }

    /// Like [`Runner::finish`], invoking `before` first so the caller can
    /// reset any of its own state ahead of the terminal pass.
    pub fn finish_with(&mut self, before: impl FnOnce()) -> Result<(), ScriptError> {
        before();
        self.finish()
    }

    /// Everything received so far, verbatim.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// The cleaned program text derived from the buffer.
    pub fn code(&self) -> String {
        clean_code(&self.buffer)
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }
}

/// Strip stream-framing artifacts from the accumulated buffer.
///
/// Removes every code-fence marker (with or without a language tag) and a
/// bare language-tag line at the very start. Recomputed from the full
/// buffer on every call, so markers split across fragments disappear as
/// soon as they are complete.
pub fn clean_code(buffer: &str) -> String {
    // Longest marker first: "```js" is a prefix of "```javascript".
    let stripped = buffer
        .replace("```javascript", "")
        .replace("```js", "")
        .replace("```", "");

    let head = stripped.trim_start();
    if let Some(rest) = head.strip_prefix("javascript")
        && rest.chars().next().is_none_or(char::is_whitespace)
    {
        return rest.to_string();
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_and_language_tags() {
        assert_eq!(
            clean_code("```javascript\nroughCanvas.line(0,0,1,1);\n```"),
            "\nroughCanvas.line(0,0,1,1);\n"
        );
        assert_eq!(clean_code("```js\nx\n```"), "\nx\n");
        assert_eq!(clean_code("javascript\nx"), "\nx");
        assert_eq!(clean_code("javascript"), "");
    }

    #[test]
    fn keeps_identifiers_that_merely_start_with_the_tag() {
        assert_eq!(clean_code("javascriptish()"), "javascriptish()");
    }

    #[test]
    fn cleaning_is_recomputed_not_incremental() {
        // The closing fence arrives split across two fragments; cleaning
        // the concatenation removes it entirely.
        let buffer = format!("{}{}", "x = 1;\n``", "`");
        assert_eq!(clean_code(&buffer), "x = 1;\n");
    }

    #[test]
    fn plain_code_is_untouched() {
        let src = "roughCanvas.circle(256, 256, 200);";
        assert_eq!(clean_code(src), src);
    }
}
