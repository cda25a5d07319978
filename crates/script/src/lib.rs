//! Lexer, parser and interpreter for the doodle drawing dialect.
//!
//! Generated drawing programs arrive as text and call a fixed capability
//! object. This crate answers the one question the streaming executor
//! keeps asking ("is this text a compilable program yet?") with a real
//! parser rather than string heuristics, and runs compiled programs
//! against any [`canvas::Canvas`].
//!
//! ```rust
//! use canvas::Recorder;
//! use doodle_script::Program;
//!
//! let program = Program::compile("roughCanvas.circle(256, 256, 200);")?;
//! let mut recorder = Recorder::new();
//! program.run(&mut recorder, 42)?;
//! assert_eq!(recorder.draws().len(), 1);
//! # Ok::<(), doodle_script::ScriptError>(())
//! ```

pub use error::ScriptError;
pub use interp::CANVAS_BINDING;

use canvas::Canvas;

mod ast;
mod error;
mod interp;
mod lexer;
mod parser;

/// A compiled drawing program, ready to be invoked against a canvas.
///
/// Compilation is a pure syntax check: it never touches a surface and
/// never runs user code. A program that compiles can still fault at
/// [`Program::run`]; the two failure kinds are distinct
/// [`ScriptError`] variants.
#[derive(Debug, Clone)]
pub struct Program {
    stmts: Vec<ast::Stmt>,
}

impl Program {
    /// Parse `source` into a program.
    ///
    /// Returns [`ScriptError::Parse`] when the text is not (yet) a
    /// structurally valid unit, the expected case while a stream is
    /// still arriving.
    pub fn compile(source: &str) -> Result<Self, ScriptError> {
        let tokens = lexer::lex(source)?;
        let stmts = parser::parse(&tokens)?;
        Ok(Self { stmts })
    }

    /// Execute every statement in order against `canvas`.
    ///
    /// Stops at the first faulting statement and returns
    /// [`ScriptError::Runtime`]; statements before the fault keep their
    /// effects. `seed` fixes `Math.random`, so the same program and seed
    /// always produce the same invocation sequence.
    pub fn run<C: Canvas>(&self, canvas: &mut C, seed: u64) -> Result<(), ScriptError> {
        interp::Interp::new(canvas, seed).run(&self.stmts)
    }

    /// Number of top-level statements.
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}
