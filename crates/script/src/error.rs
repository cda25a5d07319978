//! The two fault kinds of the streaming executor.
//!
//! During streaming a parse failure just means "the program has not fully
//! arrived yet" and is suppressed; a runtime fault means a complete
//! statement misbehaved when invoked. Callers branch on the variant, so
//! the distinction is part of the type, not a string.

/// Error produced when compiling or running a drawing program.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// The source is not (yet) a structurally valid program.
    #[error("parse error at {line}:{col}: {message}")]
    Parse {
        line: u32,
        col: u32,
        message: String,
    },

    /// A compiled statement faulted during invocation.
    #[error("runtime fault at statement {statement}: {message}")]
    Runtime { statement: usize, message: String },
}

impl ScriptError {
    pub(crate) fn parse_at(line: u32, col: u32, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            col,
            message: message.into(),
        }
    }

    pub(crate) fn runtime(statement: usize, message: impl Into<String>) -> Self {
        Self::Runtime {
            statement,
            message: message.into(),
        }
    }

    /// Whether this is the expected mid-stream "not yet complete" case.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Whether a compiled statement faulted while executing.
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_position_and_kind() {
        let parse = ScriptError::parse_at(3, 7, "unexpected end of input");
        assert_eq!(
            parse.to_string(),
            "parse error at 3:7: unexpected end of input"
        );
        assert!(parse.is_parse());

        let runtime = ScriptError::runtime(2, "line expects 4 numeric arguments");
        assert!(runtime.is_runtime());
        assert!(runtime.to_string().contains("statement 2"));
    }
}
