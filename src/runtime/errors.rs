use std::fmt;

use crate::parser::ast::Span;

/// An evaluation failure. The position is the nearest enclosing
/// statement; the message accumulates context phrases as it unwinds.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        RuntimeError {
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }

    /// Prepend a phrase naming the construct that was being evaluated.
    pub fn context(mut self, info: &str) -> Self {
        self.message = format!("{info}: {}", self.message);
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: at line {}, column {}",
            self.message, self.line, self.column
        )
    }
}

impl std::error::Error for RuntimeError {}
