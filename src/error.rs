use thiserror::Error;

/// Source location span for error reporting
/// Represents a range of characters in the input string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position (0-indexed byte offset)
    pub start: usize,
    /// End position (exclusive, 0-indexed byte offset)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Create a span for a single position
    pub fn at(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos + 1,
        }
    }

    /// Check if this span has valid location info
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Format the span for display (1-indexed for users)
    pub fn display(&self) -> String {
        if !self.is_valid() {
            String::new()
        } else if self.end - self.start == 1 {
            format!(" at position {}", self.start + 1)
        } else {
            format!(" at positions {}-{}", self.start + 1, self.end)
        }
    }
}

fn span_suffix(span: &Option<Span>) -> String {
    span.map_or(String::new(), |s| s.display())
}

/// Errors raised while parsing a formula, differentiating it or propagating uncertainties.
///
/// Every variant is returned synchronously to the caller; nothing is retried and no
/// partial output is produced once one of these has been raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    /// The formula string was empty or whitespace only
    #[error("Formula cannot be empty")]
    EmptyFormula,

    /// The formula does not conform to the accepted grammar
    #[error("Invalid syntax: {msg}{}", span_suffix(.span))]
    ParseError { msg: String, span: Option<Span> },

    /// The formula references a name that was not declared as a variable
    #[error("Undefined variable '{name}'{}", span_suffix(.span))]
    UndefinedVariable { name: String, span: Option<Span> },

    /// The declared variable names are not unique
    #[error("Variable '{0}' is declared more than once")]
    DuplicateVariable(String),

    /// Number of supplied values/errors/columns differs from the number of variables
    #[error("Expected {expected} {what}, got {got}")]
    ArityMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Parallel arrays have inconsistent lengths
    #[error("Array {index} has length {got}, expected {expected}")]
    SizeMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    /// An operand used as a denominator is zero
    #[error("Division by zero: operand {operand} is zero at row {row}")]
    DivisionByZero { row: usize, operand: usize },

    /// A numeric evaluation produced NaN or an infinity
    #[error("Non-finite result for '{variable}' at row {row}: {value}")]
    NonFiniteResult {
        row: usize,
        variable: String,
        value: f64,
    },

    /// Expression nesting depth exceeds the configured limit
    #[error("Expression nesting depth exceeds maximum limit")]
    MaxDepthExceeded,

    /// Expression node count exceeds the configured limit
    #[error("Expression size exceeds maximum node count limit")]
    MaxNodesExceeded,

    /// The diagnostic log destination could not be prepared
    #[error("Cannot open log destination '{path}': {reason}")]
    LogSetup { path: String, reason: String },
}

impl PropagationError {
    /// Create ParseError without span
    pub fn parse(msg: impl Into<String>) -> Self {
        PropagationError::ParseError {
            msg: msg.into(),
            span: None,
        }
    }

    /// Create ParseError with span
    pub fn parse_at(msg: impl Into<String>, span: Span) -> Self {
        PropagationError::ParseError {
            msg: msg.into(),
            span: Some(span),
        }
    }

    pub(crate) fn arity(what: &'static str, expected: usize, got: usize) -> Self {
        PropagationError::ArityMismatch {
            what,
            expected,
            got,
        }
    }
}
