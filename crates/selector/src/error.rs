use thiserror::Error;

/// Failures raised while turning selector or expression text into tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Selector parsing error at offset {offset}: '{fragment}'")]
    Unrecognized { offset: usize, fragment: String },

    #[error("Unterminated expression at offset {offset}: '{fragment}'")]
    UnterminatedExpression { offset: usize, fragment: String },
}

/// Failures raised while compiling a token stream into a selector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("No selector recognized at offset {offset}")]
    NoSelector { offset: usize },

    #[error("Unrecognized combinator '{0}'")]
    UnrecognizedCombinator(String),

    #[error("Malformed nth-child formula '{0}'")]
    MalformedFormula(String),

    #[error("Pseudo-class ':{pseudo_class}' requires a parenthesized argument")]
    MissingArguments { pseudo_class: String },

    #[error("Invalid argument for ':{pseudo_class}': {reason}")]
    InvalidArgument {
        pseudo_class: String,
        reason: String,
    },

    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Selector nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },

    #[error("Selector of length {length} exceeds the limit of {limit}")]
    SelectorTooLong { length: usize, limit: usize },
}

/// The error type surfaced by the query facade.
#[derive(Error, Debug)]
pub enum SelectError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An arithmetic operator met a non-numeric operand while evaluating `:expr`.
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Document error: {0}")]
    Document(#[from] serde_json::Error),
}
