pub mod ast;
pub mod combinators;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod expression;
pub mod index;
pub mod lexer;
pub mod nth;
pub mod operators;
pub mod parser;
pub mod query;

pub use ast::{Clause, Combinator, ComplexSelector, Literal, Selector, SimpleSelector};
pub use config::Limits;
pub use diagnostics::{DiagnosticSink, LogSink, MemorySink, NoopSink};
pub use engine::Matcher;
pub use error::{LexError, ParseError, SelectError};
pub use expression::ExprValue;
pub use index::{JsonNode, NodeId, NodeIndex, NodeKind};
pub use nth::NthFormula;
pub use parser::parse_selector;
pub use query::{Index, compile, parse_document, select_str};
