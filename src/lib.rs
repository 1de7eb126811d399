//! JSON selectors: CSS-like queries over `serde_json` documents.
//!
//! The matching engine lives in `jsonselect-selector` and is re-exported here
//! unchanged. This crate adds the line-oriented command-line filter in [`cli`].
pub mod cli;

pub use jsonselect_selector::*;
