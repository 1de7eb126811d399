#![allow(dead_code)]

pub mod fixtures;

use jsonselect::{Index, SelectError, compile};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Runs `selector` against `document` and returns owned copies of the matches.
pub fn select(document: &Value, selector: &str) -> Result<Vec<Value>, SelectError> {
    compile(document).select_owned(selector)
}

/// Renders each match as compact JSON, the way conformance output is compared.
pub fn select_encoded(index: &Index<'_>, selector: &str) -> Result<Vec<String>, SelectError> {
    Ok(index
        .select(selector)?
        .into_iter()
        .map(Value::to_string)
        .collect())
}

/// Asserts that a selector yields exactly the given values, in order.
#[macro_export]
macro_rules! assert_selects {
    ($doc:expr, $selector:expr, [$($expected:tt),* $(,)?]) => {{
        let actual = $crate::common::select(&$doc, $selector)?;
        let expected: Vec<serde_json::Value> = vec![$(serde_json::json!($expected)),*];
        assert_eq!(actual, expected, "selector {:?}", $selector);
    }};
}
