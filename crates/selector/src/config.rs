//! Bounds on selector text supplied by untrusted callers.

/// Size and depth limits applied while parsing a selector.
///
/// Nested `:has(...)` arguments and parenthesized `:expr` terms are parsed
/// recursively, so both are counted against `max_nesting_depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_selector_len: usize,
    pub max_nesting_depth: usize,
}

impl Limits {
    pub const DEFAULT_MAX_SELECTOR_LEN: usize = 4096;
    pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

    pub fn with_max_selector_len(mut self, max_selector_len: usize) -> Self {
        self.max_selector_len = max_selector_len;
        self
    }

    pub fn with_max_nesting_depth(mut self, max_nesting_depth: usize) -> Self {
        self.max_nesting_depth = max_nesting_depth;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_selector_len: Self::DEFAULT_MAX_SELECTOR_LEN,
            max_nesting_depth: Self::DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}
