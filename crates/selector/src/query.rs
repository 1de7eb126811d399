//! The query facade: one mapped document, many selectors.
use crate::ast::Selector;
use crate::config::Limits;
use crate::diagnostics::{DiagnosticSink, NoopSink, diag};
use crate::engine::Matcher;
use crate::error::SelectError;
use crate::index::{JsonNode, NodeIndex};
use crate::parser::parse_selector;
use serde_json::Value;

/// A document mapped for querying.
///
/// Building the index walks the document once; every later query only reads
/// it, so an `Index` can be shared between threads and queried concurrently.
#[derive(Debug)]
pub struct Index<'a> {
    nodes: NodeIndex<'a>,
    limits: Limits,
}

/// Maps `document` with the default limits.
pub fn compile(document: &Value) -> Index<'_> {
    Index::new(document)
}

/// Decodes JSON text into a document, surfacing decoder failures as
/// [`SelectError::Document`].
pub fn parse_document(text: &str) -> Result<Value, SelectError> {
    Ok(serde_json::from_str(text)?)
}

/// Decodes `json` and returns owned copies of the values `selector` matches.
pub fn select_str(json: &str, selector: &str) -> Result<Vec<Value>, SelectError> {
    let document = parse_document(json)?;
    compile(&document).select_owned(selector)
}

impl<'a> Index<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self {
            nodes: NodeIndex::new(document),
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The root value the index was built from.
    pub fn document(&self) -> &'a Value {
        self.nodes.value(0)
    }

    pub fn nodes(&self) -> &NodeIndex<'a> {
        &self.nodes
    }

    /// Parses `selector` under this index's limits.
    pub fn parse(&self, selector: &str) -> Result<Selector, SelectError> {
        parse_selector(selector, &self.limits)
    }

    /// Matched values in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<&'a Value>, SelectError> {
        self.select_with(selector, &NoopSink)
    }

    /// Like [`Index::select`], reporting lexing, matching and combinator
    /// activity to `sink`.
    pub fn select_with(
        &self,
        selector: &str,
        sink: &dyn DiagnosticSink,
    ) -> Result<Vec<&'a Value>, SelectError> {
        let parsed = self.parse(selector)?;
        diag!(sink, "parsed '{}' as '{}'", selector, parsed);
        self.select_compiled(&parsed, sink)
    }

    /// Evaluates an already parsed selector.
    pub fn select_compiled(
        &self,
        selector: &Selector,
        sink: &dyn DiagnosticSink,
    ) -> Result<Vec<&'a Value>, SelectError> {
        let ids = Matcher::new(&self.nodes, sink).match_selector(selector)?;
        diag!(sink, "'{}' selected {} nodes", selector, ids.len());
        Ok(ids.into_iter().map(|id| self.nodes.value(id)).collect())
    }

    /// Matched node handles, exposing key, position and parent alongside
    /// each value.
    pub fn select_nodes(&self, selector: &str) -> Result<Vec<JsonNode<'_>>, SelectError> {
        let parsed = self.parse(selector)?;
        let ids = Matcher::new(&self.nodes, &NoopSink).match_selector(&parsed)?;
        Ok(ids.into_iter().filter_map(|id| self.nodes.get(id)).collect())
    }

    /// Matched values, cloned out of the document.
    pub fn select_owned(&self, selector: &str) -> Result<Vec<Value>, SelectError> {
        Ok(self.select(selector)?.into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::error::{LexError, ParseError};
    use crate::index::NodeKind;
    use serde_json::json;

    #[test]
    fn test_select_returns_borrowed_values() {
        let doc = json!({ "a": [1, 2, 3] });
        let index = compile(&doc);
        let matched = index.select(":nth-child(odd)").unwrap();
        assert_eq!(matched, vec![&json!(1), &json!(3)]);
        assert!(std::ptr::eq(matched[0], &doc["a"][0]));
    }

    #[test]
    fn test_select_nodes_exposes_metadata() {
        let doc = json!({ "list": ["x", "y"] });
        let index = compile(&doc);
        let nodes = index.select_nodes("string").unwrap();
        let summary: Vec<(usize, usize, NodeKind)> = nodes
            .iter()
            .map(|n| (n.position(), n.sibling_count(), n.kind()))
            .collect();
        assert_eq!(summary, vec![(1, 2, NodeKind::String), (2, 2, NodeKind::String)]);
        assert_eq!(nodes[0].parent().and_then(|p| p.key()), Some("list"));
    }

    #[test]
    fn test_no_match_is_not_an_error() {
        let doc = json!({ "a": 1 });
        assert!(compile(&doc).select(".missing").unwrap().is_empty());
    }

    #[test]
    fn test_errors_are_typed() {
        let doc = json!({});
        let index = compile(&doc);
        assert!(matches!(
            index.select(".a $"),
            Err(SelectError::Lex(LexError::Unrecognized { .. }))
        ));
        assert!(matches!(
            index.select(".a >"),
            Err(SelectError::Parse(ParseError::NoSelector { .. }))
        ));
        assert!(matches!(
            select_str("{not json", ":root"),
            Err(SelectError::Document(_))
        ));
    }

    #[test]
    fn test_limits_apply_to_queries() {
        let doc = json!({});
        let index = compile(&doc).with_limits(Limits::default().with_max_selector_len(3));
        assert!(matches!(
            index.select(".abcd"),
            Err(SelectError::Parse(ParseError::SelectorTooLong { .. }))
        ));
    }

    #[test]
    fn test_select_str_and_owned() {
        let values = select_str(r#"{"a": {"b": 1}, "b": 2}"#, ".b").unwrap();
        assert_eq!(values, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_select_with_reports_to_sink() {
        let doc = json!({ "a": 1 });
        let sink = MemorySink::new();
        compile(&doc).select_with(".a", &sink).unwrap();
        let lines = sink.lines();
        assert_eq!(lines.first().map(String::as_str), Some("parsed '.a' as '.\"a\"'"));
        assert_eq!(lines.last().map(String::as_str), Some("'.\"a\"' selected 1 nodes"));
    }

    #[test]
    fn test_repeated_queries_are_deterministic() {
        let doc = json!({ "x": [{ "y": 1 }, { "y": 2 }], "y": 3 });
        let index = compile(&doc);
        let first = index.select(".y, object").unwrap();
        for _ in 0..3 {
            assert_eq!(index.select(".y, object").unwrap(), first);
        }
    }
}
