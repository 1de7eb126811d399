//! The evaluation engine for executing a parsed [`Selector`] against a [`NodeIndex`].
//!
//! Each simple selector is compiled into a list of predicates and run as a
//! single filter pass over the whole index. Combinators then relate the match
//! sets of neighbouring simple selectors, left to right.

use crate::ast::{
    Clause, ComplexSelector, Expression, HasRelation, Literal, NthFunction, Selector,
    SimpleSelector, StructuralClass,
};
use crate::combinators;
use crate::diagnostics::{DiagnosticSink, diag};
use crate::error::SelectError;
use crate::expression;
use crate::index::{JsonNode, NodeId, NodeIndex, NodeKind};
use crate::nth::NthFormula;
use serde_json::Value;
use std::collections::HashSet;

/// One compiled clause. Borrows from the selector it was compiled from.
#[derive(Debug)]
enum Predicate<'s> {
    Type(NodeKind),
    Key(&'s str),
    Structural(StructuralClass),
    Nth {
        function: NthFunction,
        formula: NthFormula,
    },
    /// Ids of the nodes that stand in the required relation to an inner match.
    Has(HashSet<NodeId>),
    Contains(&'s str),
    Val(&'s Literal),
    Expr(&'s Expression),
    Universal,
}

impl Predicate<'_> {
    fn test(&self, node: JsonNode<'_>) -> Result<bool, SelectError> {
        Ok(match self {
            Predicate::Type(kind) => node.kind() == *kind,
            Predicate::Key(name) => node.key() == Some(*name),
            Predicate::Structural(class) => matches_structural(*class, node),
            Predicate::Nth { function, formula } => matches_nth(*function, *formula, node),
            Predicate::Has(related) => related.contains(&node.id()),
            Predicate::Contains(needle) => match node.value() {
                Value::String(text) => text.contains(*needle),
                _ => false,
            },
            Predicate::Val(literal) => value_equals_literal(node.value(), literal),
            Predicate::Expr(expr) => expression::evaluate(expr, node.value())?.is_truthy(),
            Predicate::Universal => true,
        })
    }
}

fn matches_structural(class: StructuralClass, node: JsonNode<'_>) -> bool {
    match class {
        StructuralClass::Root => node.is_root(),
        StructuralClass::Empty => node.is_empty_container(),
        StructuralClass::FirstChild => node.sibling_count() > 0 && node.position() == 1,
        StructuralClass::LastChild => {
            node.sibling_count() > 0 && node.position() == node.sibling_count()
        }
        StructuralClass::OnlyChild => node.sibling_count() == 1,
    }
}

fn matches_nth(function: NthFunction, formula: NthFormula, node: JsonNode<'_>) -> bool {
    let count = node.sibling_count();
    if count == 0 {
        return false;
    }
    let position = match function {
        NthFunction::NthChild => node.position(),
        NthFunction::NthLastChild => count - node.position() + 1,
    };
    formula.matches(position)
}

/// Scalar comparison for `:val`. Different kinds and containers never match.
fn value_equals_literal(value: &Value, literal: &Literal) -> bool {
    match (value, literal) {
        (Value::Null, Literal::Null) => true,
        (Value::Bool(a), Literal::Bool(b)) => a == b,
        (Value::Number(n), Literal::Number(m)) => n.as_f64() == Some(*m),
        (Value::String(s), Literal::String(t)) => s == t,
        _ => false,
    }
}

/// Runs selectors against one index, reporting progress to a sink.
pub struct Matcher<'i, 'a> {
    index: &'i NodeIndex<'a>,
    sink: &'i dyn DiagnosticSink,
}

impl<'i, 'a> Matcher<'i, 'a> {
    pub fn new(index: &'i NodeIndex<'a>, sink: &'i dyn DiagnosticSink) -> Self {
        Self { index, sink }
    }

    /// Returns the ids of all matching nodes in document order, without duplicates.
    pub fn match_selector(&self, selector: &Selector) -> Result<Vec<NodeId>, SelectError> {
        let mut sets = Vec::with_capacity(selector.alternatives.len());
        for alternative in &selector.alternatives {
            sets.push(self.match_complex(alternative)?);
        }
        if sets.len() == 1 {
            return Ok(sets.pop().unwrap_or_default());
        }
        let merged = combinators::union(sets.iter().map(Vec::as_slice));
        diag!(
            self.sink,
            "union of {} alternatives -> {} nodes",
            sets.len(),
            merged.len()
        );
        Ok(merged)
    }

    fn match_complex(&self, complex: &ComplexSelector) -> Result<Vec<NodeId>, SelectError> {
        let mut left = self.match_simple(&complex.head)?;
        for (combinator, simple) in &complex.tail {
            if left.is_empty() {
                diag!(self.sink, "left side empty, skipping '{}{}'", combinator, simple);
                return Ok(left);
            }
            let right = self.match_simple(simple)?;
            let combined = combinators::apply(*combinator, self.index, &left, &right);
            diag!(
                self.sink,
                "combinator '{}': {} x {} -> {} nodes",
                combinator,
                left.len(),
                right.len(),
                combined.len()
            );
            left = combined;
        }
        Ok(left)
    }

    /// A single filter pass over every node of the index.
    pub fn match_simple(&self, simple: &SimpleSelector) -> Result<Vec<NodeId>, SelectError> {
        let predicates = self.compile(simple)?;
        let mut matched = Vec::new();
        'nodes: for node in self.index.iter() {
            for predicate in &predicates {
                if !predicate.test(node)? {
                    continue 'nodes;
                }
            }
            matched.push(node.id());
        }
        diag!(self.sink, "'{}' matched {} nodes", simple, matched.len());
        Ok(matched)
    }

    fn compile<'s>(&self, simple: &'s SimpleSelector) -> Result<Vec<Predicate<'s>>, SelectError> {
        let mut predicates = Vec::with_capacity(simple.clauses.len());
        for clause in &simple.clauses {
            predicates.push(match clause {
                Clause::Type(kind) => Predicate::Type(*kind),
                Clause::Key(name) => Predicate::Key(name),
                Clause::Structural(class) => Predicate::Structural(*class),
                Clause::Nth { function, formula } => Predicate::Nth {
                    function: *function,
                    formula: *formula,
                },
                Clause::Has { relation, selector } => {
                    Predicate::Has(self.related_to_matches(*relation, selector)?)
                }
                Clause::Contains(needle) => Predicate::Contains(needle),
                Clause::Val(literal) => Predicate::Val(literal),
                Clause::Expr(expr) => Predicate::Expr(expr),
                Clause::Universal => Predicate::Universal,
            });
        }
        Ok(predicates)
    }

    /// Evaluates the inner `:has` selector over the whole document and
    /// collects the nodes a candidate must be one of.
    fn related_to_matches(
        &self,
        relation: HasRelation,
        inner: &Selector,
    ) -> Result<HashSet<NodeId>, SelectError> {
        let inner_matches = self.match_selector(inner)?;
        let mut related = HashSet::new();
        for id in inner_matches {
            match relation {
                HasRelation::Child => {
                    if let Some(parent) = self.index.parent_of(id) {
                        related.insert(parent);
                    }
                }
                HasRelation::Descendant => {
                    let mut current = self.index.parent_of(id);
                    // Stop early once a chain is already recorded.
                    while let Some(p) = current {
                        if !related.insert(p) {
                            break;
                        }
                        current = self.index.parent_of(p);
                    }
                }
            }
        }
        diag!(
            self.sink,
            ":has({}) relates to {} candidate nodes",
            inner,
            related.len()
        );
        Ok(related)
    }
}
