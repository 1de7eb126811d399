//! A recursive-descent parser turning selector tokens into a [`Selector`].
//!
//! Clauses of a simple selector must appear in a fixed order:
//! type, key, structural pseudo-class, nth function, parameterized
//! pseudo-class, `*`. A clause that cannot extend the current simple selector
//! starts a new one, joined to the previous by the descendant combinator.

use super::ast::*;
use crate::config::Limits;
use crate::error::{ParseError, SelectError};
use crate::expression::parse_expression;
use crate::lexer::{Dialect, Token, TokenKind, lex_at};
use crate::nth::NthFormula;
use std::str::FromStr;

// --- Main Public Parser ---

/// Parses selector text under the given limits.
pub fn parse_selector(text: &str, limits: &Limits) -> Result<Selector, SelectError> {
    if text.len() > limits.max_selector_len {
        return Err(ParseError::SelectorTooLong {
            length: text.len(),
            limit: limits.max_selector_len,
        }
        .into());
    }
    let tokens = lex_at(text, Dialect::Selector, 0)?;
    SelectorParser::new(&tokens, text.len(), 0, limits).selector()
}

impl Selector {
    /// Parses `text` with the default [`Limits`].
    pub fn parse(text: &str) -> Result<Selector, SelectError> {
        parse_selector(text, &Limits::default())
    }

    pub fn parse_with_limits(text: &str, limits: &Limits) -> Result<Selector, SelectError> {
        parse_selector(text, limits)
    }
}

impl FromStr for Selector {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

// --- Parser State ---

struct SelectorParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Offset reported when input runs out.
    end_offset: usize,
    depth: usize,
    limits: &'t Limits,
}

/// Rank of each clause kind inside a simple selector. A clause may only
/// follow clauses of strictly lower rank.
fn clause_rank(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Type(_) => Some(0),
        TokenKind::Identifier(_) => Some(1),
        TokenKind::StructuralClass(_) => Some(2),
        TokenKind::NthFunction(_) => Some(3),
        TokenKind::ParamClass(_) => Some(4),
        TokenKind::Universal => Some(5),
        _ => None,
    }
}

impl<'t> SelectorParser<'t> {
    fn new(tokens: &'t [Token], end_offset: usize, depth: usize, limits: &'t Limits) -> Self {
        Self {
            tokens,
            pos: 0,
            end_offset,
            depth,
            limits,
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn offset_here(&self) -> usize {
        self.peek().map_or(self.end_offset, |t| t.offset)
    }

    fn selector(&mut self) -> Result<Selector, SelectError> {
        let mut alternatives = vec![self.complex_selector()?];
        while let Some(Token {
            kind: TokenKind::Combinator(Combinator::Union),
            ..
        }) = self.peek()
        {
            self.advance();
            alternatives.push(self.complex_selector()?);
        }
        Ok(Selector { alternatives })
    }

    fn complex_selector(&mut self) -> Result<ComplexSelector, SelectError> {
        let head = self.simple_selector()?;
        let mut tail = Vec::new();

        loop {
            let Some(token) = self.peek() else { break };
            let combinator = match &token.kind {
                TokenKind::Combinator(Combinator::Union) => break,
                TokenKind::Combinator(combinator) => {
                    self.advance();
                    *combinator
                }
                kind if clause_rank(kind).is_some() => Combinator::Descendant,
                kind => return Err(ParseError::UnrecognizedCombinator(kind.to_string()).into()),
            };
            tail.push((combinator, self.simple_selector()?));
        }
        Ok(ComplexSelector { head, tail })
    }

    fn simple_selector(&mut self) -> Result<SimpleSelector, SelectError> {
        let start = self.offset_here();
        let mut clauses = Vec::new();
        let mut last_rank = None;

        while let Some(token) = self.peek() {
            let Some(rank) = clause_rank(&token.kind) else { break };
            if last_rank.is_some_and(|last| rank <= last) {
                break;
            }
            self.advance();
            clauses.push(self.clause(token)?);
            last_rank = Some(rank);
        }

        if clauses.is_empty() {
            return Err(ParseError::NoSelector { offset: start }.into());
        }
        Ok(SimpleSelector { clauses })
    }

    fn clause(&mut self, token: &'t Token) -> Result<Clause, SelectError> {
        match &token.kind {
            TokenKind::Type(kind) => Ok(Clause::Type(*kind)),
            TokenKind::Identifier(name) => Ok(Clause::Key(name.clone())),
            TokenKind::StructuralClass(class) => Ok(Clause::Structural(*class)),
            TokenKind::Universal => Ok(Clause::Universal),
            TokenKind::NthFunction(function) => {
                let (text, _) = self.arguments(function.name())?;
                let formula = NthFormula::parse(text)?;
                Ok(Clause::Nth {
                    function: *function,
                    formula,
                })
            }
            TokenKind::ParamClass(class) => {
                let (text, base) = self.arguments(class.name())?;
                match class {
                    ParamClass::Has => self.has_argument(text, base),
                    ParamClass::Contains => contains_argument(text, base),
                    ParamClass::Val => val_argument(text, base),
                    ParamClass::Expr => {
                        let remaining = self.limits.max_nesting_depth.saturating_sub(self.depth);
                        parse_expression(text, base, remaining).map(Clause::Expr)
                    }
                }
            }
            _ => Err(ParseError::NoSelector {
                offset: token.offset,
            }
            .into()),
        }
    }

    /// Consumes the argument token that must follow a pseudo-class name.
    /// Returns the argument text and its offset in the outermost selector.
    fn arguments(&mut self, pseudo_class: &str) -> Result<(&'t str, usize), SelectError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Arguments(text),
                offset,
            }) => {
                self.advance();
                Ok((text.as_str(), offset + 1))
            }
            _ => Err(ParseError::MissingArguments {
                pseudo_class: pseudo_class.to_string(),
            }
            .into()),
        }
    }

    fn has_argument(&self, text: &str, base: usize) -> Result<Clause, SelectError> {
        let depth = self.depth + 1;
        if depth > self.limits.max_nesting_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.limits.max_nesting_depth,
            }
            .into());
        }

        let tokens = lex_at(text, Dialect::Selector, base)?;
        let (relation, rest) = match tokens.split_first() {
            Some((
                Token {
                    kind: TokenKind::Combinator(Combinator::Child),
                    ..
                },
                rest,
            )) => (HasRelation::Child, rest),
            _ => (HasRelation::Descendant, tokens.as_slice()),
        };

        let mut inner = SelectorParser::new(rest, base + text.len(), depth, self.limits);
        let selector = inner.selector()?;
        Ok(Clause::Has {
            relation,
            selector: Box::new(selector),
        })
    }
}

fn contains_argument(text: &str, base: usize) -> Result<Clause, SelectError> {
    let tokens = lex_at(text, Dialect::Expression, base)?;
    match tokens.as_slice() {
        [
            Token {
                kind: TokenKind::Literal(Literal::String(needle)),
                ..
            },
        ] => Ok(Clause::Contains(needle.clone())),
        _ => Err(ParseError::InvalidArgument {
            pseudo_class: ParamClass::Contains.name().to_string(),
            reason: format!("expected a single quoted string, got '{}'", text.trim()),
        }
        .into()),
    }
}

fn val_argument(text: &str, base: usize) -> Result<Clause, SelectError> {
    let tokens = lex_at(text, Dialect::Expression, base)?;
    match tokens.as_slice() {
        [
            Token {
                kind: TokenKind::Literal(literal),
                ..
            },
        ] => Ok(Clause::Val(literal.clone())),
        [
            Token {
                kind: TokenKind::BinaryOperator(BinaryOperator::Minus),
                ..
            },
            Token {
                kind: TokenKind::Literal(Literal::Number(n)),
                ..
            },
        ] => Ok(Clause::Val(Literal::Number(-n))),
        _ => Err(ParseError::InvalidArgument {
            pseudo_class: ParamClass::Val.name().to_string(),
            reason: format!("expected a single literal, got '{}'", text.trim()),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LexError;
    use crate::index::NodeKind;

    fn parse(text: &str) -> Selector {
        Selector::parse(text).unwrap()
    }

    fn simple(clauses: Vec<Clause>) -> SimpleSelector {
        SimpleSelector { clauses }
    }

    fn single(selector: &Selector) -> &ComplexSelector {
        assert_eq!(selector.alternatives.len(), 1);
        &selector.alternatives[0]
    }

    #[test]
    fn test_parse_compound_simple_selector() {
        let selector = parse("object.story:first-child:nth-child(2n+1):has(.title)*");
        let complex = single(&selector);
        assert!(complex.tail.is_empty());
        let clauses = &complex.head.clauses;
        assert_eq!(clauses.len(), 6);
        assert_eq!(clauses[0], Clause::Type(NodeKind::Object));
        assert_eq!(clauses[1], Clause::Key("story".into()));
        assert_eq!(clauses[2], Clause::Structural(StructuralClass::FirstChild));
        assert_eq!(
            clauses[3],
            Clause::Nth {
                function: NthFunction::NthChild,
                formula: NthFormula::new(2, 1),
            }
        );
        assert!(matches!(
            &clauses[4],
            Clause::Has {
                relation: HasRelation::Descendant,
                ..
            }
        ));
        assert_eq!(clauses[5], Clause::Universal);
    }

    #[test]
    fn test_parse_combinators_left_to_right() {
        let selector = parse(".a > .b ~ .c .d");
        let complex = single(&selector);
        assert_eq!(complex.head, simple(vec![Clause::Key("a".into())]));
        let combinators: Vec<Combinator> = complex.tail.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            combinators,
            vec![Combinator::Child, Combinator::Sibling, Combinator::Descendant]
        );
    }

    #[test]
    fn test_out_of_order_clause_starts_descendant() {
        // A key after a structural class cannot join the same simple selector.
        let selector = parse(":root.a");
        let complex = single(&selector);
        assert_eq!(
            complex.head,
            simple(vec![Clause::Structural(StructuralClass::Root)])
        );
        assert_eq!(
            complex.tail,
            vec![(Combinator::Descendant, simple(vec![Clause::Key("a".into())]))]
        );
    }

    #[test]
    fn test_union_binds_loosest() {
        let selector = parse(".a > .b, string");
        assert_eq!(selector.alternatives.len(), 2);
        assert_eq!(selector.alternatives[0].tail.len(), 1);
        assert_eq!(
            selector.alternatives[1].head,
            simple(vec![Clause::Type(NodeKind::String)])
        );
    }

    #[test]
    fn test_parameterized_arguments() {
        let selector = parse(r#":contains("lph") :val(-2.5) :val(null) :expr(x > 1)"#);
        let complex = single(&selector);
        assert_eq!(complex.head.clauses, vec![Clause::Contains("lph".into())]);
        assert_eq!(complex.tail[0].1.clauses, vec![Clause::Val(Literal::Number(-2.5))]);
        assert_eq!(complex.tail[1].1.clauses, vec![Clause::Val(Literal::Null)]);
        assert!(matches!(
            complex.tail[2].1.clauses[0],
            Clause::Expr(Expression::BinaryOp {
                op: BinaryOperator::GreaterThan,
                ..
            })
        ));
    }

    #[test]
    fn test_has_child_relation() {
        let selector = parse("object:has(> .title)");
        let Clause::Has { relation, selector } = &single(&selector).head.clauses[1] else {
            panic!("expected :has");
        };
        assert_eq!(*relation, HasRelation::Child);
        assert_eq!(
            single(selector).head,
            simple(vec![Clause::Key("title".into())])
        );
    }

    #[test]
    fn test_empty_and_dangling_selectors() {
        assert!(matches!(
            Selector::parse(""),
            Err(SelectError::Parse(ParseError::NoSelector { offset: 0 }))
        ));
        assert!(matches!(
            Selector::parse("  "),
            Err(SelectError::Parse(ParseError::NoSelector { offset: 2 }))
        ));
        assert!(matches!(
            Selector::parse(".a >"),
            Err(SelectError::Parse(ParseError::NoSelector { offset: 4 }))
        ));
        assert!(matches!(
            Selector::parse(".a, , .b"),
            Err(SelectError::Parse(ParseError::NoSelector { offset: 4 }))
        ));
    }

    #[test]
    fn test_stray_arguments_are_not_a_combinator() {
        assert!(matches!(
            Selector::parse(".a (x)"),
            Err(SelectError::Parse(ParseError::NoSelector { .. }))
        ));
        assert!(matches!(
            Selector::parse(".a(x)"),
            Err(SelectError::Parse(ParseError::UnrecognizedCombinator(_)))
        ));
    }

    #[test]
    fn test_missing_and_invalid_arguments() {
        assert!(matches!(
            Selector::parse(":has"),
            Err(SelectError::Parse(ParseError::MissingArguments { .. }))
        ));
        assert!(matches!(
            Selector::parse(":contains(12)"),
            Err(SelectError::Parse(ParseError::InvalidArgument { .. }))
        ));
        assert!(matches!(
            Selector::parse(":val(x)"),
            Err(SelectError::Parse(ParseError::InvalidArgument { .. }))
        ));
        assert!(matches!(
            Selector::parse(":nth-child(3x)"),
            Err(SelectError::Parse(ParseError::MalformedFormula(_)))
        ));
    }

    #[test]
    fn test_nested_error_offsets() {
        let err = Selector::parse("object:has(.a @)").unwrap_err();
        assert!(matches!(
            err,
            SelectError::Lex(LexError::Unrecognized { offset: 14, .. })
        ));
    }

    #[test]
    fn test_limits() {
        let limits = Limits::default().with_max_selector_len(8);
        assert!(matches!(
            Selector::parse_with_limits(".abcdefgh", &limits),
            Err(SelectError::Parse(ParseError::SelectorTooLong { length: 9, limit: 8 }))
        ));

        let limits = Limits::default().with_max_nesting_depth(2);
        assert!(Selector::parse_with_limits(":has(:has(.a))", &limits).is_ok());
        assert!(matches!(
            Selector::parse_with_limits(":has(:has(:has(.a)))", &limits),
            Err(SelectError::Parse(ParseError::NestingTooDeep { limit: 2 }))
        ));
    }

    #[test]
    fn test_from_str() {
        let selector: Selector = "number".parse().unwrap();
        assert_eq!(
            single(&selector).head,
            simple(vec![Clause::Type(NodeKind::Number)])
        );
    }
}
