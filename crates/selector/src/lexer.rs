//! A `nom`-based tokenizer for selector text and the `:expr` sub-language.
//!
//! Both dialects are scanned with an ordered table of token parsers; the first
//! parser that accepts the remaining input wins. Parenthesized arguments are
//! captured whole by a depth-balanced scan so that nested selectors and
//! expressions survive intact for a later, separate lexing pass.
use crate::ast::{BinaryOperator, Combinator, Literal, NthFunction, ParamClass, StructuralClass};
use crate::error::LexError;
use crate::index::NodeKind;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{anychar, char, digit0, digit1, multispace0, multispace1, one_of, satisfy},
    combinator::{map, map_opt, map_res, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};
use std::fmt;

/// Which token table to scan with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Selector,
    Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // --- Selector dialect ---
    Type(NodeKind),
    Identifier(String),
    StructuralClass(StructuralClass),
    ParamClass(ParamClass),
    NthFunction(NthFunction),
    /// The text between a balanced pair of parentheses, exclusive.
    Arguments(String),
    Combinator(Combinator),
    Universal,
    // --- Expression dialect ---
    Literal(Literal),
    Variable,
    BinaryOperator(BinaryOperator),
    OpenParen,
    CloseParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Type(kind) => write!(f, "{}", kind),
            TokenKind::Identifier(name) => write!(f, ".{:?}", name),
            TokenKind::StructuralClass(class) => write!(f, ":{}", class.name()),
            TokenKind::ParamClass(class) => write!(f, ":{}", class.name()),
            TokenKind::NthFunction(function) => write!(f, ":{}", function.name()),
            TokenKind::Arguments(text) => write!(f, "({})", text),
            TokenKind::Combinator(combinator) => write!(f, "{}", combinator),
            TokenKind::Universal => f.write_str("*"),
            TokenKind::Literal(literal) => write!(f, "{}", literal),
            TokenKind::Variable => f.write_str("x"),
            TokenKind::BinaryOperator(op) => write!(f, "{}", op),
            TokenKind::OpenParen => f.write_str("("),
            TokenKind::CloseParen => f.write_str(")"),
        }
    }
}

/// A token and the byte offset where it starts in the lexed text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Tokenizes `input` with the given dialect.
pub fn lex(input: &str, dialect: Dialect) -> Result<Vec<Token>, LexError> {
    lex_at(input, dialect, 0)
}

/// Tokenizes `input`, reporting offsets shifted by `base`. Used for argument
/// text so that nested errors point into the outer selector.
pub fn lex_at(input: &str, dialect: Dialect, base: usize) -> Result<Vec<Token>, LexError> {
    let leading = input.len() - input.trim_start().len();
    let trimmed = input.trim();
    let mut rest = trimmed;
    let mut tokens = Vec::new();

    while !rest.is_empty() {
        let offset = base + leading + (trimmed.len() - rest.len());
        let (remaining, kind) = match dialect {
            Dialect::Selector => selector_token(rest, offset)?,
            Dialect::Expression => expression_token(rest, offset)?,
        };
        if let Some(kind) = kind {
            tokens.push(Token { kind, offset });
        }
        rest = remaining;
    }
    Ok(tokens)
}

fn unrecognized(input: &str, offset: usize) -> LexError {
    LexError::Unrecognized {
        offset,
        fragment: input.to_string(),
    }
}

// --- Selector Dialect ---

fn selector_token(input: &str, offset: usize) -> Result<(&str, Option<TokenKind>), LexError> {
    if input.starts_with('(') {
        let (rest, inner) = balanced_arguments(input, offset)?;
        return Ok((rest, Some(TokenKind::Arguments(inner.to_string()))));
    }
    alt((
        combinator,
        universal,
        type_name,
        quoted_identifier,
        identifier,
        structural_class,
        nth_function,
        param_class,
    ))
    .parse(input)
    .map(|(rest, kind)| (rest, Some(kind)))
    .map_err(|_| unrecognized(input, offset))
}

/// Scans `(`...`)` with depth counting, skipping over quoted strings.
/// Returns the remaining input and the text between the outer parentheses.
fn balanced_arguments(input: &str, offset: usize) -> Result<(&str, &str), LexError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[i + 1..], &input[1..i]));
                }
            }
            _ => {}
        }
    }

    Err(LexError::UnterminatedExpression {
        offset,
        fragment: input.to_string(),
    })
}

/// Combinators swallow surrounding whitespace, so whitespace on its own only
/// becomes the descendant combinator when no operator character is adjacent.
fn combinator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        map_opt(delimited(multispace0, one_of(",>~"), multispace0), |c| {
            Combinator::from_char(c).map(TokenKind::Combinator)
        }),
        value(TokenKind::Combinator(Combinator::Descendant), multispace1),
    ))
    .parse(input)
}

fn universal(input: &str) -> IResult<&str, TokenKind> {
    value(TokenKind::Universal, char('*')).parse(input)
}

fn type_name(input: &str) -> IResult<&str, TokenKind> {
    map_opt(
        alt((
            tag("string"),
            tag("number"),
            tag("boolean"),
            tag("null"),
            tag("array"),
            tag("object"),
        )),
        |name| NodeKind::from_name(name).map(TokenKind::Type),
    )
    .parse(input)
}

fn escaped_char(input: &str) -> IResult<&str, char> {
    preceded(
        char('\\'),
        satisfy(|c| !c.is_whitespace() && !c.is_ascii_hexdigit()),
    )
    .parse(input)
}

fn name_start(input: &str) -> IResult<&str, char> {
    alt((satisfy(|c| c.is_alphabetic() || c == '_'), escaped_char)).parse(input)
}

fn name_char(input: &str) -> IResult<&str, char> {
    alt((
        satisfy(|c| c.is_alphanumeric() || c == '_' || c == '-'),
        escaped_char,
    ))
    .parse(input)
}

fn unescape_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                name.push(escaped);
            }
        } else {
            name.push(c);
        }
    }
    name
}

fn identifier(input: &str) -> IResult<&str, TokenKind> {
    map(
        preceded(char('.'), recognize(pair(name_start, many0(name_char)))),
        |raw: &str| TokenKind::Identifier(unescape_name(raw)),
    )
    .parse(input)
}

/// A double-quoted string with JSON escapes, decoded.
fn json_string(input: &str) -> IResult<&str, String> {
    map_res(
        recognize(delimited(
            char('"'),
            many0(alt((
                value((), is_not("\"\\")),
                value((), pair(char('\\'), anychar)),
            ))),
            char('"'),
        )),
        |raw: &str| serde_json::from_str::<String>(raw),
    )
    .parse(input)
}

fn quoted_identifier(input: &str) -> IResult<&str, TokenKind> {
    map(preceded(opt(char('.')), json_string), TokenKind::Identifier).parse(input)
}

fn structural_class(input: &str) -> IResult<&str, TokenKind> {
    map(
        preceded(
            char(':'),
            alt((
                value(StructuralClass::Root, tag("root")),
                value(StructuralClass::Empty, tag("empty")),
                value(StructuralClass::FirstChild, tag("first-child")),
                value(StructuralClass::LastChild, tag("last-child")),
                value(StructuralClass::OnlyChild, tag("only-child")),
            )),
        ),
        TokenKind::StructuralClass,
    )
    .parse(input)
}

// The function names eat trailing whitespace so `:has (...)` never yields a
// descendant combinator before its argument.

fn nth_function(input: &str) -> IResult<&str, TokenKind> {
    map(
        terminated(
            preceded(
                char(':'),
                alt((
                    value(NthFunction::NthLastChild, tag("nth-last-child")),
                    value(NthFunction::NthChild, tag("nth-child")),
                )),
            ),
            multispace0,
        ),
        TokenKind::NthFunction,
    )
    .parse(input)
}

fn param_class(input: &str) -> IResult<&str, TokenKind> {
    map(
        terminated(
            preceded(
                char(':'),
                alt((
                    value(ParamClass::Has, tag("has")),
                    value(ParamClass::Expr, tag("expr")),
                    value(ParamClass::Val, tag("val")),
                    value(ParamClass::Contains, tag("contains")),
                )),
            ),
            multispace0,
        ),
        TokenKind::ParamClass,
    )
    .parse(input)
}

// --- Expression Dialect ---

fn expression_token(input: &str, offset: usize) -> Result<(&str, Option<TokenKind>), LexError> {
    alt((
        value(None, multispace1),
        map(literal, |l| Some(TokenKind::Literal(l))),
        value(Some(TokenKind::Variable), char('x')),
        map(binary_operator, |op| Some(TokenKind::BinaryOperator(op))),
        value(Some(TokenKind::OpenParen), char('(')),
        value(Some(TokenKind::CloseParen), char(')')),
    ))
    .parse(input)
    .map_err(|_| unrecognized(input, offset))
}

fn keyword_literal(input: &str) -> IResult<&str, Literal> {
    alt((
        value(Literal::Bool(true), tag("true")),
        value(Literal::Bool(false), tag("false")),
        value(Literal::Null, tag("null")),
    ))
    .parse(input)
}

/// Unsigned; a leading `-` is always lexed as an operator so `x-1` works.
fn number_literal(input: &str) -> IResult<&str, Literal> {
    map_res(
        recognize((
            digit1,
            opt(pair(char('.'), digit0)),
            opt((one_of("eE"), opt(one_of("+-")), digit1)),
        )),
        |raw: &str| raw.parse::<f64>().map(Literal::Number),
    )
    .parse(input)
}

fn literal(input: &str) -> IResult<&str, Literal> {
    alt((
        keyword_literal,
        number_literal,
        map(json_string, Literal::String),
    ))
    .parse(input)
}

fn binary_operator(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::And, tag("&&")),
        value(BinaryOperator::Or, tag("||")),
        value(BinaryOperator::StartsWith, tag("^=")),
        value(BinaryOperator::EndsWith, tag("$=")),
        value(BinaryOperator::Contains, tag("*=")),
        value(BinaryOperator::LessThanOrEqual, tag("<=")),
        value(BinaryOperator::GreaterThanOrEqual, tag(">=")),
        value(BinaryOperator::NotEquals, tag("!=")),
        value(BinaryOperator::Equals, tag("=")),
        value(BinaryOperator::LessThan, tag("<")),
        value(BinaryOperator::GreaterThan, tag(">")),
        value(BinaryOperator::Plus, tag("+")),
        value(BinaryOperator::Minus, tag("-")),
        value(BinaryOperator::Multiply, tag("*")),
        value(BinaryOperator::Divide, tag("/")),
        value(BinaryOperator::Modulo, tag("%")),
    ))
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str, dialect: Dialect) -> Vec<TokenKind> {
        lex(input, dialect)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_lex_compound_selector() {
        assert_eq!(
            kinds(".stories object:has(.rating:expr(x>50))", Dialect::Selector),
            vec![
                TokenKind::Identifier("stories".into()),
                TokenKind::Combinator(Combinator::Descendant),
                TokenKind::Type(NodeKind::Object),
                TokenKind::ParamClass(ParamClass::Has),
                TokenKind::Arguments(".rating:expr(x>50)".into()),
            ]
        );
    }

    #[test]
    fn test_whitespace_around_operators_is_absorbed() {
        assert_eq!(
            kinds(".a , .b   >  .c~.d", Dialect::Selector),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Combinator(Combinator::Union),
                TokenKind::Identifier("b".into()),
                TokenKind::Combinator(Combinator::Child),
                TokenKind::Identifier("c".into()),
                TokenKind::Combinator(Combinator::Sibling),
                TokenKind::Identifier("d".into()),
            ]
        );
    }

    #[test]
    fn test_universal_after_whitespace_is_descendant() {
        assert_eq!(
            kinds("  object *  ", Dialect::Selector),
            vec![
                TokenKind::Type(NodeKind::Object),
                TokenKind::Combinator(Combinator::Descendant),
                TokenKind::Universal,
            ]
        );
    }

    #[test]
    fn test_pseudo_class_names() {
        assert_eq!(
            kinds(":root :nth-last-child (2n+1):empty:val (\"x\")", Dialect::Selector),
            vec![
                TokenKind::StructuralClass(StructuralClass::Root),
                TokenKind::Combinator(Combinator::Descendant),
                TokenKind::NthFunction(NthFunction::NthLastChild),
                TokenKind::Arguments("2n+1".into()),
                TokenKind::StructuralClass(StructuralClass::Empty),
                TokenKind::ParamClass(ParamClass::Val),
                TokenKind::Arguments("\"x\"".into()),
            ]
        );
    }

    #[test]
    fn test_quoted_and_escaped_identifiers() {
        assert_eq!(
            kinds(r#"."a name" "bare" .we\~ird"#, Dialect::Selector),
            vec![
                TokenKind::Identifier("a name".into()),
                TokenKind::Combinator(Combinator::Descendant),
                TokenKind::Identifier("bare".into()),
                TokenKind::Combinator(Combinator::Descendant),
                TokenKind::Identifier("we~ird".into()),
            ]
        );
    }

    #[test]
    fn test_nested_parentheses_are_preserved() {
        let tokens = kinds(":expr((x + 1) * (x - 1) > 3)", Dialect::Selector);
        assert_eq!(
            tokens[1],
            TokenKind::Arguments("(x + 1) * (x - 1) > 3".into())
        );
    }

    #[test]
    fn test_parentheses_inside_strings_do_not_count() {
        let tokens = kinds(r#":contains(")(")"#, Dialect::Selector);
        assert_eq!(tokens[1], TokenKind::Arguments(r#"")(""#.into()));
    }

    #[test]
    fn test_unterminated_arguments() {
        let err = lex(".a:has(.b:expr(x>1)", Dialect::Selector).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedExpression { offset: 6, .. }));
    }

    #[test]
    fn test_unrecognized_offset() {
        let err = lex("  .a @", Dialect::Selector).unwrap_err();
        assert_eq!(
            err,
            LexError::Unrecognized {
                offset: 5,
                fragment: "@".into()
            }
        );
    }

    #[test]
    fn test_expression_dialect() {
        assert_eq!(
            kinds("x-1 >= 2.5e1 && x != \"a b\" || null", Dialect::Expression),
            vec![
                TokenKind::Variable,
                TokenKind::BinaryOperator(BinaryOperator::Minus),
                TokenKind::Literal(Literal::Number(1.0)),
                TokenKind::BinaryOperator(BinaryOperator::GreaterThanOrEqual),
                TokenKind::Literal(Literal::Number(25.0)),
                TokenKind::BinaryOperator(BinaryOperator::And),
                TokenKind::Variable,
                TokenKind::BinaryOperator(BinaryOperator::NotEquals),
                TokenKind::Literal(Literal::String("a b".into())),
                TokenKind::BinaryOperator(BinaryOperator::Or),
                TokenKind::Literal(Literal::Null),
            ]
        );
    }

    #[test]
    fn test_expression_string_operators_and_parens() {
        assert_eq!(
            kinds("(x ^= \"ab\") $= *=", Dialect::Expression),
            vec![
                TokenKind::OpenParen,
                TokenKind::Variable,
                TokenKind::BinaryOperator(BinaryOperator::StartsWith),
                TokenKind::Literal(Literal::String("ab".into())),
                TokenKind::CloseParen,
                TokenKind::BinaryOperator(BinaryOperator::EndsWith),
                TokenKind::BinaryOperator(BinaryOperator::Contains),
            ]
        );
    }

    #[test]
    fn test_offsets_are_shifted_by_base() {
        let tokens = lex_at(" .b", Dialect::Selector, 10).unwrap();
        assert_eq!(tokens[0].offset, 11);
    }
}
