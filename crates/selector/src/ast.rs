//! Defines the Abstract Syntax Tree (AST) for selectors and `:expr` expressions.
use crate::index::NodeKind;
use crate::nth::NthFormula;
use std::fmt;

/// A full selector: one or more comma-separated alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub alternatives: Vec<ComplexSelector>,
}

/// A chain of simple selectors joined by combinators, applied left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub head: SimpleSelector,
    pub tail: Vec<(Combinator, SimpleSelector)>,
}

/// A conjunction of clauses matched against a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleSelector {
    pub clauses: Vec<Clause>,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, alternative) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", alternative)?;
        }
        Ok(())
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        for (combinator, simple) in &self.tail {
            match combinator {
                Combinator::Descendant => write!(f, " {}", simple)?,
                other => write!(f, " {} {}", other, simple)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.clauses.iter().try_for_each(|clause| write!(f, "{}", clause))
    }
}

/// One test contributed to a simple selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `object`, `string`, ...
    Type(NodeKind),
    /// `.name` or `."quoted name"`
    Key(String),
    Structural(StructuralClass),
    Nth {
        function: NthFunction,
        formula: NthFormula,
    },
    Has {
        relation: HasRelation,
        selector: Box<Selector>,
    },
    Contains(String),
    Val(Literal),
    Expr(Expression),
    /// `*`
    Universal,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Type(kind) => write!(f, "{}", kind),
            Clause::Key(name) => {
                f.write_str(".")?;
                write_json_string(f, name)
            }
            Clause::Structural(class) => write!(f, ":{}", class.name()),
            Clause::Nth { function, formula } => write!(f, ":{}({})", function.name(), formula),
            Clause::Has {
                relation: HasRelation::Child,
                selector,
            } => write!(f, ":has(> {})", selector),
            Clause::Has { selector, .. } => write!(f, ":has({})", selector),
            Clause::Contains(needle) => {
                f.write_str(":contains(")?;
                write_json_string(f, needle)?;
                f.write_str(")")
            }
            Clause::Val(literal) => write!(f, ":val({})", literal),
            Clause::Expr(expr) => write!(f, ":expr({})", expr),
            Clause::Universal => f.write_str("*"),
        }
    }
}

fn write_json_string(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let quoted = serde_json::to_string(text).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

/// Operators composing the match sets of two selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `,`
    Union,
    /// `>`
    Child,
    /// `~`
    Sibling,
    /// whitespace
    Descendant,
}

impl Combinator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ',' => Some(Combinator::Union),
            '>' => Some(Combinator::Child),
            '~' => Some(Combinator::Sibling),
            ' ' => Some(Combinator::Descendant),
            _ => None,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Union => f.write_str(","),
            Combinator::Child => f.write_str(">"),
            Combinator::Sibling => f.write_str("~"),
            Combinator::Descendant => f.write_str(" "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralClass {
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
}

impl StructuralClass {
    pub fn name(&self) -> &'static str {
        match self {
            StructuralClass::Root => "root",
            StructuralClass::Empty => "empty",
            StructuralClass::FirstChild => "first-child",
            StructuralClass::LastChild => "last-child",
            StructuralClass::OnlyChild => "only-child",
        }
    }
}

/// Pseudo-classes that take a parenthesized argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamClass {
    Has,
    Contains,
    Val,
    Expr,
}

impl ParamClass {
    pub fn name(&self) -> &'static str {
        match self {
            ParamClass::Has => "has",
            ParamClass::Contains => "contains",
            ParamClass::Val => "val",
            ParamClass::Expr => "expr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NthFunction {
    NthChild,
    NthLastChild,
}

impl NthFunction {
    pub fn name(&self) -> &'static str {
        match self {
            NthFunction::NthChild => "nth-child",
            NthFunction::NthLastChild => "nth-last-child",
        }
    }
}

/// How a `:has` candidate must relate to the inner selector's matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasRelation {
    /// `:has(S)`: the candidate is a proper ancestor of a match.
    Descendant,
    /// `:has(> S)`: the candidate is the parent of a match.
    Child,
}

/// A scalar literal, as written in `:val(...)`, `:contains(...)` or `:expr(...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write_json_string(f, s),
        }
    }
}

/// An `:expr(...)` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    /// `x`, the value of the candidate node.
    Variable,
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
}

/// Renders fully parenthesized, so the output never depends on precedence.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Variable => f.write_str("x"),
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } => write!(f, "(-{})", expr),
            Expression::BinaryOp { left, op, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,
    // Comparison
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    StartsWith,
    EndsWith,
    Contains,
    // Additive
    Plus,
    Minus,
    // Multiplicative
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::StartsWith => "^=",
            BinaryOperator::EndsWith => "$=",
            BinaryOperator::Contains => "*=",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Plus
                | BinaryOperator::Minus
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Modulo
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
