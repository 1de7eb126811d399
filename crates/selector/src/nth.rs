//! The `an+b` formulas accepted by `:nth-child` and `:nth-last-child`.
use crate::error::ParseError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{all_consuming, map_res, opt, value},
    sequence::delimited,
};
use std::fmt;

/// Matches positions `p` for which some `n >= 0` gives `p = a*n + b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthFormula {
    pub a: i64,
    pub b: i64,
}

impl NthFormula {
    pub const ODD: NthFormula = NthFormula { a: 2, b: 1 };
    pub const EVEN: NthFormula = NthFormula { a: 2, b: 0 };

    pub fn new(a: i64, b: i64) -> Self {
        NthFormula { a, b }
    }

    /// Parses `odd`, `even`, a bare integer, or `[+-]?\d*n([+-]\d+)?`.
    /// Surrounding whitespace and whitespace around the offset sign are allowed.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        all_consuming(delimited(multispace0, formula, multispace0))
            .parse(text)
            .map(|(_, formula)| formula)
            .map_err(|_| ParseError::MalformedFormula(text.trim().to_string()))
    }

    /// Tests a 1-based position.
    pub fn matches(&self, position: usize) -> bool {
        // Widened so offsets near the i64 limits cannot overflow.
        let p = position as i128;
        let (a, b) = (i128::from(self.a), i128::from(self.b));
        if a == 0 {
            return p == b;
        }
        let diff = p - b;
        diff % a == 0 && diff / a >= 0
    }
}

impl fmt::Display for NthFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.a, self.b) {
            (0, b) => write!(f, "{}", b),
            (a, 0) => write!(f, "{}n", a),
            (a, b) => write!(f, "{}n{:+}", a, b),
        }
    }
}

fn sign(input: &str) -> IResult<&str, i64> {
    alt((value(1, char('+')), value(-1, char('-')))).parse(input)
}

fn step_formula(input: &str) -> IResult<&str, NthFormula> {
    map_res(
        (
            opt(sign),
            digit0,
            char('n'),
            opt((multispace0, one_of("+-"), multispace0, digit1)),
        ),
        |(sign, coefficient, _, offset): (Option<i64>, &str, char, Option<(&str, char, &str, &str)>)| {
            let magnitude = if coefficient.is_empty() {
                1
            } else {
                coefficient.parse::<i64>()?
            };
            let b = match offset {
                Some((_, '-', _, digits)) => -digits.parse::<i64>()?,
                Some((_, _, _, digits)) => digits.parse::<i64>()?,
                None => 0,
            };
            Ok::<_, std::num::ParseIntError>(NthFormula::new(sign.unwrap_or(1) * magnitude, b))
        },
    )
    .parse(input)
}

fn constant_formula(input: &str) -> IResult<&str, NthFormula> {
    map_res((opt(sign), digit1), |(sign, digits): (Option<i64>, &str)| {
        digits
            .parse::<i64>()
            .map(|b| NthFormula::new(0, sign.unwrap_or(1) * b))
    })
    .parse(input)
}

fn formula(input: &str) -> IResult<&str, NthFormula> {
    alt((
        value(NthFormula::ODD, tag("odd")),
        value(NthFormula::EVEN, tag("even")),
        step_formula,
        constant_formula,
    ))
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(formula: NthFormula, upto: usize) -> Vec<usize> {
        (1..=upto).filter(|&p| formula.matches(p)).collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(NthFormula::parse("odd").unwrap(), NthFormula::new(2, 1));
        assert_eq!(NthFormula::parse(" even ").unwrap(), NthFormula::new(2, 0));
    }

    #[test]
    fn test_step_forms() {
        assert_eq!(NthFormula::parse("2n+1").unwrap(), NthFormula::new(2, 1));
        assert_eq!(NthFormula::parse("n").unwrap(), NthFormula::new(1, 0));
        assert_eq!(NthFormula::parse("-n+3").unwrap(), NthFormula::new(-1, 3));
        assert_eq!(NthFormula::parse("+3n - 2").unwrap(), NthFormula::new(3, -2));
        assert_eq!(NthFormula::parse("10n").unwrap(), NthFormula::new(10, 0));
    }

    #[test]
    fn test_constant_forms() {
        assert_eq!(NthFormula::parse("3").unwrap(), NthFormula::new(0, 3));
        assert_eq!(NthFormula::parse("-1").unwrap(), NthFormula::new(0, -1));
    }

    #[test]
    fn test_malformed_formulas() {
        for text in ["", "n+", "2x", "odd1", "2n+1n", "--n"] {
            assert_eq!(
                NthFormula::parse(text),
                Err(ParseError::MalformedFormula(text.trim().to_string())),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_matching() {
        assert_eq!(positions(NthFormula::ODD, 6), vec![1, 3, 5]);
        assert_eq!(positions(NthFormula::EVEN, 6), vec![2, 4, 6]);
        assert_eq!(positions(NthFormula::new(0, 2), 6), vec![2]);
        assert_eq!(positions(NthFormula::new(-1, 3), 6), vec![1, 2, 3]);
        assert_eq!(positions(NthFormula::new(3, -2), 6), vec![1, 4]);
        assert_eq!(positions(NthFormula::new(1, 0), 3), vec![1, 2, 3]);
    }

    #[test]
    fn test_display_reparses() {
        for formula in [
            NthFormula::new(2, 1),
            NthFormula::new(-1, 3),
            NthFormula::new(3, -2),
            NthFormula::new(4, 0),
            NthFormula::new(0, -1),
        ] {
            assert_eq!(NthFormula::parse(&formula.to_string()).unwrap(), formula);
        }
    }

    #[test]
    fn test_constant_outside_range_never_matches() {
        assert!(positions(NthFormula::new(0, -1), 10).is_empty());
        assert!(positions(NthFormula::new(0, 0), 10).is_empty());
    }

    #[test]
    fn test_extreme_offsets_do_not_overflow() {
        let formula = NthFormula::parse("n-9223372036854775807").unwrap();
        assert_eq!(formula, NthFormula::new(1, -i64::MAX));
        // n = p + i64::MAX is a valid non-negative n for every position.
        assert_eq!(positions(formula, 3), vec![1, 2, 3]);

        let formula = NthFormula::parse("-n+9223372036854775807").unwrap();
        assert_eq!(positions(formula, 3), vec![1, 2, 3]);

        assert!(positions(NthFormula::new(-1, i64::MIN), 10).is_empty());
        assert!(positions(NthFormula::new(i64::MIN, -1), 10).is_empty());
        assert!(positions(NthFormula::new(0, i64::MIN), 10).is_empty());
        assert_eq!(positions(NthFormula::new(i64::MAX, 1), 3), vec![1]);
    }
}
