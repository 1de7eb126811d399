//! Semantics of the binary operators in `:expr`.
use crate::ast::BinaryOperator;
use crate::error::SelectError;
use crate::expression::ExprValue;
use std::mem;

/// Applies `op` to an evaluated left operand and a lazily evaluated right
/// operand. `&&` and `||` only evaluate `right` when the left side does not
/// decide the result.
pub fn evaluate<'a, F>(op: BinaryOperator, left: ExprValue<'a>, right: F) -> Result<ExprValue<'a>, SelectError>
where
    F: FnOnce() -> Result<ExprValue<'a>, SelectError>,
{
    let result = match op {
        BinaryOperator::And => left.is_truthy() && right()?.is_truthy(),
        BinaryOperator::Or => left.is_truthy() || right()?.is_truthy(),
        BinaryOperator::Plus
        | BinaryOperator::Minus
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo => return arithmetic(op, &left, &right()?).map(ExprValue::Number),
        _ => compare(op, &left, &right()?),
    };
    Ok(ExprValue::Boolean(result))
}

/// Comparisons between operands of different kinds never hold, `!=` included.
fn compare(op: BinaryOperator, left: &ExprValue<'_>, right: &ExprValue<'_>) -> bool {
    if mem::discriminant(left) != mem::discriminant(right) {
        return false;
    }
    match op {
        BinaryOperator::Equals => left == right,
        BinaryOperator::NotEquals => left != right,
        BinaryOperator::StartsWith | BinaryOperator::EndsWith | BinaryOperator::Contains => {
            match (left, right) {
                (ExprValue::String(l), ExprValue::String(r)) => match op {
                    BinaryOperator::StartsWith => l.starts_with(r.as_ref()),
                    BinaryOperator::EndsWith => l.ends_with(r.as_ref()),
                    _ => l.contains(r.as_ref()),
                },
                _ => false,
            }
        }
        _ => compare_ordered(op, left, right),
    }
}

/// Numbers compare numerically and strings lexicographically. Any other
/// pairing is never ordered.
fn compare_ordered(op: BinaryOperator, left: &ExprValue<'_>, right: &ExprValue<'_>) -> bool {
    let ordering = match (left, right) {
        (ExprValue::Number(l), ExprValue::Number(r)) => l.partial_cmp(r),
        (ExprValue::String(l), ExprValue::String(r)) => Some(l.as_ref().cmp(r.as_ref())),
        _ => None,
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinaryOperator::LessThan => ordering.is_lt(),
        BinaryOperator::LessThanOrEqual => ordering.is_le(),
        BinaryOperator::GreaterThan => ordering.is_gt(),
        _ => ordering.is_ge(),
    }
}

fn arithmetic(op: BinaryOperator, left: &ExprValue<'_>, right: &ExprValue<'_>) -> Result<f64, SelectError> {
    let (ExprValue::Number(l), ExprValue::Number(r)) = (left, right) else {
        return Err(SelectError::MalformedExpression(format!(
            "operator '{}' needs numeric operands, got {} {} and {} {}",
            op,
            left.kind_name(),
            left,
            right.kind_name(),
            right
        )));
    };
    Ok(match op {
        BinaryOperator::Plus => l + r,
        BinaryOperator::Minus => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => l / r,
        _ => l % r,
    })
}
