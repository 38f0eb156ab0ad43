use super::token::{Operator, Token};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;

/// One item of a postfix (reverse Polish) expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Value(Decimal),
    Op(Operator),
}

/// Evaluates an infix token sequence of literals and the four binary
/// operators. A trailing operator is dropped first.
pub fn evaluate(tokens: &[Token]) -> Result<Decimal> {
    let postfix = to_postfix(tokens)?;
    evaluate_postfix(&postfix)
}

/// Shunting-yard over two precedence tiers without parentheses. Operators of
/// equal or higher precedence are popped before a new one is pushed, so
/// operators within a tier associate to the left: `5-2-1` is `(5-2)-1 = 2`
/// and `8/4/2` is `1`, never `4`.
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Term>> {
    let tokens = match tokens.last() {
        Some(last) if last.is_operator() => &tokens[..tokens.len() - 1],
        _ => tokens,
    };
    if tokens.is_empty() {
        return Err(LedgerError::EmptyEvaluation);
    }

    let mut output = Vec::with_capacity(tokens.len());
    let mut holding: Vec<Operator> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(_) => {
                if let Some(value) = token.value()? {
                    output.push(Term::Value(value));
                }
            }
            Token::Op(op) => {
                while let Some(&top) = holding.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Term::Op(top));
                    holding.pop();
                }
                holding.push(*op);
            }
        }
    }

    while let Some(op) = holding.pop() {
        output.push(Term::Op(op));
    }

    Ok(output)
}

pub fn evaluate_postfix(terms: &[Term]) -> Result<Decimal> {
    let mut stack: Vec<Decimal> = Vec::new();

    for term in terms {
        match term {
            Term::Value(value) => stack.push(*value),
            Term::Op(op) => {
                let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                    return Err(LedgerError::MalformedExpression(format!(
                        "operator '{}' is missing an operand",
                        op
                    )));
                };
                stack.push(op.apply(lhs, rhs)?);
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(result), true) => Ok(result),
        (None, _) => Err(LedgerError::EmptyEvaluation),
        (Some(_), false) => Err(LedgerError::MalformedExpression(format!(
            "{} operands left without an operator",
            stack.len() + 1
        ))),
    }
}
