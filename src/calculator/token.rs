use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide => 2,
        }
    }

    pub fn apply(self, lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
        let result = match self {
            Self::Add => lhs.checked_add(rhs),
            Self::Subtract => lhs.checked_sub(rhs),
            Self::Multiply => lhs.checked_mul(rhs),
            Self::Divide => {
                if rhs.is_zero() {
                    return Err(LedgerError::DivisionByZero);
                }
                lhs.checked_div(rhs)
            }
        };

        result.ok_or_else(|| {
            LedgerError::ArithmeticOverflow(format!("{} {} {}", lhs, self.symbol(), rhs))
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    /// Literal text as typed: digits with at most one `.`, or a seeded
    /// result which may carry a leading `-`.
    Number(String),
    Op(Operator),
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::Op(_))
    }

    pub fn value(&self) -> Result<Option<Decimal>> {
        match self {
            Token::Op(_) => Ok(None),
            Token::Number(literal) => parse_literal(literal).map(Some),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(literal) => write!(f, "{}", literal),
            Token::Op(op) => write!(f, "{}", op),
        }
    }
}

/// A literal still being typed may end in `.`.
pub fn parse_literal(literal: &str) -> Result<Decimal> {
    let text = literal.strip_suffix('.').unwrap_or(literal);
    text.parse::<Decimal>()
        .map_err(|_| LedgerError::InvalidNumber(literal.to_string()))
}

/// Tokens built left to right from key presses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(literal: impl Into<String>) -> Self {
        Self {
            tokens: vec![Token::Number(literal.into())],
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Appends ASCII digits to the trailing literal, or starts a new one.
    /// Anything else is rejected and the stream is left as it was.
    pub fn push_digits(&mut self, digits: &str) -> Result<()> {
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(LedgerError::InvalidNumber(digits.to_string()));
        }
        match self.tokens.last_mut() {
            Some(Token::Number(literal)) => literal.push_str(digits),
            _ => self.tokens.push(Token::Number(digits.to_string())),
        }
        Ok(())
    }

    /// A second `.` in the same literal is ignored.
    pub fn push_dot(&mut self) {
        match self.tokens.last_mut() {
            Some(Token::Number(literal)) => {
                if !literal.contains('.') {
                    literal.push('.');
                }
            }
            _ => self.tokens.push(Token::Number("0.".to_string())),
        }
    }

    pub fn push_operator(&mut self, op: Operator) {
        match self.tokens.last_mut() {
            None => {
                self.tokens.push(Token::Number("0".to_string()));
                self.tokens.push(Token::Op(op));
            }
            Some(Token::Op(current)) => *current = op,
            Some(Token::Number(_)) => self.tokens.push(Token::Op(op)),
        }
    }

    pub fn backspace(&mut self) {
        let remove = match self.tokens.last_mut() {
            None => false,
            Some(Token::Op(_)) => true,
            Some(Token::Number(literal)) => {
                literal.pop();
                literal.is_empty() || literal.as_str() == "-"
            }
        };
        if remove {
            self.tokens.pop();
        }
    }

    pub fn display(&self) -> String {
        self.tokens.iter().map(Token::to_string).collect()
    }
}

impl fmt::Display for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
