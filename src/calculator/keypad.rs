use super::evaluator::evaluate;
use super::token::{parse_literal, Operator, Token, TokenStream};
use crate::error::{LedgerError, Result};
use crate::model::display_amount;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Digit(char),
    Dot,
    Op(Operator),
    Back,
    Done,
}

impl FromStr for Key {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "back" => return Ok(Key::Back),
            "done" | "=" => return Ok(Key::Done),
            "." => return Ok(Key::Dot),
            _ => {}
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() => Ok(Key::Digit(c)),
            (Some(c), None) => Operator::from_symbol(c)
                .map(Key::Op)
                .ok_or_else(|| LedgerError::UnknownKey(s.to_string())),
            _ => Err(LedgerError::UnknownKey(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculatorState {
    Empty,
    BuildingOperand,
    AfterOperator,
}

/// Keypad-driven calculator. Each instance owns its own token stream.
#[derive(Debug, Clone)]
pub struct Calculator {
    stream: TokenStream,
    display_scale: u32,
    last_result: Option<Decimal>,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Calculator {
    pub fn new(display_scale: u32) -> Self {
        Self {
            stream: TokenStream::new(),
            display_scale,
            last_result: None,
        }
    }

    /// Starts from an existing field value, as when the keypad opens over a
    /// filled input.
    pub fn with_initial(literal: &str, display_scale: u32) -> Self {
        let mut calculator = Self::new(display_scale);
        let trimmed = literal.trim();
        if !trimmed.is_empty() && parse_literal(trimmed).is_ok() {
            calculator.stream = TokenStream::seeded(trimmed);
        }
        calculator
    }

    pub fn state(&self) -> CalculatorState {
        match self.stream.last() {
            None => CalculatorState::Empty,
            Some(Token::Op(_)) => CalculatorState::AfterOperator,
            Some(Token::Number(_)) => CalculatorState::BuildingOperand,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        self.stream.tokens()
    }

    pub fn display(&self) -> String {
        self.stream.display()
    }

    pub fn last_result(&self) -> Option<Decimal> {
        self.last_result
    }

    pub fn clear(&mut self) {
        self.stream.clear();
        self.last_result = None;
    }

    /// Applies one key. Returns the full-precision result when the key was
    /// `Done`.
    pub fn press(&mut self, key: Key) -> Result<Option<Decimal>> {
        match key {
            Key::Digit(c) => self.stream.push_digits(&c.to_string())?,
            Key::Dot => self.stream.push_dot(),
            Key::Op(op) => self.stream.push_operator(op),
            Key::Back => self.stream.backspace(),
            Key::Done => return self.evaluate().map(Some),
        }
        Ok(None)
    }

    pub fn press_str(&mut self, symbol: &str) -> Result<Option<Decimal>> {
        let key = symbol.parse::<Key>()?;
        self.press(key)
    }

    /// Evaluates the stream and re-seeds it with the rounded result, which
    /// becomes the first operand of the next expression. On error the stream
    /// is left untouched.
    pub fn evaluate(&mut self) -> Result<Decimal> {
        if self.stream.is_empty() {
            return Err(LedgerError::EmptyEvaluation);
        }

        let result = evaluate(self.stream.tokens())?;
        let shown = display_amount(result, self.display_scale).normalize();
        debug!("Evaluated '{}' = {}", self.stream.display(), result);

        self.stream = TokenStream::seeded(shown.to_string());
        self.last_result = Some(result);
        Ok(result)
    }
}
