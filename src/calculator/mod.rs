//! On-screen calculator: key presses build an infix token stream which is
//! evaluated through a postfix pass with exact decimals.

pub mod evaluator;
pub mod keypad;
pub mod token;

pub use evaluator::{evaluate, evaluate_postfix, to_postfix, Term};
pub use keypad::{Calculator, CalculatorState, Key};
pub use token::{Operator, Token, TokenStream};
