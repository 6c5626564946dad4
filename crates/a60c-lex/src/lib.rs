//! a60c-lex - Lexical analysis for the a60c translator.
//!
//! The input language is the hardware representation of ALGOL 60 as
//! described in the IFIP Modified Report. Lexical analysis happens in
//! three layers, each folding the previous one:
//!
//! 1. [`LineSource`] - line-oriented character input with 1-based
//!    source line numbers and an end-of-file sentinel;
//! 2. [`SymbolScanner`] - folds characters into basic symbols
//!    (letters, digits, operators, keywords);
//! 3. [`TokenWindow`] - folds basic symbols into tokens (identifier,
//!    number, string, delimiter) and maintains the three-slot window
//!    (previous, current, optional one-token lookahead) that the LL(2)
//!    parser drives.
//!
//! Comment sequences (after `end` and after `comment`) are consumed at
//! the token layer and never reach the parser.

pub mod source;
pub mod symbol;
pub mod token;

mod scanner;

#[cfg(test)]
mod edge_cases;

pub use source::LineSource;
pub use symbol::{Delim, Sym};
pub use token::{Token, TokenKind, TokenWindow};
