//! a60c-util - Shared infrastructure for the a60c translator.
//!
//! This crate holds the pieces every phase of the translator needs:
//! the diagnostics handler with its error-count ceiling, the `Fatal`
//! error that aborts a translation, and the `Outcome` result alias
//! threaded through all parsing routines.

pub mod diag;

pub use diag::{Fatal, Handler, Outcome, Pass};
