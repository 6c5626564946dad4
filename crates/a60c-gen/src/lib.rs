//! a60c-gen - Output code assembly for the a60c translator.
//!
//! Parts of the output need to be rearranged substantially during
//! translation, so nothing is written to the output file until the
//! very end. Emitted text accumulates in a rope ([`Code`]) supporting
//! constant-time append, prepend, and catenation; a final formatter
//! streams the rope out with a configurable line-width target.
//!
//! This crate also emits the parts of the output derived from the
//! block tree alone: procedure headings and prototypes, forward
//! declarations, and the per-procedure DSA structs.

pub mod code;
pub mod dsa;
pub mod writer;

#[cfg(test)]
mod tests;

pub use code::{Code, ValType};
pub use dsa::{emit_dsa_structs, emit_forward_decls, emit_proc_head};
pub use writer::write_formatted;
