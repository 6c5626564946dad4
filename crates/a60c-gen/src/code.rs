//! The output code rope.
//!
//! A `Code` is a piece of emitted C text produced for one grammar
//! non-terminal. Expression fragments additionally carry an lvalue
//! flag and a value type, which downstream parsing routines use for
//! semantic checks and to select the right output form.
//!
//! On the first pass every fragment is inert: all operations are
//! no-ops, so the parsing routines run identically on both passes
//! and nothing can be emitted before scope resolution completes.

use std::collections::LinkedList;

use a60c_sym::IdentFlags;

/// The value type of an expression fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValType {
    /// Not an expression (statements, declarations) or typeless.
    None,
    Real,
    Int,
    Bool,
    Label,
}

impl ValType {
    #[inline]
    pub fn is_arith(self) -> bool {
        matches!(self, ValType::Real | ValType::Int)
    }

    /// The type part of declaration flags as a value type.
    pub fn from_flags(flags: IdentFlags) -> ValType {
        if flags.contains(IdentFlags::REAL) {
            ValType::Real
        } else if flags.contains(IdentFlags::INT) {
            ValType::Int
        } else if flags.contains(IdentFlags::BOOL) {
            ValType::Bool
        } else if flags.contains(IdentFlags::LABEL) {
            ValType::Label
        } else {
            ValType::None
        }
    }

    /// The ABI flag word for this type, as emitted by `print`.
    pub fn flag_bits(self) -> u16 {
        match self {
            ValType::None => 0,
            ValType::Real => IdentFlags::REAL.bits(),
            ValType::Int => IdentFlags::INT.bits(),
            ValType::Bool => IdentFlags::BOOL.bits(),
            ValType::Label => IdentFlags::LABEL.bits(),
        }
    }
}

/// A rope of output text with O(1) append, prepend, and catenate.
pub struct Code {
    live: bool,
    /// Lvalue flag; meaningful for expression fragments only.
    pub lval: bool,
    /// Value type; meaningful for expression fragments only.
    pub ty: ValType,
    chunks: LinkedList<String>,
}

impl Code {
    /// Creates an empty fragment. An inert fragment (first pass)
    /// ignores all text operations.
    pub fn new(live: bool) -> Self {
        Self {
            live,
            lval: false,
            ty: ValType::None,
            chunks: LinkedList::new(),
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// code := code || text
    pub fn append(&mut self, text: impl Into<String>) {
        if self.live {
            self.chunks.push_back(text.into());
        }
    }

    /// code := text || code
    pub fn prepend(&mut self, text: impl Into<String>) {
        if self.live {
            self.chunks.push_front(text.into());
        }
    }

    /// self := self || other; `other` is consumed.
    pub fn catenate(&mut self, mut other: Code) {
        if self.live {
            self.chunks.append(&mut other.chunks);
        }
    }

    /// Streams the rope character by character.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chunks.iter().flat_map(|s| s.chars())
    }

    /// The whole text as one string (tests and small fragments).
    pub fn text(&self) -> String {
        self.chunks.iter().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(|s| s.is_empty())
    }
}
