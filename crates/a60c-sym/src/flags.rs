//! Identifier property flags.
//!
//! The bit values are fixed: the `print` pseudo-procedure emits them
//! in hexadecimal into the generated C, so translator and runtime
//! must agree on them.

use bitflags::bitflags;

bitflags! {
    /// Properties of a declared (or specified) identifier.
    ///
    /// An identifier with an empty flag set is not declared yet. Two
    /// patterns never coexist: `OWN` with `BYVAL`/`BYNAME`, and
    /// `STRING` with any numeric type.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IdentFlags: u16 {
        const REAL   = 0x0001;
        const INT    = 0x0002;
        const BOOL   = 0x0004;
        const LABEL  = 0x0008;
        const ARRAY  = 0x0010;
        const SWITCH = 0x0020;
        const PROC   = 0x0040;
        const STRING = 0x0080;
        /// Formal parameter called by value.
        const BYVAL  = 0x0100;
        /// Formal parameter called by name.
        const BYNAME = 0x0200;
        const OWN    = 0x0400;
        /// Code procedure (body supplied elsewhere).
        const CODE   = 0x0800;
        /// Builtin procedure bound by the resolver.
        const BLTIN  = 0x1000;
    }
}

impl IdentFlags {
    /// The arithmetic/Boolean type bits.
    #[inline]
    pub fn type_part(self) -> IdentFlags {
        self & (IdentFlags::REAL | IdentFlags::INT | IdentFlags::BOOL)
    }

    /// True for a simple local/own/by-value variable or a simple
    /// formal parameter (nothing beyond type and calling mode).
    #[inline]
    pub fn is_simple(self) -> bool {
        !self.intersects(
            IdentFlags::LABEL
                | IdentFlags::ARRAY
                | IdentFlags::SWITCH
                | IdentFlags::PROC
                | IdentFlags::STRING,
        )
    }

    /// The property words used in emitted comments, e.g.
    /// `" by value real"`.
    pub fn describe(self) -> String {
        let mut s = String::new();
        if self.contains(IdentFlags::OWN) {
            s.push_str(" own");
        }
        if self.contains(IdentFlags::BYVAL) {
            s.push_str(" by value");
        }
        if self.contains(IdentFlags::BYNAME) {
            s.push_str(" by name");
        }
        if self.contains(IdentFlags::REAL) {
            s.push_str(" real");
        }
        if self.contains(IdentFlags::INT) {
            s.push_str(" integer");
        }
        if self.contains(IdentFlags::BOOL) {
            s.push_str(" Boolean");
        }
        if self.contains(IdentFlags::LABEL) {
            s.push_str(" label");
        }
        if self.contains(IdentFlags::ARRAY) {
            s.push_str(" array");
        }
        if self.contains(IdentFlags::SWITCH) {
            s.push_str(" switch");
        }
        if self.contains(IdentFlags::PROC) {
            s.push_str(" procedure");
        }
        if self.contains(IdentFlags::STRING) {
            s.push_str(" string");
        }
        s
    }
}
