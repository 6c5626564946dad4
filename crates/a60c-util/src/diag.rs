//! Diagnostics - error and warning reporting for the translator.
//!
//! Diagnostics are written to standard error in the fixed format
//! `<filename>:<line>: <message>` (warnings carry a `warning: ` tag).
//! The handler tracks the current source line, counts errors and
//! warnings, enforces the configurable error ceiling, and collects the
//! debug dump that the driver embeds into the output in `-d` mode.
//!
//! # Examples
//!
//! ```
//! use a60c_util::{Handler, Pass};
//!
//! let mut handler = Handler::new("prog.alg", 0, false, false);
//! handler.set_line(3);
//! handler.error("missing `then' delimiter").unwrap();
//! assert_eq!(handler.error_count(), 1);
//! ```

use std::fmt;

use thiserror::Error;

/// Which of the two passes over the source is running.
///
/// The first pass discovers scopes and declarations; the second pass
/// performs semantic checks and emits code. Warnings are only issued
/// on the first pass so that they appear once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    First,
    Second,
}

impl Pass {
    #[inline]
    pub fn is_first(self) -> bool {
        self == Pass::First
    }

    #[inline]
    pub fn is_second(self) -> bool {
        self == Pass::Second
    }
}

/// Translation aborted after reaching the configured error ceiling.
///
/// The terminal diagnostic has already been written when this value is
/// produced; callers unwind with `?` and the driver exits non-zero.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("translation terminated")]
pub struct Fatal;

/// Result alias used by every parsing and scanning routine.
pub type Outcome<T> = Result<T, Fatal>;

/// Collects and reports diagnostics for one translation.
pub struct Handler {
    /// Input file name used as the diagnostic prefix.
    filename: String,

    /// Error ceiling (0 = unbounded).
    errmax: u32,

    /// Suppress warnings (`-w`).
    nowarn: bool,

    /// Debug mode (`-d`): echo diagnostics and tokens into the dump.
    debug: bool,

    /// Current pass; warnings fire on the first pass only.
    pass: Pass,

    /// Current source line (the line the scanner is reading).
    line: u32,

    errors: u32,
    warnings: u32,

    /// Token dump and echoed diagnostics collected in debug mode.
    dump: Vec<String>,
}

impl Handler {
    pub fn new(filename: impl Into<String>, errmax: u8, nowarn: bool, debug: bool) -> Self {
        Self {
            filename: filename.into(),
            errmax: u32::from(errmax),
            nowarn,
            debug,
            pass: Pass::First,
            line: 0,
            errors: 0,
            warnings: 0,
            dump: Vec::new(),
        }
    }

    pub fn set_pass(&mut self, pass: Pass) {
        self.pass = pass;
    }

    #[inline]
    pub fn pass(&self) -> Pass {
        self.pass
    }

    /// Records the source line the scanner is currently reading.
    ///
    /// All diagnostics are attributed to this line, which may run a
    /// little ahead of the token being parsed.
    #[inline]
    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Reports an error against the current source line.
    ///
    /// Returns `Err(Fatal)` when the configured error ceiling is
    /// reached; the terminal message has already been printed then.
    pub fn error(&mut self, msg: impl fmt::Display) -> Outcome<()> {
        let text = format!("{}:{}: {}", self.filename, self.line, msg);
        eprintln!("{}", text);
        if self.debug && self.pass.is_first() {
            self.dump.push(format!(">>{}", text));
        }
        self.errors += 1;
        if self.errmax != 0 && self.errors == self.errmax {
            let term = "too many errors detected; translation terminated";
            eprintln!("{}:{}: {}", self.filename, self.line, term);
            self.errors += 1;
            return Err(Fatal);
        }
        Ok(())
    }

    /// Reports a warning against the current source line.
    ///
    /// Warnings are issued on the first pass only, and suppressed
    /// entirely by `-w`.
    pub fn warning(&mut self, msg: impl fmt::Display) {
        if self.pass.is_first() && !self.nowarn {
            let text = format!("{}:{}: warning: {}", self.filename, self.line, msg);
            eprintln!("{}", text);
            if self.debug {
                self.dump.push(format!(">>{}", text));
            }
            self.warnings += 1;
        }
    }

    /// Records one token for the debug dump (`-d`, first pass only).
    pub fn dump_token(&mut self, line: u32, kind: &str, image: &str) {
        if self.debug && self.pass.is_first() {
            self.dump.push(format!("{:6}: {:<6} |{}|", line, kind, image));
        }
    }

    #[inline]
    pub fn error_count(&self) -> u32 {
        self.errors
    }

    #[inline]
    pub fn warning_count(&self) -> u32 {
        self.warnings
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    #[inline]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// The collected debug dump lines, in emission order.
    pub fn dump_lines(&self) -> &[String] {
        &self.dump
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handler() {
        let handler = Handler::new("x.alg", 0, false, false);
        assert!(!handler.has_errors());
        assert_eq!(handler.error_count(), 0);
        assert_eq!(handler.warning_count(), 0);
    }

    #[test]
    fn test_error_counting() {
        let mut handler = Handler::new("x.alg", 0, false, false);
        handler.set_line(7);
        assert!(handler.error("first").is_ok());
        assert!(handler.error("second").is_ok());
        assert_eq!(handler.error_count(), 2);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_error_ceiling() {
        let mut handler = Handler::new("x.alg", 2, false, false);
        assert!(handler.error("one").is_ok());
        assert_eq!(handler.error("two"), Err(Fatal));
    }

    #[test]
    fn test_unbounded_ceiling() {
        let mut handler = Handler::new("x.alg", 0, false, false);
        for _ in 0..300 {
            assert!(handler.error("e").is_ok());
        }
        assert_eq!(handler.error_count(), 300);
    }

    #[test]
    fn test_warning_first_pass_only() {
        let mut handler = Handler::new("x.alg", 0, false, false);
        handler.warning("once");
        handler.set_pass(Pass::Second);
        handler.warning("never");
        assert_eq!(handler.warning_count(), 1);
    }

    #[test]
    fn test_warning_suppressed() {
        let mut handler = Handler::new("x.alg", 0, true, false);
        handler.warning("quiet");
        assert_eq!(handler.warning_count(), 0);
    }

    #[test]
    fn test_debug_dump() {
        let mut handler = Handler::new("x.alg", 0, false, true);
        handler.dump_token(1, "ident", "foo");
        handler.set_line(1);
        handler.error("bad").unwrap();
        let lines = handler.dump_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("|foo|"));
        assert!(lines[1].starts_with(">>x.alg:1: bad"));
    }

    #[test]
    fn test_dump_second_pass_silent() {
        let mut handler = Handler::new("x.alg", 0, false, true);
        handler.set_pass(Pass::Second);
        handler.dump_token(1, "ident", "foo");
        assert!(handler.dump_lines().is_empty());
    }
}
