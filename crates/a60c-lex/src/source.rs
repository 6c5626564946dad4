//! Line-oriented character source.
//!
//! The translator scans its input twice; the driver loads the whole
//! source into memory once and each pass reads it through a fresh
//! `LineSource`. Lines are exposed as byte slices (the hardware
//! representation is plain ASCII) with a 1-based line counter that is
//! also pushed into the diagnostics handler, so every diagnostic is
//! attributed to the line currently being read.

use a60c_util::{Handler, Outcome};

/// Line-oriented reader over the source text.
///
/// # Example
///
/// ```
/// use a60c_lex::LineSource;
/// use a60c_util::Handler;
///
/// let mut diag = Handler::new("x.alg", 0, false, false);
/// let mut src = LineSource::new("begin\nend\n");
/// assert!(!src.read_line(&mut diag).unwrap());
/// assert_eq!(src.line(), b"begin");
/// assert_eq!(src.count(), 1);
/// ```
pub struct LineSource<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: Vec<u8>,
    count: u32,
}

impl<'a> LineSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            line: Vec::new(),
            count: 0,
        }
    }

    /// Reads the next source line into the internal buffer.
    ///
    /// Returns `Ok(true)` when the end of file is reached and no
    /// further line exists. A control character that is not
    /// whitespace is diagnosed and replaced by a blank; a final line
    /// without a terminating newline is kept, with a warning.
    pub fn read_line(&mut self, diag: &mut Handler) -> Outcome<bool> {
        self.line.clear();
        loop {
            if self.pos >= self.bytes.len() {
                if self.line.is_empty() {
                    return Ok(true);
                }
                diag.set_line(self.count + 1);
                diag.warning("missing final newline");
                break;
            }
            let c = self.bytes[self.pos];
            self.pos += 1;
            if c == b'\n' {
                break;
            }
            if c.is_ascii_control() && !c.is_ascii_whitespace() {
                diag.set_line(self.count + 1);
                diag.error(format!("invalid control character 0x{:02X}", c))?;
                self.line.push(b' ');
            } else {
                self.line.push(c);
            }
        }
        self.count += 1;
        diag.set_line(self.count);
        Ok(false)
    }

    /// The current line, without its terminating newline.
    #[inline]
    pub fn line(&self) -> &[u8] {
        &self.line
    }

    /// 1-based number of the current line (0 before the first read).
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> Handler {
        Handler::new("t.alg", 0, false, false)
    }

    #[test]
    fn test_reads_lines_in_order() {
        let mut diag = handler();
        let mut src = LineSource::new("one\ntwo\n");
        assert!(!src.read_line(&mut diag).unwrap());
        assert_eq!(src.line(), b"one");
        assert!(!src.read_line(&mut diag).unwrap());
        assert_eq!(src.line(), b"two");
        assert_eq!(src.count(), 2);
        assert!(src.read_line(&mut diag).unwrap());
    }

    #[test]
    fn test_empty_input_is_eof() {
        let mut diag = handler();
        let mut src = LineSource::new("");
        assert!(src.read_line(&mut diag).unwrap());
        assert_eq!(src.count(), 0);
    }

    #[test]
    fn test_missing_final_newline_warns() {
        let mut diag = handler();
        let mut src = LineSource::new("begin");
        assert!(!src.read_line(&mut diag).unwrap());
        assert_eq!(src.line(), b"begin");
        assert_eq!(diag.warning_count(), 1);
        assert!(src.read_line(&mut diag).unwrap());
    }

    #[test]
    fn test_control_character_replaced() {
        let mut diag = handler();
        let mut src = LineSource::new("a\x01b\n");
        assert!(!src.read_line(&mut diag).unwrap());
        assert_eq!(src.line(), b"a b");
        assert_eq!(diag.error_count(), 1);
    }

    #[test]
    fn test_tab_is_kept() {
        let mut diag = handler();
        let mut src = LineSource::new("a\tb\n");
        assert!(!src.read_line(&mut diag).unwrap());
        assert_eq!(src.line(), b"a\tb");
        assert_eq!(diag.error_count(), 0);
    }

    #[test]
    fn test_diag_line_tracks_reader() {
        let mut diag = handler();
        let mut src = LineSource::new("x\ny\n");
        src.read_line(&mut diag).unwrap();
        assert_eq!(diag.line(), 1);
        src.read_line(&mut diag).unwrap();
        assert_eq!(diag.line(), 2);
    }
}
