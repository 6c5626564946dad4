//! The basic-symbol scanner.
//!
//! Folds the character stream into basic symbols. Non-significant
//! (whitespace) characters are skipped between symbols. A sequence of
//! letters is recognized as a word delimiter if and only if it is not
//! immediately preceded or followed by a letter or digit; otherwise
//! every letter stands for itself. Two-character operators are
//! resolved with one character of lookahead.

use rustc_hash::FxHashMap;

use a60c_util::{Handler, Outcome};

use crate::source::LineSource;
use crate::symbol::{Delim, Sym, KEYWORDS};

/// The character under the scanner's cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Ch {
    /// End of file.
    Eof,
    /// End of the current line.
    Eol,
    /// An ordinary character.
    Byte(u8),
}

pub(crate) struct SymbolScanner<'a> {
    src: LineSource<'a>,
    pos: usize,
    eof: bool,
    /// The most recently scanned basic symbol.
    pub(crate) sym: Sym,
    keywords: FxHashMap<&'static str, Delim>,
}

impl<'a> SymbolScanner<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let keywords = KEYWORDS.iter().copied().collect();
        Self {
            src: LineSource::new(text),
            pos: 0,
            eof: false,
            sym: Sym::Delim(Delim::Eof),
            keywords,
        }
    }

    #[inline]
    pub(crate) fn line_count(&self) -> u32 {
        self.src.count()
    }

    #[inline]
    pub(crate) fn ch(&self) -> Ch {
        if self.eof {
            Ch::Eof
        } else {
            match self.src.line().get(self.pos) {
                Some(&b) => Ch::Byte(b),
                None => Ch::Eol,
            }
        }
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        self.pos += 1;
    }

    /// Skips non-significant characters, reading further lines as
    /// needed. On return the cursor is at a significant character or
    /// at end of file.
    pub(crate) fn skip_pad(&mut self, diag: &mut Handler) -> Outcome<()> {
        loop {
            match self.ch() {
                Ch::Eol => {
                    if self.src.read_line(diag)? {
                        self.eof = true;
                    }
                    self.pos = 0;
                }
                Ch::Byte(b) if b.is_ascii_whitespace() => self.pos += 1,
                _ => return Ok(()),
            }
        }
    }

    /// Consumes raw characters through the next semicolon; used for
    /// the comment sequence following the `comment` delimiter.
    pub(crate) fn skip_comment_text(&mut self, diag: &mut Handler) -> Outcome<()> {
        loop {
            self.skip_pad(diag)?;
            match self.ch() {
                Ch::Eof => {
                    diag.error("comment sequence following `comment' terminated by eof")?;
                    return Ok(());
                }
                Ch::Byte(b';') => {
                    self.bump();
                    return Ok(());
                }
                _ => self.bump(),
            }
        }
    }

    /// Scans the next basic symbol into `self.sym`.
    pub(crate) fn scan_symbol(&mut self, diag: &mut Handler) -> Outcome<()> {
        loop {
            self.skip_pad(diag)?;
            let b = match self.ch() {
                Ch::Eof => {
                    self.sym = Sym::Delim(Delim::Eof);
                    return Ok(());
                }
                Ch::Byte(b) => b,
                Ch::Eol => unreachable!("skip_pad leaves a significant character"),
            };
            if b.is_ascii_alphabetic() {
                if let Some((kw, end)) = self.match_keyword() {
                    self.sym = Sym::Delim(kw);
                    self.pos = end;
                } else {
                    self.sym = Sym::Letter(b);
                    self.pos += 1;
                }
                return Ok(());
            }
            if b.is_ascii_digit() {
                self.sym = Sym::Digit(b);
                self.pos += 1;
                return Ok(());
            }
            let sym = match b {
                b'+' => self.single(Delim::Plus),
                b'-' => self.pair(b'>', Delim::Minus, Delim::Impl),
                b'*' => self.pair(b'*', Delim::Times, Delim::Power),
                b'/' => self.single(Delim::Slash),
                b'%' => self.single(Delim::IntDiv),
                b'^' => self.single(Delim::Power),
                b'<' => self.pair(b'=', Delim::Less, Delim::NotGreater),
                b'=' => self.pair(b'=', Delim::Equal, Delim::Equiv),
                b'>' => self.pair(b'=', Delim::Greater, Delim::NotLess),
                b'!' => self.pair(b'=', Delim::Not, Delim::NotEqual),
                b'|' => self.single(Delim::Or),
                b'&' => self.single(Delim::And),
                b',' => self.single(Delim::Comma),
                b'.' => self.single(Delim::Point),
                b'#' => self.single(Delim::Ten),
                b':' => self.pair(b'=', Delim::Colon, Delim::Assign),
                b';' => self.single(Delim::Semicolon),
                b'(' => self.single(Delim::Left),
                b')' => self.single(Delim::Right),
                b'[' => self.single(Delim::BegSub),
                b']' => self.single(Delim::EndSub),
                b'"' => self.single(Delim::Open),
                other => {
                    diag.error(format!("invalid character `{}'", other as char))?;
                    self.pos += 1;
                    continue;
                }
            };
            self.sym = Sym::Delim(sym);
            return Ok(());
        }
    }

    #[inline]
    fn single(&mut self, d: Delim) -> Delim {
        self.pos += 1;
        d
    }

    /// One-character lookahead for two-character operators.
    #[inline]
    fn pair(&mut self, second: u8, short: Delim, long: Delim) -> Delim {
        if self.src.line().get(self.pos + 1) == Some(&second) {
            self.pos += 2;
            long
        } else {
            self.pos += 1;
            short
        }
    }

    /// Tries to recognize a word delimiter at the cursor.
    ///
    /// Returns the delimiter and the position just past it. A letter
    /// run embedded in a larger alphanumeric run never forms a word
    /// delimiter; `go` followed by one to three blanks and `to` forms
    /// the go-to delimiter.
    fn match_keyword(&self) -> Option<(Delim, usize)> {
        let line = self.src.line();
        if self.pos > 0 && line[self.pos - 1].is_ascii_alphanumeric() {
            return None;
        }
        let mut end = self.pos;
        while end < line.len() && line[end].is_ascii_alphabetic() {
            end += 1;
        }
        if end < line.len() && line[end].is_ascii_alphanumeric() {
            return None;
        }
        let run = std::str::from_utf8(&line[self.pos..end]).ok()?;
        if let Some(&kw) = self.keywords.get(run) {
            return Some((kw, end));
        }
        if run == "go" {
            let mut k = end;
            while k < line.len() && line[k] == b' ' && k - end < 3 {
                k += 1;
            }
            let spaces = k - end;
            if (1..=3).contains(&spaces)
                && line[k..].starts_with(b"to")
                && line.get(k + 2).map_or(true, |c| !c.is_ascii_alphanumeric())
            {
                return Some((Delim::Goto, k + 2));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(src: &str) -> Vec<Sym> {
        let mut diag = Handler::new("t.alg", 0, true, false);
        let mut sc = SymbolScanner::new(src);
        let mut out = Vec::new();
        loop {
            sc.scan_symbol(&mut diag).unwrap();
            if sc.sym.is(Delim::Eof) {
                break;
            }
            out.push(sc.sym);
        }
        out
    }

    #[test]
    fn test_keywords_and_letters() {
        let syms = scan_all("begin x end");
        assert_eq!(
            syms,
            vec![
                Sym::Delim(Delim::Begin),
                Sym::Letter(b'x'),
                Sym::Delim(Delim::End),
            ]
        );
    }

    #[test]
    fn test_embedded_keyword_is_letters() {
        // `ifx' and `xif' are identifiers, not the keyword `if'.
        let syms = scan_all("ifx");
        assert_eq!(
            syms,
            vec![Sym::Letter(b'i'), Sym::Letter(b'f'), Sym::Letter(b'x')]
        );
        let syms = scan_all("xif");
        assert_eq!(syms[0], Sym::Letter(b'x'));
    }

    #[test]
    fn test_keyword_followed_by_digit_is_letters() {
        let syms = scan_all("do2");
        assert_eq!(
            syms,
            vec![Sym::Letter(b'd'), Sym::Letter(b'o'), Sym::Digit(b'2')]
        );
    }

    #[test]
    fn test_goto_with_blanks() {
        assert_eq!(scan_all("goto"), vec![Sym::Delim(Delim::Goto)]);
        assert_eq!(scan_all("go to"), vec![Sym::Delim(Delim::Goto)]);
        assert_eq!(scan_all("go   to"), vec![Sym::Delim(Delim::Goto)]);
    }

    #[test]
    fn test_go_alone_is_letters() {
        assert_eq!(scan_all("go"), vec![Sym::Letter(b'g'), Sym::Letter(b'o')]);
    }

    #[test]
    fn test_boolean_both_spellings() {
        assert_eq!(scan_all("Boolean"), vec![Sym::Delim(Delim::Boolean)]);
        assert_eq!(scan_all("boolean"), vec![Sym::Delim(Delim::Boolean)]);
    }

    #[test]
    fn test_operator_pairs() {
        assert_eq!(
            scan_all("< <= = == > >= ! != : := - -> * **"),
            vec![
                Sym::Delim(Delim::Less),
                Sym::Delim(Delim::NotGreater),
                Sym::Delim(Delim::Equal),
                Sym::Delim(Delim::Equiv),
                Sym::Delim(Delim::Greater),
                Sym::Delim(Delim::NotLess),
                Sym::Delim(Delim::Not),
                Sym::Delim(Delim::NotEqual),
                Sym::Delim(Delim::Colon),
                Sym::Delim(Delim::Assign),
                Sym::Delim(Delim::Minus),
                Sym::Delim(Delim::Impl),
                Sym::Delim(Delim::Times),
                Sym::Delim(Delim::Power),
            ]
        );
    }

    #[test]
    fn test_invalid_character_skipped() {
        let mut diag = Handler::new("t.alg", 0, true, false);
        let mut sc = SymbolScanner::new("@;");
        sc.scan_symbol(&mut diag).unwrap();
        assert_eq!(sc.sym, Sym::Delim(Delim::Semicolon));
        assert_eq!(diag.error_count(), 1);
    }

    #[test]
    fn test_symbols_across_lines() {
        let syms = scan_all("begin\n  end");
        assert_eq!(
            syms,
            vec![Sym::Delim(Delim::Begin), Sym::Delim(Delim::End)]
        );
    }
}
