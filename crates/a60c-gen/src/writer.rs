//! The final output formatter.
//!
//! Streams a code rope to the output, breaking lines that would
//! exceed the width target. Breaks are allowed after a newline,
//! space, `(`, `)`, `:`, `,`, `;`, or `"`; continuation lines are
//! indented by nine spaces. String literal content is treated
//! specially: a literal is closed and reopened across the break
//! (C concatenates adjacent literals), and never split right after a
//! backslash, so escape sequences stay intact.

use std::io::{self, Write};

use crate::code::Code;

#[inline]
fn is_break(c: char) -> bool {
    matches!(c, '\n' | ' ' | '(' | ')' | ':' | ',' | ';' | '"')
}

/// Formats and writes the final output code.
///
/// `width` is the line-width target (50..=255 in the CLI; default 72).
pub fn write_formatted<W: Write>(code: &Code, width: usize, out: &mut W) -> io::Result<()> {
    let mut it = code.chars();
    let mut size: i64 = 0;
    loop {
        // accumulate the next piece of code
        let mut piece = String::new();
        let mut last: Option<char> = None;
        loop {
            match it.next() {
                None => {
                    last = None;
                    break;
                }
                Some(c) => {
                    piece.push(c);
                    if is_break(c) {
                        last = Some(c);
                        break;
                    }
                }
            }
        }
        let len = piece.chars().count() as i64;
        let adjust = match last {
            Some('\n') => -1,
            Some('"') => 6,
            _ => 0,
        };
        if size + len + adjust > width as i64 && size > 0 {
            out.write_all(b"\n         ")?;
            size = 9;
        }
        out.write_all(piece.as_bytes())?;
        match last {
            None => {
                if piece.is_empty() {
                    break;
                }
                size += len;
                break;
            }
            Some('\n') => size = 0,
            Some(c) => {
                size += len;
                if c == '"' {
                    // string literal content
                    let mut oldc = c;
                    loop {
                        let nc = it.next().expect("string literal closed within the rope");
                        if size + 2 > width as i64 && oldc != '\\' {
                            out.write_all(b"\"\n         \"")?;
                            size = 10;
                        }
                        let mut buf = [0u8; 4];
                        out.write_all(nc.encode_utf8(&mut buf).as_bytes())?;
                        size += 1;
                        if oldc != '\\' && nc == '"' {
                            break;
                        }
                        oldc = nc;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(text: &str, width: usize) -> String {
        let mut code = Code::new(true);
        code.append(text);
        let mut out = Vec::new();
        write_formatted(&code, width, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_short_lines_untouched() {
        let src = "int main(void)\n{\n      return 0;\n}\n";
        assert_eq!(format(src, 72), src);
    }

    #[test]
    fn test_long_line_broken() {
        let src = format!("{};\n", "x = f(aaaa, bbbb, cccc, dddd, eeee, ffff)".repeat(3));
        let out = format(&src, 50);
        for line in out.lines() {
            assert!(line.len() <= 50, "line too long: {:?}", line);
        }
        assert!(out.contains("\n         "));
    }

    #[test]
    fn test_width_respected_outside_literals() {
        let mut code = Code::new(true);
        for _ in 0..40 {
            code.append("alpha(beta, gamma); ");
        }
        code.append("\n");
        let mut out = Vec::new();
        write_formatted(&code, 72, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        for line in text.lines() {
            assert!(line.len() <= 72, "line too long: {:?}", line);
        }
    }

    #[test]
    fn test_literal_closed_and_reopened() {
        let long = "a".repeat(120);
        let src = format!("s = \"{}\";\n", long);
        let out = format(&src, 60);
        // the literal was split into concatenated parts
        assert!(out.matches('"').count() >= 4);
        let glued: String = out
            .replace("\"\n         \"", "")
            .chars()
            .collect();
        assert!(glued.contains(&long));
    }

    #[test]
    fn test_literal_not_split_after_backslash() {
        // escape sequences survive formatting at any width
        let body = "\\n".repeat(60);
        let src = format!("s = \"{}\";\n", body);
        let out = format(&src, 50);
        assert!(!out.contains("\\\"\n         \""));
    }

    #[test]
    fn test_empty_code() {
        assert_eq!(format("", 72), "");
    }

    #[test]
    fn test_trailing_text_without_newline() {
        assert_eq!(format("abc", 72), "abc");
    }
}
