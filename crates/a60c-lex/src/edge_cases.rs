//! Edge case tests for a60c-lex.

use a60c_util::Handler;

use crate::symbol::Delim;
use crate::token::{TokenKind, TokenWindow};

fn lex_all(src: &str) -> (Vec<TokenKind>, Handler) {
    let mut diag = Handler::new("t.alg", 0, true, false);
    let mut w = TokenWindow::new(src);
    let mut out = Vec::new();
    loop {
        w.advance(&mut diag).unwrap();
        if w.cur().kind.is_delim(Delim::Eof) {
            break;
        }
        out.push(w.cur().kind.clone());
    }
    (out, diag)
}

#[test]
fn test_edge_empty_source() {
    let (t, diag) = lex_all("");
    assert!(t.is_empty());
    assert_eq!(diag.error_count(), 0);
}

#[test]
fn test_edge_blank_lines_only() {
    let (t, _) = lex_all("\n\n   \n\t\n");
    assert!(t.is_empty());
}

#[test]
fn test_edge_single_letter_ident() {
    let (t, _) = lex_all("q");
    assert_eq!(t, vec![TokenKind::Ident("q".into())]);
}

#[test]
fn test_edge_ident_with_digits() {
    let (t, _) = lex_all("x1y2z3");
    assert_eq!(t, vec![TokenKind::Ident("x1y2z3".into())]);
}

#[test]
fn test_edge_ident_spanning_lines() {
    // basic symbols may be separated by line boundaries, so an
    // identifier can be split across lines
    let (t, _) = lex_all("ab\ncd");
    assert_eq!(t, vec![TokenKind::Ident("abcd".into())]);
}

#[test]
fn test_edge_keyword_not_split_by_context() {
    let (t, _) = lex_all("if x then y else z");
    assert_eq!(t.len(), 7);
    assert_eq!(t[0], TokenKind::Delim(Delim::If));
    assert_eq!(t[2], TokenKind::Delim(Delim::Then));
    assert_eq!(t[4], TokenKind::Delim(Delim::Else));
}

#[test]
fn test_edge_zero_forms() {
    let (t, _) = lex_all("0 0.0 .0 #0");
    assert_eq!(
        t,
        vec![
            TokenKind::Int("0".into()),
            TokenKind::Real("0.0".into()),
            TokenKind::Real(".0".into()),
            TokenKind::Real("#0".into()),
        ]
    );
}

#[test]
fn test_edge_exponent_signs() {
    let (t, _) = lex_all("1#+2 1#-2 1#2");
    assert_eq!(
        t,
        vec![
            TokenKind::Real("1#+2".into()),
            TokenKind::Real("1#-2".into()),
            TokenKind::Real("1#2".into()),
        ]
    );
}

#[test]
fn test_edge_unterminated_string_eof() {
    let mut diag = Handler::new("t.alg", 0, true, false);
    let mut w = TokenWindow::new("\"never closed");
    w.advance(&mut diag).unwrap();
    assert!(matches!(w.cur().kind, TokenKind::Str(_)));
    assert!(diag.error_count() >= 1);
}

#[test]
fn test_edge_empty_string() {
    let (t, _) = lex_all("\"\"");
    assert_eq!(t, vec![TokenKind::Str("\"\"".into())]);
}

#[test]
fn test_edge_comment_at_program_start_warns() {
    let mut diag = Handler::new("t.alg", 0, false, false);
    let mut w = TokenWindow::new("comment leading text ; begin");
    w.advance(&mut diag).unwrap();
    assert_eq!(w.cur().kind, TokenKind::Delim(Delim::Begin));
    assert_eq!(diag.warning_count(), 1);
    assert_eq!(diag.error_count(), 0);
}

#[test]
fn test_edge_consecutive_comments() {
    let (t, _) = lex_all("; comment one ; comment two ; x");
    assert_eq!(
        t,
        vec![
            TokenKind::Delim(Delim::Semicolon),
            TokenKind::Ident("x".into()),
        ]
    );
}

#[test]
fn test_edge_power_spellings() {
    let (t, _) = lex_all("a ^ b ** c");
    assert_eq!(t[1], TokenKind::Delim(Delim::Power));
    assert_eq!(t[3], TokenKind::Delim(Delim::Power));
}

#[test]
fn test_edge_constant_too_long() {
    let digits = "9".repeat(140);
    let mut diag = Handler::new("t.alg", 0, true, false);
    let mut w = TokenWindow::new(&digits);
    w.advance(&mut diag).unwrap();
    match &w.cur().kind {
        TokenKind::Int(s) => assert_eq!(s.len(), 100),
        other => panic!("expected integer, got {:?}", other),
    }
    assert_eq!(diag.error_count(), 1);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The lexer terminates without panicking on arbitrary
        /// printable input.
        #[test]
        fn lexer_total_on_printable(src in "[ -~\n]{0,200}") {
            let mut diag = Handler::new("t.alg", 0, true, false);
            let mut w = TokenWindow::new(&src);
            for _ in 0..1000 {
                w.advance(&mut diag).unwrap();
                if w.cur().kind.is_delim(Delim::Eof) {
                    break;
                }
            }
        }

        /// Unsigned integers lex to a single integer token with the
        /// same image.
        #[test]
        fn integers_roundtrip(n in 0u64..=999_999_999) {
            let src = n.to_string();
            let (t, diag) = lex_all(&src);
            prop_assert_eq!(t, vec![TokenKind::Int(src)]);
            prop_assert_eq!(diag.error_count(), 0);
        }

        /// Simple real constants keep digits and point intact.
        #[test]
        fn reals_roundtrip(a in 0u32..10_000, b in 0u32..10_000) {
            let src = format!("{}.{}", a, b);
            let (t, diag) = lex_all(&src);
            prop_assert_eq!(t, vec![TokenKind::Real(src)]);
            prop_assert_eq!(diag.error_count(), 0);
        }
    }
}
