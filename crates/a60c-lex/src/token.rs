//! Tokens and the three-slot token window.
//!
//! A token is an identifier, a numeric constant, a logical constant,
//! a character string, or a delimiter. The grammar driven by the
//! parser is LL(2): most productions resolve on the current token,
//! some need one token of lookahead, and a few need the token that
//! preceded the current one. The [`TokenWindow`] keeps exactly those
//! three slots.
//!
//! Comment sequences are consumed here: after an `end` delimiter
//! everything up to the next `;`, `else`, `end`, or end of file is
//! discarded, and after a `comment` delimiter (legal only directly
//! after `;`, `begin`, or the start of the program) everything through
//! the next semicolon is discarded.

use std::mem;

use a60c_util::{Handler, Outcome};

use crate::scanner::{Ch, SymbolScanner};
use crate::symbol::{Delim, Sym};

/// Maximal length of an identifier or constant image; longer images
/// are truncated with an error.
const T_MAXLEN: usize = 100;

/// The payload of a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Undefined (possible only in the lookahead slot).
    Undef,
    /// Identifier.
    Ident(String),
    /// Integer constant (canonical image).
    Int(String),
    /// Real constant; the ten symbol is normalized to `#`.
    Real(String),
    /// Logical constant `false`.
    False,
    /// Logical constant `true`.
    True,
    /// Character string, including the enclosing quotes.
    Str(String),
    /// Delimiter.
    Delim(Delim),
}

impl TokenKind {
    /// The token image, as shown in diagnostics and the debug dump.
    pub fn image(&self) -> &str {
        match self {
            TokenKind::Undef => "",
            TokenKind::Ident(s) | TokenKind::Int(s) | TokenKind::Real(s) | TokenKind::Str(s) => s,
            TokenKind::False => "false",
            TokenKind::True => "true",
            TokenKind::Delim(d) => d.image(),
        }
    }

    /// Short class name used by the debug token dump.
    pub fn class_name(&self) -> &'static str {
        match self {
            TokenKind::Undef => "???",
            TokenKind::Ident(_) => "ident",
            TokenKind::Int(_) => "int",
            TokenKind::Real(_) => "real",
            TokenKind::False => "false",
            TokenKind::True => "true",
            TokenKind::Str(_) => "string",
            TokenKind::Delim(_) => "delim",
        }
    }

    #[inline]
    pub fn is_delim(&self, d: Delim) -> bool {
        matches!(self, TokenKind::Delim(x) if *x == d)
    }
}

/// One token with the source line where it begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub line: u32,
    pub kind: TokenKind,
}

impl Token {
    fn eof() -> Self {
        Token {
            line: 0,
            kind: TokenKind::Delim(Delim::Eof),
        }
    }
}

/// Scans raw tokens from the basic-symbol stream.
struct TokenScanner<'a> {
    sc: SymbolScanner<'a>,
    /// The most recently scanned token; decides comment contexts.
    last: TokenKind,
}

impl<'a> TokenScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            sc: SymbolScanner::new(text),
            last: TokenKind::Delim(Delim::Eof),
        }
    }

    /// Primes the scanner: reads the very first basic symbol.
    fn prime(&mut self, diag: &mut Handler) -> Outcome<()> {
        self.sc.scan_symbol(diag)
    }

    fn scan_digits(&mut self, image: &mut String, diag: &mut Handler) -> Outcome<()> {
        while let Sym::Digit(b) = self.sc.sym {
            image.push(b as char);
            self.sc.scan_symbol(diag)?;
        }
        Ok(())
    }

    /// The decimal exponent part: optional sign, then digits.
    fn scan_exponent(&mut self, image: &mut String, diag: &mut Handler) -> Outcome<()> {
        if self.sc.sym.is(Delim::Plus) {
            image.push('+');
            self.sc.scan_symbol(diag)?;
        } else if self.sc.sym.is(Delim::Minus) {
            image.push('-');
            self.sc.scan_symbol(diag)?;
        }
        if !matches!(self.sc.sym, Sym::Digit(_)) {
            diag.error(format!("real constant `{}' incomplete", image))?;
        }
        self.scan_digits(image, diag)
    }

    /// Scans the body of a character string; the opening quote has
    /// already been consumed as a basic symbol.
    fn scan_string(&mut self, image: &mut String, diag: &mut Handler) -> Outcome<()> {
        image.push('"');
        'parts: loop {
            loop {
                match self.sc.ch() {
                    Ch::Eof => {
                        diag.error("unexpected eof within string")?;
                        break 'parts;
                    }
                    Ch::Eol => {
                        diag.error("string incomplete")?;
                        break;
                    }
                    Ch::Byte(c) if c.is_ascii_control() => {
                        diag.error(format!(
                            "invalid use of control character 0x{:02X} within string",
                            c
                        ))?;
                        self.sc.bump();
                    }
                    Ch::Byte(b'\\') => {
                        self.sc.bump();
                        match self.sc.ch() {
                            Ch::Byte(e) => {
                                image.push('\\');
                                image.push(e as char);
                                self.sc.bump();
                            }
                            _ => diag.error("invalid use of backslash within string")?,
                        }
                    }
                    Ch::Byte(b'"') => {
                        self.sc.bump();
                        break;
                    }
                    Ch::Byte(c) => {
                        image.push(c as char);
                        self.sc.bump();
                    }
                }
            }
            // a string may continue with another quoted part
            self.sc.skip_pad(diag)?;
            if self.sc.ch() == Ch::Byte(b'"') {
                self.sc.bump();
            } else {
                break 'parts;
            }
        }
        image.push('"');
        self.sc.scan_symbol(diag)
    }

    /// Scans the next token.
    fn scan(&mut self, diag: &mut Handler) -> Outcome<Token> {
        'scan: loop {
            // comment sequence following `end'
            if self.last.is_delim(Delim::End) {
                let mut some = false;
                let mut flagged = false;
                loop {
                    if matches!(
                        self.sc.sym,
                        Sym::Delim(Delim::Eof)
                            | Sym::Delim(Delim::Semicolon)
                            | Sym::Delim(Delim::Else)
                            | Sym::Delim(Delim::End)
                    ) {
                        break;
                    }
                    some = true;
                    let benign = matches!(
                        self.sc.sym,
                        Sym::Letter(_)
                            | Sym::Digit(_)
                            | Sym::Delim(Delim::False)
                            | Sym::Delim(Delim::True)
                    );
                    if !benign && !flagged {
                        diag.warning("comment sequence following `end' contains delimiter(s)");
                        flagged = true;
                    }
                    self.sc.scan_symbol(diag)?;
                }
                if self.sc.sym.is(Delim::Eof) && some {
                    diag.warning("comment sequence following `end' terminated by eof");
                }
            }
            // comment sequence following `comment'
            {
                let mut flagged = false;
                while self.sc.sym.is(Delim::Comment) {
                    let preceded_ok = self.last.is_delim(Delim::Semicolon)
                        || self.last.is_delim(Delim::Begin);
                    if !preceded_ok {
                        if self.last.is_delim(Delim::Eof) {
                            if !flagged {
                                diag.warning("no symbols preceding delimiter `comment'");
                                flagged = true;
                            }
                        } else {
                            diag.error("delimiter `comment' in invalid position")?;
                        }
                    }
                    self.sc.skip_comment_text(diag)?;
                    self.sc.scan_symbol(diag)?;
                }
            }
            // the current basic symbol begins the next token
            let line = self.sc.line_count();
            let mut image = String::new();
            let kind = match self.sc.sym {
                Sym::Letter(_) => {
                    loop {
                        match self.sc.sym {
                            Sym::Letter(b) | Sym::Digit(b) => {
                                image.push(b as char);
                                self.sc.scan_symbol(diag)?;
                            }
                            _ => break,
                        }
                    }
                    if image.len() > T_MAXLEN {
                        image.truncate(T_MAXLEN);
                        diag.error(format!("identifier `{}...' too long", image))?;
                    }
                    TokenKind::Ident(image)
                }
                Sym::Digit(_) => {
                    let mut real = false;
                    self.scan_digits(&mut image, diag)?;
                    if self.sc.sym.is(Delim::Point) {
                        real = true;
                        image.push('.');
                        self.sc.scan_symbol(diag)?;
                        if !matches!(self.sc.sym, Sym::Digit(_)) {
                            diag.error(format!("real constant `{}' incomplete", image))?;
                        }
                        self.scan_digits(&mut image, diag)?;
                    }
                    if self.sc.sym.is(Delim::Ten) {
                        real = true;
                        image.push('#');
                        self.sc.scan_symbol(diag)?;
                        self.scan_exponent(&mut image, diag)?;
                    }
                    if image.len() > T_MAXLEN {
                        image.truncate(T_MAXLEN);
                        diag.error(format!("constant `{}...' too long", image))?;
                    }
                    if real {
                        TokenKind::Real(image)
                    } else {
                        TokenKind::Int(image)
                    }
                }
                Sym::Delim(Delim::False) => {
                    self.sc.scan_symbol(diag)?;
                    TokenKind::False
                }
                Sym::Delim(Delim::True) => {
                    self.sc.scan_symbol(diag)?;
                    TokenKind::True
                }
                Sym::Delim(Delim::Open) => {
                    self.scan_string(&mut image, diag)?;
                    TokenKind::Str(image)
                }
                Sym::Delim(Delim::Point) => {
                    // a point may begin a real constant
                    image.push('.');
                    self.sc.scan_symbol(diag)?;
                    if !matches!(self.sc.sym, Sym::Digit(_)) {
                        diag.error("invalid use of period")?;
                        continue 'scan;
                    }
                    self.scan_digits(&mut image, diag)?;
                    if self.sc.sym.is(Delim::Ten) {
                        image.push('#');
                        self.sc.scan_symbol(diag)?;
                        self.scan_exponent(&mut image, diag)?;
                    }
                    if image.len() > T_MAXLEN {
                        image.truncate(T_MAXLEN);
                        diag.error(format!("constant `{}...' too long", image))?;
                    }
                    TokenKind::Real(image)
                }
                Sym::Delim(Delim::Ten) => {
                    // a ten symbol may begin a real constant
                    image.push('#');
                    self.sc.scan_symbol(diag)?;
                    if !matches!(
                        self.sc.sym,
                        Sym::Digit(_) | Sym::Delim(Delim::Plus) | Sym::Delim(Delim::Minus)
                    ) {
                        diag.error("invalid use of subscripted ten")?;
                        continue 'scan;
                    }
                    self.scan_exponent(&mut image, diag)?;
                    TokenKind::Real(image)
                }
                Sym::Delim(d) => {
                    self.sc.scan_symbol(diag)?;
                    TokenKind::Delim(d)
                }
            };
            diag.dump_token(line, kind.class_name(), kind.image());
            self.last = kind.clone();
            return Ok(Token { line, kind });
        }
    }
}

/// The three-slot token window over the source.
///
/// `prev` and `cur` are always defined; the lookahead slot is filled
/// on demand by [`TokenWindow::peek`].
pub struct TokenWindow<'a> {
    scanner: TokenScanner<'a>,
    prev: Token,
    cur: Token,
    ahead: Option<Token>,
    primed: bool,
}

impl<'a> TokenWindow<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            scanner: TokenScanner::new(text),
            prev: Token::eof(),
            cur: Token::eof(),
            ahead: None,
            primed: false,
        }
    }

    /// Shifts the window: the current token becomes the previous one
    /// and the next token (the cached lookahead, if any) becomes
    /// current.
    pub fn advance(&mut self, diag: &mut Handler) -> Outcome<()> {
        if !self.primed {
            self.scanner.prime(diag)?;
            self.primed = true;
        }
        let next = match self.ahead.take() {
            Some(t) => t,
            None => self.scanner.scan(diag)?,
        };
        self.prev = mem::replace(&mut self.cur, next);
        Ok(())
    }

    /// Fills (if necessary) and returns the lookahead slot.
    pub fn peek(&mut self, diag: &mut Handler) -> Outcome<&Token> {
        if self.ahead.is_none() {
            let t = self.scanner.scan(diag)?;
            self.ahead = Some(t);
        }
        Ok(self.ahead.as_ref().expect("lookahead filled above"))
    }

    #[inline]
    pub fn cur(&self) -> &Token {
        &self.cur
    }

    #[inline]
    pub fn prev(&self) -> &Token {
        &self.prev
    }

    /// The lookahead token, if one is cached.
    #[inline]
    pub fn ahead(&self) -> Option<&Token> {
        self.ahead.as_ref()
    }

    /// The line the scanner is currently reading (for diagnostics).
    #[inline]
    pub fn line_count(&self) -> u32 {
        self.scanner.sc.line_count()
    }
}
