//! Hand-rolled lexer for the analyzed language.
//!
//! Produces spanned tokens and performs automatic semicolon insertion: a
//! newline after a token that can end a statement yields a `Semi` token, so
//! the parser only ever deals with explicit terminators.

use crate::frontend::source::{Diagnostic, Span};

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Eof,
    Semi,

    Ident(String),
    Int(String),
    Float(String),
    Str(String),

    // Keywords.
    KwPackage,
    KwImport,
    KwType,
    KwFunc,
    KwVar,
    KwIf,
    KwElse,
    KwFor,
    KwReturn,
    KwGo,
    KwDefer,
    KwMap,
    KwStruct,
    KwInterface,
    KwBreak,
    KwContinue,

    // Delimiters.
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    DotDotDot,
    Colon,

    // Operators.
    Assign,
    Define,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Not,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    PlusPlus,
    MinusMinus,
}

impl TokenKind {
    /// Whether a newline right after this token inserts a semicolon.
    fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::KwReturn
                | TokenKind::KwBreak
                | TokenKind::KwContinue
        )
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "package" => TokenKind::KwPackage,
        "import" => TokenKind::KwImport,
        "type" => TokenKind::KwType,
        "func" => TokenKind::KwFunc,
        "var" => TokenKind::KwVar,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "for" => TokenKind::KwFor,
        "return" => TokenKind::KwReturn,
        "go" => TokenKind::KwGo,
        "defer" => TokenKind::KwDefer,
        "map" => TokenKind::KwMap,
        "struct" => TokenKind::KwStruct,
        "interface" => TokenKind::KwInterface,
        "break" => TokenKind::KwBreak,
        "continue" => TokenKind::KwContinue,
        _ => return None,
    })
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    base: usize,
    last: Option<TokenKind>,
    eof_semi_done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, base: usize) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            base,
            last: None,
            eof_semi_done: false,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.base + start, self.base + self.pos)
    }

    fn error(&self, start: usize, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(message, self.span_from(start))
    }

    fn token(&mut self, start: usize, kind: TokenKind) -> Token {
        self.last = Some(kind.clone());
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, Diagnostic> {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.pos += 1;
                }
                Some(b'\n') => {
                    if self.last.as_ref().is_some_and(|k| k.ends_statement()) {
                        let start = self.pos;
                        self.pos += 1;
                        return Ok(self.token(start, TokenKind::Semi));
                    }
                    self.pos += 1;
                }
                Some(b'/') if self.peek2() == Some(b'/') => {
                    while self.peek().is_some_and(|b| b != b'\n') {
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek2() == Some(b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek2()) {
                            (Some(b'*'), Some(b'/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => {
                                return Err(self.error(start, "unterminated block comment"))
                            }
                        }
                    }
                }
                _ => break,
            }
        }

        let start = self.pos;
        let Some(c) = self.peek() else {
            if self.last.as_ref().is_some_and(|k| k.ends_statement()) && !self.eof_semi_done {
                self.eof_semi_done = true;
                self.last = Some(TokenKind::Semi);
                return Ok(Token {
                    kind: TokenKind::Semi,
                    span: self.span_from(start),
                });
            }
            return Ok(Token {
                kind: TokenKind::Eof,
                span: self.span_from(start),
            });
        };

        if c == b'_' || c.is_ascii_alphabetic() {
            while self
                .peek()
                .is_some_and(|b| b == b'_' || b.is_ascii_alphanumeric())
            {
                self.pos += 1;
            }
            let word = std::str::from_utf8(&self.src[start..self.pos])
                .map_err(|_| self.error(start, "invalid identifier encoding"))?;
            let kind = keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()));
            return Ok(self.token(start, kind));
        }

        if c.is_ascii_digit() {
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
            let mut float = false;
            if self.peek() == Some(b'.') && self.peek2().is_some_and(|b| b.is_ascii_digit()) {
                float = true;
                self.pos += 1;
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            let text = std::str::from_utf8(&self.src[start..self.pos])
                .expect("digits are valid utf-8")
                .to_string();
            let kind = if float {
                TokenKind::Float(text)
            } else {
                TokenKind::Int(text)
            };
            return Ok(self.token(start, kind));
        }

        if c == b'"' {
            self.pos += 1;
            let mut value = String::new();
            loop {
                match self.peek() {
                    Some(b'"') => {
                        self.pos += 1;
                        break;
                    }
                    Some(b'\\') => {
                        self.pos += 1;
                        let esc = self
                            .peek()
                            .ok_or_else(|| self.error(start, "unterminated string literal"))?;
                        value.push(match esc {
                            b'n' => '\n',
                            b't' => '\t',
                            b'\\' => '\\',
                            b'"' => '"',
                            other => {
                                return Err(self.error(
                                    start,
                                    format!("unsupported escape \\{}", other as char),
                                ))
                            }
                        });
                        self.pos += 1;
                    }
                    Some(b'\n') | None => {
                        return Err(self.error(start, "unterminated string literal"))
                    }
                    Some(b) => {
                        value.push(b as char);
                        self.pos += 1;
                    }
                }
            }
            return Ok(self.token(start, TokenKind::Str(value)));
        }

        self.pos += 1;
        let two = |l: &Self, second: u8| l.peek() == Some(second);
        let kind = match c {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semi,
            b'.' => {
                if self.peek() == Some(b'.') && self.peek2() == Some(b'.') {
                    self.pos += 2;
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            b':' => {
                if two(self, b'=') {
                    self.pos += 1;
                    TokenKind::Define
                } else {
                    TokenKind::Colon
                }
            }
            b'=' => {
                if two(self, b'=') {
                    self.pos += 1;
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            b'!' => {
                if two(self, b'=') {
                    self.pos += 1;
                    TokenKind::NotEq
                } else {
                    TokenKind::Not
                }
            }
            b'<' => {
                if two(self, b'=') {
                    self.pos += 1;
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                if two(self, b'=') {
                    self.pos += 1;
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'+' => {
                if two(self, b'+') {
                    self.pos += 1;
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }
            b'-' => {
                if two(self, b'-') {
                    self.pos += 1;
                    TokenKind::MinusMinus
                } else {
                    TokenKind::Minus
                }
            }
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'&' => {
                if two(self, b'&') {
                    self.pos += 1;
                    TokenKind::AndAnd
                } else {
                    TokenKind::Amp
                }
            }
            b'|' => {
                if two(self, b'|') {
                    self.pos += 1;
                    TokenKind::OrOr
                } else {
                    return Err(self.error(start, "unexpected character `|`"));
                }
            }
            other => {
                return Err(self.error(start, format!("unexpected character `{}`", other as char)))
            }
        };
        Ok(self.token(start, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lx = Lexer::new(src, 0);
        let mut out = Vec::new();
        loop {
            let tok = lx.next_token().expect("lex error");
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn semicolons_are_inserted_at_newlines() {
        let toks = kinds("x = 1\ny++\n");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Assign,
                TokenKind::Int("1".into()),
                TokenKind::Semi,
                TokenKind::Ident("y".into()),
                TokenKind::PlusPlus,
                TokenKind::Semi,
            ]
        );
    }

    #[test]
    fn no_semicolon_after_operators() {
        let toks = kinds("a &&\nb");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::AndAnd,
                TokenKind::Ident("b".into()),
                TokenKind::Semi,
            ]
        );
    }

    #[test]
    fn compound_tokens() {
        let toks = kinds("a := b != nil; cs ...");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Define,
                TokenKind::Ident("b".into()),
                TokenKind::NotEq,
                TokenKind::Ident("nil".into()),
                TokenKind::Semi,
                TokenKind::Ident("cs".into()),
                TokenKind::DotDotDot,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let toks = kinds("x // trailing\n/* block */ y");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Semi,
                TokenKind::Ident("y".into()),
                TokenKind::Semi,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let toks = kinds(r#""foo\n""#);
        assert_eq!(toks, vec![TokenKind::Str("foo\n".into()), TokenKind::Semi]);
    }
}
