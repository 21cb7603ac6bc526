use std::fmt::Display;

use miette::SourceSpan;
use tracing::{debug, trace};

use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    /// Byte offset of `literal` in the source.
    pub offset: usize,
}

impl Token<'_> {
    pub fn span(&self) -> SourceSpan {
        SourceSpan::from(self.offset..self.offset + self.literal.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number(i64),
    Ident,
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    Equal,
    Semicolon,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    BangEqual,
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        match self.kind {
            TokenKind::Number(n) => write!(f, "NUMBER {lit} {n}"),
            TokenKind::Ident => write!(f, "IDENTIFIER {lit} null"),
            TokenKind::Plus => write!(f, "PLUS {lit} null"),
            TokenKind::Minus => write!(f, "MINUS {lit} null"),
            TokenKind::Star => write!(f, "STAR {lit} null"),
            TokenKind::Slash => write!(f, "SLASH {lit} null"),
            TokenKind::LeftParen => write!(f, "LEFT_PAREN {lit} null"),
            TokenKind::RightParen => write!(f, "RIGHT_PAREN {lit} null"),
            TokenKind::Equal => write!(f, "EQUAL {lit} null"),
            TokenKind::Semicolon => write!(f, "SEMICOLON {lit} null"),
            TokenKind::Less => write!(f, "LESS {lit} null"),
            TokenKind::Greater => write!(f, "GREATER {lit} null"),
            TokenKind::LessEqual => write!(f, "LESS_EQUAL {lit} null"),
            TokenKind::GreaterEqual => write!(f, "GREATER_EQUAL {lit} null"),
            TokenKind::EqualEqual => write!(f, "EQUAL_EQUAL {lit} null"),
            TokenKind::BangEqual => write!(f, "BANG_EQUAL {lit} null"),
        }
    }
}

/// Scans the whole input into a token vector, stopping at the first error.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut tokens = Vec::new();
    for token in Lexer::new(source) {
        let token = token?;
        trace!(%token, offset = token.offset, "lexed token");
        tokens.push(token);
    }
    debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

pub struct Lexer<'de> {
    rest: &'de str,
    byte: usize,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str) -> Self {
        Lexer {
            rest: input,
            byte: 0,
        }
    }

    fn unexpected(&self, character: char, position: usize) -> LexError {
        LexError::UnexpectedCharacter {
            character,
            position,
            span: SourceSpan::from(position..self.byte),
        }
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut chars = self.rest.chars();
            let c = chars.next()?;
            let offset = self.byte;
            let literal = &self.rest[..c.len_utf8()];
            let cur = self.rest;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            enum Start {
                Ident,
                Number,
                Bang,
                IfEqualElse(TokenKind, TokenKind),
            }

            let process = |kind: TokenKind| {
                Some(Ok(Token {
                    kind,
                    literal,
                    offset,
                }))
            };

            let started = match c {
                '(' => return process(TokenKind::LeftParen),
                ')' => return process(TokenKind::RightParen),
                '-' => return process(TokenKind::Minus),
                '+' => return process(TokenKind::Plus),
                ';' => return process(TokenKind::Semicolon),
                '*' => return process(TokenKind::Star),
                '/' => return process(TokenKind::Slash),
                '!' => Start::Bang,
                '=' => Start::IfEqualElse(TokenKind::EqualEqual, TokenKind::Equal),
                '>' => Start::IfEqualElse(TokenKind::GreaterEqual, TokenKind::Greater),
                '<' => Start::IfEqualElse(TokenKind::LessEqual, TokenKind::Less),
                '0'..='9' => Start::Number,
                c if c.is_alphabetic() || c == '_' => Start::Ident,
                c if c.is_whitespace() => continue,
                c => return Some(Err(self.unexpected(c, offset))),
            };

            match started {
                Start::Ident => {
                    let first_non_ident = cur
                        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                        .unwrap_or(cur.len());

                    let literal = &cur[..first_non_ident];

                    let extra_bytes = literal.len() - c.len_utf8();
                    self.byte += extra_bytes;
                    self.rest = &self.rest[extra_bytes..];

                    return Some(Ok(Token {
                        kind: TokenKind::Ident,
                        literal,
                        offset,
                    }));
                }
                Start::Number => {
                    let first_non_digit = cur
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(cur.len());

                    let literal = &cur[..first_non_digit];

                    let extra_bytes = literal.len() - c.len_utf8();
                    self.byte += extra_bytes;
                    self.rest = &self.rest[extra_bytes..];

                    // only a run of ascii digits gets here, so the parse can fail on width alone
                    let Ok(n) = literal.parse::<i64>() else {
                        return Some(Err(LexError::IntegerOverflow {
                            literal: literal.to_string(),
                            span: SourceSpan::from(offset..self.byte),
                        }));
                    };

                    return Some(Ok(Token {
                        kind: TokenKind::Number(n),
                        literal,
                        offset,
                    }));
                }
                Start::Bang => {
                    if self.rest.starts_with('=') {
                        self.rest = &self.rest[1..];
                        self.byte += 1;
                        return Some(Ok(Token {
                            kind: TokenKind::BangEqual,
                            literal: &cur[..2],
                            offset,
                        }));
                    }
                    return Some(Err(self.unexpected('!', offset)));
                }
                Start::IfEqualElse(yes, no) => {
                    // `<` and `=` separated by anything lex as two tokens
                    if self.rest.starts_with('=') {
                        self.rest = &self.rest[1..];
                        self.byte += 1;
                        return Some(Ok(Token {
                            kind: yes,
                            literal: &cur[..2],
                            offset,
                        }));
                    }
                    return process(no);
                }
            }
        }
    }
}
