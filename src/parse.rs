use std::fmt::Display;

use miette::SourceSpan;
use tracing::debug;

use crate::{
    error::ParseError,
    lex::{Token, TokenKind},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Node<'de> {
    Number(i64),
    Name(&'de str),
    UnaryOp {
        op: UnaryOp,
        operand: Box<Node<'de>>,
    },
    BinaryOp {
        left: Box<Node<'de>>,
        op: BinaryOp,
        right: Box<Node<'de>>,
    },
    Compare {
        left: Box<Node<'de>>,
        op: CompareOp,
        right: Box<Node<'de>>,
    },
    Assign {
        name: &'de str,
        value: Box<Node<'de>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Less => "<",
            CompareOp::Greater => ">",
            CompareOp::LessEqual => "<=",
            CompareOp::GreaterEqual => ">=",
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
        }
    }

    fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Less => CompareOp::Less,
            TokenKind::Greater => CompareOp::Greater,
            TokenKind::LessEqual => CompareOp::LessEqual,
            TokenKind::GreaterEqual => CompareOp::GreaterEqual,
            TokenKind::EqualEqual => CompareOp::Equal,
            TokenKind::BangEqual => CompareOp::NotEqual,
            _ => return None,
        })
    }
}

impl Display for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Number(n) => write!(f, "{n}"),
            Node::Name(name) => write!(f, "{name}"),
            Node::UnaryOp { op, operand } => write!(f, "({} {operand})", op.symbol()),
            Node::BinaryOp { left, op, right } => write!(f, "({} {left} {right})", op.symbol()),
            Node::Compare { left, op, right } => write!(f, "({} {left} {right})", op.symbol()),
            Node::Assign { name, value } => write!(f, "(= {name} {value})"),
        }
    }
}

/// Parses a whole token stream into its top-level statements.
pub fn parse<'de>(tokens: &[Token<'de>]) -> Result<Vec<Node<'de>>, ParseError> {
    Parser::new(tokens).parse()
}

/// Deepest expression tree the parser builds. Parenthesized groups, unary
/// prefixes and each `+ - * /` in a chain add one level; the evaluator
/// recurses along the same tree, so this also bounds its stack use.
pub const MAX_DEPTH: usize = 256;

pub struct Parser<'a, 'de> {
    tokens: &'a [Token<'de>],
    pos: usize,
    depth: usize,
}

impl<'a, 'de> Parser<'a, 'de> {
    pub fn new(tokens: &'a [Token<'de>]) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<Vec<Node<'de>>, ParseError> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            statements.push(self.parse_statement()?);
            match self.peek() {
                Some(Token {
                    kind: TokenKind::Semicolon,
                    ..
                }) => self.pos += 1,
                _ => break,
            }
        }

        let unconsumed = self.tokens.len() - self.pos;
        if unconsumed > 0 {
            debug!(unconsumed, "statement parsing stopped before end of input");
        }
        debug!(count = statements.len(), "parsed statements");
        Ok(statements)
    }

    pub fn parse_statement(&mut self) -> Result<Node<'de>, ParseError> {
        if let [
            Token {
                kind: TokenKind::Ident,
                literal: name,
                ..
            },
            Token {
                kind: TokenKind::Equal,
                ..
            },
            ..,
        ] = self.tokens[self.pos..]
        {
            self.pos += 2;
            let value = self.parse_comparison()?;
            return Ok(Node::Assign {
                name,
                value: Box::new(value),
            });
        }

        self.parse_comparison()
    }

    /// At most one relational operator: `1 < 2 < 3` leaves the second `<` unconsumed.
    pub fn parse_comparison(&mut self) -> Result<Node<'de>, ParseError> {
        let left = self.parse_expression()?;
        let Some(op) = self.peek().and_then(|token| CompareOp::from_token(token.kind)) else {
            return Ok(left);
        };
        self.pos += 1;
        let right = self.parse_expression()?;
        Ok(Node::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn parse_expression(&mut self) -> Result<Node<'de>, ParseError> {
        let mut node = self.parse_term()?;
        let mut folds = 0;
        loop {
            let Some(token) = self.peek().copied() else {
                break;
            };
            let op = match token.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.enter(token.span())?;
            folds += 1;
            self.pos += 1;
            let right = self.parse_term()?;
            node = Node::BinaryOp {
                left: Box::new(node),
                op,
                right: Box::new(right),
            };
        }
        self.depth -= folds;
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<Node<'de>, ParseError> {
        let mut node = self.parse_factor()?;
        let mut folds = 0;
        loop {
            let Some(token) = self.peek().copied() else {
                break;
            };
            let op = match token.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.enter(token.span())?;
            folds += 1;
            self.pos += 1;
            let right = self.parse_factor()?;
            node = Node::BinaryOp {
                left: Box::new(node),
                op,
                right: Box::new(right),
            };
        }
        self.depth -= folds;
        Ok(node)
    }

    fn parse_factor(&mut self) -> Result<Node<'de>, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::UnexpectedEof {
                span: self.end_span(),
            });
        };

        Ok(match token.kind {
            TokenKind::Plus | TokenKind::Minus => {
                let op = match token.kind {
                    TokenKind::Plus => UnaryOp::Plus,
                    _ => UnaryOp::Minus,
                };
                self.enter(token.span())?;
                let operand = self.parse_factor()?;
                self.depth -= 1;
                Node::UnaryOp {
                    op,
                    operand: Box::new(operand),
                }
            }
            TokenKind::Number(n) => Node::Number(n),
            TokenKind::Ident => Node::Name(token.literal),
            TokenKind::LeftParen => {
                self.enter(token.span())?;
                let inner = self.parse_expression()?;
                self.expect_closing_paren()?;
                self.depth -= 1;
                inner
            }
            _ => {
                return Err(ParseError::UnexpectedToken {
                    token: token.literal.to_string(),
                    span: token.span(),
                });
            }
        })
    }

    fn expect_closing_paren(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::RightParen,
                ..
            }) => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(ParseError::ExpectedClosingParen {
                found: Some(token.literal.to_string()),
                span: token.span(),
            }),
            None => Err(ParseError::ExpectedClosingParen {
                found: None,
                span: self.end_span(),
            }),
        }
    }

    fn enter(&mut self, span: SourceSpan) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_DEPTH,
                span,
            });
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token<'de>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token<'de>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Zero-width span just past the last token.
    fn end_span(&self) -> SourceSpan {
        let end = self
            .tokens
            .last()
            .map_or(0, |token| token.offset + token.literal.len());
        SourceSpan::from(end..end)
    }
}
