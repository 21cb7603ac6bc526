use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::eval::Value;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum LexError {
    #[error("Unexpected character '{character}' at byte {position}")]
    #[diagnostic(
        code(calc::lex::unexpected_character),
        help("remove or correct the character: `{character}`")
    )]
    UnexpectedCharacter {
        character: char,
        position: usize,
        #[label("this character")]
        span: SourceSpan,
    },

    #[error("Integer literal `{literal}` does not fit in 64 bits")]
    #[diagnostic(
        code(calc::lex::integer_overflow),
        help("integer literals must be at most 9223372036854775807")
    )]
    IntegerOverflow {
        literal: String,
        #[label("this numeric literal")]
        span: SourceSpan,
    },
}

impl LexError {
    /// Byte offset of the offending input.
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { position, .. } => *position,
            LexError::IntegerOverflow { span, .. } => span.offset(),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token '{token}'")]
    #[diagnostic(
        code(calc::parse::unexpected_token),
        help("expected a number, a name, a unary `+`/`-` or `(`")
    )]
    UnexpectedToken {
        token: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Unexpected end of input")]
    #[diagnostic(
        code(calc::parse::unexpected_eof),
        help("the input ended while an expression was still expected")
    )]
    UnexpectedEof {
        #[label("input ends here")]
        span: SourceSpan,
    },

    #[error("Expected ')'")]
    #[diagnostic(
        code(calc::parse::expected_closing_paren),
        help("close the group opened by `(` with `)`")
    )]
    ExpectedClosingParen {
        found: Option<String>,
        #[label("expected `)` here")]
        span: SourceSpan,
    },

    #[error("Expression nested deeper than {limit} levels")]
    #[diagnostic(
        code(calc::parse::nesting_too_deep),
        help("split the expression into several assignments")
    )]
    NestingTooDeep {
        limit: usize,
        #[label("too deep here")]
        span: SourceSpan,
    },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum EvalError {
    #[error("Division by zero")]
    #[diagnostic(code(calc::eval::division_by_zero))]
    DivisionByZero,

    #[error("Undefined variable '{name}'")]
    #[diagnostic(
        code(calc::eval::undefined_variable),
        help("assign `{name}` before reading it, e.g. `{name} = 0`")
    )]
    UndefinedVariable { name: String },

    #[error("Operator `{operator}` expects integers, found `{found}`")]
    #[diagnostic(
        code(calc::eval::type_mismatch),
        help("arithmetic and ordering only accept integers")
    )]
    TypeMismatch { operator: &'static str, found: Value },

    #[error("Integer overflow in `{operator}`")]
    #[diagnostic(code(calc::eval::overflow))]
    Overflow { operator: &'static str },
}

/// Any failure of the lex → parse → evaluate pipeline.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),
}
