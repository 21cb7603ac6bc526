pub mod error;
pub mod eval;
pub mod lex;
pub mod parse;

pub use error::{Error, EvalError, LexError, ParseError};
pub use eval::{Environment, Value, evaluate, evaluate_program};
pub use lex::{Lexer, Token, TokenKind, tokenize};
pub use parse::{Node, Parser, parse};

/// Lexes, parses and evaluates `source` against `env`.
///
/// Returns the value of the last statement, or `None` when the program has
/// no statements. Bindings made before a failing statement stay in `env`.
pub fn run(source: &str, env: &mut Environment) -> Result<Option<Value>, Error> {
    let tokens = tokenize(source)?;
    let statements = parse(&tokens)?;
    Ok(evaluate_program(&statements, env)?)
}

/// Keeps one [`Environment`] alive across many programs, e.g. REPL lines.
#[derive(Debug, Default)]
pub struct Interpreter {
    environment: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_environment(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn run(&mut self, source: &str) -> Result<Option<Value>, Error> {
        run(source, &mut self.environment)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}
