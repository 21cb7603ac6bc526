use std::{collections::BTreeMap, fmt::Display};

use tracing::{debug, trace};

use crate::{
    error::EvalError,
    parse::{BinaryOp, CompareOp, Node, UnaryOp},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Boolean(_) => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(_) => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Variable bindings for one evaluation run. Owned by the caller and passed
/// into every [`evaluate`] call; reuse it to keep variables between runs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Environment {
    values: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn assign(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Runs every statement in order. The result is the value of the last one,
/// or `None` for a program without statements.
pub fn evaluate_program(
    statements: &[Node<'_>],
    env: &mut Environment,
) -> Result<Option<Value>, EvalError> {
    let mut result = None;
    for statement in statements {
        let value = evaluate(statement, env)?;
        debug!(%statement, %value, "evaluated statement");
        result = Some(value);
    }
    Ok(result)
}

/// Recurses once per tree level. Parsed trees stay within
/// [`MAX_DEPTH`](crate::parse::MAX_DEPTH) open levels.
pub fn evaluate(node: &Node<'_>, env: &mut Environment) -> Result<Value, EvalError> {
    Ok(match node {
        Node::Number(n) => Value::Integer(*n),
        Node::Name(name) => {
            let Some(value) = env.get(name) else {
                return Err(EvalError::UndefinedVariable {
                    name: name.to_string(),
                });
            };
            *value
        }
        Node::UnaryOp { op, operand } => {
            let operand = integer(evaluate(operand, env)?, op.symbol())?;
            match op {
                UnaryOp::Plus => Value::Integer(operand),
                UnaryOp::Minus => Value::Integer(
                    operand
                        .checked_neg()
                        .ok_or(EvalError::Overflow { operator: "-" })?,
                ),
            }
        }
        Node::BinaryOp { left, op, right } => {
            let lhs = evaluate(left, env)?;
            let rhs = evaluate(right, env)?;
            let operator = op.symbol();
            let (lhs, rhs) = (integer(lhs, operator)?, integer(rhs, operator)?);
            let result = match op {
                BinaryOp::Add => lhs.checked_add(rhs),
                BinaryOp::Sub => lhs.checked_sub(rhs),
                BinaryOp::Mul => lhs.checked_mul(rhs),
                BinaryOp::Div => {
                    if rhs == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    floor_div(lhs, rhs)
                }
            };
            Value::Integer(result.ok_or(EvalError::Overflow { operator })?)
        }
        Node::Compare { left, op, right } => {
            let lhs = evaluate(left, env)?;
            let rhs = evaluate(right, env)?;
            let operator = op.symbol();
            Value::Boolean(match op {
                CompareOp::Equal => lhs == rhs,
                CompareOp::NotEqual => lhs != rhs,
                CompareOp::Less => integer(lhs, operator)? < integer(rhs, operator)?,
                CompareOp::Greater => integer(lhs, operator)? > integer(rhs, operator)?,
                CompareOp::LessEqual => integer(lhs, operator)? <= integer(rhs, operator)?,
                CompareOp::GreaterEqual => integer(lhs, operator)? >= integer(rhs, operator)?,
            })
        }
        Node::Assign { name, value } => {
            let value = evaluate(value, env)?;
            trace!(name, %value, "assign");
            env.assign(*name, value);
            value
        }
    })
}

fn integer(value: Value, operator: &'static str) -> Result<i64, EvalError> {
    value.as_integer().ok_or(EvalError::TypeMismatch {
        operator,
        found: value,
    })
}

/// Rounds toward negative infinity. `None` only for `i64::MIN / -1`.
fn floor_div(lhs: i64, rhs: i64) -> Option<i64> {
    let quotient = lhs.checked_div(rhs)?;
    if lhs % rhs != 0 && (lhs < 0) != (rhs < 0) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}
