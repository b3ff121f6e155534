use std::io::{self, Write};

use errors::{Diagnostic, Diagnostics, Reporter};
use parser::Expr;
use scanner::{Token, TokenType};

mod value;
pub use value::Value;

use TokenType::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorType {
    #[error("Operand must be number.")]
    OperandMustBeNumber,
    #[error("Operands must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings,
}

/// Type error raised while evaluating, tagged with the operator that caused it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{}\n[line {}]", .error, .operator.line())]
pub struct RuntimeError<'a> {
    pub error: RuntimeErrorType,
    pub operator: Token<'a>,
}

impl From<RuntimeError<'_>> for Diagnostic {
    fn from(e: RuntimeError<'_>) -> Self {
        Diagnostic::Runtime { line: e.operator.line(), message: e.error.to_string() }
    }
}

/// Tree-walking evaluator. Holds no state, so one instance can evaluate any number of trees.
#[derive(Debug, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }

    /// Scans, parses and interprets `source`, writing the result to `output`.
    ///
    /// Each stage only runs if the previous one didn't report an error to `diagnostics`.
    pub fn run_source<R: Reporter>(
        &self,
        source: &str,
        output: &mut impl Write,
        diagnostics: &mut Diagnostics<R>,
    ) -> io::Result<()> {
        let tokens = scanner::scan(source, diagnostics);
        if diagnostics.had_error() {
            return Ok(());
        }

        match parser::parse(&tokens, diagnostics) {
            Ok(expr) if !diagnostics.had_error() => self.interpret(&expr, output, diagnostics),
            _ => Ok(()),
        }
    }

    /// Evaluates `expr` and writes the result, or reports the runtime error.
    pub fn interpret<R: Reporter>(
        &self,
        expr: &Expr,
        output: &mut impl Write,
        diagnostics: &mut Diagnostics<R>,
    ) -> io::Result<()> {
        match self.evaluate(expr) {
            Ok(value) => writeln!(output, "{value}"),
            Err(e) => {
                log::debug!("Hit runtime error: {e:?}");
                diagnostics.report(e);
                Ok(())
            }
        }
    }

    /// Evaluates `expr` to a value, or fails on the first operand of the wrong type.
    ///
    /// # Panics
    ///
    /// If a `Unary` or `Binary` node carries a token that isn't one of its operators. Trees
    /// built by the parser never do.
    pub fn evaluate<'a>(&self, expr: &Expr<'a>) -> Result<Value, RuntimeError<'a>> {
        log::trace!("Evaluating {expr}");
        match expr {
            Expr::Literal(literal) => Ok(literal.into()),

            Expr::Grouping(expr) => self.evaluate(expr),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match (operator.ty(), right) {
                    (Minus, Value::Number(n)) => Ok((-n).into()),
                    (Minus, _) => Err(RuntimeError {
                        error: RuntimeErrorType::OperandMustBeNumber,
                        operator: operator.clone(),
                    }),
                    (Bang, v) => Ok((!v.is_truthy()).into()),
                    (ty, _) => unreachable!("{ty} is not a unary operator"),
                }
            }

            Expr::Binary { left, operator, right } => {
                // Both sides are always evaluated, left first
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                let error = |error| RuntimeError { error, operator: operator.clone() };

                match (operator.ty(), left, right) {
                    (Minus, Value::Number(l), Value::Number(r)) => Ok((l - r).into()),
                    (Slash, Value::Number(l), Value::Number(r)) => Ok((l / r).into()),
                    (Star, Value::Number(l), Value::Number(r)) => Ok((l * r).into()),
                    (Plus, Value::Number(l), Value::Number(r)) => Ok((l + r).into()),
                    (Plus, Value::Str(l), Value::Str(r)) => Ok((l + &r).into()),

                    (Greater, Value::Number(l), Value::Number(r)) => Ok((l > r).into()),
                    (GreaterEqual, Value::Number(l), Value::Number(r)) => Ok((l >= r).into()),
                    (Less, Value::Number(l), Value::Number(r)) => Ok((l < r).into()),
                    (LessEqual, Value::Number(l), Value::Number(r)) => Ok((l <= r).into()),

                    (EqualEqual, l, r) => Ok(l.equals(&r).into()),
                    (BangEqual, l, r) => Ok((!l.equals(&r)).into()),

                    (Plus, _, _) => Err(error(RuntimeErrorType::OperandsMustBeNumbersOrStrings)),
                    (Minus | Slash | Star | Greater | GreaterEqual | Less | LessEqual, _, _) => {
                        Err(error(RuntimeErrorType::OperandMustBeNumber))
                    }

                    (ty, _, _) => unreachable!("{ty} is not a binary operator"),
                }
            }
        }
    }
}
