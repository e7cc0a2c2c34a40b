//! Arithmetic, comparison and logical binary operators (spec.md §4.3),
//! grounded in the teacher's `isolate/binop.rs` int/float coercion rules and
//! `isolate/cmp.rs` ordering, reworked around `Value` instead of NaN-boxed
//! registers.

use std::cmp::Ordering;

use span::Span;
use syntax::ast::{self, AugAssignOp, BinOp};

use super::{err, Evaluator, EvalResult};
use crate::environment::Environment;
use crate::value::Value;

impl Evaluator {
  /// Dispatches a `Binary` node. `&&`/`||` short-circuit and so evaluate
  /// their right operand lazily; every other operator evaluates eagerly.
  pub(crate) fn eval_binary(&self, env: &Environment, lhs: &ast::Expr, op: BinOp, rhs: &ast::Expr, span: Span) -> EvalResult<Value> {
    match op {
      BinOp::And => {
        let l = self.eval_expr(env, lhs)?;
        if l.is_truthy() {
          self.eval_expr(env, rhs)
        } else {
          Ok(l)
        }
      }
      BinOp::Or => {
        let l = self.eval_expr(env, lhs)?;
        if l.is_truthy() {
          Ok(l)
        } else {
          self.eval_expr(env, rhs)
        }
      }
      _ => {
        let l = self.eval_expr(env, lhs)?;
        let r = self.eval_expr(env, rhs)?;
        self.apply_binop(op, l, r, span)
      }
    }
  }

  pub(crate) fn apply_binop(&self, op: BinOp, l: Value, r: Value, span: Span) -> EvalResult<Value> {
    match op {
      BinOp::Add => self.numeric_add(&l, &r, span),
      BinOp::Sub => self.numeric_sub(&l, &r, span),
      BinOp::Mul => self.numeric_arith(&l, &r, span, "*", |a, b| a * b, |a, b| a * b),
      BinOp::Div => self.numeric_div(&l, &r, span),
      BinOp::Mod => self.numeric_mod(&l, &r, span),
      BinOp::Pow => self.numeric_pow(&l, &r, span),
      BinOp::Eq => Ok(Value::Bool(l == r)),
      BinOp::Neq => Ok(Value::Bool(l != r)),
      BinOp::Lt => self.compare(&l, &r, span).map(|o| Value::Bool(o == Ordering::Less)),
      BinOp::Lte => self.compare(&l, &r, span).map(|o| Value::Bool(o != Ordering::Greater)),
      BinOp::Gt => self.compare(&l, &r, span).map(|o| Value::Bool(o == Ordering::Greater)),
      BinOp::Gte => self.compare(&l, &r, span).map(|o| Value::Bool(o != Ordering::Less)),
      BinOp::And | BinOp::Or => unreachable!("short-circuit operators are handled in eval_binary"),
    }
  }

  pub(crate) fn apply_aug_op(&self, op: AugAssignOp, current: Value, rhs: Value, span: Span) -> EvalResult<Value> {
    let op = match op {
      AugAssignOp::Add => BinOp::Add,
      AugAssignOp::Sub => BinOp::Sub,
      AugAssignOp::Mul => BinOp::Mul,
      AugAssignOp::Div => BinOp::Div,
      AugAssignOp::Mod => BinOp::Mod,
    };
    self.apply_binop(op, current, rhs, span)
  }

  /// `+` concatenates if either side is a string, otherwise adds
  /// numerically (spec.md §4.3, "Operators").
  pub(crate) fn numeric_add(&self, l: &Value, r: &Value, span: Span) -> EvalResult<Value> {
    if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
      return Ok(Value::str(format!("{l}{r}")));
    }
    self.numeric_arith(l, r, span, "+", |a, b| a + b, |a, b| a + b)
  }

  pub(crate) fn numeric_sub(&self, l: &Value, r: &Value, span: Span) -> EvalResult<Value> {
    self.numeric_arith(l, r, span, "-", |a, b| a - b, |a, b| a - b)
  }

  fn numeric_arith(
    &self,
    l: &Value,
    r: &Value,
    span: Span,
    op_name: &str,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
  ) -> EvalResult<Value> {
    match (l, r) {
      (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
      (Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_op(*a as f64, *b))),
      (Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_op(*a, *b as f64))),
      (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(*a, *b))),
      _ => err(span, format!("unsupported operand types for '{op_name}': '{}' and '{}'", l.type_name(), r.type_name())),
    }
  }

  /// Division always yields a float - CoffeeScript numbers have no
  /// integer/float distinction at the source level (spec.md §4.3).
  fn numeric_div(&self, l: &Value, r: &Value, span: Span) -> EvalResult<Value> {
    let (a, b) = self.as_f64_pair(l, r, span, "/")?;
    if b == 0.0 {
      return err(span, "division by zero");
    }
    Ok(Value::Float(a / b))
  }

  /// `%` follows the host's floor-modulo convention, not Rust's truncating
  /// `%` (spec.md §4.3: "delegate[s] to host numeric/string semantics"; the
  /// ground-truth host is Python, whose `%` takes the sign of the divisor -
  /// `-7 % 3` is `2`, not `-1`).
  fn numeric_mod(&self, l: &Value, r: &Value, span: Span) -> EvalResult<Value> {
    match (l, r) {
      (Value::Int(a), Value::Int(b)) => {
        if *b == 0 {
          return err(span, "modulo by zero");
        }
        Ok(Value::Int(((a % b) + b) % b))
      }
      _ => {
        let (a, b) = self.as_f64_pair(l, r, span, "%")?;
        if b == 0.0 {
          return err(span, "modulo by zero");
        }
        Ok(Value::Float(a - b * (a / b).floor()))
      }
    }
  }

  fn numeric_pow(&self, l: &Value, r: &Value, span: Span) -> EvalResult<Value> {
    match (l, r) {
      (Value::Int(a), Value::Int(b)) if *b >= 0 && *b <= u32::MAX as i64 => Ok(Value::Int(a.pow(*b as u32))),
      _ => {
        let (a, b) = self.as_f64_pair(l, r, span, "**")?;
        Ok(Value::Float(a.powf(b)))
      }
    }
  }

  fn as_f64_pair(&self, l: &Value, r: &Value, span: Span, op_name: &str) -> EvalResult<(f64, f64)> {
    let a = match l {
      Value::Int(n) => *n as f64,
      Value::Float(n) => *n,
      other => return err(span, format!("unsupported operand type for '{op_name}': '{}'", other.type_name())),
    };
    let b = match r {
      Value::Int(n) => *n as f64,
      Value::Float(n) => *n,
      other => return err(span, format!("unsupported operand type for '{op_name}': '{}'", other.type_name())),
    };
    Ok((a, b))
  }

  /// Ordering for `<`/`<=`/`>`/`>=` and chained comparisons: numeric
  /// (int/float mixed) or lexicographic string order (spec.md §4.3).
  pub(crate) fn compare(&self, l: &Value, r: &Value, span: Span) -> EvalResult<Ordering> {
    match (l, r) {
      (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
      (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
      _ => {
        let (a, b) = self.as_f64_pair(l, r, span, "comparison")?;
        a.partial_cmp(&b).ok_or_else(|| super::Unwind::Error(crate::error::RuntimeError::at("comparison between NaN is undefined", span)))
      }
    }
  }
}
