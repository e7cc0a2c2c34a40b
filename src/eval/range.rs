//! Range literal materialization (spec.md §4.3, §8 invariant #6): `a..b`
//! (inclusive), `a...b` (exclusive), both with an optional `by step`.
//!
//! Length formulas (verified against spec.md §8's worked examples):
//!   inclusive: `max(0, floor((end - start) / step) + 1)`
//!   exclusive: `max(0, ceil((end - start) / step))`

use span::Span;
use syntax::ast;

use super::{err, Evaluator, EvalResult};
use crate::environment::Environment;
use crate::value::Value;

impl Evaluator {
  pub(crate) fn eval_range(
    &self,
    env: &Environment,
    start: &ast::Expr,
    end: &ast::Expr,
    exclusive: bool,
    step: Option<&ast::Expr>,
    span: Span,
  ) -> EvalResult<Value> {
    let start = self.eval_expr(env, start)?;
    let end = self.eval_expr(env, end)?;
    let start = require_int(&start, span)?;
    let end = require_int(&end, span)?;
    let step = match step {
      Some(expr) => require_int(&self.eval_expr(env, expr)?, span)?,
      None if end >= start => 1,
      None => -1,
    };
    if step == 0 {
      return err(span, "range step must not be 0");
    }

    let mut items = Vec::new();
    let mut i = start;
    if step > 0 {
      while if exclusive { i < end } else { i <= end } {
        items.push(Value::Int(i));
        i += step;
      }
    } else {
      while if exclusive { i > end } else { i >= end } {
        items.push(Value::Int(i));
        i += step;
      }
    }
    Ok(Value::list(items))
  }
}

fn require_int(value: &Value, span: Span) -> EvalResult<i64> {
  match value {
    Value::Int(n) => Ok(*n),
    other => err(span, format!("range bounds must be integers, got '{}'", other.type_name())),
  }
}
