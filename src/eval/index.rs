//! `Index`/`Slice` expression evaluation (spec.md §4.3), grounded in the
//! teacher's `isolate/index.rs` get/set-item dispatch - delegated to the
//! `Host` for plain indexing, with slice range math handled here since
//! slicing isn't part of the `Host` seam (spec.md §6).

use span::Span;
use syntax::ast;

use super::{err, Evaluator, EvalResult};
use crate::environment::Environment;
use crate::value::Value;

impl Evaluator {
  pub(crate) fn eval_index(&self, env: &Environment, target: &ast::Expr, index: &ast::Expr, span: Span) -> EvalResult<Value> {
    let t = self.eval_expr(env, target)?;
    let i = self.eval_expr(env, index)?;
    self.host.get_item(&t, &i).map_err(|e| e.with_span(span).into())
  }

  pub(crate) fn eval_slice(
    &self,
    env: &Environment,
    target: &ast::Expr,
    start: Option<&ast::Expr>,
    end: Option<&ast::Expr>,
    exclusive: bool,
    span: Span,
  ) -> EvalResult<Value> {
    let t = self.eval_expr(env, target)?;
    let start = start.map(|e| self.eval_expr(env, e)).transpose()?;
    let end = end.map(|e| self.eval_expr(env, e)).transpose()?;
    let start = start.map(|v| require_int(&v, span)).transpose()?;
    let end = end.map(|v| require_int(&v, span)).transpose()?;

    match &t {
      Value::List(items) => {
        let items = items.borrow();
        let (lo, hi) = slice_bounds(start, end, exclusive, items.len());
        Ok(Value::list(items[lo..hi].to_vec()))
      }
      Value::Str(s) => {
        let chars: Vec<char> = s.chars().collect();
        let (lo, hi) = slice_bounds(start, end, exclusive, chars.len());
        Ok(Value::str(chars[lo..hi].iter().collect::<String>()))
      }
      other => err(span, format!("'{}' object is not sliceable", other.type_name())),
    }
  }
}

fn require_int(value: &Value, span: Span) -> EvalResult<i64> {
  match value {
    Value::Int(n) => Ok(*n),
    other => err(span, format!("slice bounds must be integers, got '{}'", other.type_name())),
  }
}

/// Normalizes possibly-negative, possibly-absent slice bounds against a
/// concrete length, clamped the way CoffeeScript's `a[start..end]` clamps
/// out-of-range bounds rather than raising (spec.md §4.3).
fn slice_bounds(start: Option<i64>, end: Option<i64>, exclusive: bool, len: usize) -> (usize, usize) {
  let len_i = len as i64;
  let clamp = |i: i64| -> usize {
    let i = if i < 0 { i + len_i } else { i };
    i.clamp(0, len_i) as usize
  };
  let lo = start.map(clamp).unwrap_or(0);
  let hi = match end {
    Some(e) => {
      let e = if exclusive { e } else { e + 1 };
      clamp(e)
    }
    None => len,
  };
  if hi < lo {
    (lo, lo)
  } else {
    (lo, hi)
  }
}
