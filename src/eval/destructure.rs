//! Assignment-target resolution, including array/object destructuring
//! (spec.md §4.3, §8 invariant #5: "at most one splat per pattern").

use span::Span;
use syntax::ast::{self, ExprKind};

use super::{err, Evaluator, EvalResult};
use crate::environment::Environment;
use crate::value::Value;

impl Evaluator {
  /// Assigns `value` to any assignable target: a name, a member/index
  /// expression, or a destructuring pattern.
  pub(crate) fn assign_to_target(&self, env: &Environment, target: &ast::Expr, value: Value) -> EvalResult<()> {
    match &target.kind {
      ExprKind::Identifier(name) => {
        env.assign(name, value);
        Ok(())
      }
      ExprKind::GetAttr { target: base, name } => {
        let base = self.eval_expr(env, base)?;
        if let Value::Instance(instance) = &base {
          if let Some((setter, owner)) = crate::class::find_method_with_owner(&instance.class, &format!("set {name}")) {
            if let Value::Function(f) = setter {
              self.call_function_with_super(&f, vec![value], Vec::new(), Some(base.clone()), Some(owner))?;
              return Ok(());
            }
          }
        }
        self.host.set_item(&base, Value::str(name.as_str()), value).map_err(|e| e.with_span(target.span).into())
      }
      ExprKind::Index { target: base, index } => {
        let base = self.eval_expr(env, base)?;
        let idx = self.eval_expr(env, index)?;
        self.host.set_item(&base, idx, value).map_err(|e| e.with_span(target.span).into())
      }
      ExprKind::ArrayDestructure { elems, splat_index } => self.destructure_array(env, elems, *splat_index, value, target.span),
      ExprKind::ObjectDestructure(props) => self.destructure_object(env, props, value, target.span),
      other => err(target.span, format!("invalid assignment target: {other:?}")),
    }
  }

  fn destructure_array(&self, env: &Environment, elems: &[ast::Expr], splat_index: isize, value: Value, span: Span) -> EvalResult<()> {
    let Value::List(items) = &value else {
      return err(span, format!("cannot destructure '{}' as an array", value.type_name()));
    };
    let items = items.borrow().clone();

    if splat_index < 0 {
      for (i, elem) in elems.iter().enumerate() {
        let v = items.get(i).cloned().unwrap_or(Value::Null);
        self.assign_to_target(env, elem, v)?;
      }
      return Ok(());
    }

    let splat_index = splat_index as usize;
    let tail_len = elems.len() - splat_index - 1;
    let rest_len = items.len().saturating_sub(splat_index + tail_len);

    for (i, elem) in elems.iter().enumerate().take(splat_index) {
      let v = items.get(i).cloned().unwrap_or(Value::Null);
      self.assign_to_target(env, elem, v)?;
    }

    let rest: Vec<Value> = items.iter().skip(splat_index).take(rest_len).cloned().collect();
    self.assign_to_target(env, &elems[splat_index], Value::list(rest))?;

    for (offset, elem) in elems.iter().enumerate().skip(splat_index + 1) {
      let tail_pos = offset - splat_index - 1;
      let src_idx = splat_index + rest_len + tail_pos;
      let v = items.get(src_idx).cloned().unwrap_or(Value::Null);
      self.assign_to_target(env, elem, v)?;
    }

    Ok(())
  }

  fn destructure_object(&self, env: &Environment, props: &[ast::ObjectPatternProp], value: Value, span: Span) -> EvalResult<()> {
    for prop in props {
      let field = match &value {
        Value::Object(fields) => fields.borrow().get(&prop.key).cloned(),
        Value::Instance(instance) => instance.fields.borrow().get(&prop.key).cloned(),
        other => return err(span, format!("cannot destructure '{}' as an object", other.type_name())),
      };
      let resolved = match field {
        Some(v) => v,
        None => match &prop.default {
          Some(default_expr) => self.eval_expr(env, default_expr)?,
          None => Value::Null,
        },
      };
      let name = prop.alias.as_deref().unwrap_or(&prop.key);
      env.assign(name, resolved);
    }
    Ok(())
  }
}
