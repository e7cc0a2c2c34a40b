//! `class` declaration evaluation (spec.md §4.3, "Classes"): builds a
//! `CoffeeClass` from its member list and binds it to `name` in scope.

use std::rc::Rc;

use indexmap::IndexMap;
use span::Span;
use syntax::ast::{self, ClassMember, ExprKind};

use super::{call::make_closure, err, Evaluator, EvalResult};
use crate::class::CoffeeClass;
use crate::environment::Environment;
use crate::value::Value;

impl Evaluator {
  pub(crate) fn eval_class_decl(&self, env: &Environment, name: &str, parent_expr: Option<&ast::Expr>, members: &[ClassMember], span: Span) -> EvalResult<Value> {
    let parent = match parent_expr {
      Some(expr) => {
        let v = self.eval_expr(env, expr)?;
        match v {
          Value::Class(c) => Some(c),
          other => return err(expr.span, format!("cannot extend '{}': not a class", other.type_name())),
        }
      }
      None => None,
    };

    let mut methods = IndexMap::new();
    for member in members {
      match member {
        ClassMember::Field(member_name, expr) => {
          let value = match &expr.kind {
            ExprKind::FunctionLit { params, body, bound } => make_closure(env, params, body, *bound, Some(member_name.clone()), None),
            _ => self.eval_expr(env, expr)?,
          };
          methods.insert(member_name.clone(), value);
        }
        // Getter/setter bodies are plain clause bodies (spec.md §4.2's
        // `get name` / `set name(param)` grammar), not `->`/`=>` function
        // literals - the parameter list (none, or the single setter
        // parameter) is declared separately from the body, so the closure
        // is built directly rather than via a `FunctionLit` expression.
        ClassMember::Getter(member_name, body) => {
          let closure = make_closure(env, &[], body, false, Some(format!("get {member_name}")), None);
          methods.insert(format!("get {member_name}"), closure);
        }
        ClassMember::Setter(member_name, param, body) => {
          let params = [ast::Param { name: param.clone(), this_param: false, splat: false, default: None }];
          let closure = make_closure(env, &params, body, false, Some(format!("set {member_name}")), None);
          methods.insert(format!("set {member_name}"), closure);
        }
      }
    }

    let class = Value::Class(Rc::new(CoffeeClass { name: name.to_string(), parent, methods }));
    env.define(name, class.clone());
    Ok(class)
  }
}
