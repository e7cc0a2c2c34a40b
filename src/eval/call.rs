//! Call/`new`/function-literal evaluation (spec.md §4.3), grounded in the
//! teacher's `isolate/call.rs` (`Args` binding: positional, splat, defaults)
//! generalized to this crate's closures-over-`Environment`, kwarg, and
//! `@param` auto-assign semantics.

use std::rc::Rc;

use span::Span;
use syntax::ast;

use super::{err, rc_expr, Evaluator, EvalResult, Unwind};
use crate::class::{BoundMethod, CoffeeClass, CoffeeFunction, CoffeeInstance};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::value::Value;

/// Builds a `Value::Function` closing over `env` (spec.md §3). Shared by
/// `FunctionLit` expression evaluation and class-method construction.
pub fn make_closure(env: &Environment, params: &[ast::Param], body: &ast::Expr, bound: bool, name: Option<String>, captured_this: Option<Value>) -> Value {
  Value::Function(Rc::new(CoffeeFunction {
    name,
    params: params.to_vec(),
    body: rc_expr(body),
    env: env.clone(),
    bound_this: if bound { captured_this } else { None },
    bound,
  }))
}

impl Evaluator {
  pub(crate) fn eval_call(
    &self,
    env: &Environment,
    callee: &ast::Expr,
    args: &[ast::Expr],
    kwargs: &[(String, ast::Expr)],
    span: Span,
  ) -> EvalResult<Value> {
    // Bare `super(...)` forwards to the same-named method on the parent
    // class (spec.md §4.3, "Classes") - distinct from `super.other(...)`,
    // which the `GetAttr` arm below handles.
    if matches!(callee.kind, ast::ExprKind::Super) {
      let (arg_values, kwarg_values) = self.eval_args(env, args, kwargs)?;
      return self.call_bare_super(env, arg_values, kwarg_values, span);
    }

    // `obj.method(...)` binds `this` to `obj` for the duration of the call,
    // even though `obj.method` alone is not itself a `BoundMethod` value
    // unless explicitly taken as one (spec.md §4.3, "Method calls").
    let (callee_value, this_override) = match &callee.kind {
      ast::ExprKind::GetAttr { target, name } if !matches!(target.kind, ast::ExprKind::Super) => {
        let receiver = self.eval_expr(env, target)?;
        let method = self.get_attr(&receiver, name, callee.span)?;
        (method, Some(receiver))
      }
      ast::ExprKind::SafeAccess { target, name } => {
        let receiver = self.eval_expr(env, target)?;
        if receiver.is_null() {
          return Ok(Value::Null);
        }
        let method = self.get_attr(&receiver, name, callee.span)?;
        (method, Some(receiver))
      }
      _ => (self.eval_expr(env, callee)?, None),
    };

    let (arg_values, kwarg_values) = self.eval_args(env, args, kwargs)?;
    self.call_value(&callee_value, arg_values, kwarg_values, this_override, span)
  }

  pub(crate) fn eval_args(&self, env: &Environment, args: &[ast::Expr], kwargs: &[(String, ast::Expr)]) -> EvalResult<(Vec<Value>, Vec<(String, Value)>)> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
      if let ast::ExprKind::Splat(inner) = &arg.kind {
        let v = self.eval_expr(env, inner)?;
        match v {
          Value::List(items) => out.extend(items.borrow().iter().cloned()),
          other => return err(arg.span, format!("cannot splat a '{}' into arguments", other.type_name())),
        }
      } else {
        out.push(self.eval_expr(env, arg)?);
      }
    }
    let mut kw = Vec::with_capacity(kwargs.len());
    for (name, expr) in kwargs {
      kw.push((name.clone(), self.eval_expr(env, expr)?));
    }
    Ok((out, kw))
  }

  pub(crate) fn call_value(&self, callee: &Value, args: Vec<Value>, kwargs: Vec<(String, Value)>, this_override: Option<Value>, span: Span) -> EvalResult<Value> {
    match callee {
      Value::Function(f) => self.call_function(f, args, kwargs, this_override.or_else(|| f.bound_this.clone())),
      Value::BoundMethod(bm) => self.call_bound_method(bm, args, kwargs),
      Value::Class(class) => self.instantiate(class, args, kwargs, span),
      Value::Native(_) => self.host.call(callee, &args, &kwargs).map_err(|e| e.with_span(span).into()),
      other => err(span, format!("'{}' object is not callable", other.type_name())),
    }
  }

  fn call_bound_method(&self, bm: &BoundMethod, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult<Value> {
    self.call_function_with_super(&bm.function, args, kwargs, Some(bm.receiver.clone()), bm.owner.clone())
  }

  /// `super(...)` with no attribute: forwards to the parent class's method
  /// of the same name as the one currently executing.
  fn call_bare_super(&self, env: &Environment, args: Vec<Value>, kwargs: Vec<(String, Value)>, span: Span) -> EvalResult<Value> {
    let Some(Value::Class(parent)) = env.get("__super_class__") else {
      return err(span, "'super' used outside of a subclass method");
    };
    let Some(Value::Str(method_name)) = env.get("__current_method__") else {
      return err(span, "'super' called with no enclosing named method to forward to");
    };
    let this = env.get("this").unwrap_or(Value::Null);
    let (method, owner) = crate::class::find_method_with_owner(&parent, &method_name)
      .ok_or_else(|| Unwind::Error(crate::error::RuntimeError::at(format!("super has no method '{method_name}'"), span)))?;
    match method {
      Value::Function(f) => self.call_function_with_super(&f, args, kwargs, Some(this), Some(owner)),
      other => self.call_value(&other, args, kwargs, Some(this), span),
    }
  }

  pub(crate) fn call_function(&self, f: &Rc<CoffeeFunction>, args: Vec<Value>, kwargs: Vec<(String, Value)>, this_value: Option<Value>) -> EvalResult<Value> {
    self.call_function_with_super(f, args, kwargs, this_value, None)
  }

  pub(crate) fn call_function_with_super(
    &self,
    f: &Rc<CoffeeFunction>,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
    this_value: Option<Value>,
    super_owner: Option<Rc<CoffeeClass>>,
  ) -> EvalResult<Value> {
    let call_env = f.env.child();
    let this_value = if f.bound { f.bound_this.clone() } else { this_value };
    if let Some(this_value) = &this_value {
      call_env.define("this", this_value.clone());
    }
    if let Some(owner) = &super_owner {
      if let Some(parent) = &owner.parent {
        call_env.define("__super_class__", Value::Class(parent.clone()));
      }
      if let Some(name) = &f.name {
        call_env.define("__current_method__", Value::str(name.as_str()));
      }
    }

    let splat_pos = f.params.iter().position(|p| p.splat);
    let positional_count = splat_pos.unwrap_or(f.params.len());
    let mut drained = args.into_iter();

    for (i, param) in f.params.iter().enumerate() {
      if param.splat {
        let rest: Vec<Value> = drained.by_ref().collect();
        call_env.define(param.name.as_str(), Value::list(rest));
        continue;
      }
      let from_positional = if i < positional_count { drained.next() } else { None };
      let from_kwarg = kwargs.iter().find(|(name, _)| name == &param.name).map(|(_, v)| v.clone());
      let value = match from_positional.or(from_kwarg) {
        Some(v) => v,
        None => match &param.default {
          Some(default_expr) => self.eval_expr(&call_env, default_expr)?,
          None => Value::Null,
        },
      };
      if param.this_param {
        if let Some(this_value) = &this_value {
          self.host.set_item(this_value, Value::str(param.name.as_str()), value.clone()).map_err(Unwind::Error)?;
        }
      }
      call_env.define(param.name.as_str(), value);
    }

    match self.eval_body(&call_env, &f.body) {
      Ok(v) => Ok(v),
      Err(Unwind::Return(v)) => Ok(v),
      Err(Unwind::Break) => err(f.body.span, "'break' used outside of a loop"),
      Err(Unwind::Continue) => err(f.body.span, "'continue' used outside of a loop"),
      Err(other) => Err(other),
    }
  }

  pub(crate) fn eval_new(
    &self,
    env: &Environment,
    class_expr: &ast::Expr,
    args: &[ast::Expr],
    kwargs: &[(String, ast::Expr)],
    span: Span,
  ) -> EvalResult<Value> {
    let callee = self.eval_expr(env, class_expr)?;
    let Value::Class(class) = &callee else {
      return err(span, format!("'{}' is not a class", callee.type_name()));
    };
    let (arg_values, kwarg_values) = self.eval_args(env, args, kwargs)?;
    self.instantiate(class, arg_values, kwarg_values, span)
  }

  pub(crate) fn instantiate(&self, class: &Rc<CoffeeClass>, args: Vec<Value>, kwargs: Vec<(String, Value)>, span: Span) -> EvalResult<Value> {
    let instance = Rc::new(CoffeeInstance { class: class.clone(), fields: std::cell::RefCell::new(indexmap::IndexMap::new()) });
    let this = Value::Instance(instance);
    if let Some((ctor, owner)) = crate::class::find_method_with_owner(class, "constructor") {
      if let Value::Function(f) = ctor {
        self.call_function_with_super(&f, args, kwargs, Some(this.clone()), Some(owner))?;
      }
    }
    Ok(this)
  }

  /// Attribute read used both by plain `.name` access and by method-call
  /// dispatch, wrapping a resolved method in a `BoundMethod` so `this`
  /// (and `super`, via the owning class) are available inside it.
  pub(crate) fn get_attr(&self, receiver: &Value, name: &str, span: Span) -> EvalResult<Value> {
    match receiver {
      Value::Instance(instance) => {
        if let Some((getter, owner)) = crate::class::find_method_with_owner(&instance.class, &format!("get {name}")) {
          if let Value::Function(f) = getter {
            return self.call_function_with_super(&f, Vec::new(), Vec::new(), Some(receiver.clone()), Some(owner));
          }
        }
        if let Some(v) = instance.fields.borrow().get(name) {
          return Ok(v.clone());
        }
        if let Some((method, owner)) = crate::class::find_method_with_owner(&instance.class, name) {
          if let Value::Function(f) = method {
            return Ok(Value::BoundMethod(Rc::new(BoundMethod { receiver: receiver.clone(), function: f, owner: Some(owner) })));
          }
        }
        err(span, format!("'{}' instance has no attribute '{name}'", instance.class.name))
      }
      Value::Class(class) => class.find_method(name).ok_or_else(|| Unwind::Error(RuntimeError::at(format!("class '{}' has no attribute '{name}'", class.name), span))),
      Value::Object(_) | Value::Host(_) => self.host.get_attr(receiver, name).map_err(|e| e.with_span(span).into()),
      other => err(span, format!("'{}' object has no attribute '{name}'", other.type_name())),
    }
  }
}
