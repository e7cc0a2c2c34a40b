//! Expression-kind dispatch (spec.md §4.3) - the evaluator's largest single
//! match, mirroring the shape of the teacher's own bytecode dispatch loop
//! but walking the AST directly rather than a compiled instruction stream.

use std::cmp::Ordering;

use indexmap::IndexMap;
use syntax::ast::{self, CmpOp, ExprKind, Literal, UnaryOp};

use super::call::make_closure;
use super::{err, Evaluator, EvalResult, Unwind};
use crate::class::BoundMethod;
use crate::environment::Environment;
use crate::value::Value;

impl Evaluator {
  pub(crate) fn eval_expr(&self, env: &Environment, expr: &ast::Expr) -> EvalResult<Value> {
    let span = expr.span;
    match &expr.kind {
      ExprKind::Literal(lit) => Ok(literal_value(lit)),

      ExprKind::Identifier(name) => env
        .get(name)
        .or_else(|| self.host.lookup_builtin(name))
        .ok_or_else(|| Unwind::Error(crate::error::RuntimeError::at(format!("'{name}' is not defined"), span))),

      ExprKind::This => Ok(env.get("this").unwrap_or(Value::Null)),

      ExprKind::Super => env
        .get("__super_class__")
        .ok_or_else(|| Unwind::Error(crate::error::RuntimeError::at("'super' used outside of a subclass method", span))),

      ExprKind::Unary(op, inner) => {
        let v = self.eval_expr(env, inner)?;
        self.eval_unary(*op, v, span)
      }

      ExprKind::Binary(lhs, op, rhs) => self.eval_binary(env, lhs, *op, rhs, span),

      ExprKind::ChainedComparison { operands, ops } => self.eval_chained_comparison(env, operands, ops, span),

      ExprKind::If { cond, then_branch, else_branch } => {
        if self.eval_expr(env, cond)?.is_truthy() {
          self.eval_body(env, then_branch)
        } else {
          self.eval_body(env, else_branch)
        }
      }

      ExprKind::Block(_) => self.eval_body(env, expr),

      ExprKind::Call { callee, args, kwargs, .. } => self.eval_call(env, callee, args, kwargs, span),

      ExprKind::New { class_expr, args, kwargs } => self.eval_new(env, class_expr, args, kwargs, span),

      ExprKind::FunctionLit { params, body, bound } => {
        let captured_this = if *bound { env.get("this") } else { None };
        Ok(make_closure(env, params, body, *bound, None, captured_this))
      }

      ExprKind::GetAttr { target, name } => {
        if matches!(target.kind, ExprKind::Super) {
          return self.eval_super_attr(env, name, span);
        }
        let receiver = self.eval_expr(env, target)?;
        self.get_attr(&receiver, name, span)
      }

      ExprKind::SafeAccess { target, name } => {
        let receiver = self.eval_expr(env, target)?;
        if receiver.is_null() {
          Ok(Value::Null)
        } else {
          self.get_attr(&receiver, name, span)
        }
      }

      ExprKind::ProtoAccess { target, name } => self.eval_proto_access(env, target.as_deref(), name, span),

      ExprKind::Index { target, index } => self.eval_index(env, target, index, span),

      ExprKind::Slice { target, start, end, exclusive } => self.eval_slice(env, target, start.as_deref(), end.as_deref(), *exclusive, span),

      ExprKind::ArrayLit(elems) => {
        let mut out = Vec::with_capacity(elems.len());
        for elem in elems {
          if let ExprKind::Splat(inner) = &elem.kind {
            match self.eval_expr(env, inner)? {
              Value::List(items) => out.extend(items.borrow().iter().cloned()),
              other => return err(elem.span, format!("cannot splat a '{}' into an array", other.type_name())),
            }
          } else {
            out.push(self.eval_expr(env, elem)?);
          }
        }
        Ok(Value::list(out))
      }

      ExprKind::ObjectLit(fields) => {
        let mut out = IndexMap::new();
        for (name, value_expr) in fields {
          out.insert(name.clone(), self.eval_expr(env, value_expr)?);
        }
        Ok(Value::object(out))
      }

      ExprKind::RangeLit { start, end, exclusive, step } => self.eval_range(env, start, end, *exclusive, step.as_deref(), span),

      ExprKind::Existential { left, right } => {
        let l = self.eval_expr(env, left).unwrap_or(Value::Null);
        if l.is_null() {
          self.eval_expr(env, right)
        } else {
          Ok(l)
        }
      }

      ExprKind::Splat(inner) => self.eval_expr(env, inner),

      ExprKind::InterpolatedString(parts) => {
        let mut out = String::new();
        for part in parts {
          let v = self.eval_expr(env, part)?;
          out.push_str(&v.to_string());
        }
        Ok(Value::str(out))
      }

      ExprKind::In { value, container } => {
        let needle = self.eval_expr(env, value)?;
        let haystack = self.eval_expr(env, container)?;
        match &haystack {
          Value::List(items) => Ok(Value::Bool(items.borrow().iter().any(|v| *v == needle))),
          Value::Str(s) => match &needle {
            Value::Str(n) => Ok(Value::Bool(s.contains(n.as_ref()))),
            other => err(span, format!("cannot check '{}' in a string", other.type_name())),
          },
          other => err(span, format!("'{}' object is not a container for 'in'", other.type_name())),
        }
      }

      ExprKind::Of { key, container } => {
        let key_value = self.eval_expr(env, key)?;
        let container_value = self.eval_expr(env, container)?;
        let Value::Str(key_str) = &key_value else {
          return err(span, "'of' requires a string key");
        };
        match &container_value {
          Value::Object(fields) => Ok(Value::Bool(fields.borrow().contains_key(key_str.as_ref()))),
          Value::Instance(instance) => Ok(Value::Bool(instance.fields.borrow().contains_key(key_str.as_ref()))),
          other => err(span, format!("'{}' object has no keys to check with 'of'", other.type_name())),
        }
      }

      ExprKind::Comprehension { var, iter, body, filter } => self.eval_comprehension(env, var, iter, body, filter.as_deref(), span),

      ExprKind::ObjectComprehension { key_expr, value_expr, key_var, value_var, iter, filter } => {
        self.eval_object_comprehension(env, key_expr, value_expr, key_var, value_var.as_deref(), iter, filter.as_deref(), span)
      }

      ExprKind::Switch { subject, cases, default } => self.eval_switch(env, subject.as_deref(), cases, default.as_deref()),

      ExprKind::Do(inner) => {
        let v = self.eval_expr(env, inner)?;
        if v.is_callable() {
          self.call_value(&v, Vec::new(), Vec::new(), None, span)
        } else {
          Ok(v)
        }
      }

      ExprKind::Yield(inner) => {
        if let Some(inner) = inner {
          self.eval_expr(env, inner)?;
        }
        err(span, "'yield' requires a generator function, which is not supported")
      }

      ExprKind::ArrayDestructure { .. } | ExprKind::ObjectDestructure(_) => err(span, "destructuring pattern used outside of an assignment"),
    }
  }

  fn eval_unary(&self, op: UnaryOp, v: Value, span: span::Span) -> EvalResult<Value> {
    match op {
      UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
      UnaryOp::Neg => match v {
        Value::Int(n) => Ok(Value::Int(-n)),
        Value::Float(n) => Ok(Value::Float(-n)),
        other => err(span, format!("bad operand type for unary '-': '{}'", other.type_name())),
      },
      UnaryOp::Pos => match v {
        Value::Int(_) | Value::Float(_) => Ok(v),
        Value::Str(s) => s
          .trim()
          .parse::<i64>()
          .map(Value::Int)
          .or_else(|_| s.trim().parse::<f64>().map(Value::Float))
          .map_err(|_| Unwind::Error(crate::error::RuntimeError::at(format!("invalid numeric literal '{s}'"), span))),
        other => err(span, format!("bad operand type for unary '+': '{}'", other.type_name())),
      },
    }
  }

  fn eval_chained_comparison(&self, env: &Environment, operands: &[ast::Expr], ops: &[CmpOp], span: span::Span) -> EvalResult<Value> {
    let values: Vec<Value> = operands.iter().map(|e| self.eval_expr(env, e)).collect::<EvalResult<_>>()?;
    for (pair, op) in values.windows(2).zip(ops) {
      if !self.cmp_op_holds(*op, &pair[0], &pair[1], span)? {
        return Ok(Value::Bool(false));
      }
    }
    Ok(Value::Bool(true))
  }

  fn cmp_op_holds(&self, op: CmpOp, l: &Value, r: &Value, span: span::Span) -> EvalResult<bool> {
    match op {
      CmpOp::Eq => Ok(l == r),
      CmpOp::Neq => Ok(l != r),
      CmpOp::Lt => Ok(self.compare(l, r, span)? == Ordering::Less),
      CmpOp::Lte => Ok(self.compare(l, r, span)? != Ordering::Greater),
      CmpOp::Gt => Ok(self.compare(l, r, span)? == Ordering::Greater),
      CmpOp::Gte => Ok(self.compare(l, r, span)? != Ordering::Less),
    }
  }

  fn eval_super_attr(&self, env: &Environment, name: &str, span: span::Span) -> EvalResult<Value> {
    let Some(Value::Class(parent)) = env.get("__super_class__") else {
      return err(span, "'super' used outside of a subclass method");
    };
    let this = env.get("this").unwrap_or(Value::Null);
    let (method, owner) = crate::class::find_method_with_owner(&parent, name)
      .ok_or_else(|| Unwind::Error(crate::error::RuntimeError::at(format!("super has no method '{name}'"), span)))?;
    match method {
      Value::Function(f) => Ok(Value::BoundMethod(std::rc::Rc::new(BoundMethod { receiver: this, function: f, owner: Some(owner) }))),
      other => Ok(other),
    }
  }

  fn eval_proto_access(&self, env: &Environment, target: Option<&ast::Expr>, name: &str, span: span::Span) -> EvalResult<Value> {
    let class = match target {
      Some(target_expr) => match self.eval_expr(env, target_expr)? {
        Value::Class(c) => c,
        Value::Instance(i) => i.class.clone(),
        other => return err(target_expr.span, format!("'{}' has no prototype", other.type_name())),
      },
      None => match env.get("this") {
        Some(Value::Instance(i)) => i.class.clone(),
        _ => return err(span, "bare prototype access requires an explicit target or 'this' in scope"),
      },
    };
    class
      .find_method(name)
      .ok_or_else(|| Unwind::Error(crate::error::RuntimeError::at(format!("'{}' has no method '{name}'", class.name), span)))
  }

  fn eval_comprehension(&self, env: &Environment, var: &str, iter: &ast::Expr, body: &ast::Expr, filter: Option<&ast::Expr>, span: span::Span) -> EvalResult<Value> {
    let iterable = self.eval_expr(env, iter)?;
    let items = self.host.iterate(&iterable).map_err(|e| e.with_span(span))?;
    let scope = env.child();
    let mut out = Vec::new();
    for item in items {
      scope.define(var, item);
      if let Some(filter) = filter {
        if !self.eval_expr(&scope, filter)?.is_truthy() {
          continue;
        }
      }
      out.push(self.eval_expr(&scope, body)?);
    }
    Ok(Value::list(out))
  }

  #[allow(clippy::too_many_arguments)]
  fn eval_object_comprehension(
    &self,
    env: &Environment,
    key_expr: &ast::Expr,
    value_expr: &ast::Expr,
    key_var: &str,
    value_var: Option<&str>,
    iter: &ast::Expr,
    filter: Option<&ast::Expr>,
    span: span::Span,
  ) -> EvalResult<Value> {
    let container = self.eval_expr(env, iter)?;
    let entries = self.mapping_entries(&container, span)?;
    let scope = env.child();
    let mut out = IndexMap::new();
    for (k, v) in entries {
      scope.define(key_var, Value::str(k));
      if let Some(value_var) = value_var {
        scope.define(value_var, v);
      }
      if let Some(filter) = filter {
        if !self.eval_expr(&scope, filter)?.is_truthy() {
          continue;
        }
      }
      let key = self.eval_expr(&scope, key_expr)?;
      let value = self.eval_expr(&scope, value_expr)?;
      let Value::Str(key) = key else {
        return err(key_expr.span, "object comprehension keys must be strings");
      };
      out.insert(key.to_string(), value);
    }
    Ok(Value::object(out))
  }

  fn eval_switch(&self, env: &Environment, subject: Option<&ast::Expr>, cases: &[(Vec<ast::Expr>, ast::Expr)], default: Option<&ast::Expr>) -> EvalResult<Value> {
    let subject_value = subject.map(|s| self.eval_expr(env, s)).transpose()?;
    for (matches, body) in cases {
      for candidate in matches {
        let taken = match &subject_value {
          Some(subject_value) => *subject_value == self.eval_expr(env, candidate)?,
          None => self.eval_expr(env, candidate)?.is_truthy(),
        };
        if taken {
          return self.eval_body(env, body);
        }
      }
    }
    match default {
      Some(default) => self.eval_body(env, default),
      None => Ok(Value::Null),
    }
  }
}

fn literal_value(lit: &Literal) -> Value {
  match lit {
    Literal::Int(n) => Value::Int(*n),
    Literal::Float(n) => Value::Float(*n),
    Literal::Str(s) => Value::str(s.clone()),
    Literal::Regex(pattern, flags) => Value::Regex(std::rc::Rc::new(crate::value::RegexLiteral { pattern: pattern.clone(), flags: flags.clone() })),
    Literal::Bool(b) => Value::Bool(*b),
    Literal::Null => Value::Null,
    Literal::Undefined => Value::Undefined,
  }
}

