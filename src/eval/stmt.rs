use syntax::ast::{self, AugAssignOp, LogicalAssignOp, StmtKind, UpdateOp};

use super::{err, Evaluator, EvalResult, Unwind};
use crate::environment::Environment;
use crate::value::Value;

impl Evaluator {
  pub(crate) fn eval_stmt(&self, env: &Environment, stmt: &ast::Stmt) -> EvalResult<Value> {
    match &stmt.kind {
      StmtKind::Import(_) | StmtKind::FromImport { .. } | StmtKind::ImportAll { .. } => self.eval_import(env, stmt),

      StmtKind::Assign { target, value } => {
        let v = self.eval_expr(env, value)?;
        self.assign_to_target(env, target, v.clone())?;
        Ok(v)
      }

      StmtKind::MultiAssign { targets, value } => {
        let v = self.eval_expr(env, value)?;
        for target in targets {
          self.assign_to_target(env, target, v.clone())?;
        }
        Ok(v)
      }

      StmtKind::AugAssign { target, op, value } => {
        let current = self.eval_expr(env, target)?;
        let rhs = self.eval_expr(env, value)?;
        let result = self.apply_aug_op(*op, current, rhs, stmt.span)?;
        self.assign_to_target(env, target, result.clone())?;
        Ok(result)
      }

      StmtKind::ExistentialAssign { target, value } => {
        let current = self.eval_target_or_null(env, target);
        if !current.is_null() {
          return Ok(current);
        }
        let v = self.eval_expr(env, value)?;
        self.assign_to_target(env, target, v.clone())?;
        Ok(v)
      }

      StmtKind::LogicalAssign { target, op, value } => {
        let current = self.eval_target_or_null(env, target);
        let take_rhs = match op {
          LogicalAssignOp::Or => !current.is_truthy(),
          LogicalAssignOp::And => current.is_truthy(),
        };
        if !take_rhs {
          return Ok(current);
        }
        let v = self.eval_expr(env, value)?;
        self.assign_to_target(env, target, v.clone())?;
        Ok(v)
      }

      StmtKind::Update { target, op, prefix } => {
        let current = self.eval_expr(env, target)?;
        let one = Value::Int(1);
        let updated = match op {
          UpdateOp::Inc => self.numeric_add(&current, &one, stmt.span)?,
          UpdateOp::Dec => self.numeric_sub(&current, &one, stmt.span)?,
        };
        self.assign_to_target(env, target, updated.clone())?;
        Ok(if *prefix { updated } else { current })
      }

      StmtKind::Return(value) => {
        let v = match value {
          Some(e) => self.eval_expr(env, e)?,
          None => Value::Null,
        };
        Err(Unwind::Return(v))
      }

      StmtKind::While { cond, body } => self.eval_while(env, cond, body),

      StmtKind::ForIn { var, iter, body } => self.eval_for_in(env, var, iter, body),
      StmtKind::ForOf { key_var, value_var, iter, body } => self.eval_for_of(env, key_var, value_var.as_deref(), iter, body),

      StmtKind::Break => Err(Unwind::Break),
      StmtKind::Continue => Err(Unwind::Continue),

      StmtKind::Throw(expr) => {
        let v = self.eval_expr(env, expr)?;
        Err(Unwind::Throw(v))
      }

      StmtKind::Try { try_body, catch_var, catch_body, finally_body } => {
        self.eval_try(env, try_body, catch_var.as_deref(), catch_body.as_ref(), finally_body.as_ref())
      }

      StmtKind::ClassDecl { name, parent, members } => self.eval_class_decl(env, name, parent.as_ref(), members, stmt.span),

      StmtKind::ExprStmt(expr) => self.eval_expr(env, expr),
    }
  }

  fn eval_while(&self, env: &Environment, cond: &ast::Expr, body: &ast::Expr) -> EvalResult<Value> {
    let mut result = Value::Null;
    while self.eval_expr(env, cond)?.is_truthy() {
      match self.eval_body(env, body) {
        Ok(v) => result = v,
        Err(Unwind::Break) => break,
        Err(Unwind::Continue) => continue,
        Err(other) => return Err(other),
      }
    }
    Ok(result)
  }

  fn eval_for_in(&self, env: &Environment, var: &str, iter: &ast::Expr, body: &ast::Expr) -> EvalResult<Value> {
    let iter_span = iter.span;
    let iterable = self.eval_expr(env, iter)?;
    let items = self.host.iterate(&iterable).map_err(|e| e.with_span(iter_span))?;
    let mut result = Value::Null;
    for item in items {
      env.define(var, item);
      match self.eval_body(env, body) {
        Ok(v) => result = v,
        Err(Unwind::Break) => break,
        Err(Unwind::Continue) => continue,
        Err(other) => return Err(other),
      }
    }
    Ok(result)
  }

  fn eval_for_of(&self, env: &Environment, key_var: &str, value_var: Option<&str>, iter: &ast::Expr, body: &ast::Expr) -> EvalResult<Value> {
    let iter_span = iter.span;
    let container = self.eval_expr(env, iter)?;
    let entries = self.mapping_entries(&container, iter_span)?;
    let mut result = Value::Null;
    for (k, v) in entries {
      env.define(key_var, Value::str(k));
      if let Some(value_var) = value_var {
        env.define(value_var, v);
      }
      match self.eval_body(env, body) {
        Ok(r) => result = r,
        Err(Unwind::Break) => break,
        Err(Unwind::Continue) => continue,
        Err(other) => return Err(other),
      }
    }
    Ok(result)
  }

  pub(crate) fn mapping_entries(&self, value: &Value, span: span::Span) -> EvalResult<Vec<(String, Value)>> {
    match value {
      Value::Object(fields) => Ok(fields.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
      Value::Instance(instance) => Ok(instance.fields.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
      other => err(span, format!("'{}' object has no keys to iterate with 'of'", other.type_name())),
    }
  }

  fn eval_try(
    &self,
    env: &Environment,
    try_body: &ast::Expr,
    catch_var: Option<&str>,
    catch_body: Option<&ast::Expr>,
    finally_body: Option<&ast::Expr>,
  ) -> EvalResult<Value> {
    let result = match self.eval_body(env, try_body) {
      Err(Unwind::Throw(v)) => {
        if let Some(catch_body) = catch_body {
          if let Some(name) = catch_var {
            env.define(name, v);
          }
          self.eval_body(env, catch_body)
        } else {
          Err(Unwind::Throw(v))
        }
      }
      other => other,
    };

    if let Some(finally_body) = finally_body {
      let finally_result = self.eval_body(env, finally_body);
      finally_result?;
    }

    result
  }

  /// Resolves a potential `?=`/`||=`/`&&=` target without raising on an
  /// undefined name - an unreadable target reads as `null` for these
  /// operators (spec.md §4.3: "evaluate target; if unreadable or yields
  /// null, assign").
  fn eval_target_or_null(&self, env: &Environment, target: &ast::Expr) -> Value {
    self.eval_expr(env, target).unwrap_or(Value::Null)
  }

  /// `import`/`from ... import`/`import * as` (spec.md §6): all three
  /// forms go through `Host::import_module`, since this crate carries no
  /// concrete module system of its own.
  fn eval_import(&self, env: &Environment, stmt: &ast::Stmt) -> EvalResult<Value> {
    match &stmt.kind {
      StmtKind::Import(items) => {
        for item in items {
          let module = self.host.import_module(&item.module).map_err(|e| e.with_span(stmt.span))?;
          let name = item.alias.clone().unwrap_or_else(|| last_segment(&item.module));
          env.define(name, module);
        }
        Ok(Value::Null)
      }
      StmtKind::FromImport { module, names } => {
        let module_value = self.host.import_module(module).map_err(|e| e.with_span(stmt.span))?;
        for name in names {
          let value = self.host.get_attr(&module_value, &name.name).map_err(|e| e.with_span(stmt.span))?;
          env.define(name.alias.clone().unwrap_or_else(|| name.name.clone()), value);
        }
        Ok(Value::Null)
      }
      StmtKind::ImportAll { module, alias } => {
        let module_value = self.host.import_module(module).map_err(|e| e.with_span(stmt.span))?;
        let name = alias.clone().unwrap_or_else(|| last_segment(module));
        env.define(name, module_value);
        Ok(Value::Null)
      }
      _ => unreachable!("eval_import only called for import statements"),
    }
  }
}

fn last_segment(dotted: &str) -> String {
  dotted.rsplit('.').next().unwrap_or(dotted).to_string()
}
