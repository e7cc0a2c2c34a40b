//! The tree-walking evaluator (spec.md §4.3) - the crate's largest
//! component, split into submodules the way the teacher splits its own
//! `Isolate` (`src/isolate/{binop,cmp,call,class,index}.rs`) into one file
//! per concern rather than one large dispatch function.

mod binop;
mod call;
mod class;
mod destructure;
mod expr;
mod index;
mod range;
mod stmt;

use std::rc::Rc;

use span::Span;
use syntax::ast;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::host::Host;
use crate::value::Value;

/// In-band control-flow signal (spec.md §4.3, §9 "Signals") distinguishing
/// a user-level `throw` (catchable by `try`) from `return`/`break`/
/// `continue` (catchable only by their respective frames), plus a plain
/// runtime error. All four unwind the evaluator's Rust call stack via `?`.
#[derive(Debug)]
pub enum Unwind {
  Return(Value),
  Break,
  Continue,
  Throw(Value),
  Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
  fn from(value: RuntimeError) -> Self {
    Unwind::Error(value)
  }
}

pub type EvalResult<T = Value> = Result<T, Unwind>;

pub(crate) fn err<T>(span: Span, message: impl Into<String>) -> EvalResult<T> {
  Err(Unwind::Error(RuntimeError::at(message, span)))
}

/// Owns the root environment and the `Host` capability (spec.md §5: "the
/// interpreter owns exactly one root `Environment` ... and a reference to
/// the host module loader").
pub struct Evaluator {
  pub(crate) host: Box<dyn Host>,
  pub(crate) globals: Environment,
}

impl Evaluator {
  pub fn new(host: Box<dyn Host>) -> Evaluator {
    Evaluator { host, globals: Environment::root() }
  }

  pub fn globals(&self) -> &Environment {
    &self.globals
  }

  /// Runs every top-level statement in program order; the module's value
  /// is the last statement's value, or `Null` for an empty program
  /// (spec.md §4.3).
  pub fn eval_module(&self, module: &ast::Module) -> Result<Value, RuntimeError> {
    let env = self.globals.clone();
    let mut result = Value::Null;
    for stmt in &module.statements {
      match self.eval_stmt(&env, stmt) {
        Ok(v) => result = v,
        Err(Unwind::Return(_)) => return Err(RuntimeError::new("'return' used outside of a function")),
        Err(Unwind::Break) => return Err(RuntimeError::new("'break' used outside of a loop")),
        Err(Unwind::Continue) => return Err(RuntimeError::new("'continue' used outside of a loop")),
        Err(Unwind::Throw(v)) => return Err(RuntimeError::new(format!("uncaught exception: {v}"))),
        Err(Unwind::Error(e)) => return Err(e),
      }
    }
    Ok(result)
  }

  /// Evaluates `body` (an `Expr::Block` or a single expression, per
  /// `parse_clause_body`) in `env` without opening a new scope - control-
  /// flow bodies don't create environments (spec.md §4.3).
  pub(crate) fn eval_body(&self, env: &Environment, body: &ast::Expr) -> EvalResult<Value> {
    if let ast::ExprKind::Block(stmts) = &body.kind {
      let mut result = Value::Null;
      for stmt in stmts {
        result = self.eval_stmt(env, stmt)?;
      }
      Ok(result)
    } else {
      self.eval_expr(env, body)
    }
  }
}

pub use call::make_closure;
pub(crate) fn rc_expr(e: &ast::Expr) -> Rc<ast::Expr> {
  Rc::new(e.clone())
}
