//! Lexically scoped name -> value mapping with a parent chain (spec.md §3).
//!
//! `Environment` is `Rc<RefCell<EnvironmentInner>>` - shared ownership so a
//! closure keeps its defining environment alive after the call frame that
//! created it returns, the same reasoning the teacher gives for its own
//! reference-counted handles (spec.md §9, "Environment chain").

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

#[derive(Debug)]
struct EnvironmentInner {
  parent: Option<Environment>,
  vars: IndexMap<String, Value>,
}

#[derive(Clone, Debug)]
pub struct Environment(Rc<RefCell<EnvironmentInner>>);

impl Environment {
  pub fn root() -> Environment {
    Environment(Rc::new(RefCell::new(EnvironmentInner { parent: None, vars: IndexMap::new() })))
  }

  pub fn child(&self) -> Environment {
    Environment(Rc::new(RefCell::new(EnvironmentInner { parent: Some(self.clone()), vars: IndexMap::new() })))
  }

  /// Defines `name` in *this* scope, shadowing any outer binding.
  pub fn define(&self, name: impl Into<String>, value: Value) {
    self.0.borrow_mut().vars.insert(name.into(), value);
  }

  /// Looks up `name` starting at this scope and walking outward. Returns
  /// the nearest enclosing definition (spec.md §3 invariant).
  pub fn get(&self, name: &str) -> Option<Value> {
    let inner = self.0.borrow();
    if let Some(v) = inner.vars.get(name) {
      return Some(v.clone());
    }
    inner.parent.as_ref().and_then(|p| p.get(name))
  }

  pub fn has(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  /// Updates the nearest scope that already defines `name`, or creates it
  /// in the current scope (spec.md §3 invariant).
  pub fn assign(&self, name: &str, value: Value) {
    if self.0.borrow().vars.contains_key(name) {
      self.0.borrow_mut().vars.insert(name.to_string(), value);
      return;
    }
    let parent = self.0.borrow().parent.clone();
    match parent {
      Some(p) if p.has(name) => p.assign(name, value),
      _ => {
        self.0.borrow_mut().vars.insert(name.to_string(), value);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn get_resolves_nearest_enclosing_scope() {
    let root = Environment::root();
    root.define("x", Value::Int(1));
    let child = root.child();
    child.define("x", Value::Int(2));
    assert_eq!(child.get("x"), Some(Value::Int(2)));
    assert_eq!(root.get("x"), Some(Value::Int(1)));
  }

  #[test]
  fn assign_updates_nearest_defining_scope() {
    let root = Environment::root();
    root.define("x", Value::Int(1));
    let child = root.child();
    child.assign("x", Value::Int(9));
    assert_eq!(root.get("x"), Some(Value::Int(9)));
    assert_eq!(child.get("x"), Some(Value::Int(9)));
  }

  #[test]
  fn assign_with_no_existing_binding_creates_in_current_scope() {
    let root = Environment::root();
    let child = root.child();
    child.assign("y", Value::Int(5));
    assert_eq!(child.get("y"), Some(Value::Int(5)));
    assert_eq!(root.get("y"), None);
  }
}
