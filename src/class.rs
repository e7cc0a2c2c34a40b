//! Class and function object model (spec.md §3: `CoffeeClass`,
//! `CoffeeInstance`, `CoffeeFunction`, `BoundMethod`).

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use syntax::ast;

use crate::environment::Environment;
use crate::value::Value;

/// `(name, parent?, methods)`. Immutable after declaration except for the
/// method table at class-body construction time (spec.md §3).
#[derive(Debug)]
pub struct CoffeeClass {
  pub name: String,
  pub parent: Option<Rc<CoffeeClass>>,
  pub methods: IndexMap<String, Value>,
}

impl CoffeeClass {
  /// Looks up a member through the inheritance chain, the evaluator's
  /// `_find_method` (spec.md §4.3, "Classes").
  pub fn find_method(&self, name: &str) -> Option<Value> {
    if let Some(v) = self.methods.get(name) {
      return Some(v.clone());
    }
    self.parent.as_ref().and_then(|p| p.find_method(name))
  }
}

/// Like [`CoffeeClass::find_method`], but also returns the class that
/// actually defines the method - the correct anchor for `super` inside an
/// inherited (non-overridden) method, as opposed to the dynamic instance's
/// own class.
pub fn find_method_with_owner(class: &Rc<CoffeeClass>, name: &str) -> Option<(Value, Rc<CoffeeClass>)> {
  if let Some(v) = class.methods.get(name) {
    return Some((v.clone(), class.clone()));
  }
  class.parent.as_ref().and_then(|p| find_method_with_owner(p, name))
}

/// `(class, fields)`. Fields are mutable; the class reference is not
/// (spec.md §3).
#[derive(Debug)]
pub struct CoffeeInstance {
  pub class: Rc<CoffeeClass>,
  pub fields: RefCell<IndexMap<String, Value>>,
}

/// A closure: parameter list, body, captured enclosing environment, and the
/// call-time behaviors (splat, lazy defaults, `@param` auto-assign, bound
/// `this`) spec.md §3 attaches to it.
#[derive(Debug)]
pub struct CoffeeFunction {
  pub name: Option<String>,
  pub params: Vec<ast::Param>,
  pub body: Rc<ast::Expr>,
  pub env: Environment,
  /// `=>` captured `this` at creation time; `None` if the function is
  /// `bound` but was created with no enclosing `this` in scope.
  pub bound_this: Option<Value>,
  pub bound: bool,
}

/// `(instance, function)`. On call, binds `this` to the instance, and binds
/// `super` to `owner`'s parent class so `super.method()` resolves
/// (spec.md §4.3, "Classes").
#[derive(Debug)]
pub struct BoundMethod {
  pub receiver: Value,
  pub function: Rc<CoffeeFunction>,
  pub owner: Option<Rc<CoffeeClass>>,
}
