//! A tree-walking interpreter for a CoffeeScript-flavored language.
//!
//! ```no_run
//! let coffee = coffee::Coffee::new();
//! let value = coffee.eval("1 + 2").unwrap();
//! assert_eq!(value.to_string(), "3");
//! ```

pub mod class;
pub mod environment;
pub mod error;
pub mod eval;
pub mod host;
pub mod value;

pub use error::{Error, Result};
pub use host::{DefaultHost, Host};
pub use value::Value;

use eval::Evaluator;

/// Entry point: parses and evaluates CoffeeScript-flavored source against a
/// single, persistent global environment (spec.md §5, §6).
///
/// Each `Coffee` owns its `Host` and its global scope, so statements
/// evaluated across separate calls to [`Coffee::eval`] share top-level
/// variables, function and class declarations - a REPL-style session, not a
/// fresh interpreter per call.
pub struct Coffee {
  evaluator: Evaluator,
}

impl Coffee {
  /// Builds a `Coffee` with the bundled [`DefaultHost`].
  pub fn new() -> Coffee {
    CoffeeBuilder::new().build()
  }

  pub fn builder() -> CoffeeBuilder {
    CoffeeBuilder::new()
  }

  /// Parses and evaluates `src`, returning the value of its last statement
  /// (`Value::Null` for an empty program).
  pub fn eval(&self, src: &str) -> Result<Value> {
    let (module, _src) = syntax::parse_source(src)?;
    self.evaluator.eval_module(&module).map_err(Error::from)
  }

  /// Like [`Coffee::eval`], but renders a caret-pointer diagnostic against
  /// `src` on failure instead of a bare error (spec.md §7).
  pub fn run(&self, src: &str) -> std::result::Result<Value, String> {
    self.eval(src).map_err(|e| e.report(src))
  }

  pub fn globals(&self) -> &environment::Environment {
    self.evaluator.globals()
  }
}

impl Default for Coffee {
  fn default() -> Self {
    Coffee::new()
  }
}

/// Builder for installing a custom [`Host`] before constructing a [`Coffee`]
/// (spec.md §6: "a CLI/REPL would supply its own `Host`").
#[derive(Default)]
pub struct CoffeeBuilder {
  host: Option<Box<dyn Host>>,
}

impl CoffeeBuilder {
  pub fn new() -> CoffeeBuilder {
    CoffeeBuilder { host: None }
  }

  pub fn host(mut self, host: impl Host + 'static) -> CoffeeBuilder {
    self.host = Some(Box::new(host));
    self
  }

  pub fn build(self) -> Coffee {
    let host = self.host.unwrap_or_else(|| Box::new(DefaultHost::new()));
    Coffee { evaluator: Evaluator::new(host) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn arithmetic_precedence() {
    let coffee = Coffee::new();
    let v = coffee.eval("1 + 2 * 3").unwrap();
    assert_eq!(v, Value::Int(7));
  }

  #[test]
  fn power_is_right_associative() {
    let coffee = Coffee::new();
    let v = coffee.eval("2 ** 3 ** 2").unwrap();
    assert_eq!(v, Value::Int(512));
  }

  #[test]
  fn range_materializes_inclusive_and_exclusive() {
    let coffee = Coffee::new();
    assert_eq!(coffee.eval("len([1..5])").unwrap(), Value::Int(5));
    assert_eq!(coffee.eval("len([1...5])").unwrap(), Value::Int(4));
    assert_eq!(coffee.eval("len([10..1 by -3])").unwrap(), Value::Int(4));
  }

  #[test]
  fn if_expression_value() {
    let coffee = Coffee::new();
    let v = coffee.eval("x = if 2 > 1 then \"yes\" else \"no\"\nx").unwrap();
    assert_eq!(v, Value::str("yes"));
  }

  #[test]
  fn function_call_and_closures() {
    let coffee = Coffee::new();
    let v = coffee.eval("add = (a, b) -> a + b\nadd(3, 4)").unwrap();
    assert_eq!(v, Value::Int(7));
  }

  #[test]
  fn class_inheritance_with_super() {
    let coffee = Coffee::new();
    let src = r#"
class Animal
  constructor: (@name) ->
  speak: -> "#{@name} makes a sound"

class Dog extends Animal
  speak: -> super() + "!"

d = new Dog("Rex")
d.speak()
"#;
    let v = coffee.eval(src).unwrap();
    assert_eq!(v, Value::str("Rex makes a sound!"));
  }

  #[test]
  fn array_destructuring_with_splat() {
    let coffee = Coffee::new();
    let v = coffee.eval("[a, rest...] = [1, 2, 3]\nrest").unwrap();
    assert_eq!(v, Value::list(vec![Value::Int(2), Value::Int(3)]));
  }

  #[test]
  fn try_catch_recovers_from_throw() {
    let coffee = Coffee::new();
    let v = coffee
      .eval(
        r#"
try
  throw "boom"
catch e
  e
"#,
      )
      .unwrap();
    assert_eq!(v, Value::str("boom"));
  }

  #[test]
  fn return_outside_function_is_a_runtime_error() {
    let coffee = Coffee::new();
    assert!(coffee.eval("return 1").is_err());
  }

  #[test]
  fn chained_comparison() {
    let coffee = Coffee::new();
    let v = coffee.eval("1 < 2 < 3").unwrap();
    assert_eq!(v, Value::Bool(true));
    let v = coffee.eval("1 < 2 < 1").unwrap();
    assert_eq!(v, Value::Bool(false));
  }

  #[test]
  fn string_interpolation() {
    let coffee = Coffee::new();
    let v = coffee
      .eval(indoc::indoc! {r#"
        name = "world"
        "hello #{name}, #{1 + 1}!"
      "#})
      .unwrap();
    assert_eq!(v, Value::str("hello world, 2!"));
  }

  #[test]
  fn list_comprehension_with_filter() {
    let coffee = Coffee::new();
    let v = coffee.eval("[x * x for x in [1, 2, 3, 4] when x % 2 == 0]").unwrap();
    assert_eq!(v, Value::list(vec![Value::Int(4), Value::Int(16)]));
  }

  #[test]
  fn object_getter_and_setter() {
    let coffee = Coffee::new();
    let src = r#"
class Box
  constructor: (@value) ->
  get doubled
    @value * 2
  set doubled(v)
    @value = v / 2

b = new Box(5)
first = b.doubled
b.doubled = 20
[first, b.value]
"#;
    let v = coffee.eval(src).unwrap();
    assert_eq!(v, Value::list(vec![Value::Int(10), Value::Float(10.0)]));
  }
}
