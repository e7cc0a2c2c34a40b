//! The `Value` sum type (spec.md §9, "Host values"): a statically-typed
//! stand-in for the source interpreter's native dynamic values. `Rc`, not
//! `Arc` - the evaluator is single-threaded (spec.md §5), the same choice
//! the teacher's own reference-counted `Handle<T>` makes and documents.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::class::{BoundMethod, CoffeeClass, CoffeeFunction, CoffeeInstance};
use crate::error::RuntimeError;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type ObjectRef = Rc<RefCell<IndexMap<String, Value>>>;

/// An opaque value round-tripped through the `Host` trait - an imported
/// module, or anything else the host hands back without the evaluator
/// needing to look inside it.
#[derive(Clone)]
pub struct HostValue(pub Rc<dyn std::any::Any>);

impl fmt::Debug for HostValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("<host value>")
  }
}

#[derive(Clone, Debug)]
pub struct RegexLiteral {
  pub pattern: String,
  pub flags: String,
}

/// A first-class function pointer produced by the `Host` (e.g. `print`,
/// `len`) - registered via `Host::lookup_builtin` and invoked the same way
/// as any other callable.
pub trait NativeFn {
  fn name(&self) -> &str;
  fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, RuntimeError>;
}

impl fmt::Debug for dyn NativeFn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "<native fn {}>", self.name())
  }
}

#[derive(Clone, Debug)]
pub enum Value {
  Null,
  Undefined,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(Rc<str>),
  List(ListRef),
  /// A plain `{}` object literal - not a class instance.
  Object(ObjectRef),
  Regex(Rc<RegexLiteral>),
  Function(Rc<CoffeeFunction>),
  Class(Rc<CoffeeClass>),
  Instance(Rc<CoffeeInstance>),
  BoundMethod(Rc<BoundMethod>),
  Native(Rc<dyn NativeFn>),
  Host(HostValue),
}

impl Value {
  pub fn str(s: impl Into<Rc<str>>) -> Value {
    Value::Str(s.into())
  }

  pub fn list(items: Vec<Value>) -> Value {
    Value::List(Rc::new(RefCell::new(items)))
  }

  pub fn object(fields: IndexMap<String, Value>) -> Value {
    Value::Object(Rc::new(RefCell::new(fields)))
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Undefined => "undefined",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Str(_) => "string",
      Value::List(_) => "array",
      Value::Object(_) => "object",
      Value::Regex(_) => "regex",
      Value::Function(_) => "function",
      Value::Class(_) => "class",
      Value::Instance(_) => "instance",
      Value::BoundMethod(_) => "function",
      Value::Native(_) => "function",
      Value::Host(_) => "host",
    }
  }

  /// Truthiness (spec.md §4.3): `null`/`undefined`, `0`, `0.0`, empty
  /// string and empty sequence are false; everything else is true.
  pub fn is_truthy(&self) -> bool {
    match self {
      Value::Null | Value::Undefined => false,
      Value::Bool(b) => *b,
      Value::Int(n) => *n != 0,
      Value::Float(n) => *n != 0.0,
      Value::Str(s) => !s.is_empty(),
      Value::List(l) => !l.borrow().is_empty(),
      Value::Object(o) => !o.borrow().is_empty(),
      _ => true,
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null | Value::Undefined)
  }

  pub fn is_callable(&self) -> bool {
    matches!(self, Value::Function(_) | Value::BoundMethod(_) | Value::Native(_) | Value::Class(_))
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => write!(f, "null"),
      Value::Undefined => write!(f, "undefined"),
      Value::Bool(b) => write!(f, "{b}"),
      Value::Int(n) => write!(f, "{n}"),
      Value::Float(n) => write!(f, "{n}"),
      Value::Str(s) => write!(f, "{s}"),
      Value::List(items) => {
        write!(f, "[")?;
        for (i, item) in items.borrow().iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{item}")?;
        }
        write!(f, "]")
      }
      Value::Object(fields) => {
        write!(f, "{{")?;
        for (i, (k, v)) in fields.borrow().iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
      }
      Value::Regex(r) => write!(f, "/{}/{}", r.pattern, r.flags),
      Value::Function(_) => write!(f, "<function>"),
      Value::Class(c) => write!(f, "<class {}>", c.name),
      Value::Instance(i) => write!(f, "<instance of {}>", i.class.name),
      Value::BoundMethod(_) => write!(f, "<bound method>"),
      Value::Native(n) => write!(f, "<native fn {}>", n.name()),
      Value::Host(_) => write!(f, "<host value>"),
    }
  }
}

/// Structural equality (spec.md §4.3): `is`/`isnt` alias to `==`/`!=`.
/// Container equality compares contents, not identity.
impl PartialEq for Value {
  fn eq(&self, other: &Value) -> bool {
    use Value::*;
    match (self, other) {
      (Null, Null) | (Undefined, Undefined) | (Null, Undefined) | (Undefined, Null) => true,
      (Bool(a), Bool(b)) => a == b,
      (Int(a), Int(b)) => a == b,
      (Float(a), Float(b)) => a == b,
      (Int(a), Float(b)) | (Float(b), Int(a)) => *a as f64 == *b,
      (Str(a), Str(b)) => a == b,
      (List(a), List(b)) => *a.borrow() == *b.borrow(),
      (Object(a), Object(b)) => *a.borrow() == *b.borrow(),
      (Regex(a), Regex(b)) => a.pattern == b.pattern && a.flags == b.flags,
      (Class(a), Class(b)) => Rc::ptr_eq(a, b),
      (Instance(a), Instance(b)) => Rc::ptr_eq(a, b),
      (Function(a), Function(b)) => Rc::ptr_eq(a, b),
      (BoundMethod(a), BoundMethod(b)) => Rc::ptr_eq(a, b),
      _ => false,
    }
  }
}
