//! The `Host` capability (spec.md §6): the seam through which the evaluator
//! reaches the surrounding runtime for module imports and builtin names.
//! A CLI/REPL (out of scope here, spec.md §1) would supply its own `Host`;
//! this crate ships [`DefaultHost`] so the evaluator is usable standalone,
//! grounded in the teacher's `src/builtins.rs` (`str`, `type`) and the
//! original interpreter's `_install_builtins`/`_builtin_print`.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::value::{NativeFn, Value};

/// Host capability consumed by the evaluator (spec.md §6).
pub trait Host {
  fn import_module(&self, dotted: &str) -> Result<Value, RuntimeError>;
  fn get_attr(&self, module_value: &Value, name: &str) -> Result<Value, RuntimeError>;
  fn has_attr(&self, module_value: &Value, name: &str) -> bool;
  fn lookup_builtin(&self, name: &str) -> Option<Value>;
  fn call(&self, callee: &Value, args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, RuntimeError>;
  fn is_callable(&self, value: &Value) -> bool {
    value.is_callable()
  }
  fn is_mapping(&self, value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Instance(_))
  }
  fn iterate(&self, value: &Value) -> Result<Vec<Value>, RuntimeError>;
  fn get_item(&self, value: &Value, key: &Value) -> Result<Value, RuntimeError>;
  fn set_item(&self, value: &Value, key: Value, v: Value) -> Result<(), RuntimeError>;
}

struct NativeClosure<F> {
  name: &'static str,
  f: F,
}

impl<F> NativeFn for NativeClosure<F>
where
  F: Fn(&[Value], &[(String, Value)]) -> Result<Value, RuntimeError>,
{
  fn name(&self) -> &str {
    self.name
  }

  fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, RuntimeError> {
    (self.f)(args, kwargs)
  }
}

fn native<F>(name: &'static str, f: F) -> Value
where
  F: Fn(&[Value], &[(String, Value)]) -> Result<Value, RuntimeError> + 'static,
{
  Value::Native(Rc::new(NativeClosure { name, f }))
}

/// The builtin names the language has ambiently available (spec.md §6:
/// "`print`, `len`, `range`, numeric conversions, etc.") plus a module
/// loader that always fails, since this crate carries no concrete module
/// system (spec.md §1, "Out of scope").
pub struct DefaultHost {
  stdout: Rc<RefCell<dyn Write>>,
}

impl Default for DefaultHost {
  fn default() -> Self {
    DefaultHost { stdout: Rc::new(RefCell::new(std::io::stdout())) }
  }
}

impl DefaultHost {
  pub fn new() -> DefaultHost {
    DefaultHost::default()
  }

  /// Builds a host whose `print` writes into `sink` instead of stdout -
  /// used by tests to capture output without touching the real terminal.
  pub fn with_sink(sink: Rc<RefCell<dyn Write>>) -> DefaultHost {
    DefaultHost { stdout: sink }
  }
}

impl Host for DefaultHost {
  fn import_module(&self, dotted: &str) -> Result<Value, RuntimeError> {
    Err(RuntimeError::new(format!("no module named '{dotted}'")))
  }

  fn get_attr(&self, module_value: &Value, name: &str) -> Result<Value, RuntimeError> {
    match module_value {
      Value::Object(fields) => fields
        .borrow()
        .get(name)
        .cloned()
        .ok_or_else(|| RuntimeError::new(format!("no attribute '{name}'"))),
      other => Err(RuntimeError::new(format!("'{}' has no attribute '{name}'", other.type_name()))),
    }
  }

  fn has_attr(&self, module_value: &Value, name: &str) -> bool {
    matches!(module_value, Value::Object(fields) if fields.borrow().contains_key(name))
  }

  fn lookup_builtin(&self, name: &str) -> Option<Value> {
    let stdout = self.stdout.clone();
    match name {
      "print" => Some(native("print", move |args, _| {
        let mut out = stdout.borrow_mut();
        let rendered: Vec<String> = args.iter().map(|v| v.to_string()).collect();
        let _ = writeln!(out, "{}", rendered.join(" "));
        Ok(Value::Null)
      })),
      "len" => Some(native("len", |args, _| {
        let v = args.first().ok_or_else(|| RuntimeError::new("len() expects 1 argument"))?;
        match v {
          Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
          Value::List(l) => Ok(Value::Int(l.borrow().len() as i64)),
          Value::Object(o) => Ok(Value::Int(o.borrow().len() as i64)),
          other => Err(RuntimeError::new(format!("object of type '{}' has no len()", other.type_name()))),
        }
      })),
      "range" => Some(native("range", |args, _| {
        let ints: Vec<i64> = args
          .iter()
          .map(|v| match v {
            Value::Int(n) => Ok(*n),
            other => Err(RuntimeError::new(format!("range() arguments must be int, got {}", other.type_name()))),
          })
          .collect::<Result<_, _>>()?;
        let (start, end, step) = match ints.as_slice() {
          [end] => (0, *end, 1),
          [start, end] => (*start, *end, 1),
          [start, end, step] => (*start, *end, *step),
          _ => return Err(RuntimeError::new("range() expects 1 to 3 arguments")),
        };
        if step == 0 {
          return Err(RuntimeError::new("range() step must not be 0"));
        }
        let mut out = Vec::new();
        let mut i = start;
        if step > 0 {
          while i < end {
            out.push(Value::Int(i));
            i += step;
          }
        } else {
          while i > end {
            out.push(Value::Int(i));
            i += step;
          }
        }
        Ok(Value::list(out))
      })),
      "str" => Some(native("str", |args, _| {
        let v = args.first().ok_or_else(|| RuntimeError::new("str() expects 1 argument"))?;
        Ok(Value::str(v.to_string()))
      })),
      "int" => Some(native("int", |args, _| {
        let v = args.first().ok_or_else(|| RuntimeError::new("int() expects 1 argument"))?;
        match v {
          Value::Int(n) => Ok(Value::Int(*n)),
          Value::Float(n) => Ok(Value::Int(*n as i64)),
          Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| RuntimeError::new(format!("invalid literal for int(): '{s}'"))),
          Value::Bool(b) => Ok(Value::Int(*b as i64)),
          other => Err(RuntimeError::new(format!("cannot convert {} to int", other.type_name()))),
        }
      })),
      "float" => Some(native("float", |args, _| {
        let v = args.first().ok_or_else(|| RuntimeError::new("float() expects 1 argument"))?;
        match v {
          Value::Int(n) => Ok(Value::Float(*n as f64)),
          Value::Float(n) => Ok(Value::Float(*n)),
          Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| RuntimeError::new(format!("invalid literal for float(): '{s}'"))),
          other => Err(RuntimeError::new(format!("cannot convert {} to float", other.type_name()))),
        }
      })),
      "type" => Some(native("type", |args, _| {
        let v = args.first().ok_or_else(|| RuntimeError::new("type() expects 1 argument"))?;
        Ok(Value::str(v.type_name()))
      })),
      _ => None,
    }
  }

  fn call(&self, callee: &Value, args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, RuntimeError> {
    match callee {
      Value::Native(f) => f.call(args, kwargs),
      other => Err(RuntimeError::new(format!("'{}' object is not callable", other.type_name()))),
    }
  }

  fn iterate(&self, value: &Value) -> Result<Vec<Value>, RuntimeError> {
    match value {
      Value::List(items) => Ok(items.borrow().clone()),
      Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
      Value::Object(fields) => Ok(fields.borrow().keys().map(|k| Value::str(k.clone())).collect()),
      other => Err(RuntimeError::new(format!("'{}' object is not iterable", other.type_name()))),
    }
  }

  fn get_item(&self, value: &Value, key: &Value) -> Result<Value, RuntimeError> {
    match (value, key) {
      (Value::List(items), Value::Int(i)) => {
        let items = items.borrow();
        let idx = normalize_index(*i, items.len()).ok_or_else(|| RuntimeError::new("array index out of range"))?;
        Ok(items[idx].clone())
      }
      (Value::Str(s), Value::Int(i)) => {
        let chars: Vec<char> = s.chars().collect();
        let idx = normalize_index(*i, chars.len()).ok_or_else(|| RuntimeError::new("string index out of range"))?;
        Ok(Value::str(chars[idx].to_string()))
      }
      (Value::Object(fields), Value::Str(key)) => {
        fields.borrow().get(key.as_ref()).cloned().ok_or_else(|| RuntimeError::new(format!("no key '{key}'")))
      }
      (Value::Instance(instance), Value::Str(key)) => instance
        .fields
        .borrow()
        .get(key.as_ref())
        .cloned()
        .ok_or_else(|| RuntimeError::new(format!("no key '{key}'"))),
      (other, _) => Err(RuntimeError::new(format!("'{}' object is not subscriptable", other.type_name()))),
    }
  }

  fn set_item(&self, value: &Value, key: Value, v: Value) -> Result<(), RuntimeError> {
    match (value, key) {
      (Value::List(items), Value::Int(i)) => {
        let mut items = items.borrow_mut();
        let idx = normalize_index(i, items.len()).ok_or_else(|| RuntimeError::new("array index out of range"))?;
        items[idx] = v;
        Ok(())
      }
      (Value::Object(fields), Value::Str(key)) => {
        fields.borrow_mut().insert(key.to_string(), v);
        Ok(())
      }
      (Value::Instance(instance), Value::Str(key)) => {
        instance.fields.borrow_mut().insert(key.to_string(), v);
        Ok(())
      }
      (other, _) => Err(RuntimeError::new(format!("'{}' object does not support item assignment", other.type_name()))),
    }
  }
}

fn normalize_index(i: i64, len: usize) -> Option<usize> {
  let idx = if i < 0 { i + len as i64 } else { i };
  if idx < 0 || idx as usize >= len {
    None
  } else {
    Some(idx as usize)
  }
}
