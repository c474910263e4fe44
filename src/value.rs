use std::fmt;
use std::rc::Rc;

/// A runtime value.
///
/// Strings are reference-counted and immutable (no in-place mutation, cheap
/// clone). There is no object graph and no garbage collector here: scripts
/// have no user-defined functions, closures or classes (see Non-goals), so
/// every value fits in four flat variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Float(f64),
  Bool(bool),
  Str(Rc<str>),
  Null,
}

impl Value {
  pub fn float(v: f64) -> Value {
    Value::Float(v)
  }

  pub fn str(v: impl Into<Rc<str>>) -> Value {
    Value::Str(v.into())
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn as_float(&self) -> Option<f64> {
    match self {
      Value::Float(v) => Some(*v),
      _ => None,
    }
  }

  /// Truthiness per the language reference: `false`, `0`, `null` and the
  /// empty string are falsy, everything else is truthy.
  pub fn is_truthy(&self) -> bool {
    match self {
      Value::Null => false,
      Value::Bool(b) => *b,
      Value::Float(f) => *f != 0.0,
      Value::Str(s) => !s.is_empty(),
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Float(v) => write!(f, "{v}"),
      Value::Bool(v) => write!(f, "{v}"),
      Value::Str(v) => write!(f, "{v}"),
      Value::Null => write!(f, "null"),
    }
  }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self {
    Value::Float(v)
  }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self {
    Value::Bool(v)
  }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self {
    Value::Str(Rc::from(v))
  }
}

impl From<String> for Value {
  fn from(v: String) -> Self {
    Value::Str(Rc::from(v.as_str()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truthiness() {
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Float(0.0).is_truthy());
    assert!(!Value::Str(Rc::from("")).is_truthy());
    assert!(!Value::Bool(false).is_truthy());

    assert!(Value::Float(1.0).is_truthy());
    assert!(Value::Float(-1.0).is_truthy());
    assert!(Value::Str(Rc::from("x")).is_truthy());
    assert!(Value::Bool(true).is_truthy());
  }

  #[test]
  fn display() {
    assert_eq!(Value::Float(3.5).to_string(), "3.5");
    assert_eq!(Value::Float(3.0).to_string(), "3");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::str("hi").to_string(), "hi");
  }
}
