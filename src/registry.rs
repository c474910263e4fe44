//! The indicator registry (component D): a process-global, immutable-after-
//! init table mapping names to stateful native functions, plus the
//! type-erased per-call-site state bag the VM hands to each entry.

use std::any::Any;
use std::collections::HashMap;

use crate::error::{Error, ErrorKind, Result};
use crate::indicators;
use crate::logger::Logger;
use crate::value::Value;

/// Opaque per-call-site state, owned by the VM and handed to indicator
/// entries by mutable reference. An entry may stash arbitrarily many named
/// sub-objects here (e.g. a second ring buffer keyed `"prev"` alongside the
/// main one), each independently typed.
#[derive(Default)]
pub struct StateBag {
  slots: HashMap<&'static str, Box<dyn Any>>,
}

impl StateBag {
  pub fn new() -> StateBag {
    StateBag::default()
  }

  /// Returns the sub-state stored at `key`, creating it with `init` on
  /// first access. Panics if `key` was previously used with a different
  /// type `T` — that would mean the compiler bound one call site to two
  /// different indicator entries, which violates invariant (v).
  pub fn entry<T: 'static>(&mut self, key: &'static str, init: impl FnOnce() -> T) -> &mut T {
    self
      .slots
      .entry(key)
      .or_insert_with(|| Box::new(init()))
      .downcast_mut::<T>()
      .expect("call-site state type mismatch: one call site must bind to one indicator entry")
  }
}

/// The call-site context passed to every registry entry: `{state, marketTs, log}`.
pub struct CallContext<'a> {
  pub state: &'a mut StateBag,
  pub market_ts: f64,
  pub log: &'a mut dyn Logger,
}

pub type BuiltinFn = fn(&[Value], &mut CallContext) -> Result<Value>;

pub struct Entry {
  pub name: &'static str,
  pub execute: BuiltinFn,
}

/// Name -> stateful function entry. Case-sensitive, uppercase by
/// convention. Aliases register the same entry under multiple keys.
#[derive(Default)]
pub struct Registry {
  entries: HashMap<&'static str, Entry>,
}

impl Registry {
  pub fn empty() -> Registry {
    Registry::default()
  }

  pub fn with_builtins() -> Registry {
    let mut registry = Registry::empty();
    indicators::register_all(&mut registry);
    registry
  }

  /// Registers `execute` under `name` and every entry in `aliases`. Fails
  /// if any of those keys is already registered.
  pub fn register(&mut self, name: &'static str, aliases: &[&'static str], execute: BuiltinFn) -> Result<()> {
    for key in std::iter::once(&name).chain(aliases.iter()) {
      if self.entries.contains_key(key) {
        return Err(Error::new(
          ErrorKind::RuntimeError,
          format!("duplicate registry entry for `{key}`"),
        ));
      }
    }
    for key in std::iter::once(name).chain(aliases.iter().copied()) {
      self.entries.insert(key, Entry { name, execute });
    }
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&Entry> {
    self.entries.get(name)
  }
}

/// Checks that `args` has exactly `arity` elements.
pub fn expect_arity(name: &str, args: &[Value], arity: usize) -> Result<()> {
  if args.len() != arity {
    return Err(Error::new(
      ErrorKind::TypeError,
      format!("{name}: expected {arity} argument(s), got {}", args.len()),
    ));
  }
  Ok(())
}

/// Reads `args[index]` as a float or null (null preserved as `None`).
/// Callers that accept a mix of numeric and condition arguments (e.g.
/// `VALUEWHEN(cond, value)`) check arity once via `expect_arity` and then
/// pull each argument with the extractor that matches its role.
pub fn numeric_arg(name: &str, args: &[Value], index: usize) -> Result<Option<f64>> {
  match &args[index] {
    Value::Float(f) => Ok(Some(*f)),
    Value::Null => Ok(None),
    other => Err(Error::new(
      ErrorKind::TypeError,
      format!("{name}: expected a number for argument {index}, got {other:?}"),
    )),
  }
}

/// Reads `args[index]` by truthiness rather than forcing a numeric
/// conversion. The VM's comparison and logical opcodes (`Gt`, `And`, ...)
/// push `Value::Bool`, so condition-shaped arguments — `COUNT`, `EXIST`,
/// `EVERY`, `BARSLAST`, `VALUEWHEN`, `LAST`, `FILTER`, `NOT` — must accept
/// a bool directly instead of rejecting it as a type error.
pub fn condition_arg(args: &[Value], index: usize) -> bool {
  args[index].is_truthy()
}

/// Shared argument-shape validation helper for entries whose arguments are
/// all numeric: checks arity and that every argument is a float or null,
/// returning the floats (null preserved as `None`).
pub fn expect_numeric_args(name: &str, args: &[Value], arity: usize) -> Result<Vec<Option<f64>>> {
  expect_arity(name, args, arity)?;
  (0..arity).map(|i| numeric_arg(name, args, i)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn noop(_args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
    Ok(Value::Null)
  }

  #[test]
  fn duplicate_registration_fails() {
    let mut reg = Registry::empty();
    reg.register("FOO", &[], noop).unwrap();
    assert!(reg.register("FOO", &[], noop).is_err());
  }

  #[test]
  fn aliases_resolve_to_the_same_entry() {
    let mut reg = Registry::empty();
    reg.register("MA", &["SMA_ALIAS"], noop).unwrap();
    assert_eq!(reg.get("MA").unwrap().name, "MA");
    assert_eq!(reg.get("SMA_ALIAS").unwrap().name, "MA");
  }

  #[test]
  fn state_bag_type_confusion_panics() {
    let mut bag = StateBag::new();
    bag.entry::<f64>("x", || 1.0);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
      bag.entry::<bool>("x", || true);
    }));
    assert!(result.is_err());
  }
}
