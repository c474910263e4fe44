use std::collections::HashMap;

/// One tick of OHLC(+T) input to `Vm::execute`.
///
/// Field names are uppercase, matching the surface language's identifiers
/// (`O H L C T`, plus any embedder-declared extras). Aliases are resolved by
/// the VM at bar-ingest time, not here: `Bar` itself is a plain map.
#[derive(Debug, Clone, Default)]
pub struct Bar {
  fields: HashMap<String, f64>,
}

/// Canonical aliases resolved at bar-ingest time and at global-slot
/// resolution in the compiler. A small static table, not a semantic
/// property of any one opcode — see the design notes on aliases.
pub const ALIASES: &[(&str, &str)] = &[
  ("O", "OPEN"),
  ("H", "HIGH"),
  ("L", "LOW"),
  ("C", "CLOSE"),
  ("V", "VOL"),
];

/// Returns the canonical partner name for a field, if one is known.
pub fn alias_of(name: &str) -> Option<&'static str> {
  for (a, b) in ALIASES {
    if name == *a {
      return Some(b);
    }
    if name == *b {
      return Some(a);
    }
  }
  None
}

impl Bar {
  pub fn new() -> Bar {
    Bar::default()
  }

  pub fn with_ohlc(t: f64, o: f64, h: f64, l: f64, c: f64) -> Bar {
    let mut bar = Bar::new();
    bar.set("T", t);
    bar.set("O", o);
    bar.set("H", h);
    bar.set("L", l);
    bar.set("C", c);
    bar
  }

  pub fn set(&mut self, field: impl Into<String>, value: f64) {
    self.fields.insert(field.into(), value);
  }

  pub fn get(&self, field: &str) -> Option<f64> {
    self.fields.get(field).copied()
  }

  pub fn timestamp(&self) -> f64 {
    self.get("T").unwrap_or(0.0)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
    self.fields.iter().map(|(k, v)| (k.as_str(), *v))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn alias_lookup_is_symmetric() {
    assert_eq!(alias_of("O"), Some("OPEN"));
    assert_eq!(alias_of("OPEN"), Some("O"));
    assert_eq!(alias_of("T"), None);
  }

  #[test]
  fn bar_round_trips_fields() {
    let bar = Bar::with_ohlc(1.0, 10.0, 12.0, 9.0, 11.0);
    assert_eq!(bar.get("O"), Some(10.0));
    assert_eq!(bar.get("C"), Some(11.0));
    assert_eq!(bar.timestamp(), 1.0);
    assert_eq!(bar.get("V"), None);
  }
}
