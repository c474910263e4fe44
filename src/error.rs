use std::collections::BTreeMap;
use std::fmt;

/// Tag identifying what went wrong, not the Rust type that carries it.
///
/// Mirrors the taxonomy in the language reference: compile-time kinds
/// (`UndefinedVariable`, `InvalidAssignment`, `InvalidOperator`,
/// `UnimplementedFeature`, `SyntaxError`, `UnexpectedToken`, `MissingToken`)
/// and runtime kinds (everything else).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  RuntimeError,
  TypeError,
  DivisionByZero,
  InvalidOperator,
  InvalidAssignment,
  InvalidFunctionCall,
  InvalidMemberAccess,
  UndefinedVariable,
  UndefinedLabel,
  UnimplementedFeature,
  SyntaxError,
  UnexpectedToken,
  MissingToken,
  BuiltinError,
  InvalidArgument,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ErrorKind::RuntimeError => "RuntimeError",
      ErrorKind::TypeError => "TypeError",
      ErrorKind::DivisionByZero => "DivisionByZero",
      ErrorKind::InvalidOperator => "InvalidOperator",
      ErrorKind::InvalidAssignment => "InvalidAssignment",
      ErrorKind::InvalidFunctionCall => "InvalidFunctionCall",
      ErrorKind::InvalidMemberAccess => "InvalidMemberAccess",
      ErrorKind::UndefinedVariable => "UndefinedVariable",
      ErrorKind::UndefinedLabel => "UndefinedLabel",
      ErrorKind::UnimplementedFeature => "UnimplementedFeature",
      ErrorKind::SyntaxError => "SyntaxError",
      ErrorKind::UnexpectedToken => "UnexpectedToken",
      ErrorKind::MissingToken => "MissingToken",
      ErrorKind::BuiltinError => "BuiltinError",
      ErrorKind::InvalidArgument => "InvalidArgument",
    };
    f.write_str(name)
  }
}

/// A position in source text, 1-indexed as an external parser is expected
/// to produce (see `ast::Loc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
  pub line: u32,
  pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc {
  pub start: Position,
  pub end: Position,
}

/// The error type threaded through compilation and execution.
///
/// Carries everything the reference calls for: a kind, a message, an
/// optional source location, and a free-form context map (opcode name,
/// operand name, expected/actual type, offending value, ...).
#[derive(Debug, Clone)]
pub struct Error {
  pub kind: ErrorKind,
  pub message: String,
  pub loc: Option<Loc>,
  pub context: BTreeMap<String, String>,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Error {
      kind,
      message: message.into(),
      loc: None,
      context: BTreeMap::new(),
    }
  }

  pub fn with_loc(mut self, loc: Loc) -> Self {
    self.loc = Some(loc);
    self
  }

  pub fn maybe_loc(self, loc: Option<Loc>) -> Self {
    match loc {
      Some(loc) => self.with_loc(loc),
      None => self,
    }
  }

  pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
    self.context.insert(key.into(), value.to_string());
    self
  }

  pub fn runtime(message: impl Into<String>) -> Self {
    Error::new(ErrorKind::RuntimeError, message)
  }

  pub fn type_error(message: impl Into<String>) -> Self {
    Error::new(ErrorKind::TypeError, message)
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}] {}", self.kind, self.message)?;
    if let Some(loc) = self.loc {
      write!(f, " at line {}, column {}", loc.start.line, loc.start.column)?;
    }
    if !self.context.is_empty() {
      write!(f, " {{")?;
      for (i, (k, v)) in self.context.iter().enumerate() {
        if i > 0 {
          write!(f, ", ")?;
        }
        write!(f, "{k}: {v}")?;
      }
      write!(f, "}}")?;
    }
    Ok(())
  }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_includes_location_and_context() {
    let err = Error::new(ErrorKind::DivisionByZero, "division by zero")
      .with_loc(Loc {
        start: Position { line: 3, column: 7 },
        end: Position { line: 3, column: 8 },
      })
      .with_context("opcode", "DIV");
    assert_eq!(
      err.to_string(),
      "[DivisionByZero] division by zero at line 3, column 7 {opcode: DIV}"
    );
  }

  #[test]
  fn display_without_location_or_context() {
    let err = Error::new(ErrorKind::UndefinedVariable, "undefined variable `x`");
    assert_eq!(err.to_string(), "[UndefinedVariable] undefined variable `x`");
  }
}
