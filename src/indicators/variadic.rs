//! Variadic top-of-stack reducers: `MAX`, `MIN`, `PRINT`.

use crate::error::{Error, ErrorKind, Result};
use crate::registry::CallContext;
use crate::value::Value;

fn numeric_args(name: &str, args: &[Value]) -> Result<Vec<f64>> {
  if args.is_empty() {
    return Err(Error::new(ErrorKind::TypeError, format!("{name}: expected at least 1 argument")));
  }
  args
    .iter()
    .map(|v| match v {
      Value::Float(f) => Ok(*f),
      other => Err(Error::new(
        ErrorKind::TypeError,
        format!("{name}: expected a number, got {other:?}"),
      )),
    })
    .collect()
}

pub fn max(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  if args.iter().any(Value::is_null) {
    return Ok(Value::Null);
  }
  let xs = numeric_args("MAX", args)?;
  Ok(Value::Float(xs.into_iter().fold(f64::NEG_INFINITY, f64::max)))
}

pub fn min(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  if args.iter().any(Value::is_null) {
    return Ok(Value::Null);
  }
  let xs = numeric_args("MIN", args)?;
  Ok(Value::Float(xs.into_iter().fold(f64::INFINITY, f64::min)))
}

pub fn print(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let line = args.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
  ctx.log.log(&line);
  Ok(Value::Null)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::logger::VecLogger;
  use crate::registry::StateBag;

  fn ctx<'a>(state: &'a mut StateBag, log: &'a mut VecLogger) -> CallContext<'a> {
    CallContext {
      state,
      market_ts: 0.0,
      log,
    }
  }

  #[test]
  fn max_of_several_args() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    let got = max(&[Value::Float(1.0), Value::Float(9.0), Value::Float(3.0)], &mut c).unwrap();
    assert_eq!(got, Value::Float(9.0));
  }

  #[test]
  fn print_writes_one_joined_line() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    print(&[Value::Float(1.0), Value::str("hi")], &mut c).unwrap();
    assert_eq!(log.0, vec!["1 hi".to_string()]);
  }
}
