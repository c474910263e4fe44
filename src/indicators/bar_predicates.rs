//! `ISUP`/`ISDOWN`/`ISEQUAL` compare two market values supplied as
//! ordinary arguments by the caller (typically `C` and `O`) — see the
//! call-site context design notes on why no `ctx.marketData` escape
//! hatch exists here.

use crate::error::Result;
use crate::registry::{expect_numeric_args, CallContext};
use crate::value::Value;

pub fn isup(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("ISUP", args, 2)?;
  match (raw[0], raw[1]) {
    (Some(c), Some(o)) => Ok(Value::Float(if c > o { 1.0 } else { 0.0 })),
    _ => Ok(Value::Null),
  }
}

pub fn isdown(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("ISDOWN", args, 2)?;
  match (raw[0], raw[1]) {
    (Some(c), Some(o)) => Ok(Value::Float(if c < o { 1.0 } else { 0.0 })),
    _ => Ok(Value::Null),
  }
}

pub fn isequal(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("ISEQUAL", args, 2)?;
  match (raw[0], raw[1]) {
    (Some(c), Some(o)) => Ok(Value::Float(if c == o { 1.0 } else { 0.0 })),
    _ => Ok(Value::Null),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::logger::VecLogger;
  use crate::registry::StateBag;

  #[test]
  fn isup_compares_close_to_open() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = CallContext {
      state: &mut state,
      market_ts: 0.0,
      log: &mut log,
    };
    assert_eq!(isup(&[Value::Float(102.0), Value::Float(100.0)], &mut c).unwrap(), Value::Float(1.0));
    assert_eq!(isdown(&[Value::Float(95.0), Value::Float(100.0)], &mut c).unwrap(), Value::Float(1.0));
    assert_eq!(isequal(&[Value::Float(100.0), Value::Float(100.0)], &mut c).unwrap(), Value::Float(1.0));
  }
}
