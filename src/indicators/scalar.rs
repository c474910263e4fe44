//! Stateless scalar math and logic. Each validates its argument shape and
//! null-propagates; domain-restricted operations return null instead of
//! failing (`ACOS`/`ASIN` outside `[-1,1]`, `LN`/`LOG` non-positive,
//! `SQRT` negative, `MOD` with a zero divisor).

use crate::error::Result;
use crate::registry::{condition_arg, expect_arity, expect_numeric_args, CallContext};
use crate::value::Value;

macro_rules! unary {
  ($fn_name:ident, $reg_name:literal, |$x:ident| $body:expr) => {
    pub fn $fn_name(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
      let raw = expect_numeric_args($reg_name, args, 1)?;
      let $x = match raw[0] {
        Some(v) => v,
        None => return Ok(Value::Null),
      };
      Ok($body)
    }
  };
}

macro_rules! unary_domain {
  ($fn_name:ident, $reg_name:literal, |$x:ident| $guard:expr, $body:expr) => {
    pub fn $fn_name(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
      let raw = expect_numeric_args($reg_name, args, 1)?;
      let $x = match raw[0] {
        Some(v) => v,
        None => return Ok(Value::Null),
      };
      if !$guard {
        return Ok(Value::Null);
      }
      Ok($body)
    }
  };
}

unary!(abs, "ABS", |x| Value::Float(x.abs()));
unary_domain!(acos, "ACOS", |x| (-1.0..=1.0).contains(&x), Value::Float(x.acos()));
unary_domain!(asin, "ASIN", |x| (-1.0..=1.0).contains(&x), Value::Float(x.asin()));
unary!(atan, "ATAN", |x| Value::Float(x.atan()));
unary!(sin, "SIN", |x| Value::Float(x.sin()));
unary!(cos, "COS", |x| Value::Float(x.cos()));
unary!(tan, "TAN", |x| Value::Float(x.tan()));
unary!(exp, "EXP", |x| Value::Float(x.exp()));
unary_domain!(ln, "LN", |x| x > 0.0, Value::Float(x.ln()));
unary_domain!(log, "LOG", |x| x > 0.0, Value::Float(x.log10()));
unary_domain!(sqrt, "SQRT", |x| x >= 0.0, Value::Float(x.sqrt()));
unary!(square, "SQUARE", |x| Value::Float(x * x));
unary!(cube, "CUBE", |x| Value::Float(x * x * x));
unary!(ceiling, "CEILING", |x| Value::Float(x.ceil()));
unary!(floor, "FLOOR", |x| Value::Float(x.floor()));
unary!(intpart, "INTPART", |x| Value::Float(x.trunc()));
unary!(sgn, "SGN", |x| Value::Float(if x > 0.0 {
  1.0
} else if x < 0.0 {
  -1.0
} else {
  0.0
}));
unary!(reverse, "REVERSE", |x| Value::Float(-x));

/// Reads its argument by truthiness, not as a forced numeric conversion —
/// `NOT(C > O)` must accept the `Value::Bool` a comparison opcode produces.
pub fn not(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  expect_arity("NOT", args, 1)?;
  Ok(Value::Float(if condition_arg(args, 0) { 0.0 } else { 1.0 }))
}

pub fn pow(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("POW", args, 2)?;
  match (raw[0], raw[1]) {
    (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
    _ => Ok(Value::Null),
  }
}

pub fn modulo(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("MOD", args, 2)?;
  match (raw[0], raw[1]) {
    (Some(a), Some(b)) if b != 0.0 => Ok(Value::Float(a % b)),
    (Some(_), Some(_)) => Ok(Value::Null),
    _ => Ok(Value::Null),
  }
}

pub fn max2(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("MAX2", args, 2)?;
  match (raw[0], raw[1]) {
    (Some(a), Some(b)) => Ok(Value::Float(a.max(b))),
    _ => Ok(Value::Null),
  }
}

pub fn min2(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("MIN2", args, 2)?;
  match (raw[0], raw[1]) {
    (Some(a), Some(b)) => Ok(Value::Float(a.min(b))),
    _ => Ok(Value::Null),
  }
}

/// Inclusive: `1` iff `x` lies between the two bounds (either order).
pub fn between(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("BETWEEN", args, 3)?;
  match (raw[0], raw[1], raw[2]) {
    (Some(x), Some(a), Some(b)) => {
      let (lo, hi) = (a.min(b), a.max(b));
      Ok(Value::Float(if x >= lo && x <= hi { 1.0 } else { 0.0 }))
    }
    _ => Ok(Value::Null),
  }
}

/// Exclusive: `1` iff `lo < x < hi`.
pub fn range(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("RANGE", args, 3)?;
  match (raw[0], raw[1], raw[2]) {
    (Some(x), Some(lo), Some(hi)) => Ok(Value::Float(if x > lo && x < hi { 1.0 } else { 0.0 })),
    _ => Ok(Value::Null),
  }
}

pub fn ifelse(args: &[Value], _ctx: &mut CallContext) -> Result<Value> {
  if args.len() != 3 {
    return Err(crate::error::Error::new(
      crate::error::ErrorKind::TypeError,
      format!("IFELSE: expected 3 argument(s), got {}", args.len()),
    ));
  }
  if args[0].is_truthy() {
    Ok(args[1].clone())
  } else {
    Ok(args[2].clone())
  }
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
  fn sqrt_of_negative_is_null() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    assert_eq!(sqrt(&[Value::Float(-4.0)], &mut c).unwrap(), Value::Null);
    assert_eq!(sqrt(&[Value::Float(4.0)], &mut c).unwrap(), Value::Float(2.0));
  }

  #[test]
  fn mod_by_zero_is_null() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    assert_eq!(modulo(&[Value::Float(5.0), Value::Float(0.0)], &mut c).unwrap(), Value::Null);
    assert_eq!(modulo(&[Value::Float(5.0), Value::Float(2.0)], &mut c).unwrap(), Value::Float(1.0));
  }

  #[test]
  fn ifelse_picks_branch_by_truthiness() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    let got = ifelse(&[Value::Bool(true), Value::Float(1.0), Value::Float(2.0)], &mut c).unwrap();
    assert_eq!(got, Value::Float(1.0));
  }

  #[test]
  fn not_accepts_a_boolean_condition() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    assert_eq!(not(&[Value::Bool(true)], &mut c).unwrap(), Value::Float(0.0));
    assert_eq!(not(&[Value::Bool(false)], &mut c).unwrap(), Value::Float(1.0));
    assert_eq!(not(&[Value::Float(1.0)], &mut c).unwrap(), Value::Float(0.0));
  }
}
