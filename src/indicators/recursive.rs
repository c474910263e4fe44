//! Scalar recursive indicators: each keeps a single previous value in
//! `state`, no ring buffer involved.

use crate::error::Result;
use crate::registry::{expect_numeric_args, CallContext};
use crate::value::Value;

pub fn ema(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("EMA", args, 2)?;
  let n = match raw[1] {
    Some(n) if n > 0.0 => n,
    _ => return Ok(Value::Null),
  };
  let x = match raw[0] {
    Some(x) => x,
    None => return Ok(Value::Null),
  };
  let prev = ctx.state.entry::<Option<f64>>("prev", || None);
  let next = match *prev {
    None => x,
    Some(_) if n == 1.0 => x,
    Some(p) => (x - p) * 2.0 / (n + 1.0) + p,
  };
  *prev = Some(next);
  Ok(Value::Float(next))
}

/// 3-argument smoothing: `prev <- x` on first call, otherwise
/// `prev <- prev*(n-m)/n + x*m/n`. Requires `0 < m <= n`.
pub fn sma(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("SMA", args, 3)?;
  let (n, m) = match (raw[1], raw[2]) {
    (Some(n), Some(m)) if n > 0.0 && m > 0.0 && m <= n => (n, m),
    _ => return Ok(Value::Null),
  };
  let x = match raw[0] {
    Some(x) => x,
    None => return Ok(Value::Null),
  };
  let prev = ctx.state.entry::<Option<f64>>("prev", || None);
  let next = match *prev {
    None => x,
    Some(p) => p * (n - m) / n + x * m / n,
  };
  *prev = Some(next);
  Ok(Value::Float(next))
}

/// `prev <- x` on first call, otherwise `prev <- prev*(1-a) + x*a`.
/// Requires `0 < a < 1`.
pub fn dma(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("DMA", args, 2)?;
  let a = match raw[1] {
    Some(a) if a > 0.0 && a < 1.0 => a,
    _ => return Ok(Value::Null),
  };
  let x = match raw[0] {
    Some(x) => x,
    None => return Ok(Value::Null),
  };
  let prev = ctx.state.entry::<Option<f64>>("prev", || None);
  let next = match *prev {
    None => x,
    Some(p) => p * (1.0 - a) + x * a,
  };
  *prev = Some(next);
  Ok(Value::Float(next))
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
  fn ema_first_call_returns_x_then_recurses() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    let first = ema(&[Value::Float(10.0), Value::Float(3.0)], &mut c).unwrap();
    assert_eq!(first, Value::Float(10.0));
    let second = ema(&[Value::Float(16.0), Value::Float(3.0)], &mut c).unwrap();
    assert_eq!(second, Value::Float(13.0));
  }

  #[test]
  fn dma_requires_alpha_in_open_unit_interval() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    assert_eq!(dma(&[Value::Float(1.0), Value::Float(1.5)], &mut c).unwrap(), Value::Null);
  }
}
