//! Indicators keyed on bar history and condition streams: `REF`, the
//! crossover pair, and the run-length family (`BARSLAST`, `VALUEWHEN`,
//! `LAST`, `LONGCROSS`, `FILTER`).

use crate::error::Result;
use crate::registry::{condition_arg, expect_arity, expect_numeric_args, numeric_arg, CallContext};
use crate::ring::RingBuf;
use crate::value::Value;

/// `n` most recent values; returns the oldest one in the window (the
/// value `n` bars ago), captured before the current push.
pub fn ref_(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("REF", args, 2)?;
  let n = match raw[1] {
    Some(n) if n > 0.0 => n as usize,
    _ => return Ok(Value::Null),
  };
  let x = match raw[0] {
    Some(x) => x,
    None => return Ok(Value::Null),
  };
  let buf = ctx.state.entry::<RingBuf<f64>>("buf", move || RingBuf::new(n).expect("capacity > 0"));
  let result = if buf.full() { buf.first().copied() } else { None };
  buf.push(x);
  match result {
    Some(v) => Ok(Value::Float(v)),
    None => Ok(Value::Null),
  }
}

struct CrossState {
  prev_diff: Option<f64>,
}

fn cross_impl(name: &'static str, args: &[Value], ctx: &mut CallContext, rising: bool) -> Result<Value> {
  let raw = expect_numeric_args(name, args, 2)?;
  let (a, b) = match (raw[0], raw[1]) {
    (Some(a), Some(b)) => (a, b),
    _ => return Ok(Value::Null),
  };
  let diff = a - b;
  let state = ctx.state.entry::<CrossState>("cross", || CrossState { prev_diff: None });
  let result = match state.prev_diff {
    Some(prev) if rising && prev < 0.0 && diff > 0.0 => Value::Float(1.0),
    Some(prev) if !rising && prev > 0.0 && diff < 0.0 => Value::Float(1.0),
    _ => Value::Null,
  };
  state.prev_diff = Some(diff);
  Ok(result)
}

pub fn cross(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  cross_impl("CROSS", args, ctx, true)
}

pub fn crossdown(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  cross_impl("CROSSDOWN", args, ctx, false)
}

struct BarsLastState {
  bars_seen: u64,
  last_true_bar: Option<u64>,
}

pub fn barslast(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  expect_arity("BARSLAST", args, 1)?;
  let cond = condition_arg(args, 0);
  let state = ctx.state.entry::<BarsLastState>("barslast", || BarsLastState {
    bars_seen: 0,
    last_true_bar: None,
  });
  let current = state.bars_seen;
  state.bars_seen += 1;
  if cond {
    state.last_true_bar = Some(current);
    return Ok(Value::Float(0.0));
  }
  match state.last_true_bar {
    Some(last) => Ok(Value::Float((current - last) as f64)),
    None => Ok(Value::Null),
  }
}

pub fn valuewhen(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  expect_arity("VALUEWHEN", args, 2)?;
  let cond = condition_arg(args, 0);
  let value = numeric_arg("VALUEWHEN", args, 1)?;
  let last = ctx.state.entry::<Option<f64>>("last", || None);
  if cond {
    *last = value;
  }
  match *last {
    Some(v) => Ok(Value::Float(v)),
    None => Ok(Value::Null),
  }
}

/// 1 iff `cond` was continuously true from `n2` to `n1` bars ago
/// inclusive (`n1 >= n2`); 0 otherwise. Implemented as a window of the
/// last `n1 + 1` condition values; null during warm-up, matching the
/// rolling-window family's shared warm-up contract (same as `EXIST`/`EVERY`).
pub fn last(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  expect_arity("LAST", args, 3)?;
  let cond = condition_arg(args, 0);
  let n1_raw = numeric_arg("LAST", args, 1)?;
  let n2_raw = numeric_arg("LAST", args, 2)?;
  let (n1, n2) = match (n1_raw, n2_raw) {
    (Some(n1), Some(n2)) if n1 >= n2 && n1 >= 0.0 && n2 >= 0.0 => (n1 as usize, n2 as usize),
    _ => return Ok(Value::Null),
  };
  let cap = n1 + 1;
  let buf = ctx.state.entry::<RingBuf<f64>>("buf", move || RingBuf::new(cap).expect("capacity > 0"));
  buf.push(if cond { 1.0 } else { 0.0 });
  if !buf.full() {
    return Ok(Value::Null);
  }
  let values = buf.to_vec();
  let len = values.len();
  // index 0 is n1 bars ago, index (n1-n2) is n2 bars ago.
  let start = len - 1 - n1;
  let end = len - 1 - n2;
  let all_true = values[start..=end].iter().all(|v| *v != 0.0);
  Ok(Value::Float(if all_true { 1.0 } else { 0.0 }))
}

/// 1 iff `a < b` held for the prior `n` bars and `a >= b` now. Null while
/// the prior-`n`-bars window has not yet filled, per the shared
/// rolling-window warm-up contract (`n == 0` needs no prior bars at all).
pub fn longcross(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let raw = expect_numeric_args("LONGCROSS", args, 3)?;
  let n = match raw[2] {
    Some(n) if n >= 0.0 && n.fract() == 0.0 => n as usize,
    _ => return Ok(Value::Null),
  };
  let (a, b) = match (raw[0], raw[1]) {
    (Some(a), Some(b)) => (a, b),
    _ => return Ok(Value::Null),
  };
  if n == 0 {
    return Ok(Value::Float(if a >= b { 1.0 } else { 0.0 }));
  }
  let buf = ctx.state.entry::<RingBuf<f64>>("buf", move || RingBuf::new(n).expect("capacity > 0"));
  let was_full = buf.full();
  let prior_all_below = was_full && buf.to_vec().iter().all(|v| *v != 0.0);
  buf.push(if a < b { 1.0 } else { 0.0 });
  if !was_full {
    return Ok(Value::Null);
  }
  Ok(Value::Float(if prior_all_below && a >= b { 1.0 } else { 0.0 }))
}

struct FilterState {
  bars_since_last: Option<u64>,
  bars_seen: u64,
}

/// 1 iff `cond` is truthy and at least `n` bars have passed since the
/// previous emission of 1.
pub fn filter(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  expect_arity("FILTER", args, 2)?;
  let cond = condition_arg(args, 0);
  let n = match numeric_arg("FILTER", args, 1)? {
    Some(n) if n >= 0.0 => n as u64,
    _ => return Ok(Value::Null),
  };
  let state = ctx.state.entry::<FilterState>("filter", || FilterState {
    bars_since_last: None,
    bars_seen: 0,
  });
  let current = state.bars_seen;
  state.bars_seen += 1;
  let eligible = match state.bars_since_last {
    None => true,
    Some(last) => current - last >= n,
  };
  if cond && eligible {
    state.bars_since_last = Some(current);
    Ok(Value::Float(1.0))
  } else {
    Ok(Value::Float(0.0))
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
  fn ref_returns_value_n_bars_ago() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    let xs = [10.0, 20.0, 30.0];
    let want = [Value::Null, Value::Float(10.0), Value::Float(20.0)];
    for (x, want) in xs.iter().zip(want.iter()) {
      let got = ref_(&[Value::Float(*x), Value::Float(1.0)], &mut c).unwrap();
      assert_eq!(&got, want);
    }
  }

  #[test]
  fn cross_fires_once_on_golden_cross() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    assert_eq!(cross(&[Value::Float(1.0), Value::Float(2.0)], &mut c).unwrap(), Value::Null);
    assert_eq!(cross(&[Value::Float(3.0), Value::Float(2.0)], &mut c).unwrap(), Value::Float(1.0));
    assert_eq!(cross(&[Value::Float(4.0), Value::Float(2.0)], &mut c).unwrap(), Value::Null);
  }

  #[test]
  fn barslast_counts_bars_since_last_true() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    assert_eq!(barslast(&[Value::Float(0.0)], &mut c).unwrap(), Value::Null);
    assert_eq!(barslast(&[Value::Float(1.0)], &mut c).unwrap(), Value::Float(0.0));
    assert_eq!(barslast(&[Value::Float(0.0)], &mut c).unwrap(), Value::Float(1.0));
    assert_eq!(barslast(&[Value::Float(0.0)], &mut c).unwrap(), Value::Float(2.0));
  }

  #[test]
  fn valuewhen_latches_on_trigger() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    assert_eq!(valuewhen(&[Value::Float(0.0), Value::Float(5.0)], &mut c).unwrap(), Value::Null);
    assert_eq!(valuewhen(&[Value::Float(1.0), Value::Float(7.0)], &mut c).unwrap(), Value::Float(7.0));
    assert_eq!(valuewhen(&[Value::Float(0.0), Value::Float(9.0)], &mut c).unwrap(), Value::Float(7.0));
  }

  /// `LAST` is in the rolling-window family: null during warm-up, same as
  /// `EXIST`/`EVERY`, not `0`.
  #[test]
  fn last_is_null_during_warmup_then_checks_the_inclusive_range() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    let conds = [true, true, true, false];
    let want = [Value::Null, Value::Null, Value::Float(1.0), Value::Float(0.0)];
    for (cond, want) in conds.iter().zip(want.iter()) {
      let got = last(&[Value::Bool(*cond), Value::Float(2.0), Value::Float(0.0)], &mut c).unwrap();
      assert_eq!(&got, want);
    }
  }

  /// `LONGCROSS` is in the rolling-window family too: null until the
  /// prior-`n`-bars window has filled, then `1` only on the bar where the
  /// prior window was entirely `a < b` and `a >= b` now.
  #[test]
  fn longcross_is_null_during_warmup_then_fires_on_crossover() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    let pairs = [(1.0, 2.0), (1.0, 2.0), (3.0, 2.0), (3.0, 2.0)];
    let want = [Value::Null, Value::Null, Value::Float(1.0), Value::Float(0.0)];
    for ((a, b), want) in pairs.iter().zip(want.iter()) {
      let got = longcross(&[Value::Float(*a), Value::Float(*b), Value::Float(2.0)], &mut c).unwrap();
      assert_eq!(&got, want);
    }
  }
}
