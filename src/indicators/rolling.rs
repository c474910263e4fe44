//! Rolling-window indicators: `state` holds a ring buffer keyed `"buf"`,
//! gated by the shared "not full yet -> null" contract.

use crate::error::{Error, ErrorKind, Result};
use crate::registry::{condition_arg, expect_arity, expect_numeric_args, numeric_arg, CallContext};
use crate::ring::{RingBuf, StatsRingBuf};
use crate::value::Value;

/// `n == 0` means "since the beginning" — capacity 1000, per the
/// convention `HHV`/`LLV`/`SUM` define.
const UNBOUNDED_CAP: usize = 1000;

fn window_size(name: &str, n: Option<f64>) -> Result<usize> {
  match n {
    Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
    _ => Err(Error::new(
      ErrorKind::TypeError,
      format!("{name}: window size must be a non-negative integer"),
    )),
  }
}

fn cap_for(n: usize) -> usize {
  if n == 0 {
    UNBOUNDED_CAP
  } else {
    n
  }
}

fn stats_window<'a>(ctx: &'a mut CallContext, n: usize) -> &'a mut StatsRingBuf {
  let cap = cap_for(n);
  ctx.state.entry("buf", move || StatsRingBuf::new(cap).expect("capacity > 0"))
}

fn plain_window<'a>(ctx: &'a mut CallContext, n: usize) -> &'a mut RingBuf<f64> {
  let cap = cap_for(n);
  ctx.state.entry("buf", move || RingBuf::new(cap).expect("capacity > 0"))
}

/// Linear regression `(intercept, slope)` of `values` against `t = 0..len`.
fn linreg(values: &[f64]) -> (f64, f64) {
  let len = values.len() as f64;
  let mean_t = (len - 1.0) / 2.0;
  let mean_v = values.iter().sum::<f64>() / len;
  let mut num = 0.0;
  let mut den = 0.0;
  for (i, v) in values.iter().enumerate() {
    let dt = i as f64 - mean_t;
    num += dt * (v - mean_v);
    den += dt * dt;
  }
  let slope = if den == 0.0 { 0.0 } else { num / den };
  let intercept = mean_v - slope * mean_t;
  (intercept, slope)
}

macro_rules! xn_args {
  ($name:literal, $args:expr) => {{
    let raw = expect_numeric_args($name, $args, 2)?;
    let n = window_size($name, raw[1])?;
    match raw[0] {
      Some(x) => (x, n),
      None => return Ok(Value::Null),
    }
  }};
}

pub fn ma(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("MA", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  Ok(Value::Float(buf.avg()))
}

pub fn sum(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("SUM", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  Ok(Value::Float(buf.sum()))
}

pub fn hhv(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("HHV", args);
  let buf = plain_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let m = buf.to_vec().into_iter().fold(f64::NEG_INFINITY, f64::max);
  Ok(Value::Float(m))
}

pub fn llv(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("LLV", args);
  let buf = plain_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let m = buf.to_vec().into_iter().fold(f64::INFINITY, f64::min);
  Ok(Value::Float(m))
}

fn extreme_bars_ago(values: &[f64], pick_max: bool) -> f64 {
  let mut best_idx = 0;
  let mut best_val = values[0];
  for (i, &v) in values.iter().enumerate() {
    if (pick_max && v > best_val) || (!pick_max && v < best_val) {
      best_val = v;
      best_idx = i;
    }
  }
  (values.len() - 1 - best_idx) as f64
}

pub fn hhvbars(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("HHVBARS", args);
  let buf = plain_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  Ok(Value::Float(extreme_bars_ago(&buf.to_vec(), true)))
}

pub fn llvbars(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("LLVBARS", args);
  let buf = plain_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  Ok(Value::Float(extreme_bars_ago(&buf.to_vec(), false)))
}

pub fn count(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  expect_arity("COUNT", args, 2)?;
  let n = window_size("COUNT", numeric_arg("COUNT", args, 1)?)?;
  let cond = condition_arg(args, 0);
  let buf = stats_window(ctx, n);
  buf.push(if cond { 1.0 } else { 0.0 });
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  Ok(Value::Float(buf.sum()))
}

pub fn exist(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  expect_arity("EXIST", args, 2)?;
  let n = window_size("EXIST", numeric_arg("EXIST", args, 1)?)?;
  let cond = condition_arg(args, 0);
  let buf = stats_window(ctx, n);
  buf.push(if cond { 1.0 } else { 0.0 });
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  Ok(Value::Float(if buf.sum() > 0.0 { 1.0 } else { 0.0 }))
}

pub fn every(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  expect_arity("EVERY", args, 2)?;
  let n = window_size("EVERY", numeric_arg("EVERY", args, 1)?)?;
  let cond = condition_arg(args, 0);
  let buf = stats_window(ctx, n);
  buf.push(if cond { 1.0 } else { 0.0 });
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  Ok(Value::Float(if buf.sum() as usize == buf.len() { 1.0 } else { 0.0 }))
}

pub fn avedev(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("AVEDEV", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let values = buf.to_vec();
  let mean = buf.avg();
  let dev = values.iter().map(|v| (v - mean).abs()).sum::<f64>() / values.len() as f64;
  Ok(Value::Float(dev))
}

pub fn devsq(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("DEVSQ", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let values = buf.to_vec();
  let mean = buf.avg();
  let dev = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
  Ok(Value::Float(dev))
}

pub fn var(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("VAR", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let values = buf.to_vec();
  if values.len() < 2 {
    return Ok(Value::Float(0.0));
  }
  let mean = buf.avg();
  let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
  Ok(Value::Float(ss / (values.len() - 1) as f64))
}

pub fn varp(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("VARP", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let values = buf.to_vec();
  let mean = buf.avg();
  let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
  Ok(Value::Float(ss / values.len() as f64))
}

pub fn std(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  match var(args, ctx)? {
    Value::Float(v) => Ok(Value::Float(v.sqrt())),
    other => Ok(other),
  }
}

pub fn stdp(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  match varp(args, ctx)? {
    Value::Float(v) => Ok(Value::Float(v.sqrt())),
    other => Ok(other),
  }
}

pub fn slope(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("SLOPE", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let (_, slope) = linreg(&buf.to_vec());
  Ok(Value::Float(slope))
}

/// The linear-regression line's value one bar beyond the window, i.e. the
/// trend-projected value for the next bar.
pub fn forcast(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("FORCAST", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let values = buf.to_vec();
  let (intercept, slope) = linreg(&values);
  Ok(Value::Float(intercept + slope * values.len() as f64))
}

/// The linear-regression line's value at the most recent bar in the
/// window — distinct from `FORCAST`, which projects one bar ahead.
pub fn tsma(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("TSMA", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let values = buf.to_vec();
  let (intercept, slope) = linreg(&values);
  Ok(Value::Float(intercept + slope * (values.len() - 1) as f64))
}

/// Triangular moving average: a weighted mean whose weights rise linearly
/// to the window's centre and fall symmetrically back down.
pub fn trma(args: &[Value], ctx: &mut CallContext) -> Result<Value> {
  let (x, n) = xn_args!("TRMA", args);
  let buf = stats_window(ctx, n);
  buf.push(x);
  if n > 0 && !buf.full() {
    return Ok(Value::Null);
  }
  let values = buf.to_vec();
  let len = values.len();
  let half = (len as f64 - 1.0) / 2.0;
  let weights: Vec<f64> = (0..len).map(|i| half + 1.0 - (i as f64 - half).abs()).collect();
  let total: f64 = weights.iter().sum();
  let weighted: f64 = values.iter().zip(weights.iter()).map(|(v, w)| v * w).sum();
  Ok(Value::Float(weighted / total))
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
  fn ma_nulls_then_running_average() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    let xs = [102.0, 106.0, 107.0, 109.0, 113.0];
    let expect = [None, None, Some(105.0), Some(107.333333333333333), Some(109.666666666666667)];
    for (x, want) in xs.iter().zip(expect.iter()) {
      let got = ma(&[Value::Float(*x), Value::Float(3.0)], &mut c).unwrap();
      match want {
        None => assert_eq!(got, Value::Null),
        Some(v) => assert!((got.as_float().unwrap() - v).abs() < 1e-9),
      }
    }
  }

  #[test]
  fn hhv_tracks_window_maximum() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    for x in [1.0, 5.0, 3.0] {
      hhv(&[Value::Float(x), Value::Float(3.0)], &mut c).unwrap();
    }
    let got = hhv(&[Value::Float(2.0), Value::Float(3.0)], &mut c).unwrap();
    assert_eq!(got, Value::Float(5.0));
  }

  #[test]
  fn count_accepts_a_boolean_condition() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    assert_eq!(count(&[Value::Bool(true), Value::Float(2.0)], &mut c).unwrap(), Value::Null);
    assert_eq!(count(&[Value::Bool(false), Value::Float(2.0)], &mut c).unwrap(), Value::Float(1.0));
  }

  #[test]
  fn count_counts_trues_in_window() {
    let mut state = StateBag::new();
    let mut log = VecLogger::default();
    let mut c = ctx(&mut state, &mut log);
    assert_eq!(count(&[Value::Float(1.0), Value::Float(2.0)], &mut c).unwrap(), Value::Null);
    assert_eq!(count(&[Value::Float(0.0), Value::Float(2.0)], &mut c).unwrap(), Value::Float(1.0));
  }
}
