use crate::error::{Error, ErrorKind};

/// Fixed-capacity FIFO with O(1) indexed read and O(1) push-with-eviction.
///
/// Backed by a single pre-allocated `Vec`, never reallocated after
/// construction. `head` marks the oldest element; `size` counts how many
/// slots are occupied. Capacity is fixed for the buffer's lifetime.
#[derive(Debug, Clone)]
pub struct RingBuf<T> {
  buf: Vec<Option<T>>,
  head: usize,
  size: usize,
}

impl<T: Clone> RingBuf<T> {
  pub fn new(capacity: usize) -> crate::error::Result<RingBuf<T>> {
    if capacity == 0 {
      return Err(Error::new(
        ErrorKind::InvalidArgument,
        "ring buffer capacity must be greater than 0",
      ));
    }
    Ok(RingBuf {
      buf: vec![None; capacity],
      head: 0,
      size: 0,
    })
  }

  pub fn cap(&self) -> usize {
    self.buf.len()
  }

  pub fn len(&self) -> usize {
    self.size
  }

  pub fn is_empty(&self) -> bool {
    self.size == 0
  }

  pub fn full(&self) -> bool {
    self.size == self.cap()
  }

  /// Pushes `v` at the tail, evicting and returning the oldest element if
  /// the buffer was already full.
  pub fn push(&mut self, v: T) -> Option<T> {
    let cap = self.cap();
    if self.size < cap {
      let tail = (self.head + self.size) % cap;
      self.buf[tail] = Some(v);
      self.size += 1;
      None
    } else {
      let evicted = self.buf[self.head].take();
      self.buf[self.head] = Some(v);
      self.head = (self.head + 1) % cap;
      evicted
    }
  }

  /// Returns the `i`-th oldest element (`i` in `[0, len())`), or `None` if
  /// out of range.
  pub fn get(&self, i: usize) -> Option<&T> {
    if i >= self.size {
      return None;
    }
    let idx = (self.head + i) % self.cap();
    self.buf[idx].as_ref()
  }

  pub fn first(&self) -> Option<&T> {
    self.get(0)
  }

  pub fn last(&self) -> Option<&T> {
    if self.size == 0 {
      None
    } else {
      self.get(self.size - 1)
    }
  }

  pub fn to_vec(&self) -> Vec<T> {
    (0..self.size).map(|i| self.get(i).unwrap().clone()).collect()
  }

  pub fn clear(&mut self) {
    for slot in self.buf.iter_mut() {
      *slot = None;
    }
    self.head = 0;
    self.size = 0;
  }
}

/// A [`RingBuf<f64>`] that additionally maintains a running sum, updated
/// incrementally on every push so `sum`/`avg` are O(1) instead of O(n).
#[derive(Debug, Clone)]
pub struct StatsRingBuf {
  buf: RingBuf<f64>,
  sum: f64,
}

impl StatsRingBuf {
  pub fn new(capacity: usize) -> crate::error::Result<StatsRingBuf> {
    Ok(StatsRingBuf {
      buf: RingBuf::new(capacity)?,
      sum: 0.0,
    })
  }

  pub fn cap(&self) -> usize {
    self.buf.cap()
  }

  pub fn len(&self) -> usize {
    self.buf.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buf.is_empty()
  }

  pub fn full(&self) -> bool {
    self.buf.full()
  }

  pub fn push(&mut self, v: f64) -> Option<f64> {
    let evicted = self.buf.push(v);
    self.sum += v;
    if let Some(e) = evicted {
      self.sum -= e;
    }
    evicted
  }

  pub fn get(&self, i: usize) -> Option<f64> {
    self.buf.get(i).copied()
  }

  pub fn to_vec(&self) -> Vec<f64> {
    self.buf.to_vec()
  }

  pub fn sum(&self) -> f64 {
    self.sum
  }

  pub fn avg(&self) -> f64 {
    if self.is_empty() {
      0.0
    } else {
      self.sum / self.len() as f64
    }
  }

  pub fn clear(&mut self) {
    self.buf.clear();
    self.sum = 0.0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_capacity_is_rejected() {
    assert!(RingBuf::<f64>::new(0).is_err());
  }

  #[test]
  fn push_evicts_once_full() {
    let mut rb = RingBuf::new(3).unwrap();
    assert_eq!(rb.push(1), None);
    assert_eq!(rb.push(2), None);
    assert_eq!(rb.push(3), None);
    assert!(rb.full());
    assert_eq!(rb.push(4), Some(1));
    assert_eq!(rb.to_vec(), vec![2, 3, 4]);
  }

  #[test]
  fn len_matches_min_capacity_and_push_count() {
    let mut rb = RingBuf::new(4).unwrap();
    for (i, v) in [10, 20, 30, 40, 50, 60].into_iter().enumerate() {
      rb.push(v);
      assert_eq!(rb.len(), (i + 1).min(4));
      assert_eq!(rb.full(), i + 1 >= 4);
    }
    assert_eq!(rb.to_vec(), vec![30, 40, 50, 60]);
    for i in 0..rb.len() {
      assert_eq!(rb.get(i), Some(&rb.to_vec()[i]));
    }
  }

  #[test]
  fn clear_resets_state() {
    let mut rb = RingBuf::new(2).unwrap();
    rb.push(1);
    rb.push(2);
    rb.clear();
    assert_eq!(rb.len(), 0);
    assert!(!rb.full());
    assert_eq!(rb.push(9), None);
    assert_eq!(rb.to_vec(), vec![9]);
  }

  #[test]
  fn stats_sum_and_avg_track_window() {
    let mut s = StatsRingBuf::new(3).unwrap();
    assert_eq!(s.avg(), 0.0);
    s.push(1.0);
    s.push(2.0);
    s.push(3.0);
    assert_eq!(s.sum(), 6.0);
    assert_eq!(s.avg(), 2.0);
    s.push(9.0); // evicts the 1.0
    assert_eq!(s.sum(), 14.0);
    assert_eq!(s.avg(), 14.0 / 3.0);
  }
}
