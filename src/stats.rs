// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

/// First-pass statistics accumulated across a driver run.
///
/// The buffer is append-only within a run: every stats packet emitted
/// during the first pass lands here in emission order, and the whole
/// buffer is handed back to the encoder before the final pass.
#[derive(Debug, Default, Clone)]
pub struct TwopassStats {
  buf: Vec<u8>,
}

impl TwopassStats {
  pub fn new() -> Self {
    Self::default()
  }

  /// Discards any accumulated statistics.
  pub fn reset(&mut self) {
    self.buf.clear();
  }

  /// Appends one stats packet's payload.
  pub fn append(&mut self, pkt: &[u8]) {
    self.buf.extend_from_slice(pkt);
  }

  pub fn buf(&self) -> &[u8] {
    &self.buf
  }

  pub fn len(&self) -> usize {
    self.buf.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buf.is_empty()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn append_preserves_order() {
    let mut stats = TwopassStats::new();
    stats.append(&[1, 2]);
    stats.append(&[3]);
    stats.append(&[4, 5, 6]);
    assert_eq!(stats.buf(), &[1, 2, 3, 4, 5, 6]);
    assert_eq!(stats.len(), 6);
  }

  #[test]
  fn reset_clears_buffer() {
    let mut stats = TwopassStats::new();
    stats.append(&[7; 16]);
    stats.reset();
    assert!(stats.is_empty());
  }
}
