// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

mod align;
mod pixel;

pub use self::align::*;
pub use self::pixel::*;

/// Shift `value` right by `bit` with rounding to nearest.
#[inline(always)]
pub const fn round_shift(value: i64, bit: usize) -> i64 {
  (value + (1i64 << bit >> 1)) >> bit
}

pub trait Fixed {
  fn align_power_of_two(&self, n: usize) -> Self;
}

impl Fixed for usize {
  #[inline]
  fn align_power_of_two(&self, n: usize) -> Self {
    (self + (1 << n) - 1) & !((1 << n) - 1)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn round_shift_rounds_to_nearest() {
    assert_eq!(round_shift(8, 2), 2);
    assert_eq!(round_shift(9, 2), 2);
    assert_eq!(round_shift(10, 2), 3);
    assert_eq!(round_shift(-6, 2), -1);
  }

  #[test]
  fn align_power_of_two_rounds_up() {
    assert_eq!(0usize.align_power_of_two(6), 0);
    assert_eq!(1usize.align_power_of_two(6), 64);
    assert_eq!(64usize.align_power_of_two(6), 64);
    assert_eq!(65usize.align_power_of_two(6), 128);
  }
}
