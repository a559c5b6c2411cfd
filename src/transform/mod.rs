// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

//! 32x32 transform correctness checking.
//!
//! Candidate forward/inverse kernel pairs are registered with a
//! [`CandidateRegistry`] and run through the checks in [`harness`]
//! against the double-precision reference in [`reference`]. The
//! baseline fixed-point kernels in [`rust`] are always registered.

mod harness;
mod reference;
mod rust;

pub use self::harness::*;
pub use self::reference::*;
pub use self::rust::*;

/// Transform block width and height.
pub const TX_WIDTH: usize = 32;
/// Coefficients in one block.
pub const COEFF_COUNT: usize = TX_WIDTH * TX_WIDTH;

/// Largest coefficient magnitude an 8-bit forward transform may
/// produce from a single extreme input.
pub const DCT_MAX_VALUE: i32 = 16384;

/// Divisor applied to the observed worst-case round-trip error before
/// comparison when a candidate runs at reduced precision.
pub const APPROX_MAX_ERROR_DIV: u64 = 2;
/// Divisor applied to the accumulated round-trip error before
/// comparison when a candidate runs at reduced precision.
pub const APPROX_TOTAL_ERROR_DIV: u64 = 45;
/// Per-coefficient deviation from the baseline forward transform
/// tolerated at reduced precision.
pub const APPROX_COEFF_TOLERANCE: i32 = 6;

/// Numerical contract a candidate claims to honor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrecisionMode {
  /// Full fixed-point precision; coefficients must match the baseline
  /// exactly.
  Exact,
  /// Reduced-precision fast path; errors are judged against relaxed
  /// bounds.
  Approximate,
}

/// Forward transform: 32x32 residual block in, coefficients out.
pub type FwdTxfmFn = fn(input: &[i16], output: &mut [i32]);

/// Inverse transform: coefficients in, added to the reconstruction
/// buffer in place and clamped to `bit_depth`.
pub type InvTxfmAddFn =
  fn(input: &[i32], output: &mut [u16], bit_depth: usize);

/// Halves `value` with rounding, biased upward for positive inputs.
#[inline(always)]
pub(crate) fn half_round_shift(value: i32) -> i32 {
  (value + 1 + (value < 0) as i32) >> 1
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn half_round_shift_halves_with_rounding() {
    assert_eq!(half_round_shift(3), 2);
    assert_eq!(half_round_shift(2), 1);
    assert_eq!(half_round_shift(-3), -1);
    assert_eq!(half_round_shift(-4), -1);
    assert_eq!(half_round_shift(0), 0);
  }
}
