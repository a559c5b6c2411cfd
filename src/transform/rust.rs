// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

//! Baseline fixed-point 32x32 kernels.
//!
//! A direct matrix multiply against a quantized cosine basis, with
//! 64-bit accumulation. The scale chain matches [`reference_dct_2d`]:
//! the column pass keeps two fraction bits, the row pass folds in the
//! final division by 4. The `_rd` variant halves the intermediate the
//! way reduced-precision fast paths do.
//!
//! [`reference_dct_2d`]: super::reference_dct_2d

use super::{half_round_shift, COEFF_COUNT, TX_WIDTH};
use crate::util::round_shift;

use once_cell::sync::Lazy;

use std::f64::consts::{FRAC_1_SQRT_2, PI};

const COS_BITS: usize = 14;

// cos(pi * (2n + 1) * k / 64) at 14 fraction bits, 1/sqrt(2) folded
// into the DC row.
static COS_TABLE: Lazy<[[i32; TX_WIDTH]; TX_WIDTH]> = Lazy::new(|| {
  let mut table = [[0i32; TX_WIDTH]; TX_WIDTH];
  for (k, row) in table.iter_mut().enumerate() {
    for (n, entry) in row.iter_mut().enumerate() {
      let mut basis =
        (PI * (2 * n + 1) as f64 * k as f64 / (2 * TX_WIDTH) as f64).cos();
      if k == 0 {
        basis *= FRAC_1_SQRT_2;
      }
      *entry = (basis * (1 << COS_BITS) as f64).round() as i32;
    }
  }
  table
});

fn fdct32x32_inner(input: &[i16], output: &mut [i32], rd: bool) {
  let table = &*COS_TABLE;
  let mut inter = [0i32; COEFF_COUNT];
  for i in 0..TX_WIDTH {
    for k in 0..TX_WIDTH {
      let mut acc = 0i64;
      for n in 0..TX_WIDTH {
        acc += i64::from(input[n * TX_WIDTH + i]) * i64::from(table[k][n]);
      }
      inter[k * TX_WIDTH + i] = round_shift(acc, COS_BITS - 2) as i32;
    }
  }
  if rd {
    for v in inter.iter_mut() {
      *v = half_round_shift(*v);
    }
  }
  let row_bits = if rd { COS_BITS + 3 } else { COS_BITS + 4 };
  for j in 0..TX_WIDTH {
    for k in 0..TX_WIDTH {
      let mut acc = 0i64;
      for i in 0..TX_WIDTH {
        acc += i64::from(inter[j * TX_WIDTH + i]) * i64::from(table[k][i]);
      }
      output[j * TX_WIDTH + k] = round_shift(acc, row_bits) as i32;
    }
  }
}

/// Baseline full-precision forward transform.
pub fn fdct32x32(input: &[i16], output: &mut [i32]) {
  fdct32x32_inner(input, output, false);
}

/// Baseline reduced-precision forward transform.
pub fn fdct32x32_rd(input: &[i16], output: &mut [i32]) {
  fdct32x32_inner(input, output, true);
}

/// Baseline inverse transform. Reconstructs the residual and adds it
/// into `output` in place, clamping to the `bit_depth` pixel range.
pub fn idct32x32_add(input: &[i32], output: &mut [u16], bit_depth: usize) {
  let table = &*COS_TABLE;
  let max = (1i32 << bit_depth) - 1;
  let mut inter = [0i32; COEFF_COUNT];
  for j in 0..TX_WIDTH {
    for i in 0..TX_WIDTH {
      let mut acc = 0i64;
      for k in 0..TX_WIDTH {
        acc += i64::from(input[j * TX_WIDTH + k]) * i64::from(table[k][i]);
      }
      inter[j * TX_WIDTH + i] = round_shift(acc, COS_BITS + 1) as i32;
    }
  }
  for i in 0..TX_WIDTH {
    for n in 0..TX_WIDTH {
      let mut acc = 0i64;
      for j in 0..TX_WIDTH {
        acc += i64::from(inter[j * TX_WIDTH + i]) * i64::from(table[j][n]);
      }
      let residual = round_shift(acc, COS_BITS + 5) as i32;
      let idx = n * TX_WIDTH + i;
      output[idx] = (i32::from(output[idx]) + residual).clamp(0, max) as u16;
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::transform::reference_dct_2d;

  use rand::{Rng, SeedableRng};
  use rand_chacha::ChaChaRng;

  #[test]
  fn flat_block_concentrates_in_dc() {
    let input = [64i16; COEFF_COUNT];
    let mut output = [0i32; COEFF_COUNT];
    fdct32x32(&input, &mut output);
    assert!((output[0] - 8192).abs() <= 1);
    for &c in &output[1..] {
      assert!(c.abs() <= 1, "leaked {c} into AC");
    }
  }

  #[test]
  fn tracks_reference_closely() {
    let mut rng = ChaChaRng::from_seed([0; 32]);
    let mut input = [0i16; COEFF_COUNT];
    for v in input.iter_mut() {
      *v = rng.gen_range(-255..=255);
    }
    let mut fixed = [0i32; COEFF_COUNT];
    let mut exact = [0.0f64; COEFF_COUNT];
    fdct32x32(&input, &mut fixed);
    reference_dct_2d(&input, &mut exact);
    for (&f, &e) in fixed.iter().zip(exact.iter()) {
      assert!((f64::from(f) - e).abs() <= 2.0, "{f} vs {e}");
    }
  }

  #[test]
  fn round_trip_reconstructs_residual() {
    let mut rng = ChaChaRng::from_seed([1; 32]);
    let mut src = [0u16; COEFF_COUNT];
    let mut rec = [0u16; COEFF_COUNT];
    let mut input = [0i16; COEFF_COUNT];
    for i in 0..COEFF_COUNT {
      src[i] = rng.gen::<u16>() & 0xff;
      rec[i] = rng.gen::<u16>() & 0xff;
      input[i] = src[i] as i16 - rec[i] as i16;
    }
    let mut coeffs = [0i32; COEFF_COUNT];
    fdct32x32(&input, &mut coeffs);
    idct32x32_add(&coeffs, &mut rec, 8);
    for (&s, &r) in src.iter().zip(rec.iter()) {
      let diff = (i32::from(s) - i32::from(r)).abs();
      assert!(diff <= 1, "{s} vs {r}");
    }
  }
}
