// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

//! Double-precision reference DCT used to judge candidate kernels.

use super::TX_WIDTH;

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// One 32-point type-II DCT over `input`, orthonormal up to a uniform
/// scale of `sqrt(TX_WIDTH / 2)` per dimension.
pub fn reference_dct_1d(input: &[f64; TX_WIDTH], output: &mut [f64; TX_WIDTH]) {
  for (k, out) in output.iter_mut().enumerate() {
    let mut acc = 0.0;
    for (n, &x) in input.iter().enumerate() {
      acc += x
        * (PI * (2 * n + 1) as f64 * k as f64 / (2 * TX_WIDTH) as f64).cos();
    }
    if k == 0 {
      acc *= FRAC_1_SQRT_2;
    }
    *out = acc;
  }
}

/// The separable 2D reference transform at the fixed-point kernels'
/// output scale: columns, then rows, then a uniform division by 4.
pub fn reference_dct_2d(input: &[i16], output: &mut [f64]) {
  assert!(input.len() >= TX_WIDTH * TX_WIDTH);
  assert!(output.len() >= TX_WIDTH * TX_WIDTH);
  let mut col = [0.0f64; TX_WIDTH];
  let mut out_col = [0.0f64; TX_WIDTH];
  for i in 0..TX_WIDTH {
    for j in 0..TX_WIDTH {
      col[j] = f64::from(input[j * TX_WIDTH + i]);
    }
    reference_dct_1d(&col, &mut out_col);
    for j in 0..TX_WIDTH {
      output[j * TX_WIDTH + i] = out_col[j];
    }
  }
  let mut row = [0.0f64; TX_WIDTH];
  let mut out_row = [0.0f64; TX_WIDTH];
  for j in 0..TX_WIDTH {
    row.copy_from_slice(&output[j * TX_WIDTH..(j + 1) * TX_WIDTH]);
    reference_dct_1d(&row, &mut out_row);
    for i in 0..TX_WIDTH {
      output[j * TX_WIDTH + i] = out_row[i] / 4.0;
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::transform::COEFF_COUNT;

  #[test]
  fn flat_block_concentrates_in_dc() {
    let input = [1i16; COEFF_COUNT];
    let mut output = [0.0f64; COEFF_COUNT];
    reference_dct_2d(&input, &mut output);
    // DC picks up 32 * 32 * (1/sqrt(2))^2 / 4.
    assert!((output[0] - 128.0).abs() < 1e-9);
    for &c in &output[1..] {
      assert!(c.abs() < 1e-9);
    }
  }

  #[test]
  fn preserves_energy_up_to_scale() {
    // Orthogonality: sum of squares scales by (32 / 2) * (32 / 2) / 16.
    let mut input = [0i16; COEFF_COUNT];
    input[5 * TX_WIDTH + 7] = 100;
    input[20 * TX_WIDTH + 3] = -50;
    let mut output = [0.0f64; COEFF_COUNT];
    reference_dct_2d(&input, &mut output);
    let in_energy: f64 =
      input.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    let out_energy: f64 = output.iter().map(|&c| c * c).sum();
    assert!((out_energy / in_energy - 16.0).abs() < 1e-9);
  }
}
