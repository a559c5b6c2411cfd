// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

use crate::frame::ChromaSampling;

/// A rational number.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rational {
  /// Numerator.
  pub num: u64,
  /// Denominator.
  pub den: u64,
}

impl Rational {
  /// Creates a rational number from the given numerator and denominator.
  pub const fn new(num: u64, den: u64) -> Self {
    Rational { num, den }
  }

  /// Returns a rational number that is the reciprocal of the given one.
  pub const fn from_reciprocal(reciprocal: Self) -> Self {
    Rational { num: reciprocal.den, den: reciprocal.num }
  }

  /// Returns the rational number as a floating-point number.
  pub fn as_f64(self) -> f64 {
    self.num as f64 / self.den as f64
  }
}

/// Encoding speed/quality trade-off requested for each frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Deadline {
  RealTime,
  Good,
  Best,
}

impl Default for Deadline {
  fn default() -> Self {
    Deadline::Good
  }
}

/// Rate-control workload for a driver run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PassMode {
  OnePass,
  TwoPassGood,
  TwoPassBest,
}

impl PassMode {
  /// Number of encode passes the workload requires.
  pub const fn passes(self) -> usize {
    match self {
      PassMode::OnePass => 1,
      PassMode::TwoPassGood | PassMode::TwoPassBest => 2,
    }
  }
}

/// Which rate-control pass the encoder is configured for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RcPass {
  OnePass,
  FirstPass,
  LastPass,
}

impl Default for RcPass {
  fn default() -> Self {
    RcPass::OnePass
  }
}

/// Settings handed to the encoder at initialization and reconfiguration.
#[derive(Clone, Debug)]
pub struct EncoderConfig {
  /// Width of the frames in pixels.
  pub width: usize,
  /// Height of the frames in pixels.
  pub height: usize,
  /// Bit depth.
  pub bit_depth: usize,
  /// Chroma subsampling.
  pub chroma_sampling: ChromaSampling,
  /// Video time base.
  pub time_base: Rational,
  /// Rate-control pass.
  pub pass: RcPass,
  /// First-pass statistics fed back into the final pass.
  pub twopass_stats_in: Vec<u8>,
}

impl Default for EncoderConfig {
  fn default() -> Self {
    EncoderConfig {
      width: 320,
      height: 240,
      bit_depth: 8,
      chroma_sampling: ChromaSampling::default(),
      time_base: Rational { num: 1, den: 30 },
      pass: RcPass::default(),
      twopass_stats_in: Vec::new(),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn pass_counts() {
    assert_eq!(PassMode::OnePass.passes(), 1);
    assert_eq!(PassMode::TwoPassGood.passes(), 2);
    assert_eq!(PassMode::TwoPassBest.passes(), 2);
  }

  #[test]
  fn rational_as_f64() {
    assert_eq!(Rational::new(1, 4).as_f64(), 0.25);
    assert_eq!(Rational::from_reciprocal(Rational::new(30, 1)).as_f64(), 1.0 / 30.0);
  }
}
