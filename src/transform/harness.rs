// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

//! The transform check matrix.
//!
//! Every registered candidate runs four checks at each bit depth:
//! round-trip accuracy against random residuals, coefficient agreement
//! with the matched baseline kernel, overflow behavior on extreme
//! inputs, and reconstruction accuracy from reference coefficients.

use super::reference::reference_dct_2d;
use super::rust::{fdct32x32, fdct32x32_rd, idct32x32_add};
use super::{
  FwdTxfmFn, InvTxfmAddFn, PrecisionMode, APPROX_COEFF_TOLERANCE,
  APPROX_MAX_ERROR_DIV, APPROX_TOTAL_ERROR_DIV, COEFF_COUNT, DCT_MAX_VALUE,
};
use crate::cpu_features::CpuFeatureLevel;
use crate::util::Aligned;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use thiserror::Error;

use std::fmt;

/// Bit depths every candidate is checked at.
pub const BIT_DEPTHS: &[usize] = &[8, 10, 12];

/// One candidate kernel pair at one bit depth.
#[derive(Copy, Clone, Debug)]
pub struct TxfmCase {
  pub name: &'static str,
  pub fwd: FwdTxfmFn,
  pub inv: InvTxfmAddFn,
  pub precision: PrecisionMode,
  pub bit_depth: usize,
  pub cpu: CpuFeatureLevel,
}

impl fmt::Display for TxfmCase {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    write!(
      f,
      "{}_{}bd_{}",
      self.name,
      self.bit_depth,
      match self.precision {
        PrecisionMode::Exact => "exact",
        PrecisionMode::Approximate => "approx",
      }
    )
  }
}

/// Trial counts for each check.
#[derive(Copy, Clone, Debug)]
pub struct TrialCounts {
  pub accuracy: usize,
  pub coeff: usize,
  pub mem: usize,
  pub inverse: usize,
}

impl Default for TrialCounts {
  fn default() -> Self {
    TrialCounts { accuracy: 1000, coeff: 1000, mem: 2000, inverse: 1000 }
  }
}

/// Squared-error accumulator that remembers where the worst sample
/// occurred.
#[derive(Copy, Clone, Debug, Default)]
pub struct ErrorStats {
  max_sq: u64,
  total_sq: u64,
  samples: u64,
  max_at: (usize, usize),
}

impl ErrorStats {
  pub fn observe(&mut self, trial: usize, sample: usize, diff: i64) {
    let sq = (diff * diff) as u64;
    self.total_sq += sq;
    self.samples += 1;
    if sq > self.max_sq {
      self.max_sq = sq;
      self.max_at = (trial, sample);
    }
  }

  pub fn max_sq(&self) -> u64 {
    self.max_sq
  }

  pub fn total_sq(&self) -> u64 {
    self.total_sq
  }

  pub fn samples(&self) -> u64 {
    self.samples
  }

  /// `(trial, sample)` of the largest observed error.
  pub fn max_location(&self) -> (usize, usize) {
    self.max_at
  }
}

/// A check failure, carrying enough context to reproduce it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
  #[error(
    "round-trip error {observed} exceeds {allowed} at trial {trial} sample {sample}"
  )]
  RoundTripMaxError { observed: u64, allowed: u64, trial: usize, sample: usize },
  #[error("accumulated round-trip error {observed} exceeds {allowed} over {trials} trials")]
  RoundTripTotalError { observed: u64, allowed: u64, trials: usize },
  #[error(
    "coefficient {index} is {got}, baseline has {want} (tolerance {tolerance}) at trial {trial}"
  )]
  CoeffMismatch { trial: usize, index: usize, got: i32, want: i32, tolerance: i32 },
  #[error("coefficient {index} is {value}, exceeding bound {bound} at trial {trial}")]
  CoeffOverflow { trial: usize, index: usize, value: i32, bound: i32 },
  #[error("reconstruction off by {error} (squared) at trial {trial} sample {sample}")]
  InverseError { trial: usize, sample: usize, error: u64 },
}

/// Outcome of running one case through all four checks.
#[derive(Debug, Clone)]
pub struct CaseResult {
  pub case: TxfmCase,
  pub outcome: Result<(), CheckError>,
}

const BUILTIN_CANDIDATES: &[(
  &str,
  CpuFeatureLevel,
  PrecisionMode,
  FwdTxfmFn,
  InvTxfmAddFn,
)] = &[
  ("rust", CpuFeatureLevel::RUST, PrecisionMode::Exact, fdct32x32, idct32x32_add),
  (
    "rust_rd",
    CpuFeatureLevel::RUST,
    PrecisionMode::Approximate,
    fdct32x32_rd,
    idct32x32_add,
  ),
];

/// The set of cases a harness will run. Built-in candidates are
/// filtered by the given capability level and crossed with
/// [`BIT_DEPTHS`]; external candidates can be added with `register`.
#[derive(Clone, Debug, Default)]
pub struct CandidateRegistry {
  cases: Vec<TxfmCase>,
}

impl CandidateRegistry {
  /// A registry with no cases.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Built-in candidates runnable at the detected capability level.
  pub fn detect() -> Self {
    Self::with_cpu(CpuFeatureLevel::default())
  }

  /// Built-in candidates requiring at most `cpu`.
  pub fn with_cpu(cpu: CpuFeatureLevel) -> Self {
    let mut registry = Self::empty();
    for &(name, level, precision, fwd, inv) in BUILTIN_CANDIDATES {
      if level > cpu {
        continue;
      }
      for &bit_depth in BIT_DEPTHS {
        registry.register(TxfmCase {
          name,
          fwd,
          inv,
          precision,
          bit_depth,
          cpu: level,
        });
      }
    }
    registry
  }

  pub fn register(&mut self, case: TxfmCase) {
    self.cases.push(case);
  }

  pub fn cases(&self) -> &[TxfmCase] {
    &self.cases
  }
}

/// Runs every registered case through the check matrix.
pub struct TxfmHarness {
  registry: CandidateRegistry,
  counts: TrialCounts,
}

impl TxfmHarness {
  pub fn new(registry: CandidateRegistry) -> Self {
    TxfmHarness { registry, counts: TrialCounts::default() }
  }

  pub fn with_counts(registry: CandidateRegistry, counts: TrialCounts) -> Self {
    TxfmHarness { registry, counts }
  }

  /// Runs all cases. A failing case never prevents the remaining
  /// cases from running.
  pub fn run(&self) -> Vec<CaseResult> {
    self
      .registry
      .cases()
      .iter()
      .map(|case| {
        let outcome = self.run_case(case);
        match &outcome {
          Ok(()) => log::debug!("{case}: ok"),
          Err(e) => log::debug!("{case}: {e}"),
        }
        CaseResult { case: *case, outcome }
      })
      .collect()
  }

  fn run_case(&self, case: &TxfmCase) -> Result<(), CheckError> {
    accuracy_check(case, self.counts.accuracy)?;
    coeff_check(case, self.counts.coeff)?;
    mem_check(case, self.counts.mem)?;
    inverse_accuracy_check(case, self.counts.inverse)
  }
}

/// Coefficients are always judged against the full-precision baseline
/// kernel; reduced-precision candidates get a fixed tolerance.
fn baseline_for(precision: PrecisionMode) -> (FwdTxfmFn, i32) {
  let tolerance = match precision {
    PrecisionMode::Exact => 0,
    PrecisionMode::Approximate => APPROX_COEFF_TOLERANCE,
  };
  (fdct32x32 as FwdTxfmFn, tolerance)
}

/// Encode-decode round trip over random residuals. Error bounds scale
/// with bit depth; reduced-precision candidates get their observed
/// errors divided down before comparison.
fn accuracy_check(
  case: &TxfmCase, trials: usize,
) -> Result<(), CheckError> {
  let mut rng = ChaChaRng::from_seed([0; 32]);
  let mask = (1u16 << case.bit_depth) - 1;
  let mut stats = ErrorStats::default();
  let mut input = Aligned::new([0i16; COEFF_COUNT]);
  let mut coeffs = Aligned::new([0i32; COEFF_COUNT]);
  let mut src = Aligned::new([0u16; COEFF_COUNT]);
  let mut rec = Aligned::new([0u16; COEFF_COUNT]);
  for trial in 0..trials {
    for j in 0..COEFF_COUNT {
      src.data[j] = rng.gen::<u16>() & mask;
      rec.data[j] = rng.gen::<u16>() & mask;
      input.data[j] = src.data[j] as i16 - rec.data[j] as i16;
    }
    (case.fwd)(&input.data, &mut coeffs.data);
    (case.inv)(&coeffs.data, &mut rec.data, case.bit_depth);
    for j in 0..COEFF_COUNT {
      let diff = i64::from(src.data[j]) - i64::from(rec.data[j]);
      stats.observe(trial, j, diff);
    }
  }
  let (mut max_sq, mut total_sq) = (stats.max_sq(), stats.total_sq());
  if case.precision == PrecisionMode::Approximate {
    max_sq /= APPROX_MAX_ERROR_DIV;
    total_sq /= APPROX_TOTAL_ERROR_DIV;
  }
  let allowed_max = 1u64 << (2 * (case.bit_depth - 8));
  let allowed_total = (trials as u64) << (2 * (case.bit_depth - 8));
  if max_sq > allowed_max {
    let (trial, sample) = stats.max_location();
    return Err(CheckError::RoundTripMaxError {
      observed: max_sq,
      allowed: allowed_max,
      trial,
      sample,
    });
  }
  if total_sq > allowed_total {
    return Err(CheckError::RoundTripTotalError {
      observed: total_sq,
      allowed: allowed_total,
      trials,
    });
  }
  Ok(())
}

/// Forward coefficients against the matched baseline over random
/// residuals.
fn coeff_check(case: &TxfmCase, trials: usize) -> Result<(), CheckError> {
  let mut rng = ChaChaRng::from_seed([0; 32]);
  let mask = (1u16 << case.bit_depth) - 1;
  let (baseline, tolerance) = baseline_for(case.precision);
  let mut input = Aligned::new([0i16; COEFF_COUNT]);
  let mut want = Aligned::new([0i32; COEFF_COUNT]);
  let mut got = Aligned::new([0i32; COEFF_COUNT]);
  for trial in 0..trials {
    for v in input.data.iter_mut() {
      *v = (rng.gen::<u16>() & mask) as i16 - (rng.gen::<u16>() & mask) as i16;
    }
    baseline(&input.data, &mut want.data);
    (case.fwd)(&input.data, &mut got.data);
    for j in 0..COEFF_COUNT {
      if (got.data[j] - want.data[j]).abs() > tolerance {
        return Err(CheckError::CoeffMismatch {
          trial,
          index: j,
          got: got.data[j],
          want: want.data[j],
          tolerance,
        });
      }
    }
  }
  Ok(())
}

/// Saturation behavior on extreme inputs. The first two trials are
/// all-maximum and all-minimum blocks, the rest random sign patterns
/// at full amplitude. A random residual block is drawn each trial as
/// well, so the input sequence lines up with the other checks.
fn mem_check(case: &TxfmCase, trials: usize) -> Result<(), CheckError> {
  let mut rng = ChaChaRng::from_seed([0; 32]);
  let mask = (1u16 << case.bit_depth) - 1;
  let bound = (4 * DCT_MAX_VALUE) << (case.bit_depth - 8);
  let (baseline, tolerance) = baseline_for(case.precision);
  let mut extreme = Aligned::new([0i16; COEFF_COUNT]);
  let mut unused = Aligned::new([0i16; COEFF_COUNT]);
  let mut want = Aligned::new([0i32; COEFF_COUNT]);
  let mut got = Aligned::new([0i32; COEFF_COUNT]);
  for trial in 0..trials {
    for j in 0..COEFF_COUNT {
      unused.data[j] =
        (rng.gen::<u16>() & mask) as i16 - (rng.gen::<u16>() & mask) as i16;
      extreme.data[j] = if rng.gen::<bool>() { mask as i16 } else { -(mask as i16) };
      if trial == 0 {
        extreme.data[j] = mask as i16;
      } else if trial == 1 {
        extreme.data[j] = -(mask as i16);
      }
    }
    baseline(&extreme.data, &mut want.data);
    (case.fwd)(&extreme.data, &mut got.data);
    for j in 0..COEFF_COUNT {
      if (got.data[j] - want.data[j]).abs() > tolerance {
        return Err(CheckError::CoeffMismatch {
          trial,
          index: j,
          got: got.data[j],
          want: want.data[j],
          tolerance,
        });
      }
      for &value in &[got.data[j], want.data[j]] {
        if value.abs() > bound {
          return Err(CheckError::CoeffOverflow {
            trial,
            index: j,
            value,
            bound,
          });
        }
      }
    }
  }
  Ok(())
}

/// Reconstruction from rounded reference coefficients must land
/// within one of the source pixel everywhere.
fn inverse_accuracy_check(
  case: &TxfmCase, trials: usize,
) -> Result<(), CheckError> {
  let mut rng = ChaChaRng::from_seed([0; 32]);
  let mask = (1u16 << case.bit_depth) - 1;
  let mut input = Aligned::new([0i16; COEFF_COUNT]);
  let mut reference = Aligned::new([0.0f64; COEFF_COUNT]);
  let mut coeffs = Aligned::new([0i32; COEFF_COUNT]);
  let mut src = Aligned::new([0u16; COEFF_COUNT]);
  let mut rec = Aligned::new([0u16; COEFF_COUNT]);
  for trial in 0..trials {
    for j in 0..COEFF_COUNT {
      src.data[j] = rng.gen::<u16>() & mask;
      rec.data[j] = rng.gen::<u16>() & mask;
      input.data[j] = src.data[j] as i16 - rec.data[j] as i16;
    }
    reference_dct_2d(&input.data, &mut reference.data);
    for j in 0..COEFF_COUNT {
      coeffs.data[j] = reference.data[j].round() as i32;
    }
    (case.inv)(&coeffs.data, &mut rec.data, case.bit_depth);
    for j in 0..COEFF_COUNT {
      let diff = i64::from(src.data[j]) - i64::from(rec.data[j]);
      let error = (diff * diff) as u64;
      if error > 1 {
        return Err(CheckError::InverseError { trial, sample: j, error });
      }
    }
  }
  Ok(())
}

#[cfg(test)]
mod test {
  use super::*;

  fn run_matrix(bit_depth: usize, precision: PrecisionMode) {
    let mut registry = CandidateRegistry::empty();
    for case in CandidateRegistry::with_cpu(CpuFeatureLevel::RUST).cases() {
      if case.bit_depth == bit_depth && case.precision == precision {
        registry.register(*case);
      }
    }
    let results = TxfmHarness::new(registry).run();
    assert!(!results.is_empty());
    for result in results {
      assert!(
        result.outcome.is_ok(),
        "{}: {:?}",
        result.case,
        result.outcome
      );
    }
  }

  macro_rules! test_matrix {
    ($($bd:expr),*) => {
      $(
        paste::paste! {
          #[test]
          fn [<matrix_exact_ $bd>]() {
            run_matrix($bd, PrecisionMode::Exact);
          }

          #[test]
          fn [<matrix_approx_ $bd>]() {
            run_matrix($bd, PrecisionMode::Approximate);
          }
        }
      )*
    };
  }

  test_matrix!(8, 10, 12);

  #[test]
  fn registry_always_offers_rust_baseline() {
    let registry = CandidateRegistry::with_cpu(CpuFeatureLevel::RUST);
    assert_eq!(registry.cases().len(), 2 * BIT_DEPTHS.len());
    for &bit_depth in BIT_DEPTHS {
      assert!(registry
        .cases()
        .iter()
        .any(|c| c.name == "rust" && c.bit_depth == bit_depth));
      assert!(registry
        .cases()
        .iter()
        .any(|c| c.name == "rust_rd" && c.bit_depth == bit_depth));
    }
  }

  #[test]
  fn harness_reports_all_cases() {
    let registry = CandidateRegistry::detect();
    let counts = TrialCounts { accuracy: 10, coeff: 10, mem: 10, inverse: 10 };
    let results = TxfmHarness::with_counts(registry.clone(), counts).run();
    assert_eq!(results.len(), registry.cases().len());
    for result in results {
      assert!(result.outcome.is_ok(), "{}", result.case);
    }
  }

  #[test]
  fn error_stats_tracks_maximum() {
    let mut stats = ErrorStats::default();
    stats.observe(0, 3, 2);
    stats.observe(1, 7, -5);
    stats.observe(2, 1, 1);
    assert_eq!(stats.max_sq(), 25);
    assert_eq!(stats.total_sq(), 30);
    assert_eq!(stats.samples(), 3);
    assert_eq!(stats.max_location(), (1, 7));
  }

  fn zero_fwd(_input: &[i16], output: &mut [i32]) {
    output.iter_mut().for_each(|v| *v = 0);
  }

  fn noop_inv(_input: &[i32], _output: &mut [u16], _bit_depth: usize) {}

  #[test]
  fn coeff_check_flags_mismatch() {
    let case = TxfmCase {
      name: "zero",
      fwd: zero_fwd,
      inv: idct32x32_add,
      precision: PrecisionMode::Exact,
      bit_depth: 8,
      cpu: CpuFeatureLevel::RUST,
    };
    let err = coeff_check(&case, 1).unwrap_err();
    assert!(matches!(err, CheckError::CoeffMismatch { got: 0, .. }));
  }

  #[test]
  fn accuracy_check_flags_lossy_round_trip() {
    let case = TxfmCase {
      name: "noop",
      fwd: fdct32x32,
      inv: noop_inv,
      precision: PrecisionMode::Exact,
      bit_depth: 8,
      cpu: CpuFeatureLevel::RUST,
    };
    let err = accuracy_check(&case, 2).unwrap_err();
    assert!(matches!(err, CheckError::RoundTripMaxError { .. }));
  }

  #[test]
  fn inverse_accuracy_flags_bad_inverse() {
    let case = TxfmCase {
      name: "noop",
      fwd: fdct32x32,
      inv: noop_inv,
      precision: PrecisionMode::Exact,
      bit_depth: 8,
      cpu: CpuFeatureLevel::RUST,
    };
    let err = inverse_accuracy_check(&case, 1).unwrap_err();
    assert!(matches!(err, CheckError::InverseError { .. }));
  }

  #[test]
  fn mem_check_passes_builtin_extremes() {
    for case in CandidateRegistry::with_cpu(CpuFeatureLevel::RUST).cases() {
      mem_check(case, 4).unwrap();
    }
  }
}
