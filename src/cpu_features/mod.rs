// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Instruction-set level a transform candidate requires. Candidates
/// above the level detected at runtime are excluded from the matrix.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CpuFeatureLevel {
  RUST,
  SSE2,
  SSSE3,
  SSE4_1,
  AVX2,
}

impl CpuFeatureLevel {
  pub const fn len() -> usize {
    CpuFeatureLevel::AVX2 as usize + 1
  }

  #[inline(always)]
  pub const fn as_index(self) -> usize {
    self as usize
  }

  pub const fn all() -> [CpuFeatureLevel; CpuFeatureLevel::len()] {
    use CpuFeatureLevel::*;
    [RUST, SSE2, SSSE3, SSE4_1, AVX2]
  }
}

impl fmt::Display for CpuFeatureLevel {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    use CpuFeatureLevel::*;
    write!(
      f,
      "{}",
      match self {
        RUST => "rust",
        SSE2 => "sse2",
        SSSE3 => "ssse3",
        SSE4_1 => "sse4.1",
        AVX2 => "avx2",
      }
    )
  }
}

impl FromStr for CpuFeatureLevel {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    use CpuFeatureLevel::*;
    match s {
      "rust" => Ok(RUST),
      "sse2" => Ok(SSE2),
      "ssse3" => Ok(SSSE3),
      "sse4.1" | "sse4_1" => Ok(SSE4_1),
      "avx2" => Ok(AVX2),
      _ => Err(()),
    }
  }
}

cfg_if::cfg_if! {
  if #[cfg(any(target_arch = "x86", target_arch = "x86_64"))] {
    fn detect() -> CpuFeatureLevel {
      let detected = if is_x86_feature_detected!("avx2") {
        CpuFeatureLevel::AVX2
      } else if is_x86_feature_detected!("sse4.1") {
        CpuFeatureLevel::SSE4_1
      } else if is_x86_feature_detected!("ssse3") {
        CpuFeatureLevel::SSSE3
      } else if is_x86_feature_detected!("sse2") {
        CpuFeatureLevel::SSE2
      } else {
        CpuFeatureLevel::RUST
      };
      detected
    }
  } else {
    fn detect() -> CpuFeatureLevel {
      CpuFeatureLevel::RUST
    }
  }
}

impl Default for CpuFeatureLevel {
  fn default() -> CpuFeatureLevel {
    let detected = detect();
    let manual: CpuFeatureLevel = match env::var("V_CONFORM_CPU_TARGET") {
      Ok(feature) => CpuFeatureLevel::from_str(&feature).unwrap_or(detected),
      Err(_e) => detected,
    };
    if manual > detected {
      detected
    } else {
      manual
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn levels_are_ordered() {
    let all = CpuFeatureLevel::all();
    for pair in all.windows(2) {
      assert!(pair[0] < pair[1]);
    }
  }

  #[test]
  fn parse_round_trips() {
    for level in CpuFeatureLevel::all() {
      assert_eq!(level.to_string().parse::<CpuFeatureLevel>(), Ok(level));
    }
  }

  #[test]
  fn default_never_exceeds_detection() {
    assert!(CpuFeatureLevel::default() <= CpuFeatureLevel::AVX2);
  }
}
