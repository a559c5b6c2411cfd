// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

//! Frame sources feeding the conformance driver.

use crate::config::Rational;
use crate::frame::{ChromaSampling, Frame};
use crate::util::{CastFromPrimitive, Pixel};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use std::mem::size_of;

/// Supplies frames to a driver run. `begin` rewinds to the first frame
/// so the same source can feed every pass of a multi-pass run.
pub trait VideoSource<T: Pixel> {
  /// Rewinds to the first frame. Both passes of a two-pass run must
  /// observe identical frames.
  fn begin(&mut self);

  /// Advances to the next frame.
  fn advance(&mut self);

  /// The current frame, or `None` past the end of the stream.
  fn frame(&self) -> Option<&Frame<T>>;

  /// Presentation timestamp of the current frame.
  fn pts(&self) -> u64;

  /// Duration of the current frame in timebase units.
  fn duration(&self) -> u64;

  /// Time base of the stream.
  fn timebase(&self) -> Rational;
}

/// A source of uniformly random frames, reproducible from its seed.
pub struct RandomVideoSource<T: Pixel> {
  rng: ChaChaRng,
  seed: [u8; 32],
  width: usize,
  height: usize,
  bit_depth: usize,
  chroma_sampling: ChromaSampling,
  limit: u64,
  frameno: u64,
  frame: Frame<T>,
}

impl<T: Pixel> RandomVideoSource<T> {
  pub fn new(
    width: usize, height: usize, bit_depth: usize,
    chroma_sampling: ChromaSampling, limit: u64, seed: [u8; 32],
  ) -> Self {
    assert!(bit_depth == 8 || size_of::<T>() > 1);
    RandomVideoSource {
      rng: ChaChaRng::from_seed(seed),
      seed,
      width,
      height,
      bit_depth,
      chroma_sampling,
      limit,
      frameno: 0,
      frame: Frame::new(width, height, chroma_sampling),
    }
  }

  pub fn bit_depth(&self) -> usize {
    self.bit_depth
  }

  pub fn limit(&self) -> u64 {
    self.limit
  }

  fn fill_frame(&mut self) {
    let mask = (1u16 << self.bit_depth) - 1;
    for plane in self.frame.planes.iter_mut() {
      for row in plane.rows_iter_mut() {
        for pixel in row.iter_mut() {
          *pixel = T::cast_from(self.rng.gen::<u16>() & mask);
        }
      }
    }
  }
}

impl<T: Pixel> VideoSource<T> for RandomVideoSource<T> {
  fn begin(&mut self) {
    // Reseed so every pass sees the same frame sequence.
    self.rng = ChaChaRng::from_seed(self.seed);
    self.frameno = 0;
    self.fill_frame();
  }

  fn advance(&mut self) {
    self.frameno += 1;
    if self.frameno < self.limit {
      self.fill_frame();
    }
  }

  fn frame(&self) -> Option<&Frame<T>> {
    if self.frameno < self.limit {
      Some(&self.frame)
    } else {
      None
    }
  }

  fn pts(&self) -> u64 {
    self.frameno
  }

  fn duration(&self) -> u64 {
    1
  }

  fn timebase(&self) -> Rational {
    Rational::new(1, 30)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn begin_replays_identical_frames() {
    let mut src =
      RandomVideoSource::<u8>::new(16, 16, 8, ChromaSampling::Cs420, 3, [5; 32]);
    src.begin();
    let first: Vec<Frame<u8>> = {
      let mut v = Vec::new();
      while let Some(f) = src.frame() {
        v.push(f.clone());
        src.advance();
      }
      v
    };
    src.begin();
    let second: Vec<Frame<u8>> = {
      let mut v = Vec::new();
      while let Some(f) = src.frame() {
        v.push(f.clone());
        src.advance();
      }
      v
    };
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
  }

  #[test]
  fn high_bit_depth_respects_mask() {
    let mut src = RandomVideoSource::<u16>::new(
      8, 8, 10, ChromaSampling::Cs420, 1, [0; 32],
    );
    src.begin();
    let frame = src.frame().unwrap();
    for plane in frame.planes.iter() {
      for row in plane.rows_iter() {
        for &p in row {
          assert!(p < 1024);
        }
      }
    }
  }

  #[test]
  fn exhausts_at_limit() {
    let mut src =
      RandomVideoSource::<u8>::new(4, 4, 8, ChromaSampling::Cs420, 2, [0; 32]);
    src.begin();
    assert!(src.frame().is_some());
    src.advance();
    assert!(src.frame().is_some());
    src.advance();
    assert!(src.frame().is_none());
    assert_eq!(src.pts(), 2);
  }
}
