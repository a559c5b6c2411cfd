// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

//! Raw video frames as exchanged between sources, encoders and decoders.

use crate::util::{Fixed, Pixel};

use std::fmt;
use std::mem::size_of;

const STRIDE_ALIGNMENT_LOG2: usize = 6;

/// Chroma subsampling format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChromaSampling {
  /// Both vertically and horizontally subsampled.
  Cs420,
  /// Horizontally subsampled.
  Cs422,
  /// Not subsampled.
  Cs444,
  /// Monochrome.
  Cs400,
}

impl fmt::Display for ChromaSampling {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    write!(
      f,
      "{}",
      match self {
        ChromaSampling::Cs420 => "4:2:0",
        ChromaSampling::Cs422 => "4:2:2",
        ChromaSampling::Cs444 => "4:4:4",
        ChromaSampling::Cs400 => "Monochrome",
      }
    )
  }
}

impl Default for ChromaSampling {
  fn default() -> Self {
    ChromaSampling::Cs420
  }
}

impl ChromaSampling {
  /// Provides the amount to right shift the luma plane dimensions to get the
  ///  chroma plane dimensions.
  /// Only values 0 or 1 are ever returned.
  /// The plane dimensions must also be rounded up to accommodate odd luma plane
  ///  sizes.
  /// Cs400 returns None, as there are no chroma planes.
  pub fn get_decimation(self) -> Option<(usize, usize)> {
    use self::ChromaSampling::*;
    match self {
      Cs420 => Some((1, 1)),
      Cs422 => Some((1, 0)),
      Cs444 => Some((0, 0)),
      Cs400 => None,
    }
  }

  /// Calculates the size of a chroma plane for this sampling type, given the
  ///  luma plane dimensions.
  pub fn get_chroma_dimensions(
    self, luma_width: usize, luma_height: usize,
  ) -> (usize, usize) {
    if let Some((ss_x, ss_y)) = self.get_decimation() {
      ((luma_width + ss_x) >> ss_x, (luma_height + ss_y) >> ss_y)
    } else {
      (0, 0)
    }
  }
}

/// Plane geometry: visible dimensions, decimation and row stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneConfig {
  /// Distance between the start of adjacent rows, in pixels.
  pub stride: usize,
  /// Width in pixels.
  pub width: usize,
  /// Height in pixels.
  pub height: usize,
  /// Decimator along the X axis.
  pub xdec: usize,
  /// Decimator along the Y axis.
  pub ydec: usize,
}

impl PlaneConfig {
  pub fn new<T: Pixel>(
    width: usize, height: usize, xdec: usize, ydec: usize,
  ) -> Self {
    // 64 byte aligned stride regardless of the pixel type's size.
    let stride =
      width.align_power_of_two(STRIDE_ALIGNMENT_LOG2 + 1 - size_of::<T>());
    PlaneConfig { stride, width, height, xdec, ydec }
  }
}

/// One plane of pixel data, stored row-major with a stride that may
/// exceed the visible width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane<T: Pixel> {
  pub cfg: PlaneConfig,
  pub data: Box<[T]>,
}

impl<T: Pixel> Plane<T> {
  pub fn new(width: usize, height: usize, xdec: usize, ydec: usize) -> Self {
    let cfg = PlaneConfig::new::<T>(width, height, xdec, ydec);
    let data = vec![T::zero(); cfg.stride * cfg.height].into_boxed_slice();
    Plane { cfg, data }
  }

  /// Iterates over the visible rows, `cfg.width` pixels each.
  pub fn rows_iter(&self) -> impl Iterator<Item = &[T]> + '_ {
    self
      .data
      .chunks(self.cfg.stride.max(1))
      .take(self.cfg.height)
      .map(move |row| &row[..self.cfg.width])
  }

  /// Iterates over the visible rows mutably.
  pub fn rows_iter_mut(&mut self) -> impl Iterator<Item = &mut [T]> + '_ {
    let width = self.cfg.width;
    self
      .data
      .chunks_mut(self.cfg.stride.max(1))
      .take(self.cfg.height)
      .map(move |row| &mut row[..width])
  }
}

/// A YUV frame. Chroma planes are sized per the frame's subsampling;
/// for Cs400 they are zero-sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<T: Pixel> {
  pub planes: [Plane<T>; 3],
  pub chroma_sampling: ChromaSampling,
}

impl<T: Pixel> Frame<T> {
  pub fn new(
    width: usize, height: usize, chroma_sampling: ChromaSampling,
  ) -> Self {
    let (xdec, ydec) = chroma_sampling.get_decimation().unwrap_or((1, 1));
    let (cw, ch) = chroma_sampling.get_chroma_dimensions(width, height);
    Frame {
      planes: [
        Plane::new(width, height, 0, 0),
        Plane::new(cw, ch, xdec, ydec),
        Plane::new(cw, ch, xdec, ydec),
      ],
      chroma_sampling,
    }
  }

  pub fn width(&self) -> usize {
    self.planes[0].cfg.width
  }

  pub fn height(&self) -> usize {
    self.planes[0].cfg.height
  }
}
