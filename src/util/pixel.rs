// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

use num_traits::{AsPrimitive, PrimInt};

use std::fmt::{Debug, Display};

/// Trait for casting between primitive types.
pub trait CastFromPrimitive<T>: Copy + 'static {
  /// Casts the given value into `Self`.
  fn cast_from(v: T) -> Self;
}

macro_rules! impl_cast_from_primitive {
  ( $T:ty => $U:ty ) => {
    impl CastFromPrimitive<$U> for $T {
      #[inline(always)]
      fn cast_from(v: $U) -> Self { v as Self }
    }
  };
  ( $T:ty => { $( $U:ty ),* } ) => {
    $( impl_cast_from_primitive!($T => $U); )*
  };
}

impl_cast_from_primitive!(u8 => { u16, u32, u64, usize, i32 });
impl_cast_from_primitive!(u16 => { u16, u32, u64, usize, i32 });

/// Types that can be used as pixel types.
pub enum PixelType {
  /// 8 bits per pixel, stored in a `u8`.
  U8,
  /// 10 or 12 bits per pixel, stored in a `u16`.
  U16,
}

/// A type that can be used as a pixel type.
pub trait Pixel:
  PrimInt
  + AsPrimitive<i32>
  + AsPrimitive<u16>
  + AsPrimitive<usize>
  + CastFromPrimitive<u16>
  + CastFromPrimitive<u32>
  + CastFromPrimitive<u64>
  + CastFromPrimitive<usize>
  + CastFromPrimitive<i32>
  + Into<u32>
  + Into<i32>
  + Debug
  + Display
  + Send
  + Sync
  + 'static
{
  /// Returns a [`PixelType`] variant corresponding to this type.
  fn type_enum() -> PixelType;
}

impl Pixel for u8 {
  #[inline]
  fn type_enum() -> PixelType {
    PixelType::U8
  }
}

impl Pixel for u16 {
  #[inline]
  fn type_enum() -> PixelType {
    PixelType::U16
  }
}
