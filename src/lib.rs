// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

//! Conformance and correctness harness for video codecs.
//!
//! The crate has two independent pillars:
//!
//! * [`driver::ConformanceDriver`] runs an external encoder/decoder pair
//!   through one- and two-pass workloads, classifying emitted packets,
//!   checking presentation-timestamp ordering and comparing the decoder's
//!   reconstruction against the encoder's own preview.
//! * [`transform::TxfmHarness`] runs registered forward/inverse 32x32
//!   transform candidates through accuracy, coefficient, overflow and
//!   inverse-reconstruction checks against a double-precision reference.
//!
//! The codec under test is reached through the traits in [`codec`]; the
//! harness never implements encoding or decoding itself.

pub mod codec;
pub mod config;
pub mod cpu_features;
pub mod driver;
pub mod frame;
pub mod source;
pub mod stats;
pub mod transform;
pub mod util;

pub use crate::codec::*;
pub use crate::config::*;
pub use crate::driver::*;
pub use crate::frame::*;
pub use crate::source::*;
pub use crate::stats::*;
