// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

//! Traits through which the harness reaches the codec under test.

use crate::config::{Deadline, EncoderConfig};
use crate::frame::Frame;
use crate::util::Pixel;

use thiserror::Error;

/// Errors surfaced by the codec under test.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
  /// Encoder initialization failed.
  #[error("encoder initialization failed: {0}")]
  Init(String),
  /// Mid-stream reconfiguration failed.
  #[error("encoder reconfiguration failed: {0}")]
  Reconfigure(String),
  /// The encoder rejected a frame or flush request.
  #[error("encode failed: {0}")]
  Encode(String),
  /// The decoder rejected compressed data.
  #[error("decode failed: {0}")]
  Decode(String),
  /// Flush was issued before any frame initialized the encoder.
  #[error("flush issued before the encoder was initialized")]
  UninitializedFlush,
}

/// One unit of encoder output.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
  /// A compressed frame and its presentation timestamp.
  CompressedFrame { data: Vec<u8>, pts: u64 },
  /// First-pass statistics payload.
  PassStats { data: Vec<u8> },
  /// Per-frame quality metric (one value per plane).
  QualityMetric { psnr: (f64, f64, f64) },
  /// Any packet kind the harness does not interpret.
  Other,
}

/// A fresh iteration over the packets produced by the most recent
/// encode call. Each [`CodecEncoder::packets`] call restarts from the
/// first packet of that output.
pub struct PacketStream<'a> {
  inner: Box<dyn Iterator<Item = Packet> + 'a>,
}

impl<'a> PacketStream<'a> {
  pub fn new(iter: impl Iterator<Item = Packet> + 'a) -> Self {
    PacketStream { inner: Box::new(iter) }
  }
}

impl Iterator for PacketStream<'_> {
  type Item = Packet;

  fn next(&mut self) -> Option<Packet> {
    self.inner.next()
  }
}

/// A fresh iteration over the frames produced by the most recent
/// decode call.
pub struct FrameStream<'a, T: Pixel> {
  inner: Box<dyn Iterator<Item = &'a Frame<T>> + 'a>,
}

impl<'a, T: Pixel> FrameStream<'a, T> {
  pub fn new(iter: impl Iterator<Item = &'a Frame<T>> + 'a) -> Self {
    FrameStream { inner: Box::new(iter) }
  }
}

impl<'a, T: Pixel> Iterator for FrameStream<'a, T> {
  type Item = &'a Frame<T>;

  fn next(&mut self) -> Option<&'a Frame<T>> {
    self.inner.next()
  }
}

/// The encoder side of the codec under test.
pub trait CodecEncoder<T: Pixel> {
  /// Initializes the encoder with the given settings.
  fn init(&mut self, cfg: &EncoderConfig) -> Result<(), CodecError>;

  /// Applies new settings to a running encoder.
  fn reconfigure(&mut self, cfg: &EncoderConfig) -> Result<(), CodecError>;

  /// Submits one frame, or `None` to flush buffered frames.
  fn encode(
    &mut self, frame: Option<&Frame<T>>, pts: u64, duration: u64, flags: u64,
    deadline: Deadline,
  ) -> Result<(), CodecError>;

  /// Starts a fresh iteration over the most recent encode's output.
  fn packets(&self) -> PacketStream<'_>;

  /// The encoder's own reconstruction of the most recently encoded
  /// frame, if the encoder exposes one.
  fn preview_frame(&self) -> Option<&Frame<T>>;
}

/// The decoder side of the codec under test.
pub trait CodecDecoder<T: Pixel> {
  /// Decodes one compressed frame.
  fn decode(&mut self, data: &[u8]) -> Result<(), CodecError>;

  /// Starts a fresh iteration over the most recent decode's output.
  fn frames(&self) -> FrameStream<'_, T>;
}

/// Constructs matched encoder/decoder instances for one codec.
pub trait CodecFactory<T: Pixel> {
  type Encoder: CodecEncoder<T>;
  type Decoder: CodecDecoder<T>;

  fn new_encoder(&self) -> Self::Encoder;
  fn new_decoder(&self) -> Self::Decoder;
}
