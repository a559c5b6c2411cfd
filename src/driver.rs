// Copyright (c) 2025, The v_conform contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at
// https://opensource.org/license/bsd-2-clause.

//! The encode/decode conformance driver.
//!
//! [`ConformanceDriver::run`] feeds a [`VideoSource`] through the
//! encoder under test, decodes every compressed frame with the matched
//! decoder and compares the decoder's output against the encoder's own
//! preview. Two-pass workloads run the source twice, routing the
//! first pass's statistics packets back into the final pass's
//! configuration.

use crate::codec::{
  CodecDecoder, CodecEncoder, CodecError, CodecFactory, FrameStream, Packet,
  PacketStream,
};
use crate::config::{Deadline, EncoderConfig, PassMode, RcPass};
use crate::frame::Frame;
use crate::source::VideoSource;
use crate::stats::TwopassStats;
use crate::util::Pixel;

use thiserror::Error;

use std::marker::PhantomData;

/// Errors that abort a driver run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
  #[error(transparent)]
  Codec(#[from] CodecError),
  /// A frame packet's pts went backwards within a pass.
  #[error("frame packet pts {got} precedes previously seen pts {last}")]
  NonMonotonicPts { got: u64, last: u64 },
  /// The decoder's reconstruction differed from the encoder's preview.
  #[error("encoder preview and decoded frame differ at pts {pts}")]
  Mismatch { pts: u64 },
}

/// Classification of a decoder error by the run's hooks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
  /// Abort the run.
  Fatal,
  /// The failure was anticipated; skip this packet and continue.
  Expected,
}

/// Customization points for a driver run. Every method has a default;
/// the defaults encode the strict conformance policy.
pub trait DriverHooks<T: Pixel, F: CodecFactory<T>> {
  /// Called before the first frame of each pass.
  fn begin_pass(&mut self, _pass: usize) {}

  /// Called after the last frame of each pass.
  fn end_pass(&mut self, _pass: usize) {}

  /// Called before each frame is encoded.
  fn pre_encode_frame(&mut self, _video: &dyn VideoSource<T>) {}

  /// Called before each frame is encoded, with access to the session
  /// so per-frame settings can be adjusted.
  fn pre_encode_encoder(
    &mut self, _video: &dyn VideoSource<T>,
    _session: &mut EncoderSession<T, F::Encoder>,
  ) {
  }

  /// Whether compressed frames should be decoded at all.
  fn do_decode(&self) -> bool {
    true
  }

  /// Called for every frame packet, after it has been decoded.
  fn frame_packet(&mut self, _data: &[u8], _pts: u64) {}

  /// Called for every quality-metric packet.
  fn metric_packet(&mut self, _psnr: (f64, f64, f64)) {}

  /// Classifies a decoder error. Fatal by default.
  fn handle_decode_result(&mut self, _err: &CodecError) -> DecodeOutcome {
    DecodeOutcome::Fatal
  }

  /// Called when preview and reconstruction differ. The default
  /// treats any mismatch as a conformance failure.
  fn mismatch(
    &mut self, _enc: &Frame<T>, _dec: &Frame<T>, pts: u64,
  ) -> Result<(), DriverError> {
    Err(DriverError::Mismatch { pts })
  }

  /// Called for every decoded frame that survived comparison.
  fn decoded_frame(&mut self, _frame: &Frame<T>, _pts: u64) {}

  /// Consulted after every frame and every pass; returning false ends
  /// the run early without error.
  fn keep_going(&self) -> bool {
    true
  }
}

/// The default, zero-state hook set: decode everything, fail on any
/// mismatch or decoder error, never stop early.
#[derive(Copy, Clone, Debug, Default)]
pub struct StrictHooks;

impl<T: Pixel, F: CodecFactory<T>> DriverHooks<T, F> for StrictHooks {}

/// Owns one encoder instance for the duration of a pass.
///
/// Initialization is lazy: the encoder is created on the first frame,
/// taking its dimensions and timebase from the source, and
/// reconfigured in place if the source's dimensions change mid-stream.
pub struct EncoderSession<T: Pixel, E: CodecEncoder<T>> {
  encoder: E,
  cfg: EncoderConfig,
  deadline: Deadline,
  initialized: bool,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Pixel, E: CodecEncoder<T>> EncoderSession<T, E> {
  pub fn new(encoder: E, cfg: EncoderConfig, deadline: Deadline) -> Self {
    EncoderSession {
      encoder,
      cfg,
      deadline,
      initialized: false,
      _marker: PhantomData,
    }
  }

  pub fn config(&self) -> &EncoderConfig {
    &self.cfg
  }

  pub fn config_mut(&mut self) -> &mut EncoderConfig {
    &mut self.cfg
  }

  pub fn set_deadline(&mut self, deadline: Deadline) {
    self.deadline = deadline;
  }

  /// Encodes the source's current frame, or flushes if the source is
  /// exhausted, then collects any statistics packets into `stats`.
  pub fn encode_frame(
    &mut self, video: &dyn VideoSource<T>, flags: u64,
    stats: &mut TwopassStats,
  ) -> Result<(), CodecError> {
    match self.encode_frame_inner(video, flags) {
      Ok(()) => {}
      // Flushing an encoder that never saw a frame is a no-op.
      Err(CodecError::UninitializedFlush) => return Ok(()),
      Err(e) => return Err(e),
    }
    for pkt in self.encoder.packets() {
      if let Packet::PassStats { data } = pkt {
        stats.append(&data);
      }
    }
    Ok(())
  }

  fn encode_frame_inner(
    &mut self, video: &dyn VideoSource<T>, flags: u64,
  ) -> Result<(), CodecError> {
    if let Some(frame) = video.frame() {
      if !self.initialized {
        self.cfg.width = frame.width();
        self.cfg.height = frame.height();
        self.cfg.chroma_sampling = frame.chroma_sampling;
        self.cfg.time_base = video.timebase();
        log::debug!(
          "initializing encoder: {}x{} {}",
          self.cfg.width,
          self.cfg.height,
          self.cfg.chroma_sampling
        );
        self.encoder.init(&self.cfg)?;
        self.initialized = true;
      } else if self.cfg.width != frame.width()
        || self.cfg.height != frame.height()
      {
        self.cfg.width = frame.width();
        self.cfg.height = frame.height();
        log::debug!(
          "reconfiguring encoder: {}x{}",
          self.cfg.width,
          self.cfg.height
        );
        self.encoder.reconfigure(&self.cfg)?;
      }
      self.encoder.encode(
        Some(frame),
        video.pts(),
        video.duration(),
        flags,
        self.deadline,
      )
    } else {
      self.flush(video)
    }
  }

  /// Asks the encoder to emit any buffered frames.
  pub fn flush(
    &mut self, video: &dyn VideoSource<T>,
  ) -> Result<(), CodecError> {
    if !self.initialized {
      return Err(CodecError::UninitializedFlush);
    }
    self.encoder.encode(None, video.pts(), video.duration(), 0, self.deadline)
  }

  pub fn packets(&self) -> PacketStream<'_> {
    self.encoder.packets()
  }

  pub fn preview_frame(&self) -> Option<&Frame<T>> {
    self.encoder.preview_frame()
  }
}

/// Owns one decoder instance for the duration of a pass.
pub struct DecoderSession<T: Pixel, D: CodecDecoder<T>> {
  decoder: D,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Pixel, D: CodecDecoder<T>> DecoderSession<T, D> {
  pub fn new(decoder: D) -> Self {
    DecoderSession { decoder, _marker: PhantomData }
  }

  pub fn decode(&mut self, data: &[u8]) -> Result<(), CodecError> {
    self.decoder.decode(data)
  }

  pub fn frames(&self) -> FrameStream<'_, T> {
    self.decoder.frames()
  }
}

/// Compares two frames for exact equality over their visible pixels.
///
/// Every row of every plane is visited even after the first difference
/// is found, so a debugger can observe the full extent of a mismatch.
pub fn compare_frames<T: Pixel>(enc: &Frame<T>, dec: &Frame<T>) -> bool {
  if enc.chroma_sampling != dec.chroma_sampling
    || enc.width() != dec.width()
    || enc.height() != dec.height()
  {
    return false;
  }
  let mut matches = true;
  for (enc_plane, dec_plane) in enc.planes.iter().zip(dec.planes.iter()) {
    for (enc_row, dec_row) in enc_plane.rows_iter().zip(dec_plane.rows_iter())
    {
      matches &= enc_row == dec_row;
    }
  }
  matches
}

/// Drives an encoder/decoder pair through a conformance workload.
pub struct ConformanceDriver<T: Pixel, F: CodecFactory<T>, H: DriverHooks<T, F>>
{
  factory: F,
  hooks: H,
  cfg: EncoderConfig,
  pass_mode: PassMode,
  deadline: Deadline,
  frame_flags: u64,
  stats: TwopassStats,
  last_pts: u64,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Pixel, F: CodecFactory<T>, H: DriverHooks<T, F>>
  ConformanceDriver<T, F, H>
{
  pub fn new(factory: F, hooks: H) -> Self {
    ConformanceDriver {
      factory,
      hooks,
      cfg: EncoderConfig::default(),
      pass_mode: PassMode::OnePass,
      deadline: Deadline::default(),
      frame_flags: 0,
      stats: TwopassStats::new(),
      last_pts: 0,
      _marker: PhantomData,
    }
  }

  pub fn hooks(&self) -> &H {
    &self.hooks
  }

  pub fn hooks_mut(&mut self) -> &mut H {
    &mut self.hooks
  }

  pub fn stats(&self) -> &TwopassStats {
    &self.stats
  }

  pub fn config_mut(&mut self) -> &mut EncoderConfig {
    &mut self.cfg
  }

  pub fn set_pass_mode(&mut self, mode: PassMode) {
    self.pass_mode = mode;
  }

  pub fn set_deadline(&mut self, deadline: Deadline) {
    self.deadline = deadline;
  }

  pub fn set_frame_flags(&mut self, flags: u64) {
    self.frame_flags = flags;
  }

  /// Runs the full workload over `video`.
  ///
  /// Each pass rewinds the source, builds fresh encoder and decoder
  /// sessions and loops until the source is exhausted and the encoder
  /// has stopped producing packets; any packet re-arms the loop so
  /// flush output drains completely.
  pub fn run(
    &mut self, video: &mut dyn VideoSource<T>,
  ) -> Result<(), DriverError> {
    self.stats.reset();
    let passes = self.pass_mode.passes();
    'passes: for pass in 0..passes {
      self.last_pts = 0;
      let mut cfg = self.cfg.clone();
      cfg.pass = if passes == 1 {
        RcPass::OnePass
      } else if pass == 0 {
        RcPass::FirstPass
      } else {
        RcPass::LastPass
      };
      cfg.twopass_stats_in = self.stats.buf().to_vec();
      log::debug!("starting pass {}/{} ({:?})", pass + 1, passes, cfg.pass);
      self.hooks.begin_pass(pass);
      let mut encoder =
        EncoderSession::new(self.factory.new_encoder(), cfg, self.deadline);
      let mut decoder = DecoderSession::new(self.factory.new_decoder());
      video.begin();
      let mut again = true;
      while again {
        again = video.frame().is_some();
        self.hooks.pre_encode_frame(&*video);
        self.hooks.pre_encode_encoder(&*video, &mut encoder);
        encoder.encode_frame(&*video, self.frame_flags, &mut self.stats)?;
        let mut has_cxdata = false;
        let mut has_dxdata = false;
        for pkt in encoder.packets() {
          again = true;
          match pkt {
            Packet::CompressedFrame { data, pts } => {
              has_cxdata = true;
              if self.hooks.do_decode() {
                if let Err(err) = decoder.decode(&data) {
                  match self.hooks.handle_decode_result(&err) {
                    DecodeOutcome::Fatal => {
                      return Err(DriverError::Codec(err))
                    }
                    DecodeOutcome::Expected => continue,
                  }
                }
                has_dxdata = true;
              }
              if pts < self.last_pts {
                return Err(DriverError::NonMonotonicPts {
                  got: pts,
                  last: self.last_pts,
                });
              }
              self.last_pts = pts;
              self.hooks.frame_packet(&data, pts);
            }
            Packet::PassStats { .. } => {}
            Packet::QualityMetric { psnr } => self.hooks.metric_packet(psnr),
            Packet::Other => {}
          }
        }
        if has_cxdata && has_dxdata {
          if let (Some(enc_frame), Some(dec_frame)) =
            (encoder.preview_frame(), decoder.frames().next())
          {
            if !compare_frames(enc_frame, dec_frame) {
              self.hooks.mismatch(enc_frame, dec_frame, self.last_pts)?;
            }
            self.hooks.decoded_frame(dec_frame, self.last_pts);
          }
        }
        if !self.hooks.keep_going() {
          break;
        }
        video.advance();
      }
      log::debug!("pass {}/{} complete", pass + 1, passes);
      self.hooks.end_pass(pass);
      if !self.hooks.keep_going() {
        break 'passes;
      }
    }
    Ok(())
  }
}
