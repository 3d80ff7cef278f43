/*
MIT License

Copyright (c) 2024 Philipp Schuster

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/
//! tempo-tracker estimates the tempo of live audio from a stream of FFT
//! magnitude spectra and emits beat events synchronized to the perceived
//! rhythm. The crate is `no_std`-compatible and only needs `alloc`.
//!
//! The caller owns audio capture, decoding, and the FFT itself. This crate
//! takes one magnitude spectrum per fixed frame period and runs it through
//! the following pipeline, all state owned by one [`TempoTracker`] instance:
//!
//! 1. [`BandReducer`]: reduce the spectrum to 12 logarithmically spaced band
//!    energies, matching the auditory perception of "bass" through "high
//!    treble".
//! 2. [`OnsetDetector`]: turn successive band-energy vectors into a scalar
//!    onset strength per frame.
//! 3. [`AutoCorrelationTracker`]: maintain a rolling autocorrelation of the
//!    onset signal across lags, weighted by a tempo prior.
//! 4. [`TempoEstimator`]: pick the lag with the maximum weighted correlation
//!    as the current tempo period, in frames.
//! 5. [`BeatScoreTracker`]: run a dynamic-programming recurrence over a
//!    circular score history to find the best rhythmic phase.
//! 6. [`BeatDecider`]: emit a beat when the current frame is the best-scoring
//!    phase, subject to a minimum inter-beat gap.
//!
//! ## Example
//! ```rust
//! use tempo_tracker::{TempoTracker, TrackerConfig};
//!
//! let config = TrackerConfig::default();
//! let mut tracker = TempoTracker::new(config).unwrap();
//!
//! // One FFT magnitude frame per fixed period, from your audio stack.
//! let spectrum = vec![0.0_f32; config.fft_size];
//! let output = tracker.tick(&spectrum).unwrap();
//! if output.beat {
//!     // flash a light, move a sprite, ...
//! }
//! ```
//!
//! ## Limitations
//! A [`TempoTracker`] is strictly single-threaded: one tick per frame, no
//! internal threading, no concurrent access. If you analyze multiple audio
//! sources, give each one its own tracker instance.

#![no_std]
#![deny(missing_debug_implementations)]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod autocorrelation;
mod band_reduction;
mod beat_decider;
mod beat_score;
mod config;
mod onset_detector;
mod tempo_estimator;
mod tracker;

pub use autocorrelation::AutoCorrelationTracker;
pub use band_reduction::{BandEnergies, BandReducer, NUM_BANDS};
pub use beat_decider::BeatDecider;
pub use beat_score::BeatScoreTracker;
pub use config::{ConfigError, TrackerConfig};
pub use onset_detector::OnsetDetector;
pub use tempo_estimator::TempoEstimator;
pub use tracker::{AnalysisSink, SpectrumLengthError, TempoTracker, TickOutput};
