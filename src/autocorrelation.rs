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
//! Module for [`AutoCorrelationTracker`].

use alloc::vec::Vec;
use ringbuffer::{AllocRingBuffer, RingBuffer};

/// Center of the tempo prior. Rhythms around this rate get the highest
/// weight.
const MID_TEMPO_BPM: f32 = 120.0;

/// Online autocorrelation of the onset signal across every lag in
/// `[0, lag_horizon)`, with exponential forgetting instead of a windowed sum,
/// so each streaming update runs in `O(lag_horizon)`.
///
/// Each lag additionally carries a static prior weight: a Gaussian on the
/// log-tempo axis centered at [`MID_TEMPO_BPM`]. Without it, the largest raw
/// correlation is usually the zero lag (self-correlation) or an implausible
/// tempo; weighting by proximity to a typical rhythm rate disambiguates.
#[derive(Debug, Clone)]
pub struct AutoCorrelationTracker {
    /// The most recent onset values, one per frame.
    delays: AllocRingBuffer<f32>,
    /// Running correlation estimate per lag.
    outputs: Vec<f32>,
    /// Tempo each lag corresponds to. Immutable after construction.
    bpms: Vec<f32>,
    /// Prior weight per lag. Immutable after construction.
    weights: Vec<f32>,
    decay: f32,
}

impl AutoCorrelationTracker {
    /// * `lag_horizon`: number of lags to track, in frames. Must be positive.
    /// * `decay`: exponential forgetting factor in `(0.0, 1.0)`, e.g. `0.997`.
    /// * `frame_period`: seconds of audio per frame.
    /// * `octave_width`: width of the tempo prior, in octaves.
    pub fn new(lag_horizon: usize, decay: f32, frame_period: f32, octave_width: f32) -> Self {
        assert!(lag_horizon > 0);
        assert!(decay > 0.0 && decay < 1.0);

        let mut delays = AllocRingBuffer::new(lag_horizon);
        delays.fill(0.0);

        // Lag 0 is a singular case: infinite BPM. Its prior weight evaluates
        // to zero, which keeps the self-correlation out of the tempo
        // decision.
        let bpms = (0..lag_horizon)
            .map(|lag| 60.0 / (frame_period * lag as f32))
            .collect::<Vec<_>>();
        let weights = bpms
            .iter()
            .map(|&bpm| {
                let octaves =
                    libm::logf(bpm / MID_TEMPO_BPM) / core::f32::consts::LN_2 / octave_width;
                libm::expf(-0.5 * octaves * octaves)
            })
            .collect::<Vec<_>>();

        Self {
            delays,
            outputs: alloc::vec![0.0; lag_horizon],
            bpms,
            weights,
            decay,
        }
    }

    /// Feeds the onset value of the current frame and updates the running
    /// correlation estimate of every lag.
    pub fn push(&mut self, onset: f32) {
        self.delays.push(onset);

        let delays = &self.delays;
        for (lag, output) in self.outputs.iter_mut().enumerate() {
            // The onset pushed `lag` frames before the current one.
            let past = delays
                .get_signed(-1 - lag as isize)
                .copied()
                .expect("delay line is always full and lag is within the horizon");
            *output += (1.0 - self.decay) * (onset * past - *output);
        }
    }

    /// Raw correlation estimate for `lag`.
    pub fn correlation(&self, lag: usize) -> f32 {
        self.outputs[lag]
    }

    /// Correlation estimate for `lag`, weighted by the tempo prior.
    pub fn weighted_correlation(&self, lag: usize) -> f32 {
        self.weights[lag] * self.outputs[lag]
    }

    /// Tempo that `lag` corresponds to, in beats per minute. Infinite for
    /// lag 0.
    pub fn candidate_bpm(&self, lag: usize) -> f32 {
        self.bpms[lag]
    }

    /// Prior weight of `lag`.
    pub fn prior_weight(&self, lag: usize) -> f32 {
        self.weights[lag]
    }

    /// Number of lags tracked.
    pub fn lag_horizon(&self) -> usize {
        self.outputs.len()
    }
}
