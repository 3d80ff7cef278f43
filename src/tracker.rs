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
//! Module for [`TempoTracker`].

use crate::autocorrelation::AutoCorrelationTracker;
use crate::band_reduction::{BandEnergies, BandReducer};
use crate::beat_decider::BeatDecider;
use crate::beat_score::BeatScoreTracker;
use crate::config::{ConfigError, TrackerConfig};
use crate::onset_detector::OnsetDetector;
use crate::tempo_estimator::TempoEstimator;
use thiserror::Error;

/// Everything the tracker derives from one spectrum frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Mean magnitude per logarithmic frequency band.
    pub band_energies: BandEnergies,
    /// Onset strength of this frame. Can be negative.
    pub onset: f32,
    /// Whether this frame was judged to be a beat.
    pub beat: bool,
}

/// The spectrum frame passed to [`TempoTracker::tick`] did not match the
/// configured FFT size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("spectrum frame has {actual} values but the configured FFT size is {expected}")]
pub struct SpectrumLengthError {
    pub expected: usize,
    pub actual: usize,
}

/// Listener for the tracker's output signals, for hosts that prefer event
/// wiring over inspecting [`TickOutput`]. All methods have empty default
/// implementations; implement what you need and pass the sink to
/// [`TempoTracker::tick_with`].
pub trait AnalysisSink {
    /// Fired every tick with the reduced band-energy vector.
    fn on_spectrum(&mut self, energies: &BandEnergies) {
        let _ = energies;
    }
    /// Fired on ticks where a beat was judged to occur.
    fn on_beat(&mut self) {}
}

/// Streaming tempo and beat tracker over FFT magnitude spectra.
///
/// One tracker instance owns the full analysis state of one audio source.
/// Feed it one magnitude spectrum per fixed frame period via [`Self::tick`];
/// every tick is pure computation over owned buffers and completes in bounded
/// time. When the audio source pauses, simply stop ticking; all state is
/// retained unchanged.
#[derive(Debug)]
pub struct TempoTracker {
    band_reducer: BandReducer,
    onset_detector: OnsetDetector,
    autocorrelation: AutoCorrelationTracker,
    tempo_estimator: TempoEstimator,
    score_tracker: BeatScoreTracker,
    beat_decider: BeatDecider,
}

impl TempoTracker {
    /// Creates a new tracker. Fails fast on an invalid configuration; all
    /// buffers are allocated here, once, and never resized.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let frame_period = config.frame_period();
        log::debug!(
            "new tracker: fft_size={}, sample_rate={} Hz, frame period={} s",
            config.fft_size,
            config.sample_rate,
            frame_period
        );

        Ok(Self {
            band_reducer: BandReducer::new(config.fft_size, config.sample_rate),
            onset_detector: OnsetDetector::new(),
            autocorrelation: AutoCorrelationTracker::new(
                config.lag_horizon,
                config.decay,
                frame_period,
                // Width of the tempo prior the original analyzer was tuned
                // with: the spectral bin bandwidth in Hz. Very wide, so the
                // prior mainly rules out the zero lag.
                config.bin_bandwidth(),
            ),
            tempo_estimator: TempoEstimator::new(frame_period),
            score_tracker: BeatScoreTracker::new(config.score_history_len, config.sensitivity),
            beat_decider: BeatDecider::new(),
        })
    }

    /// Consumes one spectrum frame and advances the whole pipeline by one
    /// step. Call this once per frame period with non-negative magnitudes of
    /// exactly the configured FFT size.
    pub fn tick(&mut self, spectrum: &[f32]) -> Result<TickOutput, SpectrumLengthError> {
        if spectrum.len() != self.band_reducer.fft_size() {
            return Err(SpectrumLengthError {
                expected: self.band_reducer.fft_size(),
                actual: spectrum.len(),
            });
        }

        let band_energies = self.band_reducer.reduce(spectrum);
        let onset = self.onset_detector.update(&band_energies);
        let beat = self.advance(onset);

        Ok(TickOutput {
            band_energies,
            onset,
            beat,
        })
    }

    /// Like [`Self::tick`], but additionally dispatches the outputs to a
    /// caller-supplied listener.
    pub fn tick_with(
        &mut self,
        spectrum: &[f32],
        sink: &mut dyn AnalysisSink,
    ) -> Result<TickOutput, SpectrumLengthError> {
        let output = self.tick(spectrum)?;
        sink.on_spectrum(&output.band_energies);
        if output.beat {
            sink.on_beat();
        }
        Ok(output)
    }

    /// Advances the rhythm stages by one frame, given that frame's onset
    /// strength.
    pub(crate) fn advance(&mut self, onset: f32) -> bool {
        self.autocorrelation.push(onset);
        let tempo = self.tempo_estimator.update(&self.autocorrelation);
        let score_valid = self.score_tracker.update(tempo, onset);
        let beat = self.beat_decider.decide(&self.score_tracker, tempo, score_valid);

        log::trace!("tick: onset={onset}, tempo={tempo} frames, beat={beat}");
        if beat {
            log::debug!("beat (tempo: {tempo} frames, bpm: {:?})", self.bpm());
        }
        beat
    }

    /// Latest tempo estimate in frames per beat. 0 while the estimate has not
    /// converged yet.
    pub fn tempo(&self) -> usize {
        self.tempo_estimator.tempo()
    }

    /// Latest tempo estimate in beats per minute, `None` while the estimate
    /// has not converged yet.
    pub fn bpm(&self) -> Option<f32> {
        self.tempo_estimator.bpm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::vec;
    use std::vec::Vec;

    fn tracker() -> TempoTracker {
        TempoTracker::new(TrackerConfig::default()).unwrap()
    }

    #[test]
    fn is_send() {
        fn accept<T: Send>() {}

        accept::<TempoTracker>();
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TrackerConfig {
            sample_rate: 0,
            ..TrackerConfig::default()
        };
        check!(TempoTracker::new(config).is_err());
    }

    #[test]
    fn rejects_wrong_spectrum_length() {
        let mut tracker = tracker();
        check!(
            tracker.tick(&[0.0; 512])
                == Err(SpectrumLengthError {
                    expected: 1024,
                    actual: 512
                })
        );
    }

    /// Scenario: sustained silence. No beats, onset exactly zero from the
    /// second frame on, tempo never converges.
    #[test]
    fn silence_produces_no_beats() {
        let mut tracker = tracker();
        let silence = vec![0.0_f32; 1024];

        for tick in 0..1000 {
            let output = tracker.tick(&silence).unwrap();
            check!(!output.beat);
            if tick > 0 {
                check!(output.onset == 0.0);
            }
        }
        check!(tracker.tempo() == 0);
        check!(tracker.bpm() == None);
    }

    /// Scenario: a single loud frame in otherwise steady silence. The
    /// impulse must not produce a sustained tempo lock or repeated beats.
    #[test]
    fn single_impulse_does_not_lock() {
        let mut tracker = tracker();
        let silence = vec![0.0_f32; 1024];
        let impulse = vec![1.0_f32; 1024];

        let mut beats = Vec::new();
        for _ in 0..50 {
            check!(!tracker.tick(&silence).unwrap().beat);
        }
        if tracker.tick(&impulse).unwrap().beat {
            beats.push(50_usize);
        }
        for tick in 51..500 {
            if tracker.tick(&silence).unwrap().beat {
                beats.push(tick);
            }
        }

        check!(beats.len() <= 1);
        for &tick in &beats {
            check!(tick <= 53);
        }
    }

    /// Scenario: a periodic impulse train on the onset level. The tempo
    /// estimate must converge to the period and beats must settle to the same
    /// spacing.
    #[test]
    fn periodic_impulse_train_converges() {
        const PERIOD: usize = 10;
        let mut tracker = tracker();

        let mut beats = Vec::new();
        for tick in 0..600 {
            let onset = if tick % PERIOD == 0 { 1.0 } else { 0.0 };
            if tracker.advance(onset) {
                beats.push(tick);
            }
        }

        check!((PERIOD - 1..=PERIOD + 1).contains(&tracker.tempo()));

        let settled = beats
            .iter()
            .copied()
            .filter(|&tick| tick >= 300)
            .collect::<Vec<_>>();
        check!(settled.len() >= 20);
        for gap in settled.windows(2).map(|pair| pair[1] - pair[0]) {
            check!((PERIOD - 1..=PERIOD + 1).contains(&gap));
        }
    }

    /// No two beats may ever be closer than the refractory gap of the
    /// then-current tempo.
    #[test]
    fn refractory_gap_is_respected() {
        const PERIOD: usize = 8;
        let mut tracker = tracker();

        let mut beats = Vec::new();
        for tick in 0..600 {
            let onset = if tick % PERIOD == 0 { 1.0 } else { 0.0 };
            if tracker.advance(onset) {
                beats.push(tick);
            }
        }
        for gap in beats.windows(2).map(|pair| pair[1] - pair[0]) {
            check!(gap > PERIOD / 4);
        }
    }

    #[test]
    fn random_noise_stays_finite() {
        use rand::Rng;

        let mut rng = rand::rng();
        let mut tracker = tracker();
        for _ in 0..200 {
            let spectrum = (0..1024)
                .map(|_| rng.random_range(0.0_f32..1.0))
                .collect::<Vec<_>>();
            let output = tracker.tick(&spectrum).unwrap();
            check!(output.onset.is_finite());
            for energy in output.band_energies {
                check!(energy.is_finite());
            }
        }
    }

    #[derive(Default)]
    struct CountingSink {
        spectra: usize,
        beats: usize,
    }

    impl AnalysisSink for CountingSink {
        fn on_spectrum(&mut self, _: &BandEnergies) {
            self.spectra += 1;
        }
        fn on_beat(&mut self) {
            self.beats += 1;
        }
    }

    #[test]
    fn sink_receives_every_spectrum() {
        let mut tracker = tracker();
        let mut sink = CountingSink::default();
        let silence = vec![0.0_f32; 1024];

        for _ in 0..10 {
            tracker.tick_with(&silence, &mut sink).unwrap();
        }
        check!(sink.spectra == 10);
        check!(sink.beats == 0);
    }
}
