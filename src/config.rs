//! Module for [`TrackerConfig`].

use thiserror::Error;

/// The configuration is unusable. Construction of a
/// [tracker](crate::TempoTracker) fails fast with this error instead of
/// producing garbage analysis results later.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// The FFT size must be positive.
    #[error("fft_size must be positive")]
    ZeroFftSize,
    /// The sample rate must be positive.
    #[error("sample_rate must be positive")]
    ZeroSampleRate,
    /// The decay factor must be strictly between zero and one.
    #[error("decay must be in (0.0, 1.0), got {0}")]
    DecayOutOfRange(f32),
    /// The sensitivity must be finite and positive.
    #[error("sensitivity must be finite and positive, got {0}")]
    InvalidSensitivity(f32),
    /// The lag horizon must be positive.
    #[error("lag_horizon must be positive")]
    ZeroLagHorizon,
    /// The score history length must be positive.
    #[error("score_history_len must be positive")]
    ZeroScoreHistory,
}

/// Configuration of a [tracker](crate::TempoTracker). All values are fixed
/// for the lifetime of the tracker; the internal buffers are allocated once
/// at construction.
///
/// [`Self::default`] reflects the values the analyzer was originally tuned
/// with and is a sensible starting point for 44.1 kHz material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Length of each spectrum frame passed to
    /// [`tick`](crate::TempoTracker::tick). One frame covers
    /// `fft_size / sample_rate` seconds of audio.
    pub fft_size: usize,
    /// Sampling rate in Hz of the audio the spectra were computed from.
    pub sample_rate: u32,
    /// Scales the tempo-deviation penalty of the beat-phase recurrence.
    /// Higher values tie beat decisions more rigidly to the estimated tempo.
    pub sensitivity: f32,
    /// Number of lags (candidate periodicities, in frames) tracked by the
    /// autocorrelator. The longest recognizable beat period.
    pub lag_horizon: usize,
    /// Exponential forgetting factor of the autocorrelation estimate, in
    /// `(0.0, 1.0)`. Closer to one means a longer memory.
    pub decay: f32,
    /// Number of frames of beat-likelihood scores kept for the
    /// dynamic-programming phase selection.
    pub score_history_len: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            sample_rate: 44100,
            sensitivity: 0.1,
            lag_horizon: 100,
            decay: 0.997,
            score_history_len: 120,
        }
    }
}

impl TrackerConfig {
    /// Checks all invariants of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fft_size == 0 {
            return Err(ConfigError::ZeroFftSize);
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if !(self.decay > 0.0 && self.decay < 1.0) {
            return Err(ConfigError::DecayOutOfRange(self.decay));
        }
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(ConfigError::InvalidSensitivity(self.sensitivity));
        }
        if self.lag_horizon == 0 {
            return Err(ConfigError::ZeroLagHorizon);
        }
        if self.score_history_len == 0 {
            return Err(ConfigError::ZeroScoreHistory);
        }
        Ok(())
    }

    /// Duration of one frame in seconds.
    pub fn frame_period(&self) -> f32 {
        self.fft_size as f32 / self.sample_rate as f32
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_bandwidth(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }
}
