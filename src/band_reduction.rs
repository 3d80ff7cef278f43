//! Module for [`BandReducer`].

/// Number of logarithmically spaced frequency bands the spectrum is reduced
/// to.
pub const NUM_BANDS: usize = 12;

/// Mean spectral magnitude per logarithmic frequency band, ordered from
/// "bass" to "high treble".
pub type BandEnergies = [f32; NUM_BANDS];

/// Reduces a raw FFT magnitude spectrum to [`NUM_BANDS`] octave-spaced band
/// energies.
///
/// Band `i` covers the frequency range `nyquist / 2^(12-i)` (0 for the first
/// band) up to `nyquist / 2^(11-i)`, so every band spans one octave and the
/// last one ends at the Nyquist frequency. Adjacent bands share their
/// boundary bin.
#[derive(Debug, Clone)]
pub struct BandReducer {
    fft_size: usize,
    /// Inclusive bin range per band. Fixed for the lifetime of the reducer.
    bin_ranges: [(usize, usize); NUM_BANDS],
}

impl BandReducer {
    /// Creates a reducer for spectra of length `fft_size` computed from audio
    /// sampled at `sample_rate` Hz. Both must be positive.
    pub fn new(fft_size: usize, sample_rate: u32) -> Self {
        assert!(fft_size > 0);
        assert!(sample_rate > 0);

        let nyquist = sample_rate as f32 / 2.0;
        let mut bin_ranges = [(0, 0); NUM_BANDS];
        for (band, range) in bin_ranges.iter_mut().enumerate() {
            let (low_hz, high_hz) = band_edges_hz(band, nyquist);
            *range = (
                frequency_to_bin(low_hz, fft_size, sample_rate),
                frequency_to_bin(high_hz, fft_size, sample_rate),
            );
        }

        Self {
            fft_size,
            bin_ranges,
        }
    }

    /// Length of the spectrum frames this reducer expects.
    pub const fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Reduces one spectrum frame to its per-band mean magnitudes.
    ///
    /// # Panics
    /// If `spectrum` does not have exactly [`Self::fft_size`] values. The
    /// [tracker](crate::TempoTracker) checks this before calling.
    pub fn reduce(&self, spectrum: &[f32]) -> BandEnergies {
        assert_eq!(spectrum.len(), self.fft_size);

        let mut energies = [0.0; NUM_BANDS];
        for (energy, &(low, high)) in energies.iter_mut().zip(self.bin_ranges.iter()) {
            let sum: f32 = spectrum[low..=high].iter().sum();
            // Degenerate zero-width ranges still divide by one.
            *energy = sum / (high - low + 1) as f32;
        }
        energies
    }
}

/// Frequency bounds of a band in Hz, floored to whole Hz.
fn band_edges_hz(band: usize, nyquist: f32) -> (f32, f32) {
    debug_assert!(band < NUM_BANDS);
    let low = if band == 0 {
        0.0
    } else {
        libm::floorf(nyquist / libm::powf(2.0, (NUM_BANDS - band) as f32))
    };
    let high = libm::floorf(nyquist / libm::powf(2.0, (NUM_BANDS - 1 - band) as f32));
    (low, high)
}

/// Maps a frequency to the index of the FFT bin containing it.
///
/// Frequencies below half the per-bin bandwidth belong to bin 0 and
/// frequencies within half a bandwidth of Nyquist belong to the last bin,
/// `fft_size / 2`.
fn frequency_to_bin(frequency: f32, fft_size: usize, sample_rate: u32) -> usize {
    let bin_bandwidth = sample_rate as f32 / fft_size as f32;
    let nyquist = sample_rate as f32 / 2.0;

    if frequency < bin_bandwidth / 2.0 {
        0
    } else if frequency > nyquist - bin_bandwidth / 2.0 {
        fft_size / 2
    } else {
        libm::roundf(fft_size as f32 * frequency / sample_rate as f32) as usize
    }
}
