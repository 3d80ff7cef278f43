//! Module for [`OnsetDetector`].

use crate::band_reduction::{BandEnergies, NUM_BANDS};

/// Floor of the dB conversion, so silent bands map to a finite value instead
/// of negative infinity.
const DB_FLOOR: f32 = -100.0;

/// Reference level the previous-frame store starts at. High on purpose, so
/// the very first frame reads as a large energy drop and never as an onset.
const INITIAL_REFERENCE: f32 = 100.0;

/// Turns successive band-energy vectors into a scalar onset strength per
/// frame: the summed increase of dB-compressed energy across all bands.
/// Percussive attacks show up as positive spikes; the value can be negative
/// when energy drops.
#[derive(Debug, Clone)]
pub struct OnsetDetector {
    previous_db: [f32; NUM_BANDS],
}

impl OnsetDetector {
    pub fn new() -> Self {
        Self {
            previous_db: [INITIAL_REFERENCE; NUM_BANDS],
        }
    }

    /// Consumes the band energies of the current frame and returns the onset
    /// strength relative to the previous frame.
    pub fn update(&mut self, energies: &BandEnergies) -> f32 {
        let mut onset = 0.0;
        for (&energy, previous) in energies.iter().zip(self.previous_db.iter_mut()) {
            let db = db_compress(energy);
            onset += db - *previous;
            *previous = db;
        }
        onset
    }
}

impl Default for OnsetDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamped, scaled log-energy. Finite for every `energy >= 0.0`; zero energy
/// maps to the clamp floor.
pub(crate) fn db_compress(energy: f32) -> f32 {
    DB_FLOOR.max(20.0 * libm::log10f(energy) + 160.0) * 0.025
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use float_cmp::approx_eq;
    use rand::Rng;
    use std::vec::Vec;

    #[test]
    fn zero_energy_maps_to_clamp_floor() {
        check!(db_compress(0.0) == DB_FLOOR * 0.025);
        // Magnitudes are non-negative by contract, but a negative value must
        // still clamp instead of going NaN.
        check!(db_compress(-1.0) == DB_FLOOR * 0.025);
    }

    #[test]
    fn first_frame_is_never_an_onset() {
        let mut detector = OnsetDetector::new();
        check!(detector.update(&[1.0; NUM_BANDS]) < 0.0);
    }

    #[test]
    fn constant_input_settles_to_zero_onset() {
        let mut detector = OnsetDetector::new();
        let energies = [0.25; NUM_BANDS];
        let _ = detector.update(&energies);
        check!(detector.update(&energies) == 0.0);
        check!(detector.update(&energies) == 0.0);
    }

    #[test]
    fn silence_stays_finite() {
        let mut detector = OnsetDetector::new();
        let silence = [0.0; NUM_BANDS];
        let first = detector.update(&silence);
        check!(first.is_finite());
        check!(detector.update(&silence) == 0.0);
    }

    #[test]
    fn energy_increase_gives_positive_onset() {
        let mut detector = OnsetDetector::new();
        let _ = detector.update(&[0.01; NUM_BANDS]);
        check!(detector.update(&[0.5; NUM_BANDS]) > 0.0);
    }

    /// The onset is exactly the sum of per-band dB differences, so the onsets
    /// of a whole sequence telescope to "final dB level minus initial
    /// reference".
    #[test]
    fn onsets_telescope_over_random_sequences() {
        let mut rng = rand::rng();
        let frames = (0..50)
            .map(|_| {
                let mut energies = [0.0; NUM_BANDS];
                for energy in &mut energies {
                    *energy = rng.random_range(0.0..1.0);
                }
                energies
            })
            .collect::<Vec<_>>();

        let mut detector = OnsetDetector::new();
        let onset_sum: f32 = frames.iter().map(|frame| detector.update(frame)).sum();

        let expected: f32 = frames
            .last()
            .unwrap()
            .iter()
            .map(|&energy| db_compress(energy) - INITIAL_REFERENCE)
            .sum();
        check!(approx_eq!(f32, onset_sum, expected, epsilon = 0.5));
    }
}
