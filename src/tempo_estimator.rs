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
//! Module for [`TempoEstimator`].

use crate::AutoCorrelationTracker;

/// Picks the lag with the maximum weighted autocorrelation as the current
/// tempo period, expressed in frames.
///
/// A tempo of 0 means "not yet converged": early in the stream all
/// correlations are still near zero and no periodicity has emerged. That is a
/// legitimate state, not an error; downstream stages suppress beat decisions
/// until it clears.
#[derive(Debug, Clone)]
pub struct TempoEstimator {
    frame_period: f32,
    current: usize,
}

impl TempoEstimator {
    pub const fn new(frame_period: f32) -> Self {
        Self {
            frame_period,
            current: 0,
        }
    }

    /// Re-estimates the tempo from the current correlation state.
    ///
    /// Ties resolve to the smallest lag. Lags with negative weighted
    /// correlation produce NaN under the square root and are skipped by the
    /// strict comparison.
    pub fn update(&mut self, correlator: &AutoCorrelationTracker) -> usize {
        let mut max = 0.0_f32;
        let mut tempo = 0;
        for lag in 0..correlator.lag_horizon() {
            let strength = libm::sqrtf(correlator.weighted_correlation(lag));
            if strength > max {
                max = strength;
                tempo = lag;
            }
        }
        self.current = tempo;
        tempo
    }

    /// Latest tempo estimate, in frames per beat.
    pub const fn tempo(&self) -> usize {
        self.current
    }

    /// Latest tempo estimate in beats per minute, or `None` while the
    /// estimate has not converged yet.
    pub fn bpm(&self) -> Option<f32> {
        (self.current > 0).then(|| 60.0 / (self.frame_period * self.current as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use float_cmp::approx_eq;

    const FRAME_PERIOD: f32 = 0.1;

    #[test]
    fn no_history_means_tempo_zero() {
        let correlator = AutoCorrelationTracker::new(30, 0.99, FRAME_PERIOD, 1.0);
        let mut estimator = TempoEstimator::new(FRAME_PERIOD);

        check!(estimator.update(&correlator) == 0);
        check!(estimator.tempo() == 0);
        check!(estimator.bpm() == None);
    }

    #[test]
    fn impulse_train_locks_onto_its_period() {
        const PERIOD: usize = 7;
        let mut correlator = AutoCorrelationTracker::new(30, 0.99, FRAME_PERIOD, 1.0);
        let mut estimator = TempoEstimator::new(FRAME_PERIOD);

        for tick in 0..300 {
            correlator.push(if tick % PERIOD == 0 { 1.0 } else { 0.0 });
            estimator.update(&correlator);
        }

        check!(estimator.tempo() == PERIOD);
        check!(approx_eq!(
            f32,
            estimator.bpm().unwrap(),
            60.0 / (FRAME_PERIOD * PERIOD as f32),
            epsilon = 1e-4
        ));
    }

    /// A purely anticorrelated signal has no positive peak besides the
    /// suppressed zero lag, so the estimate must stay at 0.
    #[test]
    fn anticorrelation_does_not_produce_a_tempo() {
        let mut correlator = AutoCorrelationTracker::new(2, 0.99, FRAME_PERIOD, 1.0);
        let mut estimator = TempoEstimator::new(FRAME_PERIOD);

        for tick in 0..100 {
            correlator.push(if tick % 2 == 0 { 1.0 } else { -1.0 });
            estimator.update(&correlator);
        }
        check!(estimator.tempo() == 0);
    }
}
