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
//! Module for [`BeatScoreTracker`].

use ringbuffer::{AllocRingBuffer, RingBuffer};

/// Scale between the user-facing sensitivity knob and the internal penalty
/// weight of the recurrence.
const PENALTY_SCALE: f32 = 100.0;

/// Dynamic-programming beat-phase tracker.
///
/// Keeps a circular history of beat-likelihood scores, one per frame. The
/// score of "being a beat now" is the current onset strength plus the best
/// score reachable from roughly one tempo period ago, minus a penalty that
/// grows with the log-distance of that step from the estimated period. After
/// every update the whole buffer is shifted so its minimum is exactly zero,
/// which prevents unbounded drift over long runtimes while preserving the
/// relative ranking.
#[derive(Debug, Clone)]
pub struct BeatScoreTracker {
    scores: AllocRingBuffer<f32>,
    penalty_weight: f32,
}

impl BeatScoreTracker {
    /// Creates a tracker with a score history of `history_len` frames.
    /// `sensitivity` scales the tempo-deviation penalty.
    pub fn new(history_len: usize, sensitivity: f32) -> Self {
        assert!(history_len > 0);
        let mut scores = AllocRingBuffer::new(history_len);
        scores.fill(0.0);
        Self {
            scores,
            penalty_weight: PENALTY_SCALE * sensitivity,
        }
    }

    /// Scores the current frame given the tempo estimate (in frames) and the
    /// frame's onset strength.
    ///
    /// Returns whether the score is meaningful. With a tempo of 0 there is no
    /// candidate period to score against (the estimate has not converged);
    /// the frame gets a neutral score and the caller must suppress any beat
    /// decision for it.
    pub fn update(&mut self, tempo: usize, onset: f32) -> bool {
        let history_len = self.scores.len();

        let mut score_max = f32::NEG_INFINITY;
        if tempo > 0 {
            for candidate in (tempo / 2)..(2 * tempo).min(history_len) {
                let deviation = libm::logf(candidate as f32 / tempo as f32);
                let score = onset + self.score_frames_ago(candidate)
                    - self.penalty_weight * deviation * deviation;
                if score > score_max {
                    score_max = score;
                }
            }
        }

        let valid = score_max.is_finite();
        self.scores.push(if valid { score_max } else { 0.0 });
        self.renormalize();
        valid
    }

    /// Score written `frames` frames ago. `frames == 0` addresses the slot
    /// that is about to be overwritten, i.e. the oldest surviving value,
    /// matching the circular-index semantics of the recurrence.
    fn score_frames_ago(&self, frames: usize) -> f32 {
        let offset = if frames == 0 {
            self.scores.len()
        } else {
            frames
        };
        self.scores
            .get_signed(-(offset as isize))
            .copied()
            .expect("score history is always full and the offset is within it")
    }

    /// Shifts all scores so the buffer minimum is exactly zero.
    fn renormalize(&mut self) {
        let min = self.scores.iter().copied().fold(f32::INFINITY, f32::min);
        for score in self.scores.iter_mut() {
            *score -= min;
        }
    }

    /// Whether the score of the most recent frame is the strict global
    /// maximum of the whole history. Ties resolve toward older frames, so a
    /// flat buffer never reports a maximum at the current frame.
    pub fn newest_is_global_max(&self) -> bool {
        let newest = self.scores.len() - 1;
        let mut max = f32::NEG_INFINITY;
        let mut max_index = 0;
        for (index, &score) in self.scores.iter().enumerate() {
            if score > max {
                max = score;
                max_index = index;
            }
        }
        max_index == newest
    }

    /// Number of frames of score history.
    pub fn history_len(&self) -> usize {
        self.scores.len()
    }

    #[cfg(test)]
    fn min(&self) -> f32 {
        self.scores.iter().copied().fold(f32::INFINITY, f32::min)
    }
}
