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
//! Module for [`BeatDecider`].

use crate::beat_score::BeatScoreTracker;

/// Emits a beat when the current frame is the best-scoring phase of the score
/// history, subject to a refractory gap of `tempo / 4` frames. The gap
/// prevents double-triggering on a broad score peak that spans multiple
/// adjacent frames.
#[derive(Debug, Clone)]
pub struct BeatDecider {
    frames_since_last_beat: usize,
}

impl BeatDecider {
    pub const fn new() -> Self {
        Self {
            frames_since_last_beat: 0,
        }
    }

    /// Judges the current frame. `score_valid` is the return value of
    /// [`BeatScoreTracker::update`] for this frame; an invalid score always
    /// means "no beat", but the frame still counts towards the refractory
    /// gap.
    pub fn decide(&mut self, scores: &BeatScoreTracker, tempo: usize, score_valid: bool) -> bool {
        self.frames_since_last_beat += 1;

        if score_valid
            && scores.newest_is_global_max()
            && self.frames_since_last_beat > tempo / 4
        {
            self.frames_since_last_beat = 0;
            return true;
        }
        false
    }
}

impl Default for BeatDecider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::vec::Vec;

    /// Ever-growing onsets make the current frame the global score maximum on
    /// every tick, so the refractory gap alone dictates the beat spacing.
    #[test]
    fn refractory_gap_limits_beat_rate() {
        const TEMPO: usize = 8;
        let mut scores = BeatScoreTracker::new(16, 0.1);
        let mut decider = BeatDecider::new();

        let mut beats = Vec::new();
        for tick in 0..20 {
            let valid = scores.update(TEMPO, 10.0 * (tick + 1) as f32);
            check!(valid);
            check!(scores.newest_is_global_max());
            if decider.decide(&scores, TEMPO, valid) {
                beats.push(tick);
            }
        }

        check!(beats == [2, 5, 8, 11, 14, 17]);
        for gap in beats.windows(2).map(|pair| pair[1] - pair[0]) {
            check!(gap > TEMPO / 4);
        }
    }

    #[test]
    fn invalid_score_never_fires() {
        let mut scores = BeatScoreTracker::new(16, 0.1);
        let mut decider = BeatDecider::new();

        for _ in 0..50 {
            let valid = scores.update(0, 1.0);
            check!(!decider.decide(&scores, 0, valid));
        }
    }

    /// With tempo 0 the refractory term is `0 / 4`, so a valid maximum on the
    /// current frame would fire immediately; the validity flag is what holds
    /// it back, not the gap.
    #[test]
    fn counter_keeps_running_while_suppressed() {
        let mut scores = BeatScoreTracker::new(16, 0.1);
        let mut decider = BeatDecider::new();

        for _ in 0..5 {
            let valid = scores.update(0, 1.0);
            check!(!decider.decide(&scores, 0, valid));
        }
        check!(decider.frames_since_last_beat == 5);
    }
}
