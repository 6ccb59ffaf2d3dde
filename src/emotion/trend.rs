// src/emotion/trend.rs

//! Stress-trend detection over a short window of emotion snapshots.
//!
//! Classification is a two-point comparison of the first and last stress
//! scores in the window. That is intentionally crude and sensitive to noise
//! at the endpoints; keep the rule as-is unless product requirements change.

use crate::emotion::EmotionSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Window capacity. Oldest snapshots are evicted first.
pub const TREND_WINDOW_CAP: usize = 10;

/// Minimum snapshots before a non-neutral classification is possible.
const MIN_SNAPSHOTS: usize = 3;

/// Stress threshold a score must cross for the trend to count.
const STRESS_FLOOR: f32 = 0.40;

// Per-label stress weights; divisor is their sum. "nervousness" carries the
// anxiety weight - the 28-label set has no separate anxiety class.
const W_NERVOUSNESS: f32 = 1.5;
const W_SADNESS: f32 = 1.2;
const W_FEAR: f32 = 1.3;
const W_ANGER: f32 = 0.8;
const WEIGHT_SUM: f32 = 4.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendClass {
    RisingStress,
    Improving,
    Neutral,
}

impl TrendClass {
    pub fn is_neutral(&self) -> bool {
        matches!(self, TrendClass::Neutral)
    }
}

/// Weighted stress score for one snapshot, in [0, 1].
pub fn stress_score(snapshot: &EmotionSnapshot) -> f32 {
    (snapshot.probability("nervousness") * W_NERVOUSNESS
        + snapshot.probability("sadness") * W_SADNESS
        + snapshot.probability("fear") * W_FEAR
        + snapshot.probability("anger") * W_ANGER)
        / WEIGHT_SUM
}

/// Bounded window of recent snapshots, oldest first, recomputing its
/// classification on every push.
#[derive(Debug, Clone, Default)]
pub struct TrendWindow {
    window: VecDeque<EmotionSnapshot>,
}

impl TrendWindow {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(TREND_WINDOW_CAP),
        }
    }

    /// Append a snapshot (evicting the oldest beyond capacity) and return
    /// the fresh classification.
    pub fn push(&mut self, snapshot: EmotionSnapshot) -> TrendClass {
        if self.window.len() == TREND_WINDOW_CAP {
            self.window.pop_front();
        }
        self.window.push_back(snapshot);
        self.classify()
    }

    /// Classify the current window contents.
    pub fn classify(&self) -> TrendClass {
        if self.window.len() < MIN_SNAPSHOTS {
            return TrendClass::Neutral;
        }

        // Window is non-empty here; front/back always exist.
        let first = self.window.front().map(stress_score).unwrap_or(0.0);
        let last = self.window.back().map(stress_score).unwrap_or(0.0);

        if last > first && last > STRESS_FLOOR {
            TrendClass::RisingStress
        } else if last < first && first > STRESS_FLOOR {
            TrendClass::Improving
        } else {
            TrendClass::Neutral
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use uuid::Uuid;

    /// Snapshot whose stress score comes out to exactly `target`: setting
    /// every weighted label to `target` makes the weights cancel.
    fn snapshot_with_stress(target: f32) -> EmotionSnapshot {
        let probs: HashMap<String, f32> = [
            ("nervousness".to_string(), target),
            ("sadness".to_string(), target),
            ("fear".to_string(), target),
            ("anger".to_string(), target),
        ]
        .into_iter()
        .collect();
        EmotionSnapshot::new(probs, 0.3, Uuid::new_v4())
    }

    #[test]
    fn test_stress_score_weights() {
        let probs: HashMap<String, f32> = [
            ("nervousness".to_string(), 1.0),
            ("sadness".to_string(), 1.0),
            ("fear".to_string(), 1.0),
            ("anger".to_string(), 1.0),
        ]
        .into_iter()
        .collect();
        let snap = EmotionSnapshot::new(probs, 0.3, Uuid::new_v4());
        assert!((stress_score(&snap) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_neutral_under_three_snapshots() {
        let mut window = TrendWindow::new();
        assert_eq!(window.push(snapshot_with_stress(0.9)), TrendClass::Neutral);
        assert_eq!(window.push(snapshot_with_stress(0.1)), TrendClass::Neutral);
    }

    #[test]
    fn test_rising_stress() {
        let mut window = TrendWindow::new();
        window.push(snapshot_with_stress(0.20));
        window.push(snapshot_with_stress(0.35));
        assert_eq!(window.push(snapshot_with_stress(0.55)), TrendClass::RisingStress);
    }

    #[test]
    fn test_improving() {
        let mut window = TrendWindow::new();
        window.push(snapshot_with_stress(0.60));
        window.push(snapshot_with_stress(0.50));
        assert_eq!(window.push(snapshot_with_stress(0.30)), TrendClass::Improving);
    }

    #[test]
    fn test_flat_low_stress_is_neutral() {
        let mut window = TrendWindow::new();
        window.push(snapshot_with_stress(0.10));
        window.push(snapshot_with_stress(0.15));
        // last > first but last below the 0.40 floor
        assert_eq!(window.push(snapshot_with_stress(0.20)), TrendClass::Neutral);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = TrendWindow::new();
        // Fill with high stress, then push low snapshots until the high
        // ones age out entirely.
        for _ in 0..TREND_WINDOW_CAP {
            window.push(snapshot_with_stress(0.8));
        }
        for _ in 0..TREND_WINDOW_CAP {
            window.push(snapshot_with_stress(0.1));
        }
        assert_eq!(window.len(), TREND_WINDOW_CAP);
        // All-low window: first ~0.1 is under the floor, so not improving.
        assert_eq!(window.classify(), TrendClass::Neutral);
    }
}
