//! Session leaderboard
//!
//! Finished runs are ranked by score, top 10 kept. Lives in memory only and
//! survives restarts, not process exit.

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Enemies killed by weapons
    pub score: u64,
    /// Player level reached
    pub level: u32,
    /// Seconds survived
    pub survival_secs: f64,
}

/// High score leaderboard, sorted best first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Record a finished run.
    ///
    /// Returns the 1-indexed rank, or None for a zero score or one that
    /// doesn't make the table. Equal scores rank behind earlier runs.
    pub fn add_score(&mut self, score: u64, level: u32, survival_secs: f64) -> Option<usize> {
        let index = self.entries.partition_point(|e| e.score >= score);
        if score == 0 || index >= MAX_HIGH_SCORES {
            return None;
        }
        self.entries.insert(
            index,
            HighScoreEntry {
                score,
                level,
                survival_secs,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Longest survival among recorded runs
    pub fn best_survival_secs(&self) -> Option<f64> {
        self.entries.iter().map(|e| e.survival_secs).max_by(f64::total_cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_score_never_ranks() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(0, 1, 12.0), None);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_sorted_descending() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(10, 2, 30.0), Some(1));
        assert_eq!(scores.add_score(50, 4, 90.0), Some(1));
        assert_eq!(scores.add_score(20, 3, 45.0), Some(2));
        let order: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(order, vec![50, 20, 10]);
        assert_eq!(scores.top_score(), Some(50));
        assert_eq!(scores.best_survival_secs(), Some(90.0));
    }

    #[test]
    fn test_ties_rank_behind_earlier_runs() {
        let mut scores = HighScores::new();
        scores.add_score(10, 2, 30.0);
        assert_eq!(scores.add_score(10, 5, 60.0), Some(2));
        assert_eq!(scores.entries[0].level, 2);
    }

    #[test]
    fn test_capped_at_max() {
        let mut scores = HighScores::new();
        for score in 1..=15 {
            scores.add_score(score, 1, score as f64);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(6));
        assert_eq!(scores.add_score(6, 1, 1.0), None);
        assert_eq!(scores.add_score(7, 2, 2.0), Some(10));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.level), Some(2));
    }
}
