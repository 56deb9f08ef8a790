//! Confidence thresholds and the status they assign.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    Unmapped,
    NeedsSelection,
    AutoAssigned,
    /// Only reachable through a manual action.
    Skipped,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Unmapped => "unmapped",
            EntryStatus::NeedsSelection => "needs-selection",
            EntryStatus::AutoAssigned => "auto-assigned",
            EntryStatus::Skipped => "skipped",
        }
    }
}

/// Caller supplied. Expected 0 <= minimum <= choice <= high_confidence <= 1,
/// which is not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub minimum: f64,
    pub choice: f64,
    pub high_confidence: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            minimum: 0.3,
            choice: 0.5,
            high_confidence: 0.75,
        }
    }
}

impl Thresholds {
    pub fn is_ordered(&self) -> bool {
        0.0 <= self.minimum
            && self.minimum <= self.choice
            && self.choice <= self.high_confidence
            && self.high_confidence <= 1.0
    }

    /// Status for a best score. A missing score is below every bar.
    pub fn classify(&self, score: Option<f64>) -> EntryStatus {
        let Some(s) = score else {
            return EntryStatus::Unmapped;
        };
        if s >= self.high_confidence {
            EntryStatus::AutoAssigned
        } else if s >= self.choice {
            EntryStatus::NeedsSelection
        } else {
            // Below the minimum and between minimum and choice both land here.
            EntryStatus::Unmapped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive() {
        let t = Thresholds::default();
        assert_eq!(t.classify(Some(0.29)), EntryStatus::Unmapped);
        assert_eq!(t.classify(Some(0.3)), EntryStatus::Unmapped);
        assert_eq!(t.classify(Some(0.49)), EntryStatus::Unmapped);
        assert_eq!(t.classify(Some(0.5)), EntryStatus::NeedsSelection);
        assert_eq!(t.classify(Some(0.74)), EntryStatus::NeedsSelection);
        assert_eq!(t.classify(Some(0.75)), EntryStatus::AutoAssigned);
        assert_eq!(t.classify(Some(1.0)), EntryStatus::AutoAssigned);
    }

    #[test]
    fn test_missing_score_is_unmapped() {
        assert_eq!(Thresholds::default().classify(None), EntryStatus::Unmapped);
    }

    #[test]
    fn test_classify_is_pure() {
        let t = Thresholds { minimum: 0.1, choice: 0.2, high_confidence: 0.9 };
        for i in 0..=100 {
            let s = i as f64 / 100.0;
            assert_eq!(t.classify(Some(s)), t.classify(Some(s)));
        }
    }

    #[test]
    fn test_ordering_check() {
        assert!(Thresholds::default().is_ordered());
        let bad = Thresholds { minimum: 0.6, choice: 0.5, high_confidence: 0.75 };
        assert!(!bad.is_ordered());
    }
}
