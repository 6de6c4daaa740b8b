use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::ExamType;

/// Unique identifier for a learner
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LearnerId(u64);

impl LearnerId {
    /// Creates a new `LearnerId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LearnerId({})", self.0)
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for LearnerId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(LearnerId::new)
            .map_err(|_| ParseIdError {
                kind: "LearnerId".to_string(),
            })
    }
}

// ─── Progress Key ──────────────────────────────────────────────────────────────

/// Identity of a progress record: one per learner, topic and exam type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgressKey {
    pub learner_id: LearnerId,
    pub topic: String,
    pub exam_type: ExamType,
}

impl ProgressKey {
    #[must_use]
    pub fn new(learner_id: LearnerId, topic: impl Into<String>, exam_type: ExamType) -> Self {
        Self {
            learner_id,
            topic: topic.into(),
            exam_type,
        }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.learner_id, self.exam_type, self.topic)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learner_id_display() {
        let id = LearnerId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_learner_id_from_str() {
        let id: LearnerId = "123".parse().unwrap();
        assert_eq!(id, LearnerId::new(123));
    }

    #[test]
    fn test_learner_id_from_str_invalid() {
        let err = "not-a-number".parse::<LearnerId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse LearnerId from string");
    }

    #[test]
    fn test_progress_key_display() {
        let key = ProgressKey::new(LearnerId::new(7), "Algebra", ExamType::Jee);
        assert_eq!(key.to_string(), "7/jee/Algebra");
    }
}
