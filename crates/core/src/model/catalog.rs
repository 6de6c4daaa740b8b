//! Closed value sets shared by every progress record.
//!
//! Each enum parses from and renders to a stable lowercase token. Parsing is
//! the input gate's job; once a value is in the domain it is always valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when a token does not name a member of a closed set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

//
// ─── EXAM TYPE ─────────────────────────────────────────────────────────────────
//

/// Competitive exam a topic is being studied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Jee,
    Neet,
    Gate,
    Upsc,
    Cat,
    Gre,
    Gmat,
    Sat,
}

impl ExamType {
    pub const ALL: [ExamType; 8] = [
        ExamType::Jee,
        ExamType::Neet,
        ExamType::Gate,
        ExamType::Upsc,
        ExamType::Cat,
        ExamType::Gre,
        ExamType::Gmat,
        ExamType::Sat,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExamType::Jee => "jee",
            ExamType::Neet => "neet",
            ExamType::Gate => "gate",
            ExamType::Upsc => "upsc",
            ExamType::Cat => "cat",
            ExamType::Gre => "gre",
            ExamType::Gmat => "gmat",
            ExamType::Sat => "sat",
        }
    }
}

impl FromStr for ExamType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|exam| exam.as_str() == lowered)
            .ok_or_else(|| ParseEnumError::new("exam type", s))
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Self-reported difficulty level of the material in a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(ParseEnumError::new("difficulty", s)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── ATTEMPT SOURCE ────────────────────────────────────────────────────────────
//

/// Where the most recent attempt on a topic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptSource {
    Test,
    #[default]
    Practice,
    Quiz,
    Flashcards,
}

impl AttemptSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptSource::Test => "test",
            AttemptSource::Practice => "practice",
            AttemptSource::Quiz => "quiz",
            AttemptSource::Flashcards => "flashcards",
        }
    }
}

impl FromStr for AttemptSource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(AttemptSource::Test),
            "practice" => Ok(AttemptSource::Practice),
            "quiz" => Ok(AttemptSource::Quiz),
            "flashcards" => Ok(AttemptSource::Flashcards),
            _ => Err(ParseEnumError::new("source", s)),
        }
    }
}

impl fmt::Display for AttemptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_type_parses_case_insensitively() {
        assert_eq!("JEE".parse::<ExamType>().unwrap(), ExamType::Jee);
        assert_eq!(" gmat ".parse::<ExamType>().unwrap(), ExamType::Gmat);
        for exam in ExamType::ALL {
            assert_eq!(exam.as_str().parse::<ExamType>().unwrap(), exam);
        }
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        let err = "toefl".parse::<ExamType>().unwrap_err();
        assert_eq!(err.kind, "exam type");
        assert!("impossible".parse::<Difficulty>().is_err());
        assert!("homework".parse::<AttemptSource>().is_err());
    }

    #[test]
    fn difficulty_and_source_tokens() {
        assert_eq!("Expert".parse::<Difficulty>().unwrap(), Difficulty::Expert);
        assert_eq!(Difficulty::default(), Difficulty::Medium);
        assert_eq!(
            "flashcards".parse::<AttemptSource>().unwrap(),
            AttemptSource::Flashcards
        );
        assert_eq!(AttemptSource::Quiz.to_string(), "quiz");
    }
}
