mod catalog;
mod ids;
mod progress;

pub use catalog::{AttemptSource, Difficulty, ExamType, ParseEnumError};
pub use ids::{LearnerId, ParseIdError, ProgressKey};
pub use progress::{
    ProgressError, ProgressMetadata, StreakState, SubtopicProgress, TopicProgress, accuracy_percent,
};
