pub mod progress;
pub mod question;
pub mod quiz;

use chrono::{DateTime, SubsecRound, Utc};

pub use progress::{AnswerMap, ProgressRecord};
pub use question::{Choice, Question};
pub use quiz::{QuizChunk, QuizDocument, QuizMeta};

/// Current time at the millisecond precision records are stored with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
