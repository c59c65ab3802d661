//! Turns extracted exam-dump page text into `Question` records.

pub mod normalize;
pub mod segment;

pub use normalize::PageNormalizer;
pub use segment::{parse_questions, parse_questions_with_report, ParseReport};

use crate::models::domain::Question;

/// Normalizes the pages and segments the resulting document in one pass.
pub fn parse_pages<S: AsRef<str>>(
    normalizer: &PageNormalizer,
    pages: &[S],
) -> (Vec<Question>, ParseReport) {
    let document = normalizer.normalize_document(pages);
    parse_questions_with_report(&document)
}
