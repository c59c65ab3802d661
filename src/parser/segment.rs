use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::domain::{Choice, Question};

static QUESTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"NO\.(\d+)\s").expect("QUESTION_MARKER is a valid regex pattern"));
static LEADING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^NO\.(\d+)\s+").expect("LEADING_MARKER is a valid regex pattern"));
static ANSWER_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Answer:\s*([A-F](?:\s+[A-F])*)\s*(?:Explanation|$)")
        .expect("ANSWER_SEGMENT is a valid regex pattern")
});
static ANSWER_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Answer:").expect("ANSWER_LABEL is a valid regex pattern"));
static EXPLANATION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Explanation:\s*").expect("EXPLANATION_LABEL is a valid regex pattern")
});
static EXPLANATION_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)NO\.\d+").expect("EXPLANATION_END is a valid regex pattern"));
static CHOICE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-F])\.\s+").expect("CHOICE_MARKER is a valid regex pattern"));
static CHOICE_TERMINATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-F]\.\s|Answer:|Explanation:").expect("CHOICE_TERMINATOR is a valid regex pattern")
});
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN is a valid regex pattern"));

/// Diagnostics for one parse: how many question blocks were seen and how many
/// of them failed extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub blocks: usize,
    pub dropped: usize,
}

impl ParseReport {
    pub fn parsed(&self) -> usize {
        self.blocks - self.dropped
    }
}

/// Parses normalized document text into questions sorted by number.
/// Malformed blocks are skipped; this never fails.
pub fn parse_questions(text: &str) -> Vec<Question> {
    parse_questions_with_report(text).0
}

pub fn parse_questions_with_report(text: &str) -> (Vec<Question>, ParseReport) {
    let mut report = ParseReport::default();
    let mut questions = Vec::new();

    for block in split_blocks(text) {
        if !LEADING_MARKER.is_match(block) {
            continue;
        }
        report.blocks += 1;

        match extract_question(block) {
            Some(question) => questions.push(question),
            None => {
                report.dropped += 1;
                log::debug!(
                    "Dropped malformed question block: {:?}",
                    block.chars().take(60).collect::<String>()
                );
            }
        }
    }

    // Stable, so duplicate numbers keep their document order.
    questions.sort_by_key(|q| q.number);

    if report.dropped > 0 {
        log::warn!(
            "Parsed {} of {} question blocks ({} dropped)",
            report.parsed(),
            report.blocks,
            report.dropped
        );
    }

    (questions, report)
}

/// Splits before every question marker. Text ahead of the first marker is
/// returned as its own block.
fn split_blocks(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = QUESTION_MARKER.find_iter(text).map(|m| m.start()).collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .filter(|block| !block.is_empty())
        .collect()
}

fn extract_question(block: &str) -> Option<Question> {
    let marker = LEADING_MARKER.captures(block)?;
    let number: u32 = marker.get(1)?.as_str().parse().ok()?;
    let prompt_start = marker.get(0)?.end();

    let answer = extract_answer(block);
    if answer.is_empty() {
        return None;
    }

    let explanation = extract_explanation(block);

    let pre_answer = match ANSWER_LABEL.find(block) {
        Some(label) => &block[..label.start()],
        None => block,
    };

    let choices = extract_choices(pre_answer);
    let text = match CHOICE_MARKER.find_at(pre_answer, prompt_start) {
        Some(first_choice) => collapse_whitespace(&pre_answer[prompt_start..first_choice.start()]),
        None => String::new(),
    };

    let question = Question {
        number,
        text,
        choices,
        answer,
        explanation,
    };

    question.is_valid().then_some(question)
}

fn extract_answer(block: &str) -> Vec<char> {
    let Some(letters) = ANSWER_SEGMENT.captures(block).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    let mut answer = Vec::new();
    for letter in letters
        .as_str()
        .split_whitespace()
        .filter_map(|token| token.chars().next())
        .map(|c| c.to_ascii_uppercase())
    {
        if !answer.contains(&letter) {
            answer.push(letter);
        }
    }
    answer
}

fn extract_explanation(block: &str) -> String {
    let Some(label) = EXPLANATION_LABEL.find(block) else {
        return String::new();
    };

    let end = EXPLANATION_END
        .find_at(block, label.end())
        .map(|m| m.start())
        .unwrap_or(block.len());

    block[label.end()..end].trim().to_string()
}

/// Scans `region` for `X. ` markers. Each choice runs up to the next marker,
/// an answer/explanation label, or the end of the region.
fn extract_choices(region: &str) -> Vec<Choice> {
    let mut choices = Vec::new();
    let mut pos = 0;

    while let Some(marker) = CHOICE_MARKER.captures_at(region, pos) {
        let (Some(whole), Some(letter)) = (
            marker.get(0),
            marker.get(1).and_then(|m| m.as_str().chars().next()),
        ) else {
            break;
        };

        let text_start = whole.end();
        let text_end = CHOICE_TERMINATOR
            .find_at(region, text_start)
            .map(|m| m.start())
            .unwrap_or(region.len());

        choices.push(Choice {
            letter,
            text: collapse_whitespace(&region[text_start..text_end]),
        });

        pos = text_end;
        if pos >= region.len() {
            break;
        }
    }

    choices
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reference_block() {
        let questions =
            parse_questions("NO.1 What is 2+2? A. 3 B. 4 C. 5 Answer: B Explanation: Basic math.");

        assert_eq!(questions.len(), 1);
        let q = &questions[0];
        assert_eq!(q.number, 1);
        assert_eq!(q.text, "What is 2+2?");
        assert_eq!(
            q.choices,
            vec![Choice::new('A', "3"), Choice::new('B', "4"), Choice::new('C', "5")]
        );
        assert_eq!(q.answer, vec!['B']);
        assert_eq!(q.explanation, "Basic math.");
    }

    #[test]
    fn block_without_answer_label_is_dropped() {
        let (questions, report) =
            parse_questions_with_report("NO.1 What is 2+2? A. 3 B. 4 C. 5 Explanation: none");
        assert!(questions.is_empty());
        assert_eq!(report, ParseReport { blocks: 1, dropped: 1 });
    }

    #[test]
    fn multi_letter_answers_are_uppercased_and_deduplicated() {
        let text = "NO.7 Pick two.\nA. red\nB. green\nC. blue\nD. black\nanswer: b d B\nExplanation: colours";
        let questions = parse_questions(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].answer, vec!['B', 'D']);
        assert_eq!(questions[0].explanation, "colours");
    }

    #[test]
    fn choice_text_whitespace_is_collapsed() {
        let text = "NO.2 Which   service\nstores objects? A. Amazon\n  S3 B. Amazon   EBS Answer: A";
        let q = &parse_questions(text)[0];
        assert_eq!(q.text, "Which service stores objects?");
        assert_eq!(q.choices[0].text, "Amazon S3");
        assert_eq!(q.choices[1].text, "Amazon EBS");
        assert_eq!(q.explanation, "");
    }

    #[test]
    fn output_is_sorted_and_keeps_duplicates_in_order() {
        let text = "NO.3 third A. x B. y Answer: A \
                    NO.1 first A. x B. y Answer: B \
                    NO.3 again A. x B. y Answer: B";
        let questions = parse_questions(text);
        let numbers: Vec<u32> = questions.iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec![1, 3, 3]);
        assert_eq!(questions[1].text, "third");
        assert_eq!(questions[2].text, "again");
    }

    #[test]
    fn preamble_before_first_marker_is_ignored() {
        let text = "Exam dump v2 A. not a choice\nNO.1 q? A. x B. y Answer: A";
        let (questions, report) = parse_questions_with_report(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(report.blocks, 1);
    }

    #[test]
    fn single_choice_block_is_dropped() {
        assert!(parse_questions("NO.1 q? A. only Answer: A").is_empty());
    }

    #[test]
    fn answer_letter_missing_from_choices_is_dropped() {
        assert!(parse_questions("NO.1 q? A. x B. y Answer: E").is_empty());
    }

    #[test]
    fn block_without_prompt_is_dropped() {
        assert!(parse_questions("NO.1 A. x B. y Answer: A").is_empty());
    }

    #[test]
    fn explanation_stops_at_next_question_reference() {
        let text = "NO.4 q? A. x B. y Answer: A Explanation: see below NO.5abc";
        let q = &parse_questions(text)[0];
        assert_eq!(q.explanation, "see below");
    }

    #[test]
    fn letters_inside_words_are_not_choice_markers() {
        let text = "NO.9 What does DNA. stand for? A. Deoxyribonucleic acid B. Nothing Answer: A";
        let q = &parse_questions(text)[0];
        assert_eq!(q.text, "What does DNA. stand for?");
        assert_eq!(q.choices.len(), 2);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let (questions, report) = parse_questions_with_report("");
        assert!(questions.is_empty());
        assert_eq!(report, ParseReport::default());
    }
}
