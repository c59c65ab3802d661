use std::collections::HashMap;

use rand::{seq::SliceRandom, Rng};

use crate::models::domain::{
    question::CHOICE_LETTERS,
    Choice, Question,
};

/// Returns the questions in a uniformly random order.
pub fn shuffle_questions(questions: &[Question]) -> Vec<Question> {
    shuffle_questions_with(questions, &mut rand::rng())
}

pub fn shuffle_questions_with<R: Rng + ?Sized>(questions: &[Question], rng: &mut R) -> Vec<Question> {
    let mut shuffled = questions.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// Reorders the choices of every question and relabels them A, B, C... in
/// their new positions, rewriting each answer key to match.
pub fn shuffle_all_choices(questions: &[Question]) -> Vec<Question> {
    let mut rng = rand::rng();
    questions
        .iter()
        .map(|q| shuffle_choices_with(q, &mut rng))
        .collect()
}

pub fn shuffle_choices(question: &Question) -> Question {
    shuffle_choices_with(question, &mut rand::rng())
}

/// Expects at most `CHOICE_LETTERS.len()` choices, as every valid question has.
pub fn shuffle_choices_with<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Question {
    debug_assert!(
        question.choices.len() <= CHOICE_LETTERS.len(),
        "question {} has more choices than letters",
        question.number
    );

    let mut shuffled = question.choices.clone();
    shuffled.shuffle(rng);

    let mut relabel: HashMap<char, char> = HashMap::with_capacity(shuffled.len());
    let choices: Vec<Choice> = shuffled
        .into_iter()
        .zip(CHOICE_LETTERS)
        .map(|(choice, letter)| {
            relabel.insert(choice.letter, letter);
            Choice {
                letter,
                text: choice.text,
            }
        })
        .collect();

    // Letters without a mapping pass through unchanged.
    let answer = question
        .answer
        .iter()
        .map(|a| relabel.get(a).copied().unwrap_or(*a))
        .collect();

    Question {
        choices,
        answer,
        ..question.clone()
    }
}
