use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Letters a choice may carry, in positional order.
pub const CHOICE_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

pub const MIN_CHOICES: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Choice {
    pub letter: char,
    pub text: String,
}

impl Choice {
    pub fn new(letter: char, text: &str) -> Self {
        Choice {
            letter,
            text: text.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub number: u32,
    pub text: String,
    pub choices: Vec<Choice>,
    pub answer: Vec<char>, // set semantics, order carries no meaning
    pub explanation: String,
}

impl Question {
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.choices.iter().map(|c| c.letter)
    }

    pub fn has_letter(&self, letter: char) -> bool {
        self.choices.iter().any(|c| c.letter == letter)
    }

    /// Checks the structural invariants every stored question must satisfy:
    /// non-empty prompt, at least two uniquely lettered choices from A-F,
    /// and a non-empty answer drawn from those letters.
    pub fn is_valid(&self) -> bool {
        if self.text.trim().is_empty() || self.choices.len() < MIN_CHOICES {
            return false;
        }
        if self.choices.len() > CHOICE_LETTERS.len() || self.answer.is_empty() {
            return false;
        }

        let mut seen = HashSet::new();
        let letters_ok = self
            .letters()
            .all(|l| CHOICE_LETTERS.contains(&l) && seen.insert(l));

        letters_ok && self.answer.iter().all(|a| self.has_letter(*a))
    }
}
