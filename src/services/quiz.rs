// src/services/quiz.rs

use std::collections::HashMap;

use rand::{Rng, seq::SliceRandom};

use crate::{
    config::{CATEGORIES, MAX_SESSION_QUESTIONS},
    models::question::Question,
};

/// Resolves a category name from a path or body to its canonical spelling.
/// Matching ignores case and surrounding whitespace; unknown names yield `None`.
pub fn normalize_category(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(trimmed))
        .map(|c| c.to_string())
}

/// Shuffles the category's questions and keeps at most one session's worth.
pub fn draw_session<R: Rng + ?Sized>(mut questions: Vec<Question>, rng: &mut R) -> Vec<Question> {
    questions.shuffle(rng);
    questions.truncate(MAX_SESSION_QUESTIONS);
    questions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub correct: usize,
    pub total: usize,
}

impl Grade {
    pub fn incorrect(&self) -> usize {
        self.total - self.correct
    }
}

/// Compares submitted answers against the answer key.
///
/// Every submitted answer counts towards the total; answers for unknown
/// questions are wrong. Matching is exact, as the client echoes option text.
pub fn grade(answers: &HashMap<String, String>, key: &HashMap<String, Question>) -> Grade {
    let correct = answers
        .iter()
        .filter(|(id, answer)| key.get(*id).is_some_and(|q| q.is_correct(answer)))
        .count();

    Grade {
        correct,
        total: answers.len(),
    }
}
