//! Shuffle engine
//!
//! Both shuffles are pure: they take a slice and return a new list, so a
//! caller holding the pre-shuffle questions never sees them change. The random
//! source is injected; pass a seeded `StdRng` for reproducible orderings.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{AnswerOption, Label, LabelSet, Question};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleOptions {
    /// Randomize the order of the questions.
    #[serde(default)]
    pub questions: bool,
    /// Randomize (and relabel) the options of every question.
    #[serde(default)]
    pub options: bool,
}

/// Uniformly permute the question order. Options and answers are untouched.
pub fn shuffle_questions<R: Rng + ?Sized>(questions: &[Question], rng: &mut R) -> Vec<Question> {
    let mut out = questions.to_vec();
    out.shuffle(rng);
    out
}

/// Permute the options of one question and relabel them `A`, `B`, ...
///
/// The new correct set is computed from each option's original position, not
/// from its text or old label, so duplicate option texts keep the right
/// answer. A question with fewer than two options comes back unchanged.
pub fn shuffle_options<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Question {
    if question.options.len() < 2 {
        return question.clone();
    }

    let mut order: Vec<usize> = (0..question.options.len()).collect();
    order.shuffle(rng);

    let mut options = Vec::with_capacity(order.len());
    let mut correct = LabelSet::new();
    for (new_index, old_index) in order.into_iter().enumerate() {
        let original = &question.options[old_index];
        let Some(label) = Label::from_index(new_index) else {
            return question.clone();
        };
        if question.correct.contains(&original.label) {
            correct.insert(label);
        }
        options.push(AnswerOption {
            label,
            text: original.text.clone(),
        });
    }

    Question {
        options,
        correct,
        ..question.clone()
    }
}

/// Apply the enabled shuffles: question order first, then options.
pub fn shuffle<R: Rng + ?Sized>(
    questions: &[Question],
    options: &ShuffleOptions,
    rng: &mut R,
) -> Vec<Question> {
    let ordered = if options.questions {
        shuffle_questions(questions, rng)
    } else {
        questions.to_vec()
    };

    if options.options {
        ordered.iter().map(|q| shuffle_options(q, rng)).collect()
    } else {
        ordered
    }
}
