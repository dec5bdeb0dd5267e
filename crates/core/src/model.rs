//! Canonical exam model
//!
//! Every question that leaves the parser is a [`Question`]: a non-empty stem,
//! options labelled contiguously from `A`, and a non-empty set of correct
//! labels that all exist among the options. [`build_question`] is the only
//! place that enforces those invariants for parsed text; anything that fails
//! them is dropped.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::RawQuestion;

/// Single uppercase letter `A`..=`Z` identifying an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(char);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid option label: {0:?} (expected a single letter A-Z)")]
pub struct LabelError(pub String);

impl Label {
    /// Label at zero-based `index` in display order (`0` is `A`).
    pub fn from_index(index: usize) -> Option<Self> {
        if index < 26 {
            Some(Label((b'A' + index as u8) as char))
        } else {
            None
        }
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl TryFrom<char> for Label {
    type Error = LabelError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        let upper = value.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Ok(Label(upper))
        } else {
            Err(LabelError(value.to_string()))
        }
    }
}

impl TryFrom<&str> for Label {
    type Error = LabelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut chars = value.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Label::try_from(c).map_err(|_| LabelError(value.to_string())),
            _ => Err(LabelError(value.to_string())),
        }
    }
}

impl TryFrom<String> for Label {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Label::try_from(value.as_str())
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0.to_string()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of labels, ordered so that grading and export are deterministic.
pub type LabelSet = BTreeSet<Label>;

/// Render a label set the way the canonical text format writes answers.
pub fn join_labels(labels: &LabelSet) -> String {
    labels
        .iter()
        .map(Label::to_string)
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Opaque question identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Identifier for the question at zero-based `position` of its list.
    pub fn sequential(position: usize) -> Self {
        QuestionId(format!("q-{}", position + 1))
    }

    pub fn new(id: impl Into<String>) -> Self {
        QuestionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One lettered choice of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: Label,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub stem: String,
    pub options: Vec<AnswerOption>,
    pub correct: LabelSet,
    #[serde(default)]
    pub explanation: String,
    /// Transient UI state; not part of the question's identity.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flagged: bool,
}

impl Question {
    pub fn is_multi_answer(&self) -> bool {
        self.correct.len() > 1
    }

    /// Texts of the correct options, in label order.
    pub fn correct_texts(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| self.correct.contains(&o.label))
            .map(|o| o.text.as_str())
            .collect()
    }

    /// Labels present on this question.
    pub fn labels(&self) -> LabelSet {
        self.options.iter().map(|o| o.label).collect()
    }

    /// Content equality, ignoring id and flag state.
    pub fn same_content(&self, other: &Question) -> bool {
        self.stem == other.stem
            && self.options == other.options
            && self.correct == other.correct
            && self.explanation == other.explanation
    }
}

/// Exam-level settings. The core reads `pass_mark` and `negative_marking`
/// through [`crate::grade::ScoringConfig`]; everything else is carried along.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_mark: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_marking: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub meta: ExamMeta,
    pub questions: Vec<Question>,
}

impl Exam {
    pub fn new(title: impl Into<String>, questions: Vec<Question>) -> Self {
        Exam {
            id: None,
            meta: ExamMeta {
                title: title.into(),
                ..ExamMeta::default()
            },
            questions,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Fewest options a parsed question may have to count as multiple choice.
pub const MIN_OPTIONS: usize = 2;

/// Validate a parsed block and turn it into a canonical question.
///
/// Options must already be sorted by label. They are relabelled `A`, `B`, ...
/// in order (closing gaps such as `A, B, D`) and the correct set follows the
/// relabelling. Returns `None` when the stem is empty, there are fewer than
/// [`MIN_OPTIONS`] options, or no correct label survives.
pub fn build_question(raw: RawQuestion, position: usize) -> Option<Question> {
    let stem = raw.stem.trim().to_string();
    if stem.is_empty() {
        log::debug!("dropping block {}: empty stem", position + 1);
        return None;
    }

    let mut options = Vec::with_capacity(raw.options.len());
    let mut correct = LabelSet::new();
    for (index, (old_label, text)) in raw.options.into_iter().enumerate() {
        let label = Label::from_index(index)?;
        if raw.answer.contains(&old_label) {
            correct.insert(label);
        }
        options.push(AnswerOption {
            label,
            text: text.trim().to_string(),
        });
    }

    if options.len() < MIN_OPTIONS {
        log::debug!(
            "dropping block {}: {} option(s), need at least {}",
            position + 1,
            options.len(),
            MIN_OPTIONS
        );
        return None;
    }
    if correct.is_empty() {
        log::debug!("dropping block {}: answer does not resolve", position + 1);
        return None;
    }

    Some(Question {
        id: QuestionId::sequential(position),
        stem,
        options,
        correct,
        explanation: raw.explanation.trim().to_string(),
        flagged: false,
    })
}

/// Give every question a fresh sequential id and clear transient state.
pub fn renumber(questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| Question {
            id: QuestionId::sequential(i),
            flagged: false,
            ..q
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(c: char) -> Label {
        Label::try_from(c).unwrap()
    }

    fn raw(stem: &str, options: &[(char, &str)], answer: &[char]) -> RawQuestion {
        RawQuestion {
            stem: stem.to_string(),
            options: options
                .iter()
                .map(|(l, t)| (label(*l), t.to_string()))
                .collect(),
            answer_raw: answer.iter().collect(),
            answer: answer.iter().map(|c| label(*c)).collect(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_label_accepts_lowercase() {
        assert_eq!(label('b').as_char(), 'B');
    }

    #[test]
    fn test_label_rejects_non_letters() {
        assert!(Label::try_from('1').is_err());
        assert!(Label::try_from("AB").is_err());
        assert!(Label::try_from("").is_err());
    }

    #[test]
    fn test_label_from_index() {
        assert_eq!(Label::from_index(0), Some(label('A')));
        assert_eq!(Label::from_index(3), Some(label('D')));
        assert_eq!(Label::from_index(25), Some(label('Z')));
        assert_eq!(Label::from_index(26), None);
    }

    #[test]
    fn test_label_serializes_as_string() {
        let json = serde_json::to_string(&label('C')).unwrap();
        assert_eq!(json, "\"C\"");
        let back: Label = serde_json::from_str("\"c\"").unwrap();
        assert_eq!(back, label('C'));
    }

    #[test]
    fn test_join_labels() {
        let set: LabelSet = [label('D'), label('B')].into_iter().collect();
        assert_eq!(join_labels(&set), "B & D");
    }

    #[test]
    fn test_build_question_trims_fields() {
        let mut r = raw("  2+2=?  ", &[('A', " 3 "), ('B', "4\n")], &['B']);
        r.explanation = "  Basic.  ".to_string();
        let q = build_question(r, 0).unwrap();
        assert_eq!(q.id.as_str(), "q-1");
        assert_eq!(q.stem, "2+2=?");
        assert_eq!(q.options[0].text, "3");
        assert_eq!(q.options[1].text, "4");
        assert_eq!(q.explanation, "Basic.");
        assert_eq!(q.correct_texts(), vec!["4"]);
    }

    #[test]
    fn test_build_question_closes_label_gaps() {
        let r = raw("Pick", &[('A', "one"), ('B', "two"), ('D', "four")], &['D']);
        let q = build_question(r, 4).unwrap();
        let labels: Vec<char> = q.options.iter().map(|o| o.label.as_char()).collect();
        assert_eq!(labels, vec!['A', 'B', 'C']);
        assert_eq!(q.correct_texts(), vec!["four"]);
        assert_eq!(q.id.as_str(), "q-5");
    }

    #[test]
    fn test_build_question_rejects_empty_stem() {
        assert!(build_question(raw("   ", &[('A', "x"), ('B', "y")], &['A']), 0).is_none());
    }

    #[test]
    fn test_build_question_rejects_no_options() {
        assert!(build_question(raw("Stem", &[], &['A']), 0).is_none());
    }

    #[test]
    fn test_build_question_rejects_single_option() {
        assert!(build_question(raw("Stem", &[('A', "only")], &['A']), 0).is_none());
    }

    #[test]
    fn test_build_question_rejects_empty_answer() {
        assert!(build_question(raw("Stem", &[('A', "x"), ('B', "y")], &[]), 0).is_none());
    }

    #[test]
    fn test_renumber_resets_ids_and_flags() {
        let mut q = build_question(raw("S", &[('A', "x"), ('B', "y")], &['A']), 7).unwrap();
        q.flagged = true;
        let out = renumber(vec![q]);
        assert_eq!(out[0].id.as_str(), "q-1");
        assert!(!out[0].flagged);
    }

    #[test]
    fn test_exam_meta_flattens() {
        let exam = Exam::new("Sample", vec![]);
        let json = serde_json::to_value(&exam).unwrap();
        assert_eq!(json["title"], "Sample");
        assert!(json.get("description").is_none());
    }
}
