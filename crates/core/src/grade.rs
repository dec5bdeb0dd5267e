//! Grading engine
//!
//! Grading is exact-match: a question counts as correct only when the
//! selected labels equal the correct labels. Nothing here mutates the
//! question list, so grading the same submission twice gives the same report.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::block::parse_answer;
use crate::model::{renumber, Exam, ExamMeta, LabelSet, Question};

/// Selected labels per question index (current display order).
///
/// Missing or empty entries are unanswered questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub answers: BTreeMap<usize, LabelSet>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flagged: BTreeSet<usize>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the selection for `index`, replacing any previous one.
    pub fn select(&mut self, index: usize, labels: LabelSet) {
        if labels.is_empty() {
            self.answers.remove(&index);
        } else {
            self.answers.insert(index, labels);
        }
    }

    pub fn flag(&mut self, index: usize) {
        self.flagged.insert(index);
    }

    pub fn selected(&self, index: usize) -> LabelSet {
        self.answers.get(&index).cloned().unwrap_or_default()
    }
}

/// Interpret typed input (`"B"`, `"b, d"`, `"A & C"`) against a question.
///
/// Uses the same separators as answer lines; unknown letters are dropped.
pub fn parse_selection(input: &str, question: &Question) -> LabelSet {
    parse_answer(input, &question.labels())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Points subtracted per wrong (answered and incorrect) question.
    #[serde(default)]
    pub negative_marking: f64,
    /// Minimum percent needed to pass, if the exam has one.
    #[serde(default)]
    pub pass_mark: Option<u8>,
}

impl ScoringConfig {
    /// Scoring settings stored with an exam.
    pub fn from_meta(meta: &ExamMeta) -> Self {
        ScoringConfig {
            negative_marking: meta.negative_marking.unwrap_or(0.0),
            pass_mark: meta.pass_mark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Correct,
    Wrong,
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub index: usize,
    pub question: Question,
    pub selected: LabelSet,
    pub is_correct: bool,
}

impl QuestionResult {
    pub fn status(&self) -> ResultStatus {
        if self.is_correct {
            ResultStatus::Correct
        } else if self.selected.is_empty() {
            ResultStatus::Unanswered
        } else {
            ResultStatus::Wrong
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total: usize,
    pub correct: usize,
    pub wrong: usize,
    pub unanswered: usize,
    pub raw_score: f64,
    pub percent: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub results: Vec<QuestionResult>,
    pub summary: ScoreSummary,
}

/// Exact-match check for one question.
pub fn is_correct(question: &Question, selected: &LabelSet) -> bool {
    !selected.is_empty() && *selected == question.correct
}

/// Compute the score summary for a set of results.
///
/// Only answered-and-wrong questions are penalized; unanswered questions
/// cost nothing. Negative marking is applied before rounding and the raw
/// score never drops below zero.
pub fn summarize(results: &[QuestionResult], config: &ScoringConfig) -> ScoreSummary {
    let total = results.len();
    let mut correct = 0;
    let mut wrong = 0;
    let mut unanswered = 0;
    for result in results {
        match result.status() {
            ResultStatus::Correct => correct += 1,
            ResultStatus::Wrong => wrong += 1,
            ResultStatus::Unanswered => unanswered += 1,
        }
    }

    let penalty = config.negative_marking.max(0.0) * wrong as f64;
    let raw_score = (correct as f64 - penalty).max(0.0);
    let percent = if total == 0 {
        0
    } else {
        (100.0 * raw_score / total as f64).round() as u32
    };
    let passed = config.pass_mark.map(|mark| percent >= u32::from(mark));

    ScoreSummary {
        total,
        correct,
        wrong,
        unanswered,
        raw_score,
        percent,
        passed,
    }
}

/// Grade a submission against the questions in their current display order.
///
/// Flags recorded in the submission are copied onto the result's question so
/// that a flagged-only retest can be derived from the report alone.
pub fn grade(
    questions: &[Question],
    submission: &Submission,
    config: &ScoringConfig,
) -> GradeReport {
    let results: Vec<QuestionResult> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = submission.selected(index);
            let mut question = question.clone();
            question.flagged = question.flagged || submission.flagged.contains(&index);
            QuestionResult {
                index,
                is_correct: is_correct(&question, &selected),
                question,
                selected,
            }
        })
        .collect();

    let summary = summarize(&results, config);
    GradeReport { results, summary }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetestFilter {
    /// Every question not answered correctly, unanswered ones included.
    Wrong,
    Flagged,
}

impl RetestFilter {
    pub fn matches(&self, result: &QuestionResult) -> bool {
        match self {
            RetestFilter::Wrong => !result.is_correct,
            RetestFilter::Flagged => result.question.flagged,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            RetestFilter::Wrong => "wrong only",
            RetestFilter::Flagged => "flagged only",
        }
    }
}

/// Build a fresh question list from the results that match `filter`.
///
/// The copies get new sequential ids and no flag or selection state, so the
/// list can be shuffled, taken, graded and retested again on its own.
pub fn derive_retest_set(results: &[QuestionResult], filter: RetestFilter) -> Vec<Question> {
    let picked: Vec<Question> = results
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| r.question.clone())
        .collect();
    renumber(picked)
}

/// Wrap [`derive_retest_set`] into a new exam titled after `exam`.
///
/// Returns `None` when no question matches.
pub fn derive_retest_exam(exam: &Exam, report: &GradeReport, filter: RetestFilter) -> Option<Exam> {
    let questions = derive_retest_set(&report.results, filter);
    if questions.is_empty() {
        return None;
    }

    let base_id = exam.id.clone().unwrap_or_else(|| "exam".to_string());
    let base_title = if exam.meta.title.is_empty() {
        "Exam"
    } else {
        exam.meta.title.as_str()
    };

    Some(Exam {
        id: Some(format!("{base_id}-retest")),
        meta: ExamMeta {
            title: format!("{base_title} - Retest ({})", filter.describe()),
            description: format!(
                "{} of {} questions from the previous attempt.",
                questions.len(),
                exam.questions.len()
            ),
            ..exam.meta.clone()
        },
        questions,
    })
}
