//! Canonical text export and the attempt record written after grading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grade::{GradeReport, QuestionResult, ResultStatus};
use crate::model::{join_labels, Exam, Question};

/// Render questions in the canonical text format the parser reads back.
///
/// ```text
/// Q1: <stem>
/// A) <option>
/// Answer: A & C
/// Explanation: <text>
/// ```
///
/// Questions are numbered by position and separated by a blank line; the
/// explanation line is left out when there is none.
pub fn export_text(questions: &[Question]) -> String {
    let mut out = String::new();
    for (i, question) in questions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("Q{}: {}\n", i + 1, question.stem));
        for option in &question.options {
            out.push_str(&format!("{}) {}\n", option.label, option.text));
        }
        out.push_str(&format!("Answer: {}\n", join_labels(&question.correct)));
        if !question.explanation.is_empty() {
            out.push_str(&format!("Explanation: {}\n", question.explanation));
        }
    }
    out
}

/// Canonical text for the questions behind a set of results.
pub fn export_results_text(results: &[QuestionResult]) -> String {
    let questions: Vec<Question> = results.iter().map(|r| r.question.clone()).collect();
    export_text(&questions)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Student {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.id.is_none()
    }
}

/// Per-question line of an [`AttemptRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptDetail {
    pub question: String,
    pub options: Vec<String>,
    pub selected: String,
    pub correct: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub explanation: String,
}

/// Everything worth keeping about one graded attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Student::is_empty")]
    pub student: Student,
    pub correct: usize,
    pub total: usize,
    pub percent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    pub details: Vec<AttemptDetail>,
}

impl AttemptRecord {
    pub fn new(
        exam: &Exam,
        report: &GradeReport,
        saved_id: Option<String>,
        student: Student,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let details = report
            .results
            .iter()
            .map(|r| AttemptDetail {
                question: r.question.stem.clone(),
                options: r
                    .question
                    .options
                    .iter()
                    .map(|o| format!("{}) {}", o.label, o.text))
                    .collect(),
                selected: join_labels(&r.selected),
                correct: join_labels(&r.question.correct),
                status: r.status(),
                explanation: r.question.explanation.clone(),
            })
            .collect();

        AttemptRecord {
            timestamp,
            exam_id: exam.id.clone(),
            saved_id,
            title: exam.meta.title.clone(),
            student,
            correct: report.summary.correct,
            total: report.summary.total,
            percent: report.summary.percent,
            passed: report.summary.passed,
            details,
        }
    }

    /// Suggested download name, e.g. `results-saved-geo-2024-01-02T03-04-05Z.json`.
    pub fn file_name(&self) -> String {
        let base = match (&self.saved_id, &self.exam_id) {
            (Some(saved), _) => format!("saved-{saved}"),
            (None, Some(exam)) => exam.clone(),
            (None, None) => "exam".to_string(),
        };
        let stamp = self
            .timestamp
            .format("%Y-%m-%dT%H-%M-%SZ")
            .to_string();
        format!("results-{base}-{stamp}.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grade::{grade, ScoringConfig, Submission};
    use crate::model::Label;
    use crate::parse::parse;
    use chrono::TimeZone;

    const SAMPLE: &str = "Q1: 2+2=?\nA) 3\nB) 4\nAnswer: B\nExplanation: Basic arithmetic.\n\nQ2: Pick the primes\nA) 2\nB) 4\nC) 5\nD) 9\nAnswer: A, C\n";

    #[test]
    fn test_export_text_format() {
        let questions = parse(SAMPLE);
        let text = export_text(&questions);
        assert_eq!(
            text,
            "Q1: 2+2=?\nA) 3\nB) 4\nAnswer: B\nExplanation: Basic arithmetic.\n\nQ2: Pick the primes\nA) 2\nB) 4\nC) 5\nD) 9\nAnswer: A & C\n"
        );
    }

    #[test]
    fn test_export_reparses_to_same_content() {
        let questions = parse(SAMPLE);
        let reparsed = parse(&export_text(&questions));
        assert_eq!(reparsed.len(), questions.len());
        for (a, b) in questions.iter().zip(&reparsed) {
            assert!(a.same_content(b));
        }
    }

    #[test]
    fn test_export_keeps_blank_line_inside_option() {
        let questions = parse("Q1: S\nA) x\n\ny\nB) z\nAnswer: A\n");
        assert_eq!(questions[0].options[0].text, "x\n\ny");

        let text = export_text(&questions);
        assert!(text.contains("A) x\n\ny\nB) z\n"));

        let reparsed = parse(&text);
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed[0].options[0].text, "x\n\ny");
        assert!(reparsed[0].same_content(&questions[0]));
    }

    #[test]
    fn test_export_empty() {
        assert_eq!(export_text(&[]), "");
    }

    #[test]
    fn test_attempt_record() {
        let mut exam = Exam::new("Arithmetic", parse(SAMPLE));
        exam.id = Some("arith".to_string());
        let mut submission = Submission::new();
        submission.select(0, [Label::try_from('B').unwrap()].into_iter().collect());
        let report = grade(&exam.questions, &submission, &ScoringConfig::default());
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let record = AttemptRecord::new(&exam, &report, None, Student::default(), timestamp);
        assert_eq!(record.correct, 1);
        assert_eq!(record.total, 2);
        assert_eq!(record.percent, 50);
        assert_eq!(record.details[0].selected, "B");
        assert_eq!(record.details[1].status, ResultStatus::Unanswered);
        assert_eq!(record.details[1].correct, "A & C");
        assert_eq!(record.file_name(), "results-arith-2024-01-02T03-04-05Z.json");

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("student").is_none());
        assert_eq!(json["details"][1]["status"], "unanswered");
    }
}
