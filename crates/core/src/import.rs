//! JSON exam import
//!
//! Accepts both the serde shape of [`Exam`] and the looser shape older exam
//! files use (`text` instead of `stem`, options as plain strings, `answer` as
//! a zero-based index or a letter string). Every question goes through the
//! same validation as parsed text, so invalid ones are dropped the same way.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::block::{match_option, parse_answer, RawQuestion};
use crate::model::{build_question, Exam, ExamMeta, Label, LabelSet, Question};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unrecognized exam file: {0}")]
    Shape(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionEntry {
    Text(String),
    Labelled { label: String, text: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswerEntry {
    Index(usize),
    Text(String),
    Many(Vec<AnswerEntry>),
}

#[derive(Debug, Deserialize)]
struct QuestionEntry {
    #[serde(default, alias = "stem")]
    text: String,
    #[serde(default)]
    options: Vec<OptionEntry>,
    #[serde(default, alias = "correct")]
    answer: Option<AnswerEntry>,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExamEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    meta: ExamMeta,
    #[serde(default)]
    questions: Vec<QuestionEntry>,
}

/// Label and text for the option at `position`.
///
/// A labelled entry keeps its own label; a plain string keeps the label it
/// starts with only when that matches its position (`"B) Lyon"` at `B`
/// becomes `"Lyon"`).
fn option_entry(entry: OptionEntry, position: Label) -> (Label, String) {
    match entry {
        OptionEntry::Text(text) => match match_option(&text) {
            Some((label, rest)) if label == position => (position, rest.to_string()),
            _ => (position, text),
        },
        OptionEntry::Labelled { label, text } => match Label::try_from(label.as_str()) {
            Ok(label) => (label, text),
            Err(_) => {
                log::debug!("option {position}: unusable label {label:?}");
                (position, text)
            }
        },
    }
}

/// Resolve an answer against the options in file order. Indexes pick the
/// option at that position; letters are matched against the options' labels.
fn resolve_answer(entry: &AnswerEntry, options: &[(Label, String)], out: &mut LabelSet) {
    match entry {
        AnswerEntry::Index(index) => {
            if let Some((label, _)) = options.get(*index) {
                out.insert(*label);
            }
        }
        AnswerEntry::Text(text) => {
            let available: LabelSet = options.iter().map(|(label, _)| *label).collect();
            out.extend(parse_answer(text, &available));
        }
        AnswerEntry::Many(entries) => {
            for entry in entries {
                resolve_answer(entry, options, out);
            }
        }
    }
}

fn convert_question(entry: QuestionEntry, position: usize) -> Option<Question> {
    let mut options: Vec<(Label, String)> = entry
        .options
        .into_iter()
        .take(26)
        .enumerate()
        .filter_map(|(i, option)| Label::from_index(i).map(|label| option_entry(option, label)))
        .collect();

    let labels: LabelSet = options.iter().map(|(label, _)| *label).collect();
    if labels.len() != options.len() {
        log::debug!(
            "question {}: repeated option labels, using file order",
            position + 1
        );
        for (i, (label, _)) in options.iter_mut().enumerate() {
            if let Some(positional) = Label::from_index(i) {
                *label = positional;
            }
        }
    }

    let mut answer = LabelSet::new();
    if let Some(entry) = &entry.answer {
        resolve_answer(entry, &options, &mut answer);
    }

    options.sort_by_key(|(label, _)| *label);

    build_question(
        RawQuestion {
            stem: entry.text,
            options,
            answer_raw: String::new(),
            answer,
            explanation: entry.explanation.unwrap_or_default(),
        },
        position,
    )
}

fn convert_exam(entry: ExamEntry) -> Exam {
    let mut questions = Vec::with_capacity(entry.questions.len());
    for question in entry.questions {
        if let Some(q) = convert_question(question, questions.len()) {
            questions.push(q);
        }
    }
    Exam {
        id: entry.id,
        meta: entry.meta,
        questions,
    }
}

fn exam_from_value(value: Value) -> Result<Exam, ImportError> {
    let entry: ExamEntry = serde_json::from_value(value)?;
    Ok(convert_exam(entry))
}

/// Import a single exam from JSON.
pub fn import_exam(json: &str) -> Result<Exam, ImportError> {
    let value: Value = serde_json::from_str(json)?;
    if !value.get("questions").is_some_and(Value::is_array) {
        return Err(ImportError::Shape(
            "expected an object with a \"questions\" array".to_string(),
        ));
    }
    exam_from_value(value)
}

/// Import every exam in a library export.
///
/// Accepts an array of exams, an object keyed by exam id (the key fills in a
/// missing `id`), or a single exam object.
pub fn import_library(json: &str) -> Result<Vec<Exam>, ImportError> {
    let value: Value = serde_json::from_str(json)?;
    if value.get("questions").is_some_and(Value::is_array) {
        return Ok(vec![exam_from_value(value)?]);
    }

    match value {
        Value::Array(items) => items.into_iter().map(exam_from_value).collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, item)| {
                let mut exam = exam_from_value(item)?;
                if exam.id.is_none() {
                    exam.id = Some(key);
                }
                Ok(exam)
            })
            .collect(),
        other => Err(ImportError::Shape(format!(
            "expected an exam object or a list of exams, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
