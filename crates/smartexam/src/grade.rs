use crate::prelude::{eprintln, println, *};
use crate::settings::{ScoringArgs, ShuffleArgs};
use crate::source::load_exam;
use serde_json::Value;
use smartexam_core::export::export_text;
use smartexam_core::grade::{derive_retest_exam, parse_selection};
use smartexam_core::{grade, Exam, GradeReport, Question, RetestFilter, Submission};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum RetestFilterArg {
    /// Questions answered wrong or left unanswered
    #[default]
    Wrong,
    /// Questions flagged during the attempt
    Flagged,
}

impl From<RetestFilterArg> for RetestFilter {
    fn from(value: RetestFilterArg) -> Self {
        match value {
            RetestFilterArg::Wrong => RetestFilter::Wrong,
            RetestFilterArg::Flagged => RetestFilter::Flagged,
        }
    }
}

#[derive(Debug, clap::Args, Clone)]
pub struct GradeOptions {
    /// Exam file (canonical text or JSON)
    #[arg(value_name = "FILE", required_unless_present = "saved")]
    pub path: Option<PathBuf>,

    /// Grade against a saved exam instead of a file
    #[arg(long, conflicts_with = "path")]
    pub saved: Option<String>,

    /// Submission file: {"0": ["B"], "1": "B & D"} keyed by question index or id
    #[arg(long, value_name = "JSON")]
    pub answers: PathBuf,

    // Answers refer to display order, so pass the same shuffle flags and seed.
    #[command(flatten)]
    pub shuffle: ShuffleArgs,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct RetestOptions {
    #[command(flatten)]
    pub grade: GradeOptions,

    /// Which questions go into the retest
    #[arg(long, value_enum, default_value_t = RetestFilterArg::Wrong)]
    pub filter: RetestFilterArg,
}

pub async fn run(options: GradeOptions, global: crate::Global) -> Result<()> {
    let (exam, report) = grade_submission(&options, &global).await?;

    if options.json {
        println!("{}", format_report_json(&report)?);
    } else {
        print!("{}", crate::render::format_report(&exam.meta.title, &report));
    }

    Ok(())
}

pub async fn run_retest(options: RetestOptions, global: crate::Global) -> Result<()> {
    let (exam, report) = grade_submission(&options.grade, &global).await?;
    let filter = RetestFilter::from(options.filter);

    let Some(retest) = derive_retest_exam(&exam, &report, filter) else {
        eprintln!("No questions to retest ({}).", filter.describe());
        return Ok(());
    };

    if global.verbose {
        eprintln!("{}: {}", retest.meta.title, retest.meta.description);
    }

    if options.grade.json {
        println!("{}", to_json(&retest)?);
    } else {
        print!("{}", export_text(&retest.questions));
    }

    Ok(())
}

async fn grade_submission(
    options: &GradeOptions,
    global: &crate::Global,
) -> Result<(Exam, GradeReport)> {
    let (mut exam, _) =
        load_exam(options.path.as_deref(), options.saved.as_deref(), global).await?;
    exam.questions = options.shuffle.apply(&exam.questions);

    let submission = read_answers_file(&options.answers, &exam.questions).await?;
    let config = options.scoring.config(&exam.meta);
    let report = grade(&exam.questions, &submission, &config);

    Ok((exam, report))
}

async fn read_answers_file(path: &Path, questions: &[Question]) -> Result<Submission> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(parse_answers(&content, questions)?)
}

fn question_index(key: &str, questions: &[Question]) -> Option<usize> {
    match key.trim().parse::<usize>() {
        Ok(index) => Some(index),
        Err(_) => questions.iter().position(|q| q.id.as_str() == key),
    }
}

fn selection_text(value: &Value) -> std::result::Result<String, Error> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => parts.push(s.clone()),
                    other => {
                        return Err(Error::InvalidAnswers(format!(
                            "expected option letters, found {other}"
                        )))
                    }
                }
            }
            Ok(parts.join(","))
        }
        other => Err(Error::InvalidAnswers(format!(
            "expected a string or a list of strings, found {other}"
        ))),
    }
}

/// Read a submission keyed by zero-based question index (or question id).
///
/// Accepts either the bare map or `{"answers": {...}, "flagged": [..]}`.
/// Values are option letters in any form an answer line accepts.
pub fn parse_answers(json: &str, questions: &[Question]) -> std::result::Result<Submission, Error> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| Error::InvalidAnswers(e.to_string()))?;

    let (answers, flagged) = match &value {
        Value::Object(map) if map.contains_key("answers") => {
            (map.get("answers").cloned(), map.get("flagged").cloned())
        }
        Value::Object(_) => (Some(value.clone()), None),
        _ => {
            return Err(Error::InvalidAnswers(
                "expected an object keyed by question".to_string(),
            ))
        }
    };

    let mut submission = Submission::new();

    if let Some(Value::Object(map)) = answers {
        for (key, value) in &map {
            let Some(index) = question_index(key, questions) else {
                return Err(Error::InvalidAnswers(format!("unknown question {key:?}")));
            };
            let Some(question) = questions.get(index) else {
                log::warn!(
                    "ignoring answer for question {index}: exam has {} questions",
                    questions.len()
                );
                continue;
            };
            let selected = parse_selection(&selection_text(value)?, question);
            submission.select(index, selected);
        }
    }

    if let Some(Value::Array(items)) = flagged {
        for item in items {
            let index = match &item {
                Value::Number(n) => n.as_u64().map(|n| n as usize),
                Value::String(s) => question_index(s, questions),
                _ => None,
            };
            match index {
                Some(index) if index < questions.len() => submission.flag(index),
                _ => log::warn!("ignoring flag {item}"),
            }
        }
    }

    Ok(submission)
}

fn format_report_json(report: &GradeReport) -> Result<String> {
    to_json(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartexam_core::{parse, Label, LabelSet, ScoringConfig};

    const SAMPLE: &str = "\
Q1: 2+2=?
A) 3
B) 4
Answer: B

Q2: Pick the primes
A) 2
B) 4
C) 5
D) 9
Answer: A & C

Q3: Capital of France?
A) Paris
B) Lyon
Answer: A
";

    fn labels(chars: &[char]) -> LabelSet {
        chars.iter().map(|c| Label::try_from(*c).unwrap()).collect()
    }

    #[test]
    fn test_parse_answers_bare_map() {
        let questions = parse(SAMPLE);
        let submission =
            parse_answers(r#"{"0": ["b"], "1": "A & C", "2": null}"#, &questions).unwrap();
        assert_eq!(submission.selected(0), labels(&['B']));
        assert_eq!(submission.selected(1), labels(&['A', 'C']));
        assert!(submission.selected(2).is_empty());
    }

    #[test]
    fn test_parse_answers_wrapped_with_flags() {
        let questions = parse(SAMPLE);
        let submission = parse_answers(
            r#"{"answers": {"q-2": ["A", "C"]}, "flagged": [0, "q-3", 99]}"#,
            &questions,
        )
        .unwrap();
        assert_eq!(submission.selected(1), labels(&['A', 'C']));
        assert!(submission.flagged.contains(&0));
        assert!(submission.flagged.contains(&2));
        assert_eq!(submission.flagged.len(), 2);
    }

    #[test]
    fn test_parse_answers_drops_unknown_letters() {
        let questions = parse(SAMPLE);
        let submission = parse_answers(r#"{"2": "Z"}"#, &questions).unwrap();
        assert!(submission.selected(2).is_empty());
    }

    #[test]
    fn test_parse_answers_rejects_bad_shapes() {
        let questions = parse(SAMPLE);
        assert!(parse_answers("[]", &questions).is_err());
        assert!(parse_answers(r#"{"nope": "A"}"#, &questions).is_err());
        assert!(parse_answers(r#"{"0": 1}"#, &questions).is_err());
        assert!(parse_answers("not json", &questions).is_err());
    }

    #[test]
    fn test_format_report_json() {
        let questions = parse(SAMPLE);
        let submission = parse_answers(r#"{"0": "B", "1": "A"}"#, &questions).unwrap();
        let report = grade(&questions, &submission, &ScoringConfig::default());
        let json = format_report_json(&report).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["summary"]["correct"], 1);
        assert_eq!(parsed["summary"]["wrong"], 1);
        assert_eq!(parsed["summary"]["unanswered"], 1);
        assert_eq!(parsed["summary"]["percent"], 33);
    }

    #[test]
    fn test_retest_filter_arg_maps_to_core() {
        assert_eq!(RetestFilter::from(RetestFilterArg::Wrong), RetestFilter::Wrong);
        assert_eq!(
            RetestFilter::from(RetestFilterArg::Flagged),
            RetestFilter::Flagged
        );
    }
}
