use crate::prelude::{eprintln, println, *};
use crate::source::{load_exam_file, LoadedExam};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, clap::Args, Clone)]
pub struct ParseOptions {
    /// Exam file (canonical text or JSON)
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Mark correct options and show explanations
    #[arg(long)]
    pub answers: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ParseOptions, global: crate::Global) -> Result<()> {
    let loaded = load_exam_file(&options.path).await?;

    if global.verbose {
        eprintln!(
            "{} question blocks found, {} dropped",
            loaded.headers_found, loaded.blocks_dropped
        );
    }

    if options.json {
        println!("{}", format_parse_json(&loaded)?);
    } else {
        print!("{}", format_parse_text(&loaded, options.answers));
    }

    Ok(())
}

fn format_parse_json(loaded: &LoadedExam) -> Result<String> {
    to_json(&loaded.exam)
}

fn format_parse_text(loaded: &LoadedExam, reveal: bool) -> String {
    let mut result =
        crate::render::format_questions(&loaded.exam.meta.title, &loaded.exam.questions, reveal);

    result.push_str(&format!(
        "{} {} question(s) parsed\n",
        "Parsed:".bold(),
        loaded.exam.len()
    ));
    if loaded.blocks_dropped > 0 {
        result.push_str(&format!(
            "{}\n",
            format!(
                "{} of {} question blocks produced no valid question and were skipped",
                loaded.blocks_dropped, loaded.headers_found
            )
            .yellow()
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::exam_from_content;
    use std::path::Path;

    fn load(text: &str) -> LoadedExam {
        exam_from_content(Path::new("sample.txt"), text).unwrap()
    }

    #[test]
    fn test_format_parse_text_reports_dropped() {
        colored::control::set_override(false);
        let loaded = load("Q1: a\nA) x\nB) y\nAnswer: A\n\nQ2: b\nA) only\nAnswer: A\n");
        let formatted = format_parse_text(&loaded, false);
        assert!(formatted.contains("SAMPLE"));
        assert!(formatted.contains("Parsed: 1 question(s) parsed"));
        assert!(formatted.contains("1 of 2 question blocks produced no valid question"));
    }

    #[test]
    fn test_format_parse_text_clean() {
        colored::control::set_override(false);
        let loaded = load("Q1: a\nA) x\nB) y\nAnswer: A\n");
        let formatted = format_parse_text(&loaded, true);
        assert!(formatted.contains("Answer: A"));
        assert!(!formatted.contains("were skipped"));
    }

    #[test]
    fn test_format_parse_json() {
        let loaded = load("Q1: a\nA) x\nB) y\nAnswer: B\nExplanation: because\n");
        let json = format_parse_json(&loaded).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["title"], "sample");
        assert_eq!(parsed["questions"][0]["id"], "q-1");
        assert_eq!(parsed["questions"][0]["correct"][0], "B");
        assert_eq!(parsed["questions"][0]["explanation"], "because");
    }
}
