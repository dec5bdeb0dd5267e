use crate::prelude::{eprintln, *};
use crate::settings::ShuffleArgs;
use crate::source::load_exam;
use smartexam_core::export::export_text;
use smartexam_core::Exam;
use std::path::PathBuf;

#[derive(Debug, clap::Args, Clone)]
pub struct ExportOptions {
    /// Exam file (canonical text or JSON)
    #[arg(value_name = "FILE", required_unless_present = "saved")]
    pub path: Option<PathBuf>,

    /// Export a saved exam instead of a file
    #[arg(long, conflicts_with = "path")]
    pub saved: Option<String>,

    #[command(flatten)]
    pub shuffle: ShuffleArgs,

    /// Output the exam as JSON instead of canonical text
    #[arg(long)]
    pub json: bool,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(options: ExportOptions, global: crate::Global) -> Result<()> {
    let (mut exam, _) =
        load_exam(options.path.as_deref(), options.saved.as_deref(), &global).await?;

    exam.questions = options.shuffle.apply(&exam.questions);

    let rendered = if options.json {
        format_export_json(&exam)?
    } else {
        export_text(&exam.questions)
    };

    match &options.output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if global.verbose {
                eprintln!("Wrote {} question(s) to {}", exam.len(), path.display());
            }
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn format_export_json(exam: &Exam) -> Result<String> {
    let mut json = to_json(exam)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartexam_core::import::import_exam;
    use smartexam_core::parse;

    #[test]
    fn test_format_export_json_reimports() {
        let exam = Exam::new("Quiz", parse("Q1: a\nA) x\nB) y\nC) z\nAnswer: A & C\n"));
        let json = format_export_json(&exam).unwrap();
        let back = import_exam(&json).unwrap();
        assert_eq!(back.meta.title, "Quiz");
        assert!(back.questions[0].same_content(&exam.questions[0]));
    }

    #[test]
    fn test_shuffled_export_still_reparses() {
        let questions = parse("Q1: a\nA) x\nB) y\nC) z\nAnswer: B\n\nQ2: b\nA) 1\nB) 2\nAnswer: A\n");
        let shuffle = ShuffleArgs {
            shuffle_questions: true,
            shuffle_options: true,
            seed: Some(3),
        };
        let shuffled = shuffle.apply(&questions);
        let reparsed = parse(&export_text(&shuffled));
        assert_eq!(reparsed.len(), 2);
        for question in &reparsed {
            let original = questions.iter().find(|q| q.stem == question.stem).unwrap();
            assert_eq!(question.correct_texts(), original.correct_texts());
        }
    }
}
