use crate::prelude::{eprintln, println, *};
use crate::settings::library_dir;
use crate::source::load_exam_file;
use chrono::Utc;
use colored::Colorize;
use smartexam_core::export::AttemptRecord;
use smartexam_core::import::import_library;
use smartexam_core::store::{self, SavedExamMeta};
use smartexam_core::Exam;
use std::path::{Path, PathBuf};

#[derive(Debug, clap::Parser)]
#[command(name = "saved")]
#[command(about = "Manage the saved-exam library")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List saved exams
    #[clap(name = "list")]
    List(ListOptions),

    /// Save an exam file to the library
    #[clap(name = "save")]
    Save(SaveOptions),

    /// Show a saved exam and its last attempt
    #[clap(name = "show")]
    Show(ShowOptions),

    /// Delete a saved exam
    #[clap(name = "delete")]
    Delete(IdOptions),

    /// Delete every saved exam
    #[clap(name = "clear")]
    Clear(ClearOptions),

    /// Export the whole library as one JSON file
    #[clap(name = "export")]
    Export(ExportOptions),

    /// Import exams from a library export or exam JSON file
    #[clap(name = "import")]
    Import(ImportOptions),

    /// List recorded attempts
    #[clap(name = "history")]
    History(ListOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct SaveOptions {
    /// Exam file (canonical text or JSON)
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Preferred id; made unique within the library
    #[arg(long)]
    pub id: Option<String>,

    /// Exam title (defaults to the file name)
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Time limit in minutes used by `take`
    #[arg(long)]
    pub duration: Option<u32>,

    /// Percent needed to pass (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub pass_mark: Option<u8>,

    /// Points subtracted for each wrong answer
    #[arg(long)]
    pub negative_marking: Option<f64>,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ShowOptions {
    /// Saved exam id
    pub id: String,

    /// Mark correct options and show explanations
    #[arg(long)]
    pub answers: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct IdOptions {
    /// Saved exam id
    pub id: String,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ClearOptions {
    /// Confirm deleting every saved exam
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ExportOptions {
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ImportOptions {
    /// JSON file with one exam, a list of exams or an id-keyed export
    #[arg(value_name = "FILE")]
    pub path: PathBuf,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let dir = library_dir(&global)?;

    if global.verbose {
        eprintln!("Library: {}", dir.display());
    }

    match app.command {
        Commands::List(options) => list(&dir, options),
        Commands::Save(options) => save(&dir, options).await,
        Commands::Show(options) => show(&dir, options),
        Commands::Delete(options) => {
            store::delete_exam(&dir, &options.id)?;
            println!("Deleted {}", options.id.bold());
            Ok(())
        }
        Commands::Clear(options) => {
            if !options.yes {
                return Err(Error::NotConfirmed("clear the library".to_string()).into());
            }
            let removed = store::clear_exams(&dir)?;
            println!("Deleted {removed} saved exam(s)");
            Ok(())
        }
        Commands::Export(options) => export(&dir, options).await,
        Commands::Import(options) => import(&dir, options).await,
        Commands::History(options) => history(&dir, options),
    }
}

fn list(dir: &Path, options: ListOptions) -> Result<()> {
    let exams = store::list_exams(dir)?;

    if options.json {
        println!("{}", to_json(&exams)?);
    } else {
        print!("{}", format_saved_list(&exams));
    }

    Ok(())
}

fn apply_save_options(exam: &mut Exam, options: &SaveOptions) {
    if let Some(title) = &options.title {
        exam.meta.title = title.clone();
    }
    if let Some(description) = &options.description {
        exam.meta.description = description.clone();
    }
    if options.duration.is_some() {
        exam.meta.duration_minutes = options.duration;
    }
    if options.pass_mark.is_some() {
        exam.meta.pass_mark = options.pass_mark;
    }
    if options.negative_marking.is_some() {
        exam.meta.negative_marking = options.negative_marking;
    }
}

async fn save(dir: &Path, options: SaveOptions) -> Result<()> {
    let mut exam = load_exam_file(&options.path).await?.exam;
    apply_save_options(&mut exam, &options);

    let id = store::save_exam(dir, &exam, options.id.as_deref(), Utc::now())?;
    println!(
        "Saved {} ({} question(s)) as {}",
        exam.meta.title,
        exam.len(),
        id.bold()
    );
    Ok(())
}

fn show(dir: &Path, options: ShowOptions) -> Result<()> {
    let exam = store::load_exam(dir, &options.id)?;
    let last = store::last_attempt(dir, &options.id)?;

    if options.json {
        let value = serde_json::json!({ "exam": exam, "last_attempt": last });
        println!("{}", to_json(&value)?);
        return Ok(());
    }

    print!(
        "{}",
        crate::render::format_questions(&exam.meta.title, &exam.questions, options.answers)
    );
    if !exam.meta.description.is_empty() {
        println!("{}", exam.meta.description.dimmed());
    }
    if let Some(attempt) = last {
        println!("{}", format_attempt_line(&attempt));
    }
    Ok(())
}

async fn export(dir: &Path, options: ExportOptions) -> Result<()> {
    let json = store::export_library(dir)?;

    match &options.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported library to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn import(dir: &Path, options: ImportOptions) -> Result<()> {
    let content = tokio::fs::read_to_string(&options.path)
        .await
        .with_context(|| format!("Failed to read {}", options.path.display()))?;

    let exams = import_library(&content)
        .with_context(|| format!("Failed to import {}", options.path.display()))?;

    let now = Utc::now();
    let mut imported = 0;
    for exam in exams {
        if exam.is_empty() {
            log::warn!("skipping {:?}: no valid questions", exam.meta.title);
            continue;
        }
        let id = store::save_exam(dir, &exam, None, now)?;
        println!("Imported {} as {}", exam.meta.title, id.bold());
        imported += 1;
    }

    if imported == 0 {
        return Err(eyre!("No exams with valid questions in {}", options.path.display()));
    }
    Ok(())
}

fn history(dir: &Path, options: ListOptions) -> Result<()> {
    let attempts = store::list_attempts(dir)?;

    if options.json {
        println!("{}", to_json(&attempts)?);
        return Ok(());
    }

    if attempts.is_empty() {
        println!("{}", "No attempts recorded yet.".yellow());
    }
    for attempt in &attempts {
        println!("{}", format_attempt_line(attempt));
    }
    Ok(())
}

fn format_saved_list(exams: &[SavedExamMeta]) -> String {
    if exams.is_empty() {
        return format!(
            "{}\n{}\n",
            "No saved exams.".yellow(),
            "Save one with: smartexam saved save <FILE>".cyan()
        );
    }
    let mut result = crate::render::saved_table(exams).to_string();
    result.push_str(&format!(
        "\n{}\n",
        "Take one with: smartexam take --saved <ID>".cyan()
    ));
    result
}

fn format_attempt_line(attempt: &AttemptRecord) -> String {
    let mut line = format!(
        "{} {} {}/{} ({}%)",
        attempt.timestamp.format("%Y-%m-%d %H:%M").to_string().bright_black(),
        attempt.title,
        attempt.correct,
        attempt.total,
        attempt.percent
    );
    match attempt.passed {
        Some(true) => line.push_str(&format!(" {}", "PASS".green())),
        Some(false) => line.push_str(&format!(" {}", "FAIL".red())),
        None => {}
    }
    if let Some(name) = &attempt.student.name {
        line.push_str(&format!(" - {name}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use smartexam_core::export::Student;
    use smartexam_core::{grade, parse, ScoringConfig, Submission};

    fn save_options() -> SaveOptions {
        SaveOptions {
            path: PathBuf::from("quiz.txt"),
            id: None,
            title: None,
            description: None,
            duration: None,
            pass_mark: None,
            negative_marking: None,
        }
    }

    #[test]
    fn test_apply_save_options() {
        let mut exam = Exam::new("quiz", parse("Q1: a\nA) x\nB) y\nAnswer: A\n"));
        let options = SaveOptions {
            title: Some("Final Quiz".to_string()),
            duration: Some(30),
            pass_mark: Some(70),
            ..save_options()
        };
        apply_save_options(&mut exam, &options);
        assert_eq!(exam.meta.title, "Final Quiz");
        assert_eq!(exam.meta.duration_minutes, Some(30));
        assert_eq!(exam.meta.pass_mark, Some(70));
        assert_eq!(exam.meta.negative_marking, None);
    }

    #[test]
    fn test_format_saved_list_empty() {
        colored::control::set_override(false);
        let formatted = format_saved_list(&[]);
        assert!(formatted.contains("No saved exams."));
        assert!(formatted.contains("smartexam saved save <FILE>"));
    }

    #[test]
    fn test_format_attempt_line() {
        colored::control::set_override(false);
        let mut exam = Exam::new("Geo", parse("Q1: a\nA) x\nB) y\nAnswer: A\n"));
        exam.meta.pass_mark = Some(50);
        let config = ScoringConfig::from_meta(&exam.meta);
        let report = grade(&exam.questions, &Submission::new(), &config);
        let attempt = AttemptRecord::new(
            &exam,
            &report,
            None,
            Student {
                name: Some("Ada".to_string()),
                id: None,
            },
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        );
        assert_eq!(
            format_attempt_line(&attempt),
            "2024-01-02 03:04 Geo 0/1 (0%) FAIL - Ada"
        );
    }

    #[test]
    fn test_show_reads_saved_exam() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let exam = Exam::new("Geo", parse("Q1: a\nA) x\nB) y\nAnswer: A\n"));
        let id = store::save_exam(temp_dir.path(), &exam, None, Utc::now()).unwrap();

        let options = ShowOptions {
            id,
            answers: false,
            json: true,
        };
        assert!(show(temp_dir.path(), options).is_ok());

        let missing = ShowOptions {
            id: "missing".to_string(),
            answers: false,
            json: false,
        };
        assert!(show(temp_dir.path(), missing).is_err());
    }
}
