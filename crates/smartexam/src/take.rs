use crate::prelude::{println, *};
use crate::settings::{library_dir, ScoringArgs, ShuffleArgs};
use crate::source::load_exam;
use chrono::Utc;
use colored::Colorize;
use smartexam_core::export::{AttemptRecord, Student};
use smartexam_core::grade::{derive_retest_exam, parse_selection};
use smartexam_core::{grade, store, Exam, GradeReport, Question, RetestFilter, Submission};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, clap::Args, Clone)]
pub struct TakeOptions {
    /// Exam file (canonical text or JSON)
    #[arg(value_name = "FILE", required_unless_present = "saved")]
    pub path: Option<PathBuf>,

    /// Take a saved exam instead of a file
    #[arg(long, conflicts_with = "path")]
    pub saved: Option<String>,

    #[command(flatten)]
    pub shuffle: ShuffleArgs,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Time limit in minutes; unanswered questions stay unanswered when it runs out
    #[arg(long, env = "SMARTEXAM_DURATION")]
    pub duration: Option<u32>,

    /// Student name stored with the attempt
    #[arg(long)]
    pub name: Option<String>,

    /// Student id stored with the attempt
    #[arg(long)]
    pub student_id: Option<String>,

    /// Do not record the attempt in the library
    #[arg(long)]
    pub no_record: bool,
}

/// What one line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answer { input: String, flag: bool },
    Quit,
}

/// Read one reply. `!` in front flags the question, `:q` ends the attempt.
pub fn parse_reply(line: &str) -> Reply {
    let line = line.trim();
    if line.eq_ignore_ascii_case(":q") {
        return Reply::Quit;
    }
    match line.strip_prefix('!') {
        Some(rest) => Reply::Answer {
            input: rest.trim().to_string(),
            flag: true,
        },
        None => Reply::Answer {
            input: line.to_string(),
            flag: false,
        },
    }
}

/// Terminal session state for one attempt.
pub struct Session<R, W> {
    input: R,
    output: W,
    deadline: Option<Instant>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, deadline: Option<Instant>) -> Self {
        Session {
            input,
            output,
            deadline,
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        Ok((read > 0).then_some(line))
    }

    fn time_is_up(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Ask every question in order and collect the submission.
    ///
    /// Stops early on `:q`, end of input or the deadline; the questions not
    /// reached are left unanswered.
    pub fn ask_all(&mut self, questions: &[Question]) -> Result<Submission> {
        let mut submission = Submission::new();
        writeln!(
            self.output,
            "{}",
            "Type letters (B or B,D), empty to skip, ! in front to flag, :q to finish.".dimmed()
        )?;

        'questions: for (index, question) in questions.iter().enumerate() {
            if self.time_is_up() {
                writeln!(self.output, "\n{}", "Time is up.".red().bold())?;
                break;
            }

            write!(
                self.output,
                "{}",
                crate::render::format_question(index + 1, question, false)
            )?;

            loop {
                match self.remaining() {
                    Some(left) => write!(
                        self.output,
                        "{} ",
                        format!("[{}:{:02} left] >", left.as_secs() / 60, left.as_secs() % 60)
                            .cyan()
                    )?,
                    None => write!(self.output, "{} ", ">".cyan())?,
                }
                self.output.flush()?;

                let Some(line) = self.read_line()? else {
                    break 'questions;
                };

                if self.time_is_up() {
                    writeln!(self.output, "\n{}", "Time is up.".red().bold())?;
                    break 'questions;
                }

                let (input, flag) = match parse_reply(&line) {
                    Reply::Quit => break 'questions,
                    Reply::Answer { input, flag } => (input, flag),
                };

                let selected = parse_selection(&input, question);
                if !input.is_empty() && selected.is_empty() {
                    writeln!(
                        self.output,
                        "{}",
                        format!("Not an option here: {input}").yellow()
                    )?;
                    continue;
                }

                if flag {
                    submission.flag(index);
                }
                submission.select(index, selected);
                break;
            }
        }

        Ok(submission)
    }

    /// Ask which retest to run after an attempt. `None` ends the session.
    pub fn ask_retest(&mut self) -> Result<Option<RetestFilter>> {
        write!(
            self.output,
            "\n{} ",
            "Retest [w]rong, [f]lagged, or [q]uit?".bold()
        )?;
        self.output.flush()?;

        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        Ok(match line.trim().to_lowercase().as_str() {
            "w" | "wrong" => Some(RetestFilter::Wrong),
            "f" | "flagged" => Some(RetestFilter::Flagged),
            _ => None,
        })
    }

    pub fn show(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }
}

fn student(options: &TakeOptions) -> Student {
    Student {
        name: options.name.clone(),
        id: options.student_id.clone(),
    }
}

fn record(
    options: &TakeOptions,
    global: &crate::Global,
    exam: &Exam,
    report: &GradeReport,
    saved_id: Option<String>,
) -> Result<()> {
    let dir = library_dir(global)?;
    let attempt = AttemptRecord::new(exam, report, saved_id, student(options), Utc::now());
    store::record_attempt(&dir, &attempt)?;
    log::info!("recorded attempt {} in {}", attempt.file_name(), dir.display());
    Ok(())
}

/// Take `exam`, then keep offering retests until the student quits or
/// nothing is left to retest.
fn run_session(
    options: &TakeOptions,
    global: &crate::Global,
    exam: Exam,
    saved_id: Option<String>,
) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let minutes = options.duration.or(exam.meta.duration_minutes);

    let mut current = exam;
    let mut saved_id = saved_id;

    loop {
        let deadline = minutes.map(|m| Instant::now() + Duration::from_secs(u64::from(m) * 60));
        let mut session = Session::new(stdin.lock(), stdout.lock(), deadline);

        current.questions = options.shuffle.apply(&current.questions);
        let heading = match minutes {
            Some(m) => format!("{} ({m} min)", current.meta.title),
            None => current.meta.title.clone(),
        };
        session.show(&format!("\n{}\n", heading.bright_cyan().bold()))?;

        let submission = session.ask_all(&current.questions)?;
        let config = options.scoring.config(&current.meta);
        let report = grade(&current.questions, &submission, &config);

        session.show(&crate::render::format_report(&current.meta.title, &report))?;

        if !options.no_record {
            if let Err(err) = record(options, global, &current, &report, saved_id.clone()) {
                log::warn!("could not record attempt: {err}");
            }
        }

        let Some(filter) = session.ask_retest()? else {
            return Ok(());
        };

        match derive_retest_exam(&current, &report, filter) {
            Some(retest) => {
                current = retest;
                // Retests are not saved exams; keep their results out of last/<id>.json.
                saved_id = None;
            }
            None => {
                session.show(&format!("No questions to retest ({}).\n", filter.describe()))?;
                return Ok(());
            }
        }
    }
}

pub async fn run(options: TakeOptions, global: crate::Global) -> Result<()> {
    let (exam, saved_id) =
        load_exam(options.path.as_deref(), options.saved.as_deref(), &global).await?;

    if global.verbose {
        println!("{} question(s) loaded", exam.len());
    }

    tokio::task::spawn_blocking(move || run_session(&options, &global, exam, saved_id))
        .await
        .map_err(|e| eyre!("Exam session failed: {}", e))?
}
