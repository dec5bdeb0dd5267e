use colored::Colorize;
use smartexam_core::grade::{ResultStatus, ScoreSummary};
use smartexam_core::model::join_labels;
use smartexam_core::store::SavedExamMeta;
use smartexam_core::{GradeReport, Question};

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() <= max_chars && first_line.len() == text.len() {
        return text.to_string();
    }
    let cut: String = first_line.chars().take(max_chars).collect();
    format!("{cut}...")
}

fn header(title: &str) -> String {
    let mut result = String::new();
    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!("{}\n", title.to_uppercase().bright_cyan().bold()));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));
    result
}

/// One question with its options, numbered by display position.
///
/// With `reveal` the correct options are marked and the explanation shown.
pub fn format_question(number: usize, question: &Question, reveal: bool) -> String {
    let mut result = String::new();

    let mut title = format!("[{number}]").yellow().bold().to_string();
    if question.is_multi_answer() {
        title.push_str(&format!(" {}", "(select all that apply)".dimmed()));
    }
    if question.flagged {
        title.push_str(&format!(" {}", "flagged".magenta()));
    }
    result.push_str(&format!("\n{title}\n{}\n", question.stem.white().bold()));

    for option in &question.options {
        let line = format!("  {}) {}", option.label, option.text.replace('\n', "\n     "));
        if reveal && question.correct.contains(&option.label) {
            result.push_str(&format!("{}\n", line.green()));
        } else {
            result.push_str(&format!("{line}\n"));
        }
    }

    if reveal {
        result.push_str(&format!(
            "  {} {}\n",
            "Answer:".bright_black(),
            join_labels(&question.correct).green()
        ));
        if !question.explanation.is_empty() {
            result.push_str(&format!(
                "  {} {}\n",
                "Explanation:".bright_black(),
                question.explanation
            ));
        }
    }

    result
}

/// Every question of an exam under a title header.
pub fn format_questions(title: &str, questions: &[Question], reveal: bool) -> String {
    let mut result = header(title);

    if questions.is_empty() {
        result.push_str(&format!("\n{}\n", "No questions.".yellow()));
        return result;
    }

    for (idx, question) in questions.iter().enumerate() {
        result.push_str(&format_question(idx + 1, question, reveal));
    }
    result.push('\n');
    result
}

fn status_text(status: ResultStatus) -> String {
    match status {
        ResultStatus::Correct => "correct".green().to_string(),
        ResultStatus::Wrong => "wrong".red().to_string(),
        ResultStatus::Unanswered => "unanswered".yellow().to_string(),
    }
}

/// Score line, e.g. `Score: 3/4 (75%) PASS`.
pub fn format_summary(summary: &ScoreSummary) -> String {
    let mut result = format!(
        "{} {}/{} ({}%)",
        "Score:".bold(),
        summary.correct,
        summary.total,
        summary.percent
    );

    match summary.passed {
        Some(true) => result.push_str(&format!(" {}", "PASS".green().bold())),
        Some(false) => result.push_str(&format!(" {}", "FAIL".red().bold())),
        None => {}
    }

    if summary.raw_score != summary.correct as f64 {
        result.push_str(&format!(
            "\n{} {:.2} after negative marking",
            "Raw score:".bright_black(),
            summary.raw_score
        ));
    }

    result.push_str(&format!(
        "\n{} correct, {} wrong, {} unanswered",
        summary.correct.to_string().green(),
        summary.wrong.to_string().red(),
        summary.unanswered.to_string().yellow()
    ));

    result
}

/// Per-question result table.
pub fn report_table(report: &GradeReport) -> prettytable::Table {
    let mut table = crate::prelude::new_table();
    table.set_titles(prettytable::row!["#", "Question", "Selected", "Correct", "Status"]);

    for result in &report.results {
        let selected = if result.selected.is_empty() {
            "-".to_string()
        } else {
            join_labels(&result.selected)
        };
        table.add_row(prettytable::row![
            result.index + 1,
            truncate_text(&result.question.stem, 48),
            selected,
            join_labels(&result.question.correct),
            status_text(result.status())
        ]);
    }

    table
}

/// Full report: title, table, wrong-answer explanations, score.
pub fn format_report(title: &str, report: &GradeReport) -> String {
    let mut result = header(&format!("{title} - Results"));
    result.push('\n');
    result.push_str(&report_table(report).to_string());

    let explained: Vec<_> = report
        .results
        .iter()
        .filter(|r| !r.is_correct && !r.question.explanation.is_empty())
        .collect();
    if !explained.is_empty() {
        result.push_str(&format!("\n{}\n", "Explanations".bold()));
        for r in explained {
            result.push_str(&format!(
                "  {} {}\n",
                format!("[{}]", r.index + 1).yellow(),
                r.question.explanation
            ));
        }
    }

    result.push('\n');
    result.push_str(&format_summary(&report.summary));
    result.push('\n');
    result
}

/// Saved-exam listing.
pub fn saved_table(exams: &[SavedExamMeta]) -> prettytable::Table {
    let mut table = crate::prelude::new_table();
    table.set_titles(prettytable::row!["ID", "Title", "Questions", "Saved"]);

    for meta in exams {
        table.add_row(prettytable::row![
            meta.id,
            truncate_text(&meta.title, 40),
            meta.count,
            meta.created_at.format("%Y-%m-%d %H:%M")
        ]);
    }

    table
}
