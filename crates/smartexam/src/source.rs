use crate::prelude::*;
use smartexam_core::import::import_exam;
use smartexam_core::{parse_with_report, store, Exam};
use std::path::Path;

/// An exam read from disk, with the parse bookkeeping when it came from text.
#[derive(Debug, Clone)]
pub struct LoadedExam {
    pub exam: Exam,
    pub headers_found: usize,
    pub blocks_dropped: usize,
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn default_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Exam")
        .to_string()
}

/// Turn file contents into an exam. JSON files go through the importer,
/// everything else through the text parser.
pub fn exam_from_content(path: &Path, content: &str) -> Result<LoadedExam> {
    let display = path.display().to_string();

    if is_json(path) {
        let mut exam =
            import_exam(content).with_context(|| format!("Failed to import {display}"))?;
        if exam.meta.title.is_empty() {
            exam.meta.title = default_title(path);
        }
        if exam.is_empty() {
            return Err(eyre!("{display} contains no valid questions"));
        }
        let count = exam.len();
        return Ok(LoadedExam {
            exam,
            headers_found: count,
            blocks_dropped: 0,
        });
    }

    let report = parse_with_report(content);
    if report.is_unparseable() {
        return Err(Error::Unparseable(display).into());
    }
    if report.questions.is_empty() {
        return Err(Error::NoValidQuestions {
            path: display,
            headers: report.headers_found,
        }
        .into());
    }

    Ok(LoadedExam {
        exam: Exam::new(default_title(path), report.questions),
        headers_found: report.headers_found,
        blocks_dropped: report.blocks_dropped,
    })
}

/// Read and parse an exam file.
pub async fn load_exam_file(path: &Path) -> Result<LoadedExam> {
    log::info!("loading exam from {}", path.display());

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    exam_from_content(path, &content)
}

/// Load an exam either from a file or from the saved library.
pub async fn load_exam(
    path: Option<&Path>,
    saved: Option<&str>,
    global: &crate::Global,
) -> Result<(Exam, Option<String>)> {
    match (path, saved) {
        (_, Some(id)) => {
            let dir = crate::settings::library_dir(global)?;
            let exam = store::load_exam(&dir, id)?;
            Ok((exam, Some(id.to_string())))
        }
        (Some(path), None) => Ok((load_exam_file(path).await?.exam, None)),
        (None, None) => Err(eyre!("Provide an exam file or --saved <ID>")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_from_text() {
        let loaded = exam_from_content(
            Path::new("quiz/capitals.txt"),
            "Q1: Capital of France?\nA) Paris\nB) Lyon\nAnswer: A\n\nQ2: broken\nAnswer: A\n",
        )
        .unwrap();
        assert_eq!(loaded.exam.meta.title, "capitals");
        assert_eq!(loaded.exam.len(), 1);
        assert_eq!(loaded.headers_found, 2);
        assert_eq!(loaded.blocks_dropped, 1);
    }

    #[test]
    fn test_exam_from_text_without_headers() {
        let err = exam_from_content(Path::new("notes.txt"), "just some notes").unwrap_err();
        assert!(err.to_string().contains("Could not parse any questions"));
    }

    #[test]
    fn test_exam_from_text_with_only_invalid_blocks() {
        let err = exam_from_content(Path::new("bad.txt"), "Q1: no options\nAnswer: A\n")
            .unwrap_err();
        assert!(err.to_string().contains("1 question block(s) found"));
    }

    #[test]
    fn test_exam_from_json() {
        let json = r#"{"questions": [{"text": "2+2?", "options": ["3", "4"], "answer": 1}]}"#;
        let loaded = exam_from_content(Path::new("math.JSON"), json).unwrap();
        assert_eq!(loaded.exam.meta.title, "math");
        assert_eq!(loaded.exam.questions[0].correct_texts(), vec!["4"]);
    }

    #[test]
    fn test_exam_from_json_without_questions() {
        let json = r#"{"title": "Empty", "questions": []}"#;
        assert!(exam_from_content(Path::new("empty.json"), json).is_err());
    }

    #[tokio::test]
    async fn test_load_exam_file_reads_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("geo.txt");
        std::fs::write(&path, "Q1: Capital of Italy?\nA) Rome\nB) Milan\nAnswer: A\n").unwrap();

        let loaded = load_exam_file(&path).await.unwrap();
        assert_eq!(loaded.exam.questions[0].stem, "Capital of Italy?");
    }
}
