//! Saved-exam library
//!
//! Plain-file persistence for exams and attempts. Every function takes the
//! library directory explicitly; nothing here decides where that directory
//! lives.
//!
//! Layout:
//!
//! ```text
//! <dir>/index.json          saved exam metadata, in save order
//! <dir>/exams/<id>.json     one exam per file
//! <dir>/last/<id>.json      last attempt per saved exam
//! <dir>/results.jsonl       every recorded attempt, one JSON object per line
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::AttemptRecord;
use crate::model::Exam;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid library data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Saved exam not found: {0}")]
    NotFound(String),

    #[error("Invalid exam id: {0:?}")]
    InvalidId(String),
}

/// Index entry for one saved exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedExamMeta {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub count: usize,
    pub created_at: DateTime<Utc>,
}

/// Lowercase `s` and turn every run of characters outside `[a-z0-9]` into a
/// single dash, trimming dashes at both ends.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Slug of `base` (or `exam`), suffixed `-2`, `-3`, ... until it is not in `existing`.
pub fn unique_id(base: &str, existing: &[String]) -> String {
    let slug = match slugify(base) {
        s if s.is_empty() => "exam".to_string(),
        s => s,
    };
    if !existing.contains(&slug) {
        return slug;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{slug}-{n}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Ids become file names, so only slug characters are allowed.
fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

fn index_path(dir: &Path) -> PathBuf {
    dir.join("index.json")
}

fn exam_path(dir: &Path, id: &str) -> PathBuf {
    dir.join("exams").join(format!("{id}.json"))
}

fn last_attempt_path(dir: &Path, id: &str) -> PathBuf {
    dir.join("last").join(format!("{id}.json"))
}

fn results_path(dir: &Path) -> PathBuf {
    dir.join("results.jsonl")
}

fn write_index(dir: &Path, index: &[SavedExamMeta]) -> Result<(), StoreError> {
    fs::create_dir_all(dir)?;
    fs::write(index_path(dir), serde_json::to_string_pretty(index)?)?;
    Ok(())
}

/// List saved exams in the order they were saved.
///
/// A missing library directory is an empty library.
pub fn list_exams(dir: &Path) -> Result<Vec<SavedExamMeta>, StoreError> {
    let path = index_path(dir);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Save `exam` and return the id it was stored under.
///
/// The id is derived from `preferred_id`, else the exam's own id, else its
/// title, and made unique within the library. The stored copy carries that id.
pub fn save_exam(
    dir: &Path,
    exam: &Exam,
    preferred_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    let mut index = list_exams(dir)?;
    let existing: Vec<String> = index.iter().map(|m| m.id.clone()).collect();
    let base = preferred_id
        .filter(|s| !s.trim().is_empty())
        .or(exam.id.as_deref())
        .unwrap_or(exam.meta.title.as_str());
    let id = unique_id(base, &existing);

    let mut stored = exam.clone();
    stored.id = Some(id.clone());
    if stored.meta.title.is_empty() {
        stored.meta.title = id.clone();
    }

    let path = exam_path(dir, &id);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(&stored)?)?;

    index.push(SavedExamMeta {
        id: id.clone(),
        title: stored.meta.title.clone(),
        description: stored.meta.description.clone(),
        count: stored.questions.len(),
        created_at: now,
    });
    write_index(dir, &index)?;

    log::debug!("saved exam {} to {}", id, path.display());
    Ok(id)
}

pub fn load_exam(dir: &Path, id: &str) -> Result<Exam, StoreError> {
    validate_id(id)?;
    let path = exam_path(dir, id);
    if !path.exists() {
        return Err(StoreError::NotFound(id.to_string()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Remove a saved exam and its last-attempt record.
pub fn delete_exam(dir: &Path, id: &str) -> Result<(), StoreError> {
    validate_id(id)?;
    let mut index = list_exams(dir)?;
    let before = index.len();
    index.retain(|m| m.id != id);

    let path = exam_path(dir, id);
    if index.len() == before && !path.exists() {
        return Err(StoreError::NotFound(id.to_string()));
    }

    if path.exists() {
        fs::remove_file(path)?;
    }
    let last = last_attempt_path(dir, id);
    if last.exists() {
        fs::remove_file(last)?;
    }
    write_index(dir, &index)
}

/// Delete every saved exam. Returns how many were removed.
pub fn clear_exams(dir: &Path) -> Result<usize, StoreError> {
    let index = list_exams(dir)?;
    for meta in &index {
        delete_exam(dir, &meta.id)?;
    }
    Ok(index.len())
}

/// All saved exams as one JSON object keyed by id.
pub fn export_library(dir: &Path) -> Result<String, StoreError> {
    let mut out: BTreeMap<String, Exam> = BTreeMap::new();
    for meta in list_exams(dir)? {
        match load_exam(dir, &meta.id) {
            Ok(exam) => {
                out.insert(meta.id, exam);
            }
            Err(StoreError::NotFound(id)) => log::warn!("index lists missing exam {}", id),
            Err(err) => return Err(err),
        }
    }
    Ok(serde_json::to_string_pretty(&out)?)
}

/// Append an attempt to the results log, and remember it as the last attempt
/// of its saved exam when it has one.
pub fn record_attempt(dir: &Path, attempt: &AttemptRecord) -> Result<(), StoreError> {
    fs::create_dir_all(dir)?;
    let mut log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(results_path(dir))?;
    writeln!(log_file, "{}", serde_json::to_string(attempt)?)?;

    if let Some(saved_id) = &attempt.saved_id {
        validate_id(saved_id)?;
        let path = last_attempt_path(dir, saved_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(attempt)?)?;
    }
    Ok(())
}

pub fn last_attempt(dir: &Path, id: &str) -> Result<Option<AttemptRecord>, StoreError> {
    validate_id(id)?;
    let path = last_attempt_path(dir, id);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Every recorded attempt, oldest first. Unreadable lines are skipped.
pub fn list_attempts(dir: &Path) -> Result<Vec<AttemptRecord>, StoreError> {
    let path = results_path(dir);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!("skipping unreadable attempt record: {}", err);
                None
            }
        })
        .collect())
}
