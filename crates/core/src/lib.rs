//! Core library for smartexam
//!
//! This crate implements the **Functional Core** of the smartexam application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`smartexam_core`** (this crate): parsing, shuffling, grading and
//!   export as plain functions over plain data
//! - **`smartexam`**: the CLI that reads files, talks to the terminal and
//!   decides where the library directory lives
//!
//! The only module that touches the filesystem is [`store`], and it does so
//! through functions that take the directory as an argument.
//!
//! # Pipeline
//!
//! ```text
//! raw text -> normalize -> split -> block -> model -> Vec<Question>
//!          -> shuffle (optional) -> UI -> Submission -> grade -> GradeReport
//!          -> derive_retest_set -> Vec<Question> (back into shuffle)
//! ```
//!
//! # Module Organization
//!
//! - [`normalize`]: line-ending and spacing cleanup of extracted text
//! - [`split`]: `Q<n>:` header detection and block splitting
//! - [`block`]: line-scanning parser for a single question block
//! - [`model`]: the canonical [`Question`] model and its validation
//! - [`parse`]: the text-to-questions pipeline
//! - [`shuffle`]: question and option shuffles that keep answers correct
//! - [`grade`]: exact-match grading, scoring and retest subsets
//! - [`export`]: canonical text output and attempt records
//! - [`import`]: JSON exam import, including older exam files
//! - [`store`]: saved-exam library on disk
//!
//! # Example Usage
//!
//! ```rust
//! use smartexam_core::grade::{grade, ScoringConfig, Submission};
//! use smartexam_core::parse::parse;
//!
//! let questions = parse("Q1: 2+2=?\nA) 3\nB) 4\nAnswer: B\n");
//! assert_eq!(questions.len(), 1);
//!
//! let mut submission = Submission::new();
//! submission.select(0, questions[0].correct.clone());
//!
//! let report = grade(&questions, &submission, &ScoringConfig::default());
//! assert_eq!(report.summary.percent, 100);
//! ```

pub mod block;
pub mod export;
pub mod grade;
pub mod import;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod shuffle;
pub mod split;
pub mod store;

pub use grade::{derive_retest_set, grade, GradeReport, RetestFilter, ScoringConfig, Submission};
pub use model::{AnswerOption, Exam, ExamMeta, Label, LabelSet, Question, QuestionId};
pub use parse::{parse, parse_with_report, ParseReport};
pub use shuffle::{shuffle, ShuffleOptions};
