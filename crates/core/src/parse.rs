use serde::Serialize;

use crate::block::parse_block;
use crate::model::{build_question, Question};
use crate::normalize::normalize_text;
use crate::split::split_blocks;

/// Outcome of parsing a text, with enough bookkeeping for the caller to tell
/// "nothing looked like a question" apart from "some blocks were invalid".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseReport {
    pub questions: Vec<Question>,
    pub headers_found: usize,
    pub blocks_dropped: usize,
}

impl ParseReport {
    /// No `Q<n>:` header was found at all.
    pub fn is_unparseable(&self) -> bool {
        self.headers_found == 0
    }
}

/// Parse free-form MCQ text into canonical questions, reporting drops.
pub fn parse_with_report(text: &str) -> ParseReport {
    let normalized = normalize_text(text);
    let blocks = split_blocks(&normalized);
    let headers_found = blocks.len();

    let mut questions: Vec<Question> = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let raw = parse_block(block);
        if let Some(question) = build_question(raw, questions.len()) {
            questions.push(question);
        }
    }

    let blocks_dropped = headers_found - questions.len();
    if blocks_dropped > 0 {
        log::debug!(
            "{} of {} question blocks produced no valid question",
            blocks_dropped,
            headers_found
        );
    }

    ParseReport {
        questions,
        headers_found,
        blocks_dropped,
    }
}

/// Parse free-form MCQ text into canonical questions.
///
/// Returns an empty list when the text contains no question header or when
/// every block is invalid.
pub fn parse(text: &str) -> Vec<Question> {
    parse_with_report(text).questions
}
