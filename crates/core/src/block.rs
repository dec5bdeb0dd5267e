//! Question block parser
//!
//! Turns the lines of one [`QuestionBlock`] into a [`RawQuestion`] with a
//! single line-scanning pass over an explicit [`Mode`]. The grammar is the
//! superset of the formats seen in the wild:
//!
//! ```text
//! Q1: stem, possibly
//! wrapped over several lines
//! A) option text
//!    continued on the next line
//! B. another option
//! Answer: A & B
//! Explanation: free text,
//! possibly several paragraphs
//! ```

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Label, LabelSet};
use crate::split::QuestionBlock;

/// Unvalidated result of parsing one block.
///
/// `options` is deduplicated by label and sorted ascending; `answer` only
/// contains labels that exist in `options`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuestion {
    pub stem: String,
    pub options: Vec<(Label, String)>,
    pub answer_raw: String,
    pub answer: LabelSet,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Stem,
    Option,
    Answer,
    Explanation,
}

fn option_regex() -> &'static Regex {
    static RE_OPTION: OnceLock<Regex> = OnceLock::new();
    RE_OPTION.get_or_init(|| {
        Regex::new(r"^\s*(?:\(?([A-Z])\s*[).:]|\(?([a-z])\s*\))\s*(.*)$").unwrap()
    })
}

fn answer_regex() -> &'static Regex {
    static RE_ANSWER: OnceLock<Regex> = OnceLock::new();
    RE_ANSWER.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:correct\s+)?answers?\s*[:=]\s*(.*)$").unwrap()
    })
}

fn explanation_regex() -> &'static Regex {
    static RE_EXPLANATION: OnceLock<Regex> = OnceLock::new();
    RE_EXPLANATION.get_or_init(|| Regex::new(r"(?i)^\s*explanation\s*:\s*(.*)$").unwrap())
}

/// Returns the label and initial text when `line` starts a new option.
///
/// Uppercase letters accept `)`, `.` or `:` as delimiter; lowercase letters
/// only `)`, so prose such as `e.g. ...` is not taken for an option.
pub fn match_option(line: &str) -> Option<(Label, &str)> {
    let caps = option_regex().captures(line)?;
    let letter = caps.get(1).or_else(|| caps.get(2))?.as_str();
    let label = Label::try_from(letter).ok()?;
    let text = caps.get(3).map(|m| m.as_str()).unwrap_or("");
    Some((label, text))
}

fn capture_rest<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line)
        .map(|caps| caps.get(1).map(|m| m.as_str()).unwrap_or(""))
}

fn append_line(buffer: &mut String, line: &str) {
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(line.trim());
}

/// Scan state for one block.
struct BlockScanner {
    mode: Mode,
    stem: String,
    current: Option<(Label, String)>,
    options: Vec<(Label, String)>,
    answer_raw: String,
    explanation: String,
}

impl BlockScanner {
    fn new(first_fragment: &str) -> Self {
        BlockScanner {
            mode: Mode::Stem,
            stem: first_fragment.trim().to_string(),
            current: None,
            options: Vec::new(),
            answer_raw: String::new(),
            explanation: String::new(),
        }
    }

    fn finish_option(&mut self) {
        if let Some(option) = self.current.take() {
            self.options.push(option);
        }
    }

    fn line(&mut self, line: &str) {
        if let Some(rest) = capture_rest(answer_regex(), line) {
            self.finish_option();
            let rest = rest.trim();
            if !rest.is_empty() {
                if !self.answer_raw.is_empty() {
                    self.answer_raw.push(',');
                }
                self.answer_raw.push_str(rest);
            }
            self.mode = Mode::Answer;
            return;
        }

        if let Some(rest) = capture_rest(explanation_regex(), line) {
            self.finish_option();
            append_line(&mut self.explanation, rest);
            self.mode = Mode::Explanation;
            return;
        }

        // Explanations are free text; a lettered line there is prose.
        if self.mode != Mode::Explanation {
            if let Some((label, text)) = match_option(line) {
                self.finish_option();
                self.current = Some((label, text.trim().to_string()));
                self.mode = Mode::Option;
                return;
            }
        }

        let blank = line.trim().is_empty();
        match self.mode {
            Mode::Stem if !blank => append_line(&mut self.stem, line),
            Mode::Stem => {}
            Mode::Option => {
                if let Some((_, text)) = self.current.as_mut() {
                    if blank {
                        text.push('\n');
                    } else {
                        append_line(text, line);
                    }
                }
            }
            Mode::Explanation if blank => self.explanation.push('\n'),
            Mode::Explanation => append_line(&mut self.explanation, line),
            Mode::Answer => {
                if !blank {
                    log::debug!("ignoring text after answer line: {}", line.trim());
                }
            }
        }
    }

    fn finish(mut self) -> RawQuestion {
        self.finish_option();
        let options = merge_options(self.options);
        let available: LabelSet = options.iter().map(|(label, _)| *label).collect();
        let answer = parse_answer(&self.answer_raw, &available);

        RawQuestion {
            stem: self.stem,
            options,
            answer_raw: self.answer_raw,
            answer,
            explanation: self.explanation,
        }
    }
}

/// Merge fragments that share a label (joined by newline) and sort by label.
fn merge_options(fragments: Vec<(Label, String)>) -> Vec<(Label, String)> {
    let mut merged: BTreeMap<Label, String> = BTreeMap::new();
    for (label, text) in fragments {
        merged
            .entry(label)
            .and_modify(|existing| {
                if !text.trim().is_empty() {
                    existing.push('\n');
                    existing.push_str(&text);
                }
            })
            .or_insert(text);
    }
    merged.into_iter().collect()
}

/// Parse one question block.
pub fn parse_block(block: &QuestionBlock<'_>) -> RawQuestion {
    let mut lines = block.lines.iter();
    let mut scanner = BlockScanner::new(lines.next().copied().unwrap_or(""));
    for line in lines {
        scanner.line(line);
    }
    scanner.finish()
}

/// Resolve a raw answer line against the labels that exist.
///
/// The words `and` and the characters `;`, `&`, `+`, `/` count as commas.
/// Each comma-separated token is stripped of whitespace and bracket/period
/// noise and kept when it is a single letter present in `available`. When
/// nothing survives but the raw text starts with an existing label, that
/// letter alone is used.
pub fn parse_answer(raw: &str, available: &LabelSet) -> LabelSet {
    static RE_SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let re_separators =
        RE_SEPARATORS.get_or_init(|| Regex::new(r"(?i)\band\b|[;&+/]").unwrap());

    let unified = re_separators.replace_all(raw, ",");
    let mut labels: LabelSet = unified
        .split(',')
        .map(|token| {
            token
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
        })
        .map(|token| {
            token
                .trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']' | '.' | ':'))
                .to_uppercase()
        })
        .filter_map(|token| Label::try_from(token.as_str()).ok())
        .filter(|label| available.contains(label))
        .collect();

    if labels.is_empty() {
        if let Some(first) = raw.trim().chars().next() {
            if first.is_ascii_alphabetic() {
                if let Ok(label) = Label::try_from(first) {
                    if available.contains(&label) {
                        labels.insert(label);
                    }
                }
            }
        }
    }

    labels
}
