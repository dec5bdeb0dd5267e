use std::sync::OnceLock;

use regex::Regex;

/// A run of lines belonging to one question.
///
/// `lines[0]` is whatever followed the header's colon (the first fragment of
/// the stem, possibly empty); the remaining lines run up to the next header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBlock<'a> {
    /// Number written in the header (`Q12:` gives `Some(12)`, `Q#:` gives `None`).
    pub number: Option<u32>,
    pub lines: Vec<&'a str>,
}

fn header_regex() -> &'static Regex {
    static RE_HEADER: OnceLock<Regex> = OnceLock::new();
    RE_HEADER.get_or_init(|| Regex::new(r"(?i)^\s*Q(\d+|#)\s*:\s*(.*)$").unwrap())
}

/// Returns the header's number and stem fragment when `line` is a question header.
pub fn match_header(line: &str) -> Option<(Option<u32>, &str)> {
    let caps = header_regex().captures(line)?;
    let number = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
    let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    Some((number, rest))
}

/// Split normalized text into question blocks anchored on `Q<n>:` headers.
///
/// Lines before the first header are a preamble and are discarded. Text with
/// no header at all yields an empty list, which callers treat as unparseable.
pub fn split_blocks(text: &str) -> Vec<QuestionBlock<'_>> {
    let mut blocks: Vec<QuestionBlock<'_>> = Vec::new();

    for line in text.lines() {
        if let Some((number, rest)) = match_header(line) {
            log::trace!("question header {:?}", number);
            blocks.push(QuestionBlock {
                number,
                lines: vec![rest],
            });
        } else if let Some(current) = blocks.last_mut() {
            current.lines.push(line);
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_header_numbered() {
        assert_eq!(match_header("Q12: What?"), Some((Some(12), "What?")));
    }

    #[test]
    fn test_match_header_variants() {
        assert_eq!(match_header("q3 :  Lower"), Some((Some(3), "Lower")));
        assert_eq!(match_header("Q#: Hash"), Some((None, "Hash")));
        assert_eq!(match_header("Q1:"), Some((Some(1), "")));
    }

    #[test]
    fn test_match_header_rejects_other_lines() {
        assert_eq!(match_header("A) Quebec"), None);
        assert_eq!(match_header("Question: what"), None);
        assert_eq!(match_header("The Q1: inline"), None);
        assert_eq!(match_header("Q: seventeenth option"), None);
        assert_eq!(match_header("q: a note"), None);
    }

    #[test]
    fn test_split_two_blocks() {
        let text = "Q1: first\nA) a\n\nQ2: second\nB) b";
        let blocks = split_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].number, Some(1));
        assert_eq!(blocks[0].lines, vec!["first", "A) a", ""]);
        assert_eq!(blocks[1].lines, vec!["second", "B) b"]);
    }

    #[test]
    fn test_split_ignores_preamble() {
        let text = "Chapter 3 quiz\nGood luck\nQ1: only";
        let blocks = split_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, vec!["only"]);
    }

    #[test]
    fn test_split_without_headers_is_empty() {
        assert!(split_blocks("just some text\nA) option").is_empty());
        assert!(split_blocks("").is_empty());
    }

    #[test]
    fn test_split_keeps_q_labelled_lines_in_block() {
        let text = "Q1: many options\nP: opt15\nQ: opt16\nAnswer: Q\nExplanation: see\nq: this is a note";
        let blocks = split_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines.len(), 6);
        assert_eq!(blocks[0].lines[2], "Q: opt16");
        assert_eq!(blocks[0].lines[5], "q: this is a note");
    }

    #[test]
    fn test_split_header_only_blocks() {
        let blocks = split_blocks("Q1:\nQ2:");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines, vec![""]);
    }
}
