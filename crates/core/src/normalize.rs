use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalize raw exam text before it is split into question blocks.
///
/// Converts line endings to `\n`, applies unicode NFC normalization, repairs
/// typographic ligatures and stray replacement characters left by lossy
/// PDF/DOCX extraction, collapses runs of two or more spaces/tabs into a
/// single space and strips trailing whitespace from every line. Single
/// spaces are left alone. Never fails.
pub fn normalize_text(text: &str) -> String {
    // 1. Line endings.
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    // 2. Unicode NFC normalization.
    let mut result: String = text.nfc().collect();

    // 3. Fix ligatures (ff, fi, fl, ffi, ffl).
    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ];
    for (lig, replacement) in &ligatures {
        result = result.replace(lig, replacement);
    }

    // 4. Non-breaking spaces become plain spaces; replacement characters go.
    result = result.replace('\u{00A0}', " ").replace('\u{FFFD}', "");

    // 5. Collapse spacing artifacts line by line.
    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"[ \t]{2,}").unwrap());

    result
        .split('\n')
        .map(|line| re_spaces.replace_all(line, " ").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
