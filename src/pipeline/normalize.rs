//! Text normalisation: deterministic cleanup of raw extracted page text.
//!
//! PDF text layers come out with hard line breaks mid-sentence, ligatures and
//! typographic quotes, and figure captions that the producer emitted once per
//! text run ("Figure 6.1 Figure 6.1"). The downstream topic extractor counts
//! words, so every pass here is about making those counts meaningful.
//!
//! ## Pass order
//!
//! 1. Control whitespace (`\n`, `\r`, `\t`, form feed) → space
//! 2. Transliterate non-ASCII to the closest ASCII spelling
//! 3. Strip the `square` noise token left by glyph-box artefacts
//! 4. Drop tokens identical to their immediate predecessor
//! 5. Collapse whitespace and trim

use deunicode::deunicode;

/// Noise token emitted in place of unrenderable box glyphs.
const NOISE_TOKEN: &str = "square";

/// Clean raw page text. Never fails; empty input yields an empty string.
pub fn clean_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let flattened: String = raw
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' | '\x0C' => ' ',
            other => other,
        })
        .collect();

    let mut text = deunicode(&flattened);

    // Removing one occurrence can splice a new one together ("sqsquareuare").
    while text.contains(NOISE_TOKEN) {
        text = text.replace(NOISE_TOKEN, "");
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut prev: Option<&str> = None;
    for token in text.split_whitespace() {
        if prev != Some(token) {
            kept.push(token);
        }
        prev = Some(token);
    }

    kept.join(" ")
}

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of period-delimited segments.
///
/// A trailing period yields a trailing empty segment, and empty text counts
/// as one segment.
pub fn sentence_count(text: &str) -> usize {
    text.split('.').count()
}

/// Length in Unicode scalar values.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_adjacent_duplicates(s: &str) -> bool {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        tokens.windows(2).any(|w| w[0] == w[1])
    }

    #[test]
    fn empty_input_yields_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n\t "), "");
    }

    #[test]
    fn control_whitespace_becomes_single_spaces() {
        assert_eq!(
            clean_text("line one\nline two\r\n\tindented\x0Cnext page"),
            "line one line two indented next page"
        );
    }

    #[test]
    fn transliterates_to_ascii() {
        let out = clean_text("café “quoted” naïve – Ωmega");
        assert!(out.is_ascii(), "got: {out}");
        assert!(out.starts_with("cafe \"quoted\" naive"), "got: {out}");
    }

    #[test]
    fn strips_noise_token() {
        assert_eq!(clean_text("a square b"), "a b");
        assert_eq!(clean_text("sqsquareuare gone"), "gone");
    }

    #[test]
    fn collapses_repeated_captions() {
        assert_eq!(
            clean_text("Figure 6.1 Figure 6.1 The reflex arc"),
            "Figure 6.1 Figure 6.1 The reflex arc"
        );
        assert_eq!(
            clean_text("Figure Figure Figure 6.1 6.1 shows"),
            "Figure 6.1 shows"
        );
    }

    #[test]
    fn repeated_sentence_keeps_distinct_neighbours() {
        let out = clean_text("The cat sat. The cat sat.");
        assert_eq!(out, "The cat sat. The cat sat.");
        assert!(!has_adjacent_duplicates(&out));
        assert_eq!(clean_text("the the cat cat sat"), "the cat sat");
    }

    #[test]
    fn output_has_no_control_chars_or_adjacent_duplicates() {
        let inputs = [
            "a\na\ra\tb\x0Cb square square c",
            "über über  Über\n\nstraße",
            "x squarex x",
            "  lead and trail  ",
        ];
        for raw in inputs {
            let out = clean_text(raw);
            assert!(
                !out.contains(['\n', '\r', '\t', '\x0C']),
                "control char in {out:?}"
            );
            assert!(!has_adjacent_duplicates(&out), "duplicates in {out:?}");
            assert_eq!(out, out.trim());
        }
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "Figure 6.1 Figure 6.1\nThe   nervous system",
            "sqsquareuare x x",
            "naïve café\tcafé",
            "",
        ];
        for raw in inputs {
            let once = clean_text(raw);
            assert_eq!(clean_text(&once), once, "input: {raw:?}");
        }
    }

    #[test]
    fn counts() {
        assert_eq!(word_count("The cat sat. The cat sat."), 6);
        assert_eq!(word_count(""), 0);
        assert_eq!(sentence_count("One. Two."), 3);
        assert_eq!(sentence_count("no period"), 1);
        assert_eq!(sentence_count(""), 1);
        assert_eq!(char_count("naïve"), 5);
    }
}
