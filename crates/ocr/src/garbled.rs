//! Detects text layers corrupted by font/encoding mismatches.
//!
//! Some statement generators embed fonts without a usable character map, so
//! direct extraction returns plausible-looking but meaningless glyphs. This is
//! a heuristic gate for the OCR fallback, not a proof of corruption.

pub const DEFAULT_GARBLED_THRESHOLD: f64 = 0.2;

/// Typographic glyphs that show up in place of digits and letters when a text
/// layer is decoded with the wrong encoding.
const CORRUPTION_SYMBOLS: &[char] = &[
    '\u{FFFD}', '⁄', '–', '‚', '„', 'ﬂ', 'ﬁ', '•', '¶', '†', '‡', 'ƒ', '…', '§', '¤', '‹', '›',
    '¢', '°',
];

/// Any one of these anywhere in the sample is treated as conclusive.
const CORRUPTION_MARKERS: &[&str] = &["???", "ï¿½", "\u{FFFD}", "¶", "†", "ƒ", "⁄", "…", "§", "•"];

/// `true` when `text` looks corrupted.
///
/// Empty (or whitespace-only) input counts as garbled so the caller falls
/// back to OCR instead of proceeding with no data.
pub fn is_garbled(text: &str, threshold: f64) -> bool {
    if text.trim().is_empty() {
        return true;
    }
    if CORRUPTION_MARKERS.iter().any(|m| text.contains(m)) {
        return true;
    }
    suspicious_ratio(text) > threshold
}

/// Fraction of characters that are non-ASCII, control characters, or known
/// corruption symbols. `0.0` for empty input.
pub fn suspicious_ratio(text: &str) -> f64 {
    let (total, suspicious) = text.chars().fold((0usize, 0usize), |(t, s), c| {
        (t + 1, s + usize::from(is_suspicious(c)))
    });
    if total == 0 {
        0.0
    } else {
        suspicious as f64 / total as f64
    }
}

fn is_suspicious(c: char) -> bool {
    !c.is_ascii()
        || CORRUPTION_SYMBOLS.contains(&c)
        || (c.is_ascii_control() && !matches!(c, '\n' | '\r' | '\t'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitec_style_corruption_is_garbled() {
        assert!(is_garbled("'⁄⁄–‚fl•?m–M POTPRWXVSV", DEFAULT_GARBLED_THRESHOLD));
    }

    #[test]
    fn clean_statement_text_is_not_garbled() {
        let text = "07/06/23 07/06/23 ** MTN May 2023 A0159924 -121.00 +114216.50\n\
                    08/06/23 08/06/23 Checkers Sandton -450.99 113765.51";
        assert!(!is_garbled(text, DEFAULT_GARBLED_THRESHOLD));
    }

    #[test]
    fn empty_and_blank_input_is_garbled() {
        assert!(is_garbled("", DEFAULT_GARBLED_THRESHOLD));
        assert!(is_garbled("   \n\t", DEFAULT_GARBLED_THRESHOLD));
    }

    #[test]
    fn replacement_character_marker_is_conclusive() {
        let text = format!("{}\u{FFFD}", "a perfectly normal line of text ".repeat(20));
        assert!(suspicious_ratio(&text) < DEFAULT_GARBLED_THRESHOLD);
        assert!(is_garbled(&text, DEFAULT_GARBLED_THRESHOLD));
    }

    #[test]
    fn high_non_ascii_ratio_trips_threshold() {
        // No markers, but most characters are outside ASCII.
        assert!(is_garbled("ÀÁÂÃÄÅ ÆÇÈ abc", DEFAULT_GARBLED_THRESHOLD));
    }

    #[test]
    fn occasional_accent_stays_below_threshold() {
        assert!(!is_garbled(
            "Café Nero Rosebank card purchase -45.00 1200.00",
            DEFAULT_GARBLED_THRESHOLD
        ));
    }

    #[test]
    fn threshold_is_exclusive() {
        // 1 suspicious of 5 characters = exactly 0.2.
        assert_eq!(suspicious_ratio("abcdÀ"), 0.2);
        assert!(!is_garbled("abcdÀ", 0.2));
        assert!(is_garbled("abcdÀ", 0.19));
    }

    #[test]
    fn control_characters_are_suspicious() {
        assert_eq!(suspicious_ratio("\u{1}\u{2}ab"), 0.5);
        assert_eq!(suspicious_ratio("a\tb\n"), 0.0);
    }
}
