//! Persian / English detection.

use crate::llm_client::Language;

/// Unicode blocks counted as Persian script: Arabic, and the two Arabic
/// presentation-form blocks.
const PERSIAN_RANGES: [(u32, u32); 3] = [
    (0x0600, 0x06FF),
    (0xFB50, 0xFDFF),
    (0xFE70, 0xFEFF),
];

/// Share of alphabetic characters above which text counts as Persian.
const PERSIAN_RATIO_THRESHOLD: f64 = 0.3;

/// Common command words; any one of them marks the text as Persian.
const PERSIAN_KEYWORDS: &[&str] = &[
    "روشن", "خاموش", "چراغ", "تلویزیون", "کولر", "هوا", "خبر", "وقت", "ساعت", "دما", "درجه",
    "کانال", "صدا", "رنگ", "صبح", "شب", "آشپزخانه", "حمام", "اتاق", "پذیرایی", "سلام", "چطور",
    "چی", "چه", "کن", "بده", "همه", "تمام",
];

fn is_persian_char(c: char) -> bool {
    let code = c as u32;
    PERSIAN_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&code))
}

/// Classifies `text` as Persian by script ratio or keyword presence.
///
/// Empty and whitespace-only input is never Persian.
pub fn is_persian(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    let (persian, alphabetic) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(persian, total), c| {
            (persian + usize::from(is_persian_char(c)), total + 1)
        });

    if alphabetic > 0 && (persian as f64 / alphabetic as f64) > PERSIAN_RATIO_THRESHOLD {
        return true;
    }

    let lowered = text.to_lowercase();
    PERSIAN_KEYWORDS.iter().any(|word| lowered.contains(word))
}

/// Convenience wrapper returning the detected [`Language`].
pub fn detect(text: &str) -> Language {
    if is_persian(text) {
        Language::Persian
    } else {
        Language::English
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_detection() {
        assert!(is_persian("سلام"));
        assert!(!is_persian("hello"));
        assert!(!is_persian(""));
        assert!(!is_persian("   \t\n"));
    }

    #[test]
    fn test_ratio_threshold() {
        // Mostly Latin with a short Persian word: 4 of 21 letters is below 30%
        // but the word is a known keyword.
        assert!(is_persian("please turn the lamp روشن"));
        // Persian letters outside the keyword list still count by ratio.
        assert!(is_persian("ok بله"));
        assert!(!is_persian("turn on the kitchen lamp ب"));
    }

    #[test]
    fn test_digits_and_punctuation_are_ignored() {
        assert!(!is_persian("123 !!! ???"));
        assert!(is_persian("۲۲ درجه"));
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect("چراغ آشپزخانه را روشن کن"), Language::Persian);
        assert_eq!(detect("turn on the kitchen lamp"), Language::English);
    }
}
