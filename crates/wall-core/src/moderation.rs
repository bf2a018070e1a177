//! Content moderation applied to message text before it is persisted.
//!
//! Rules run in a fixed order and the first failing rule decides the outcome.

use thiserror::Error;

/// Words that may not appear anywhere in a message, matched case-insensitively.
pub const BANNED_WORDS: &[&str] = &["nsfw", "offensive", "slur", "inappropriate"];

const MIN_TRIMMED_CHARS: usize = 3;
const MAX_UPPERCASE_RATIO: f64 = 0.7;
const SHOUTING_MIN_CHARS: usize = 5;

/// Reason a message was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Message is too short")]
    TooShort,

    #[error("Message contains inappropriate content")]
    InappropriateContent,

    #[error("Message appears to be random characters")]
    RandomCharacters,

    #[error("Please don't use excessive capitalization")]
    ExcessiveCapitalization,
}

type Rule = fn(&str) -> Option<Rejection>;

const RULES: &[Rule] = &[too_short, banned_word, random_characters, shouting];

/// Check a message against every rule in order.
pub fn moderate(message: &str) -> Result<(), Rejection> {
    match RULES.iter().find_map(|rule| rule(message)) {
        Some(rejection) => Err(rejection),
        None => Ok(()),
    }
}

/// Lengths are UTF-16 code units, the unit browsers count input in.
fn text_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn too_short(message: &str) -> Option<Rejection> {
    (text_len(message.trim()) < MIN_TRIMMED_CHARS).then_some(Rejection::TooShort)
}

fn banned_word(message: &str) -> Option<Rejection> {
    let lower = message.to_lowercase();
    BANNED_WORDS
        .iter()
        .any(|word| lower.contains(word))
        .then_some(Rejection::InappropriateContent)
}

// Word characters are ASCII letters, digits and underscore.
fn random_characters(message: &str) -> Option<Rejection> {
    let has_word_or_space = message
        .chars()
        .any(|c| c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace());
    (!has_word_or_space).then_some(Rejection::RandomCharacters)
}

fn shouting(message: &str) -> Option<Rejection> {
    let len = text_len(message);
    if len <= SHOUTING_MIN_CHARS {
        return None;
    }
    let upper = message.chars().filter(|c| c.is_ascii_uppercase()).count();
    (upper as f64 / len as f64 > MAX_UPPERCASE_RATIO).then_some(Rejection::ExcessiveCapitalization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_message() {
        assert_eq!(moderate("Hello there"), Ok(()));
    }

    #[test]
    fn test_rejects_short_after_trim() {
        assert_eq!(moderate("hi"), Err(Rejection::TooShort));
        assert_eq!(moderate("   ab   "), Err(Rejection::TooShort));
        assert_eq!(moderate(""), Err(Rejection::TooShort));
        assert_eq!(moderate("abc"), Ok(()));
    }

    #[test]
    fn test_rejects_banned_words_in_any_case() {
        assert_eq!(
            moderate("this is NSFW stuff"),
            Err(Rejection::InappropriateContent)
        );
        assert_eq!(
            moderate("Totally Inappropriate"),
            Err(Rejection::InappropriateContent)
        );
        // Substring match, not whole word.
        assert_eq!(moderate("slurping"), Err(Rejection::InappropriateContent));
    }

    #[test]
    fn test_rejects_punctuation_only() {
        assert_eq!(moderate("!!!"), Err(Rejection::RandomCharacters));
        assert_eq!(moderate("?!#$%^&"), Err(Rejection::RandomCharacters));
        assert_eq!(moderate("!!! !!!"), Ok(()));
        assert_eq!(moderate("__!"), Ok(()));
    }

    #[test]
    fn test_rejects_shouting_only_above_five_chars() {
        assert_eq!(moderate("HELLO THERE"), Err(Rejection::ExcessiveCapitalization));
        assert_eq!(moderate("HELLO"), Ok(()));
        assert_eq!(moderate("Hello There"), Ok(()));
    }

    #[test]
    fn test_lengths_count_utf16_units() {
        // One letter plus an astral emoji is three units, long enough.
        assert_eq!(moderate("a😀"), Ok(()));
        assert_eq!(moderate("é"), Err(Rejection::TooShort));
        // 7 uppercase of 11 units stays under the shouting ratio.
        assert_eq!(moderate("ABCDEFG😀😀"), Ok(()));
        assert_eq!(moderate("ABCDEFGHI😀"), Err(Rejection::ExcessiveCapitalization));
    }

    #[test]
    fn test_first_failing_rule_wins() {
        // Too short beats punctuation-only.
        assert_eq!(moderate("!!"), Err(Rejection::TooShort));
        // Banned word beats shouting.
        assert_eq!(moderate("OFFENSIVE WORDS"), Err(Rejection::InappropriateContent));
    }

    #[test]
    fn test_reasons_are_human_readable() {
        assert_eq!(Rejection::TooShort.to_string(), "Message is too short");
        assert_eq!(
            Rejection::RandomCharacters.to_string(),
            "Message appears to be random characters"
        );
    }
}
