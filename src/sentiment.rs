//! Keyword-based sentiment scoring for journal text.

const POSITIVE_WORDS: &[&str] = &[
    "happy", "joy", "great", "amazing", "wonderful", "excited", "love", "blessed", "grateful",
    "fantastic", "awesome", "brilliant", "excellent", "perfect", "beautiful", "successful",
    "proud", "confident", "peaceful", "content", "optimistic", "hopeful", "thrilled",
    "delighted", "cheerful", "satisfied",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sad", "angry", "frustrated", "disappointed", "worried", "anxious", "depressed", "awful",
    "terrible", "horrible", "hate", "stressed", "overwhelmed", "lonely", "afraid", "confused",
    "upset", "annoyed", "exhausted", "devastated", "heartbroken", "discouraged", "hopeless",
];

const WORD_WEIGHT: i32 = 2;
const SCALE: f64 = 25.0;
pub const SCORE_LIMIT: f64 = 100.0;

/// Scores `text` in `[-100, 100]`; 0 when no sentiment word is present.
pub fn score(text: &str) -> f64 {
    let mut sum = 0i32;
    let mut matched = 0u32;

    for token in text.split_whitespace() {
        let word: String = token
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .flat_map(char::to_lowercase)
            .collect();

        if POSITIVE_WORDS.contains(&word.as_str()) {
            sum += WORD_WEIGHT;
            matched += 1;
        } else if NEGATIVE_WORDS.contains(&word.as_str()) {
            sum -= WORD_WEIGHT;
            matched += 1;
        }
    }

    if matched == 0 {
        return 0.0;
    }

    let normalized = f64::from(sum) / f64::from(matched) * SCALE;
    normalized.clamp(-SCORE_LIMIT, SCORE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_text_scores_above_zero() {
        assert!(score("I am happy and grateful") > 0.0);
    }

    #[test]
    fn negative_text_scores_below_zero() {
        assert!(score("I am sad and exhausted") < 0.0);
    }

    #[test]
    fn neutral_text_scores_exactly_zero() {
        assert_eq!(score("went to the store and bought bread"), 0.0);
        assert_eq!(score(""), 0.0);
    }

    #[test]
    fn matching_ignores_case_and_punctuation() {
        assert_eq!(score("HAPPY!!!"), 50.0);
        assert_eq!(score("(Sad)."), -50.0);
    }

    #[test]
    fn mixed_text_averages_matches() {
        assert_eq!(score("happy but sad"), 0.0);
        assert_eq!(score("happy joy sad"), (2.0 / 3.0) * 25.0);
    }

    #[test]
    fn score_stays_within_bounds() {
        let long_positive = "amazing ".repeat(5_000);
        let long_negative = "hopeless, ".repeat(5_000);
        for text in [long_positive.as_str(), long_negative.as_str()] {
            let value = score(text);
            assert!((-SCORE_LIMIT..=SCORE_LIMIT).contains(&value));
        }
    }
}
