//! Keyword extraction
//!
//! Text is lowercased and split into runs of word characters. Tokens of two
//! characters or fewer and stopwords are dropped; the rest are counted and
//! the most frequent are kept.

use crate::indexer::stopwords::is_stop_word;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Maximum number of keywords returned per page
pub const MAX_KEYWORDS: usize = 10;

/// Tokens must be longer than this many characters
pub const MIN_TOKEN_CHARS: usize = 2;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word pattern should compile"));

/// Extracts the most frequent keywords of `text`
///
/// Returns at most [`MAX_KEYWORDS`] `(keyword, frequency)` pairs, most
/// frequent first. Ties keep the order in which the words first appear.
///
/// # Example
///
/// ```
/// use trawl::indexer::extract_keywords;
///
/// let keywords = extract_keywords("cat cat dog dog dog bird");
/// assert_eq!(
///     keywords,
///     vec![
///         ("dog".to_string(), 3),
///         ("cat".to_string(), 2),
///         ("bird".to_string(), 1),
///     ]
/// );
/// ```
pub fn extract_keywords(text: &str) -> Vec<(String, u32)> {
    let lowered = text.to_lowercase();

    // word -> (count, index of first occurrence)
    let mut counts: HashMap<&str, (u32, usize)> = HashMap::new();
    let tokens = WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| word.chars().count() > MIN_TOKEN_CHARS && !is_stop_word(word));

    for (position, word) in tokens.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, (u32, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });

    ranked
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(word, (count, _))| (word.to_string(), count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_order() {
        assert_eq!(
            extract_keywords("cat cat dog dog dog bird"),
            vec![
                ("dog".to_string(), 3),
                ("cat".to_string(), 2),
                ("bird".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_short_tokens_and_stopwords_dropped() {
        let keywords = extract_keywords("The ox is at an inn; the inn is old and the ox is big");
        let words: Vec<&str> = keywords.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["inn", "old", "big"]);
        assert_eq!(keywords[0].1, 2);
    }

    #[test]
    fn test_case_folded() {
        assert_eq!(
            extract_keywords("Rust RUST rust"),
            vec![("rust".to_string(), 3)]
        );
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let keywords = extract_keywords("zebra apple mango apple zebra mango");
        let words: Vec<&str> = keywords.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_at_most_ten_non_increasing() {
        let text: String = (0..30)
            .flat_map(|i| std::iter::repeat(format!("word{} ", i)).take(i % 7 + 1))
            .collect();
        let keywords = extract_keywords(&text);

        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert!(keywords.windows(2).all(|pair| pair[0].1 >= pair[1].1));
        assert!(keywords
            .iter()
            .all(|(w, _)| w.chars().count() > 2 && !is_stop_word(w)));
    }

    #[test]
    fn test_underscores_and_digits_are_word_chars() {
        assert_eq!(
            extract_keywords("snake_case 2024 x1"),
            vec![("snake_case".to_string(), 1), ("2024".to_string(), 1)]
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   \n\t ").is_empty());
    }
}
