//! Text processing utilities used by the scoring modifiers

use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Common English stop words to filter out during tokenization
static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();

/// Porter stemmer for English text
static STEMMER: OnceLock<Stemmer> = OnceLock::new();

/// Rough characters-per-token ratio for LLM token estimates
const CHARS_PER_TOKEN: f64 = 4.0;

fn get_stop_words() -> &'static HashSet<&'static str> {
    STOP_WORDS.get_or_init(|| {
        [
            "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into",
            "is", "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then",
            "there", "these", "they", "this", "to", "was", "will", "with",
        ]
        .iter()
        .copied()
        .collect()
    })
}

fn get_stemmer() -> &'static Stemmer {
    STEMMER.get_or_init(|| Stemmer::create(Algorithm::English))
}

/// Simple word-based tokenizer splitting on non-alphanumeric characters with stop word removal
pub fn tokenize(text: &str) -> Vec<String> {
    let stop_words = get_stop_words();
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .filter(|s| !stop_words.contains(s))
        .map(|s| s.to_string())
        .collect()
}

/// Tokenize and stem, so "decision" and "decisions" count as one word
pub fn stemmed_tokens(text: &str) -> Vec<String> {
    let stemmer = get_stemmer();
    tokenize(text)
        .iter()
        .map(|t| stemmer.stem(t).to_string())
        .collect()
}

/// Whitespace-delimited word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated LLM token count for a text
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() as f64 / CHARS_PER_TOKEN).ceil() as usize
}

/// Share of distinct stems among all content tokens (0.0 for empty text)
pub fn unique_ratio(text: &str) -> f64 {
    let tokens = stemmed_tokens(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&String> = tokens.iter().collect();
    unique.len() as f64 / tokens.len() as f64
}
