//! Deterministic, pure signal extraction over snapshot text.
//!
//! Everything here is a total function: malformed input produces zeros or
//! empty sets, never an error.

use crate::config::KeywordConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum main keywords.
const MAIN_KEYWORDS: usize = 5;
/// Maximum sub keywords (the ones ranked after the main set).
const SUB_KEYWORDS: usize = 7;
/// Tokens at or below this character count carry no keyword signal.
const MIN_TOKEN_CHARS: usize = 2;

/// Ranked keywords derived from snapshot text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordSet {
    pub main: Vec<String>,
    pub sub: Vec<String>,
}

/// Review counts mentioned in the rendered listing text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewCounts {
    pub visit: u32,
    pub blog: u32,
}

/// Parse a human-abbreviated number: thousands separators and whitespace are
/// stripped, a trailing `k`/`m`/`b` (any case) multiplies by 1e3/1e6/1e9.
/// Unparsable input yields `0.0`.
pub fn parse_abbreviated_number(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }

    let (number, multiplier) = match cleaned.chars().last() {
        Some(suffix) if suffix.eq_ignore_ascii_case(&'k') => {
            (&cleaned[..cleaned.len() - 1], 1e3)
        }
        Some(suffix) if suffix.eq_ignore_ascii_case(&'m') => {
            (&cleaned[..cleaned.len() - 1], 1e6)
        }
        Some(suffix) if suffix.eq_ignore_ascii_case(&'b') => {
            (&cleaned[..cleaned.len() - 1], 1e9)
        }
        _ => (cleaned.as_str(), 1.0),
    };

    number.parse::<f64>().map(|n| n * multiplier).unwrap_or(0.0)
}

/// Find visit-review and blog-review mentions in listing text. First match
/// per pattern wins.
pub fn find_review_counts(text: &str) -> ReviewCounts {
    let visit = Regex::new(r"방문자\s*리뷰\s*([\d,]+)").expect("valid visit-review pattern");
    let blog = Regex::new(r"블로그\s*리뷰\s*([\d,]+)").expect("valid blog-review pattern");

    let first = |re: &Regex| {
        re.captures(text)
            .map(|caps| parse_abbreviated_number(&caps[1]) as u32)
            .unwrap_or(0)
    };

    ReviewCounts {
        visit: first(&visit),
        blog: first(&blog),
    }
}

/// Extract ranked keywords from snapshot text.
///
/// Tokenizes on non-word/non-Hangul boundaries, drops short tokens and
/// stopwords, counts frequency, and sorts descending by count. The sort is
/// stable, so ties keep first-occurrence order. Top 5 become `main`, the
/// next 7 `sub`.
pub fn extract_keywords(text: &str, cfg: &KeywordConfig) -> KeywordSet {
    let token_re = Regex::new(r"[0-9A-Za-z_가-힣]+").expect("valid token pattern");

    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for token in token_re.find_iter(text) {
        let word = token.as_str().to_lowercase();
        if word.chars().count() < MIN_TOKEN_CHARS || cfg.stopwords.contains(&word) {
            continue;
        }
        // Prices and counts tokenize as digit-led fragments; they are noise.
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            continue;
        }
        match index.get(&word) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(word.clone(), order.len());
                order.push((word, 1));
            }
        }
    }

    order.sort_by(|a, b| b.1.cmp(&a.1));

    let main: Vec<String> = order
        .iter()
        .take(MAIN_KEYWORDS)
        .map(|(w, _)| w.clone())
        .collect();
    let sub: Vec<String> = order
        .iter()
        .skip(MAIN_KEYWORDS)
        .take(SUB_KEYWORDS)
        .map(|(w, _)| w.clone())
        .collect();

    KeywordSet { main, sub }
}
