// src/resolution/trigram.rs
//! Trigram similarity with the same word splitting and padding as Postgres
//! `pg_trgm`, so the in-memory store ranks like the `<->` operator does.

use std::collections::HashSet;

fn trigrams(text: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    let lowered = text.to_lowercase();
    for word in lowered.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        // Two blanks before, one after.
        let padded: Vec<char> = "  ".chars().chain(word.chars()).chain(" ".chars()).collect();
        for window in padded.windows(3) {
            out.insert(window.iter().collect());
        }
    }
    out
}

/// Share of distinct trigrams the two strings have in common, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

/// `1 - similarity`, the value of `a <-> b` in pg_trgm.
pub fn distance(a: &str, b: &str) -> f64 {
    1.0 - similarity(a, b)
}
