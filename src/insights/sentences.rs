//! Example-sentence extraction and seeded sampling.

use std::collections::HashSet;
use std::sync::LazyLock;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use regex::Regex;

use crate::types::AarItem;

// Terminal punctuation runs ("...", "?!") count as one boundary
const SENTENCE_BOUNDARY: &str = r"[.!?]+";

static BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SENTENCE_BOUNDARY).expect("sentence boundary pattern is valid"));

/// Split free text into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    BOUNDARY_RE
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Picks up to `max_examples` representative sentences from a group of items.
///
/// Sentences whose length (in chars) falls inside the preferred window are
/// drawn first; the rest only fill remaining slots. Identical seeds over
/// identical input give identical picks.
pub struct SentenceSampler {
    rng: StdRng,
    max_examples: usize,
    min_len: usize,
    max_len: usize,
}

impl SentenceSampler {
    pub fn new(seed: u64, max_examples: usize, min_len: usize, max_len: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_examples,
            min_len,
            max_len,
        }
    }

    fn preferred(&self, sentence: &str) -> bool {
        let len = sentence.chars().count();
        len >= self.min_len && len <= self.max_len
    }

    /// Unique sentences across all items, in first-seen order.
    pub fn extract(items: &[AarItem]) -> Vec<String> {
        let mut seen = HashSet::new();
        items
            .iter()
            .flat_map(|item| split_sentences(&item.text))
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }

    pub fn sample(&mut self, items: &[AarItem]) -> Vec<String> {
        if self.max_examples == 0 {
            return Vec::new();
        }

        let (preferred, rest): (Vec<String>, Vec<String>) = Self::extract(items)
            .into_iter()
            .partition(|s| self.preferred(s));

        let mut picked: Vec<String> = preferred
            .choose_multiple(&mut self.rng, self.max_examples)
            .cloned()
            .collect();

        let remaining = self.max_examples - picked.len();
        if remaining > 0 {
            picked.extend(rest.choose_multiple(&mut self.rng, remaining).cloned());
        }

        picked
    }
}
