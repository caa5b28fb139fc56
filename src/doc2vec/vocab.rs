//! Vocabulary: frequency-sorted words, downsampling and the negative table.

use std::collections::HashMap;

use rand::Rng;

use crate::error::{LexisError, Result};

/// Resolution of the cumulative negative-sampling table.
const CUM_TABLE_DOMAIN: f64 = 2_147_483_647.0;
const NEGATIVE_POWER: f64 = 0.75;

#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: Vec<String>,
    counts: Vec<u64>,
    index: HashMap<String, usize>,
    keep_prob: Vec<f32>,
    cum_table: Vec<u32>,
}

impl Vocabulary {
    /// Count words across documents and keep those seen at least `min_count`
    /// times, most frequent first (ties by word).
    pub fn build<'a, I>(docs: I, min_count: usize, sample: f64) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut raw: HashMap<&str, u64> = HashMap::new();
        for words in docs {
            for word in words {
                *raw.entry(word.as_str()).or_default() += 1;
            }
        }

        let mut kept: Vec<(&str, u64)> = raw
            .into_iter()
            .filter(|&(_, count)| count >= min_count as u64)
            .collect();
        if kept.is_empty() {
            return Err(LexisError::Training(format!(
                "no word occurs at least {min_count} times; vocabulary is empty"
            )));
        }
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let words: Vec<String> = kept.iter().map(|(word, _)| (*word).to_string()).collect();
        let counts: Vec<u64> = kept.iter().map(|&(_, count)| count).collect();
        let index = words
            .iter()
            .enumerate()
            .map(|(i, word)| (word.clone(), i))
            .collect();
        let keep_prob = keep_probabilities(&counts, sample);
        let cum_table = cumulative_table(&counts);

        tracing::debug!(
            words = words.len(),
            retained = counts.iter().sum::<u64>(),
            "vocabulary built"
        );

        Ok(Self {
            words,
            counts,
            index,
            keep_prob,
            cum_table,
        })
    }

    #[must_use]
    pub fn get(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn count(&self, index: usize) -> u64 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn keep_probability(&self, index: usize) -> f32 {
        self.keep_prob.get(index).copied().unwrap_or(0.0)
    }

    /// Draw a word index with probability proportional to `count^0.75`.
    pub fn sample_negative<R: Rng>(&self, rng: &mut R) -> usize {
        let last = self.cum_table.last().copied().unwrap_or(0);
        if last == 0 {
            return 0;
        }
        let r = rng.random_range(0..last);
        self.cum_table.partition_point(|&c| c <= r).min(self.words.len() - 1)
    }

    /// Vocabulary indices of `words`, dropping unknown words and applying
    /// frequent-word downsampling.
    pub fn encode<R: Rng>(&self, words: &[String], rng: &mut R) -> Vec<usize> {
        words
            .iter()
            .filter_map(|word| self.get(word))
            .filter(|&i| {
                let keep = self.keep_prob[i];
                keep >= 1.0 || rng.random::<f32>() < keep
            })
            .collect()
    }
}

/// Probability of keeping each occurrence; 1.0 when `sample` is 0.
fn keep_probabilities(counts: &[u64], sample: f64) -> Vec<f32> {
    let retained: u64 = counts.iter().sum();
    let threshold = if sample <= 0.0 {
        retained as f64
    } else if sample < 1.0 {
        sample * retained as f64
    } else {
        (sample * (3.0 + 5f64.sqrt()) / 2.0).floor()
    };

    counts
        .iter()
        .map(|&count| {
            let v = count as f64;
            let p = ((v / threshold).sqrt() + 1.0) * (threshold / v);
            p.min(1.0) as f32
        })
        .collect()
}

fn cumulative_table(counts: &[u64]) -> Vec<u32> {
    let total: f64 = counts.iter().map(|&c| (c as f64).powf(NEGATIVE_POWER)).sum();
    let mut cumulative = 0.0;
    counts
        .iter()
        .map(|&c| {
            cumulative += (c as f64).powf(NEGATIVE_POWER);
            (cumulative / total * CUM_TABLE_DOMAIN).round() as u32
        })
        .collect()
}
