//! Transcript scoring seam.
//!
//! The federated core consumes only the numeric outputs of these scorers;
//! the formulas themselves are collaborators behind [`TranscriptScorer`] and
//! can be swapped for an external metrics library without touching the
//! round loop.

use std::collections::HashMap;

/// Corpus-level transcript scorer.
pub trait TranscriptScorer {
    /// Short metric name (e.g. `"wer"`).
    fn name(&self) -> &'static str;

    /// Scores `predictions` against `references`.
    ///
    /// Returns `None` when the metric is undefined for the corpus (empty
    /// corpus, mismatched lengths, no reference words).
    fn score(&self, predictions: &[String], references: &[String]) -> Option<f64>;
}

/// Word error rate: total word-level edit distance over total reference
/// words.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordErrorRate;

impl TranscriptScorer for WordErrorRate {
    fn name(&self) -> &'static str {
        "wer"
    }

    fn score(&self, predictions: &[String], references: &[String]) -> Option<f64> {
        if predictions.len() != references.len() || references.is_empty() {
            return None;
        }

        let mut distance = 0usize;
        let mut reference_words = 0usize;
        for (prediction, reference) in predictions.iter().zip(references) {
            let p: Vec<&str> = prediction.split_whitespace().collect();
            let r: Vec<&str> = reference.split_whitespace().collect();
            distance += edit_distance(&p, &r);
            reference_words += r.len();
        }

        if reference_words == 0 {
            return None;
        }
        Some(distance as f64 / reference_words as f64)
    }
}

/// Word-level Levenshtein distance (two-row dynamic program).
fn edit_distance(a: &[&str], b: &[&str]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, wa) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, wb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(wa != wb);
            curr[j + 1] = substitute.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Corpus BLEU with clipped n-gram precision and brevity penalty, reported
/// on the usual 0–100 scale.
#[derive(Debug, Clone, Copy)]
pub struct BleuScore {
    max_order: usize,
}

impl BleuScore {
    /// Creates a scorer with the standard maximum n-gram order of 4.
    pub fn new() -> Self {
        Self { max_order: 4 }
    }
}

impl Default for BleuScore {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptScorer for BleuScore {
    fn name(&self) -> &'static str {
        "bleu"
    }

    fn score(&self, predictions: &[String], references: &[String]) -> Option<f64> {
        if predictions.len() != references.len() || references.is_empty() {
            return None;
        }

        let mut matched = vec![0usize; self.max_order];
        let mut total = vec![0usize; self.max_order];
        let mut prediction_len = 0usize;
        let mut reference_len = 0usize;

        for (prediction, reference) in predictions.iter().zip(references) {
            let p: Vec<&str> = prediction.split_whitespace().collect();
            let r: Vec<&str> = reference.split_whitespace().collect();
            prediction_len += p.len();
            reference_len += r.len();

            for n in 1..=self.max_order {
                let predicted = ngram_counts(&p, n);
                let observed = ngram_counts(&r, n);
                for (gram, count) in &predicted {
                    matched[n - 1] += (*count).min(observed.get(gram).copied().unwrap_or(0));
                }
                total[n - 1] += p.len().saturating_sub(n - 1);
            }
        }

        if prediction_len == 0 {
            return Some(0.0);
        }

        let mut log_sum = 0.0f64;
        for n in 0..self.max_order {
            if total[n] == 0 || matched[n] == 0 {
                return Some(0.0);
            }
            log_sum += (matched[n] as f64 / total[n] as f64).ln();
        }
        let precision = (log_sum / self.max_order as f64).exp();
        let brevity = if prediction_len >= reference_len {
            1.0
        } else {
            (1.0 - reference_len as f64 / prediction_len as f64).exp()
        };

        Some(100.0 * precision * brevity)
    }
}

fn ngram_counts<'a>(words: &[&'a str], n: usize) -> HashMap<Vec<&'a str>, usize> {
    let mut counts = HashMap::new();
    if n == 0 || words.len() < n {
        return counts;
    }
    for gram in words.windows(n) {
        *counts.entry(gram.to_vec()).or_insert(0) += 1;
    }
    counts
}
