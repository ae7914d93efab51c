//! Extractive summarization by word frequency.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::enrich::text::{is_stop_word, split_sentences, tokenize};

/// Pick the `n` most representative sentences of `text`, in document order.
///
/// Each sentence is scored by the mean normalized frequency of its content
/// words, where a word's normalized frequency is its count in the whole text
/// divided by the count of the most frequent word. Ties go to the earlier
/// sentence. Text with `n` or fewer sentences is returned whole.
pub fn summarize(text: &str, n: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() || n == 0 {
        return String::new();
    }
    if sentences.len() <= n {
        return sentences.join(" ");
    }

    let sentence_tokens: Vec<Vec<String>> = sentences
        .iter()
        .map(|s| {
            tokenize(s)
                .into_iter()
                .filter(|t| !is_stop_word(t))
                .collect()
        })
        .collect();

    let mut frequencies: HashMap<&str, usize> = HashMap::new();
    for token in sentence_tokens.iter().flatten() {
        *frequencies.entry(token.as_str()).or_insert(0) += 1;
    }
    let max_frequency = frequencies.values().copied().max().unwrap_or(0);

    let scores: Vec<f64> = sentence_tokens
        .iter()
        .map(|tokens| {
            if tokens.is_empty() || max_frequency == 0 {
                return 0.0;
            }
            let total: f64 = tokens
                .iter()
                .map(|t| frequencies[t.as_str()] as f64 / max_frequency as f64)
                .sum();
            total / tokens.len() as f64
        })
        .collect();

    let mut ranked: Vec<usize> = (0..sentences.len()).collect();
    ranked.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut chosen: Vec<usize> = ranked.into_iter().take(n).collect();
    chosen.sort_unstable();

    chosen
        .into_iter()
        .map(|i| sentences[i].as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_returned_whole() {
        let text = "Only one sentence here. And a second.";
        assert_eq!(summarize(text, 3), "Only one sentence here. And a second.");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(summarize("", 3), "");
        assert_eq!(summarize("  \n ", 3), "");
    }

    #[test]
    fn test_exactly_n_sentences_in_document_order() {
        let text = "The central bank raised interest rates today. \
                    Weather was mild across the region. \
                    Interest rates now stand at a decade high as the bank fights inflation. \
                    A local fair opened downtown. \
                    Analysts expect the bank to keep rates high while inflation persists.";
        let summary = summarize(text, 2);
        let sentences = split_sentences(&summary);
        assert_eq!(sentences.len(), 2);

        let positions: Vec<usize> = sentences
            .iter()
            .map(|s| text.find(s.as_str()).unwrap())
            .collect();
        assert!(positions[0] < positions[1]);
        assert!(!summary.contains("fair"));
        assert!(!summary.contains("Weather"));
    }

    #[test]
    fn test_ties_prefer_earlier_sentences() {
        let text = "Alpha beta. Gamma delta. Epsilon zeta. Eta theta.";
        assert_eq!(summarize(text, 2), "Alpha beta. Gamma delta.");
    }

    #[test]
    fn test_deterministic() {
        let text = "Rain fell. Rain stopped. Sun rose over the rain. Birds sang.";
        assert_eq!(summarize(text, 2), summarize(text, 2));
    }
}
