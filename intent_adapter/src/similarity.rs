//! Fuzzy keyword similarity
//!
//! Used by the keyword engine to tag utterance windows that are close to,
//! but not exactly, a registered sample ("lights" for "light").

/// Similarity between an utterance window and a registered sample (0.0-1.0).
///
/// Both inputs are expected to be lowercased and whitespace-normalized.
/// Exact equality scores 1.0; otherwise the score is a sequence ratio in
/// the style of `difflib.SequenceMatcher.ratio`.
pub fn keyword_similarity(window: &str, sample: &str) -> f64 {
    if window.is_empty() || sample.is_empty() {
        return 0.0;
    }
    if window == sample {
        return 1.0;
    }
    sequence_ratio(window, sample)
}

/// Calculate sequence similarity ratio: 2 * LCS / total length.
fn sequence_ratio(s1: &str, s2: &str) -> f64 {
    let total_len = s1.chars().count() + s2.chars().count();
    if total_len == 0 {
        return 0.0;
    }

    let lcs_len = longest_common_subsequence(s1, s2);
    (2.0 * lcs_len as f64) / total_len as f64
}

/// Length of the longest common subsequence, two-row DP.
fn longest_common_subsequence(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    let n = s2_chars.len();
    let mut prev = vec![0; n + 1];
    let mut curr = vec![0; n + 1];

    for a in &s1_chars {
        for j in 1..=n {
            curr[j] = if *a == s2_chars[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!((keyword_similarity("turn on", "turn on") - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_plural_is_close() {
        // 2 * 5 / 11
        let score = keyword_similarity("lights", "light");
        assert!((score - 10.0 / 11.0).abs() < 0.001);
        assert!(score > 0.85);
    }

    #[test]
    fn test_unrelated_words() {
        assert!(keyword_similarity("lamp", "lame") < 0.85);
        assert!(keyword_similarity("timer", "alarm") < 0.5);
    }

    #[test]
    fn test_empty() {
        assert_eq!(keyword_similarity("", "light"), 0.0);
        assert_eq!(keyword_similarity("light", ""), 0.0);
    }
}
