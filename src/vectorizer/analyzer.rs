use std::fmt::Debug;

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

use crate::vectorizer::{stop_words::StopWords, token::TokenFrequency};

/// Text normalizer shared by fitting and querying.
///
/// `raw text -> lowercase -> UAX #29 words -> strip punctuation -> stem`
///
/// Output is a pure function of the input, so a query normalized today
/// produces the same tokens the vocabulary was fitted on.
pub struct Analyzer {
    stemmer: Stemmer,
    stop_words: StopWords,
}

impl Analyzer {
    /// English analyzer (Snowball English stemmer, scikit-learn stop words)
    pub fn english() -> Self {
        let stemmer = Stemmer::create(Algorithm::English);
        let stop_words = StopWords::english(&stemmer);
        Self { stemmer, stop_words }
    }

    /// Normalized token stream of `raw`
    ///
    /// # Arguments
    /// * `raw` - any text, empty or garbage input gives no tokens
    pub fn tokens(&self, raw: &str) -> Vec<String> {
        let lowered = raw.to_lowercase();
        lowered
            .unicode_words()
            .filter_map(|word| {
                let stripped: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
                if stripped.is_empty() {
                    return None;
                }
                let stem = self.stemmer.stem(&stripped).into_owned();
                (!stem.is_empty()).then_some(stem)
            })
            .collect()
    }

    /// Normalized document: stemmed tokens joined by single spaces
    pub fn normalize(&self, raw: &str) -> String {
        self.tokens(raw).join(" ")
    }

    #[inline]
    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Token counts of `raw` restricted to vocabulary candidates:
    /// stop words and tokens shorter than `min_token_len` chars are dropped.
    pub fn term_frequency(&self, raw: &str, min_token_len: usize) -> TokenFrequency {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&self.tokens(raw));
        freq.remove_tokens_by_condition(|token, _| {
            token.chars().count() < min_token_len || self.is_stop_word(token)
        });
        freq
    }
}

/// `Stemmer` is not `Clone`; the algorithm is always English.
impl Clone for Analyzer {
    fn clone(&self) -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            stop_words: self.stop_words.clone(),
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::english()
    }
}

impl Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("stemmer", &"english")
            .field("stop_words", &self.stop_words.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn lowercases_strips_and_stems() {
        let a = Analyzer::english();
        assert_eq!(a.normalize("Dragons, hoarding GOLD!"), "dragon hoard gold");
    }

    #[test]
    fn contractions_stay_one_token() {
        let a = Analyzer::english();
        let tokens = a.tokens("Don't panic");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], "dont");
        assert_eq!(tokens[1], "panic");
    }

    #[test]
    fn empty_and_garbage_give_empty_string() {
        let a = Analyzer::english();
        assert_eq!(a.normalize(""), "");
        assert_eq!(a.normalize("  ... !!! --- ?? "), "");
    }

    #[test]
    fn already_normalized_text_is_stable() {
        let a = Analyzer::english();
        let once = a.normalize("The dragons were hoarding gold in caves");
        assert_eq!(a.normalize(&once), once);
    }

    #[test]
    fn term_frequency_drops_stop_words_and_short_tokens() {
        let a = Analyzer::english();
        let freq = a.term_frequency("a wizard battles a dragon, and this dragon x", 2);
        assert_eq!(freq.token_count("dragon"), 2);
        assert_eq!(freq.token_count("a"), 0);
        assert_eq!(freq.token_count("x"), 0);
        assert!(!freq.contains_token("thi"));
        assert!(!freq.contains_token("and"));
        assert!(freq.contains_token("wizard"));
    }

    #[test]
    fn clone_normalizes_like_the_original() {
        let a = Analyzer::english();
        let b = a.clone();
        let text = "The knights were fighting dragons, and this was loud";
        assert_eq!(b.normalize(text), a.normalize(text));
        assert_eq!(b.term_frequency(text, 2), a.term_frequency(text, 2));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn normalize_is_deterministic(text in "[a-zA-Z ,.'!?]{0,80}") {
            let a = Analyzer::english();
            prop_assert_eq!(a.normalize(&text), a.normalize(&text));
        }

        #[test]
        fn normalized_output_has_single_spaces(text in "[a-zA-Z0-9éüß ,.;:'!?()-]{0,60}") {
            let a = Analyzer::english();
            let out = a.normalize(&text);
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
            prop_assert!(!out.contains("  "));
        }
    }
}
