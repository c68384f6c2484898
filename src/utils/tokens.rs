//! Token counting and token-safe truncation.
//!
//! Counts use the `cl100k_base` BPE when it loads and fall back to a
//! characters-per-token heuristic otherwise. Both paths are pure functions of
//! the input text.

use crate::error::TokenError;
use once_cell::sync::Lazy;
use tiktoken_rs::CoreBPE;

/// Appended to any text cut by [`truncate_to_tokens`].
pub const TRUNCATION_MARKER: &str = "\n... [TRUNCATED]";

const CHARS_PER_TOKEN: usize = 4;

static DEFAULT_COUNTER: Lazy<TokenCounter> = Lazy::new(TokenCounter::exact);

/// Estimate tokens using a simple heuristic (chars / 4).
///
/// Counts Unicode scalar values, not bytes, so multi-byte UTF-8 content is
/// not over-counted.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Count tokens with the shared default counter.
pub fn count_tokens(text: &str) -> usize {
    DEFAULT_COUNTER.count(text)
}

/// Truncate with the shared default counter.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    DEFAULT_COUNTER.truncate(text, max_tokens)
}

pub fn default_counter() -> &'static TokenCounter {
    &DEFAULT_COUNTER
}

pub struct TokenCounter {
    encoder: Option<CoreBPE>,
}

impl TokenCounter {
    /// Counter backed by `cl100k_base`, or the heuristic if it fails to load.
    pub fn exact() -> Self {
        let encoder = match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::debug!("cl100k_base unavailable, using heuristic token counts: {e}");
                None
            }
        };
        Self { encoder }
    }

    pub fn heuristic() -> Self {
        Self { encoder: None }
    }

    pub fn is_exact(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.exact_count(text).unwrap_or_else(|_| estimate_tokens(text))
    }

    fn exact_count(&self, text: &str) -> Result<usize, TokenError> {
        let bpe = self.encoder.as_ref().ok_or(TokenError::EncoderUnavailable)?;
        Ok(bpe.encode_ordinary(text).len())
    }

    /// Cut `text` so that `self.count(result) <= max_tokens`.
    ///
    /// Text that already fits is returned unchanged. Cut text ends with
    /// [`TRUNCATION_MARKER`] whenever the budget has room for it.
    pub fn truncate(&self, text: &str, max_tokens: usize) -> String {
        if self.count(text) <= max_tokens {
            return text.to_string();
        }
        if max_tokens == 0 {
            return String::new();
        }
        match self.exact_truncate(text, max_tokens) {
            Ok(cut) => cut,
            Err(_) => heuristic_truncate(text, max_tokens),
        }
    }

    fn exact_truncate(&self, text: &str, max_tokens: usize) -> Result<String, TokenError> {
        let bpe = self.encoder.as_ref().ok_or(TokenError::EncoderUnavailable)?;
        let tokens = bpe.encode_ordinary(text);
        let marker_tokens = bpe.encode_ordinary(TRUNCATION_MARKER).len();
        let (budget, marker) = if max_tokens > marker_tokens {
            (max_tokens - marker_tokens, TRUNCATION_MARKER)
        } else {
            (max_tokens, "")
        };

        // Back off one token at a time until the prefix decodes cleanly and
        // the re-encoded result still fits.
        let mut keep = budget.min(tokens.len());
        loop {
            match bpe.decode(tokens[..keep].to_vec()) {
                Ok(prefix) => {
                    let candidate = format!("{prefix}{marker}");
                    if self.count(&candidate) <= max_tokens {
                        return Ok(candidate);
                    }
                }
                Err(e) => {
                    let err = TokenError::Decode(e.to_string());
                    tracing::trace!("token prefix of {keep} rejected: {err}");
                }
            }
            if keep == 0 {
                return Ok(String::new());
            }
            keep -= 1;
        }
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::exact()
    }
}

/// Character-based cut matching [`estimate_tokens`].
fn heuristic_truncate(text: &str, max_tokens: usize) -> String {
    let marker_tokens = estimate_tokens(TRUNCATION_MARKER);
    if max_tokens > marker_tokens {
        let keep = (max_tokens - marker_tokens) * CHARS_PER_TOKEN;
        let mut cut: String = text.chars().take(keep).collect();
        cut.push_str(TRUNCATION_MARKER);
        cut
    } else {
        text.chars().take(max_tokens * CHARS_PER_TOKEN).collect()
    }
}

/// Cut `text` to at most `max_bytes` bytes on a char boundary, appending
/// [`TRUNCATION_MARKER`] when anything was dropped.
pub fn truncate_to_bytes(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &text[..end], TRUNCATION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "The quick brown fox jumps over the lazy dog. \
        Pack my box with five dozen liquor jugs! 日本語のテキストも含む。🚀🚀";

    #[test]
    fn empty_text_counts_zero() {
        assert_eq!(count_tokens(""), 0);
        assert_eq!(TokenCounter::heuristic().count(""), 0);
    }

    #[test]
    fn heuristic_is_chars_over_four() {
        let counter = TokenCounter::heuristic();
        assert_eq!(counter.count("abcd"), 1);
        assert_eq!(counter.count("abcdefg"), 1);
        assert_eq!(counter.count("🚀🚀🚀🚀"), 1);
    }

    #[test]
    fn count_is_pure() {
        let first = count_tokens(SAMPLE);
        assert_eq!(first, count_tokens(SAMPLE));
        assert!(first > 0);
    }

    #[test]
    fn truncate_returns_input_when_it_fits() {
        for counter in [TokenCounter::exact(), TokenCounter::heuristic()] {
            let budget = counter.count(SAMPLE);
            assert_eq!(counter.truncate(SAMPLE, budget), SAMPLE);
            assert_eq!(counter.truncate(SAMPLE, budget + 10), SAMPLE);
        }
    }

    #[test]
    fn truncate_respects_budget_for_every_size() {
        let text = SAMPLE.repeat(5);
        for counter in [TokenCounter::exact(), TokenCounter::heuristic()] {
            let total = counter.count(&text);
            for budget in 0..=total {
                let cut = counter.truncate(&text, budget);
                assert!(
                    counter.count(&cut) <= budget,
                    "budget {budget}: got {} tokens",
                    counter.count(&cut)
                );
            }
        }
    }

    #[test]
    fn truncated_text_carries_marker() {
        let text = "word ".repeat(400);
        for counter in [TokenCounter::exact(), TokenCounter::heuristic()] {
            let cut = counter.truncate(&text, 50);
            assert!(cut.ends_with(TRUNCATION_MARKER));
            assert!(cut.len() < text.len());
        }
    }

    #[test]
    fn zero_budget_yields_empty() {
        assert_eq!(truncate_to_tokens(SAMPLE, 0), "");
    }

    #[test]
    fn zero_budget_keeps_text_that_counts_zero() {
        let counter = TokenCounter::heuristic();
        assert!(!counter.is_exact());
        assert_eq!(counter.count("abc"), 0);
        assert_eq!(counter.truncate("abc", 0), "abc");
        assert_eq!(counter.truncate("", 0), "");
        assert_eq!(counter.truncate("abcdefgh", 0), "");
    }

    #[test]
    fn truncate_to_bytes_keeps_char_boundary() {
        let cut = truncate_to_bytes("héllo", 2);
        assert_eq!(cut, format!("h{TRUNCATION_MARKER}"));
        assert_eq!(truncate_to_bytes("short", 100), "short");
    }
}
