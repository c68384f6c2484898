//! Context-window sizes for known models.

/// Used when a model name matches nothing below.
pub const DEFAULT_MAX_TOKENS: usize = 128_000;

/// Share of a model's window given to the map; the rest is left for the prompt.
pub const MODEL_BUDGET_FRACTION: f64 = 0.8;

/// Substring table, checked in order, so more specific keys come first.
const KNOWN_LIMITS: &[(&str, usize)] = &[
    // OpenAI
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-4", 8_192),
    ("gpt-3.5-turbo", 16_385),
    ("o1-", 128_000),
    // Anthropic
    ("claude-3-5-sonnet", 200_000),
    ("claude-3-opus", 200_000),
    ("claude-3-sonnet", 200_000),
    ("claude-3-haiku", 200_000),
    // Google
    ("gemini-1.5-pro", 1_000_000),
    ("gemini-1.5-flash", 1_000_000),
    ("gemini-pro", 32_768),
    // Groq-hosted
    ("llama-3.1-405b", 128_000),
    ("llama-3.1-70b", 128_000),
    ("llama-3.1-8b", 128_000),
    ("llama3-70b-8192", 8_192),
    ("llama3-8b-8192", 8_192),
    ("mixtral-8x7b-32768", 32_768),
    ("gemma-7b-it", 8_192),
    ("gemma2-9b-it", 8_192),
    // DeepSeek
    ("deepseek-coder", 32_000),
    ("deepseek-chat", 32_000),
    ("openrouter", 128_000),
    ("local-model", 8_192),
];

/// Family-level guesses for names missing from the table.
const FAMILY_LIMITS: &[(&str, usize)] = &[
    ("claude-3", 200_000),
    ("gemini-1.5", 1_000_000),
    ("gemini", 32_768),
    ("llama-3.1", 128_000),
    ("llama-3", 8_192),
    ("128k", 128_000),
    ("32k", 32_000),
    ("16k", 16_000),
    ("8k", 8_192),
];

/// Context window, in tokens, for `model` (case-insensitive).
pub fn max_tokens_for_model(model: &str) -> usize {
    let name = model.to_lowercase();
    KNOWN_LIMITS
        .iter()
        .chain(FAMILY_LIMITS)
        .find(|(key, _)| name.contains(key))
        .map(|(_, limit)| *limit)
        .unwrap_or(DEFAULT_MAX_TOKENS)
}

/// Map budget for `model`: [`MODEL_BUDGET_FRACTION`] of its window, rounded down.
pub fn budget_for_model(model: &str) -> usize {
    (max_tokens_for_model(model) as f64 * MODEL_BUDGET_FRACTION) as usize
}
