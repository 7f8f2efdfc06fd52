//! Token budget estimation
//!
//! Character-based heuristic calibrated against the corpus (~1.64
//! chars/token measured; the configured ratio sits below that so token
//! counts are over-estimated, which is the safe direction for context
//! packing). Pure functions over [`RetrievalConfig`] constants.

use bayan_common::config::RetrievalConfig;
use bayan_common::types::ChatMessage;

/// Estimate token count from text length
pub fn estimate_tokens(text: &str, cfg: &RetrievalConfig) -> usize {
    (text.len() as f32 / cfg.chars_per_token) as usize
}

/// Fixed overhead for prompt scaffolding ("## Source Texts", headers)
const PROMPT_OVERHEAD_TOKENS: usize = 50;

/// Token budget available for source text after accounting for the
/// system prompt, conversation history, question, query-context wrapper,
/// reserved output, and safety margin.
///
/// Never returns less than `min_source_budget`, so downstream tiering
/// always has a workable (if degraded) budget.
pub fn available_source_tokens(
    system_prompt: &str,
    history: &[ChatMessage],
    question: &str,
    context: &str,
    cfg: &RetrievalConfig,
) -> usize {
    let mut used = estimate_tokens(system_prompt, cfg);
    for msg in history {
        used += estimate_tokens(&msg.content, cfg);
    }
    used += estimate_tokens(question, cfg);
    used += estimate_tokens(context, cfg);
    used += PROMPT_OVERHEAD_TOKENS;

    let budget = cfg.context_window as i64
        - cfg.max_output_tokens as i64
        - cfg.safety_margin as i64
        - used as i64;
    budget.max(cfg.min_source_budget as i64) as usize
}

/// Trim conversation history to a token budget, dropping the oldest
/// messages first. The last message (the current turn) is always kept.
pub fn trim_history(messages: &[ChatMessage], cfg: &RetrievalConfig) -> Vec<ChatMessage> {
    let Some(last) = messages.last() else {
        return Vec::new();
    };

    let mut total = estimate_tokens(&last.content, cfg);
    let mut keep_from = messages.len() - 1;

    for i in (0..messages.len() - 1).rev() {
        let msg_tokens = estimate_tokens(&messages[i].content, cfg);
        if total + msg_tokens > cfg.history_budget_tokens {
            break;
        }
        total += msg_tokens;
        keep_from = i;
    }

    if keep_from > 0 {
        tracing::info!(
            original = messages.len(),
            kept = messages.len() - keep_from,
            approx_tokens = total,
            "History trimmed"
        );
    }
    messages[keep_from..].to_vec()
}
