//! Chunk reconciliation for push-based delivery.
//!
//! Native incremental streaming from the model is unreliable across
//! environments. When fragments were observed they are delivered as-is;
//! otherwise the final text is re-chunked on word and sentence boundaries
//! so the push consumer still receives a paced sequence instead of one
//! giant blob.

use truthsync_core::defaults;

/// Decide the ordered chunk sequence to deliver for a completed generation.
///
/// A non-empty fragment log means native streaming occurred: the chunks are
/// exactly the non-empty logged fragments in arrival order. An empty log
/// falls back to boundary-aware synthesis from the final text.
pub fn reconcile(final_text: &str, fragment_log: &[String]) -> Vec<String> {
    if !fragment_log.is_empty() {
        return fragment_log
            .iter()
            .filter(|fragment| !fragment.trim().is_empty())
            .cloned()
            .collect();
    }
    synthesize_chunks(final_text)
}

/// Sentence-terminal tokens: ASCII terminators plus the Korean
/// sentence-ending suffixes the model produces.
fn ends_sentence(token: &str) -> bool {
    token.ends_with('.')
        || token.ends_with('!')
        || token.ends_with('?')
        || token.ends_with("다.")
        || token.ends_with("요.")
        || token.ends_with("죠.")
}

/// Split the final text into chunks on whitespace, flushing at sentence
/// boundaries, at [`defaults::FALLBACK_CHUNK_MAX_TOKENS`] tokens, and at
/// the final token. Each chunk is trimmed with one trailing space appended.
fn synthesize_chunks(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut token_count = 0usize;

    for (i, word) in words.iter().enumerate() {
        current.push_str(word);
        current.push(' ');
        token_count += 1;

        let flush = ends_sentence(word)
            || token_count >= defaults::FALLBACK_CHUNK_MAX_TOKENS
            || i == words.len() - 1;

        if flush {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                chunks.push(format!("{} ", trimmed));
            }
            current.clear();
            token_count = 0;
        }
    }

    chunks
}
