//! Prompt template for the compliance review

/// Instruction placed before the document text
///
/// The model must close its answer with one of the three decision clauses;
/// the parser only recognizes a clause that terminates the response.
pub const REVIEW_INSTRUCTIONS: &str = "Summarize this document and identify missing or \
non-compliant clauses. At the end, you MUST explicitly state your decision as one of the \
following: 'Decision: ESCALATE', 'Decision: APPROVE', or 'Decision: FLAG'.";

/// Wrap extracted document text in the review instructions
pub fn build_prompt(document_text: &str) -> String {
    let mut prompt = String::with_capacity(REVIEW_INSTRUCTIONS.len() + document_text.len() + 20);
    prompt.push_str(REVIEW_INSTRUCTIONS);
    prompt.push_str("\n\nDocument Text:\n");
    prompt.push_str(document_text);
    prompt
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
