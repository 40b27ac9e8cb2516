//! Title derivation — a short human-readable title from a conversation's
//! first user message.
//!
//! Never fails: empty or all-punctuation input yields an empty title, which
//! callers display as the placeholder instead.

/// Maximum title length in characters.
const MAX_TITLE_LEN: usize = 40;

/// Keywords that mark an "instructional" message; for these the title cuts
/// at the first period instead of the first sentence boundary.
const INSTRUCTION_KEYWORDS: &[&str] = &["explain", "what is", "how to"];

/// Derive a display title from raw message text.
///
/// 1. Fenced code blocks are stripped entirely.
/// 2. Everything except letters, digits, whitespace, `?`, `.`, `!` is dropped.
/// 3. A question keeps everything up to and including the first `?`.
/// 4. An instructional message keeps everything before the first `.`.
/// 5. Otherwise the first sentence (a `.`/`!` followed by whitespace) wins,
///    or the whole cleaned text if there is none.
/// 6. The result is bounded to 40 characters (37 + `...` when truncated).
pub fn derive_title(raw: &str) -> String {
    let stripped = strip_code_fences(raw);
    let cleaned: String = stripped
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '?' | '.' | '!'))
        .collect();
    let cleaned = cleaned.trim();

    let cut = if let Some(pos) = cleaned.find('?') {
        &cleaned[..=pos]
    } else if is_instruction(cleaned) {
        match cleaned.find('.') {
            Some(pos) => &cleaned[..pos],
            None => cleaned,
        }
    } else {
        match sentence_end(cleaned) {
            Some(pos) => &cleaned[..pos],
            None => cleaned,
        }
    };

    bound(cut.trim())
}

/// Remove fenced code blocks (``` delimited). An unclosed trailing fence is
/// dropped along with everything after it.
fn strip_code_fences(text: &str) -> String {
    text.split("```")
        .enumerate()
        .filter(|(i, _)| i % 2 == 0)
        .map(|(_, chunk)| chunk)
        .collect()
}

fn is_instruction(text: &str) -> bool {
    let lower = text.to_lowercase();
    INSTRUCTION_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Byte offset of the first `.` or `!` that is followed by whitespace.
fn sentence_end(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!') {
            if let Some((_, next)) = chars.peek() {
                if next.is_whitespace() {
                    return Some(i);
                }
            }
        }
    }
    None
}

/// Bound to `MAX_TITLE_LEN` characters, keeping 37 + `...` when truncated.
fn bound(text: &str) -> String {
    if text.chars().count() <= MAX_TITLE_LEN {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_TITLE_LEN - 3).collect();
        format!("{}...", head)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
