//! Clause pruning for `BEGIN` scopes.
//!
//! A scope is dropped when it renders nothing but whitespace or a lone clause
//! keyword. When it starts with a keyword directly followed by a dangling
//! `and`/`or` (the first condition was skipped), that connector is removed.

/// Words that introduce a clause or join conditions.
const CLAUSE_KEYWORDS: [&str; 6] = ["where", "and", "or", "having", "on", "set"];

fn is_clause_keyword(word: &str) -> bool {
    CLAUSE_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(word))
}

fn is_connector(word: &str) -> bool {
    word.eq_ignore_ascii_case("and") || word.eq_ignore_ascii_case("or")
}

/// Split off the leading word; a word ends at whitespace or `(`.
fn split_word(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(text.len());
    text.split_at(end)
}

/// Decide what a `BEGIN` scope contributes: `None` to discard it, otherwise
/// the text to emit.
#[must_use]
pub fn prune(rendered: &str) -> Option<String> {
    let body = rendered.trim_start();
    let lead = &rendered[..rendered.len() - body.len()];
    let (first, after_first) = split_word(body);
    if first.is_empty() && after_first.trim().is_empty() {
        return None;
    }
    if !is_clause_keyword(first) {
        return Some(rendered.to_owned());
    }

    let rest = after_first.trim_start();
    if rest.trim_end().is_empty() {
        return None;
    }
    let gap = &after_first[..after_first.len() - rest.len()];
    let gap = if gap.contains('\n') { gap } else { " " };
    let (second, after_second) = split_word(rest);
    if !is_connector(second) {
        return Some(rendered.to_owned());
    }

    let remaining = after_second.trim_start();
    if remaining.trim_end().is_empty() {
        return None;
    }
    Some(format!("{lead}{first}{gap}{remaining}"))
}
