use serde_json::Value;

/// Pull the most plausible embedded JSON value out of a free-form text blob.
///
/// Three tiers, first success wins: the whole text as JSON, then each fenced
/// code block in order of appearance, then the first brace-balanced span.
/// `None` means no data was found, which is not an error.
pub fn json_from_text(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }

    if let Some(value) = from_fenced_blocks(text) {
        return Some(value);
    }

    from_first_brace(text)
}

fn from_fenced_blocks(text: &str) -> Option<Value> {
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let close = after.find("```")?;
        let block = after[..close].strip_prefix("json").unwrap_or(&after[..close]);
        if let Ok(value) = serde_json::from_str(block.trim()) {
            return Some(value);
        }
        rest = &after[close + 3..];
    }
    None
}

/// Single-attempt heuristic: only the first balanced `{...}` span is parsed.
/// Braces inside string literals are not understood; a span that fails to
/// parse ends the search.
fn from_first_brace(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return serde_json::from_str(&text[start..end]).ok();
                }
            }
            _ => {}
        }
    }
    None
}
