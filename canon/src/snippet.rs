//! Query tokenization, term counting and snippet windows.

/// Default size of a snippet window, in characters.
pub const DEFAULT_SNIPPET_WINDOW: usize = 400;

/// A window of document text selected for a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// Character offset of the window in the source text.
    pub offset: usize,

    /// The trimmed window text.
    pub text: String,
}

/// Split a query into lowercase ASCII alphanumeric terms.
///
/// Duplicate terms are kept, so a repeated word weighs twice.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Count non-overlapping occurrences of every term in already-lowercased text.
pub fn count_terms(lowercased: &str, terms: &[String]) -> usize {
    terms.iter().map(|t| lowercased.matches(t.as_str()).count()).sum()
}

/// Pick the window of `window` characters with the most term hits.
///
/// Windows start every `window / 2` characters. The first window wins ties,
/// so a text made only of the term yields offset 0.
pub fn extract_snippet(text: &str, terms: &[String], window: usize) -> Snippet {
    let window = window.max(1);
    let stride = (window / 2).max(1);

    // Terms are ASCII, so ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut best_offset = 0;
    let mut best_count: Option<usize> = None;

    for start in (0..char_len).step_by(stride) {
        let end = (start + window).min(char_len);
        let count = count_terms(&lower[boundaries[start]..boundaries[end]], terms);
        if best_count.is_none_or(|best| count > best) {
            best_count = Some(count);
            best_offset = start;
        }
    }

    let end = (best_offset + window).min(char_len);
    Snippet {
        offset: best_offset,
        text: text[boundaries[best_offset]..boundaries[end]].trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokenize_splits_on_non_alphanumerics() {
        assert_eq!(
            tokenize("The Dragon's lair, 2nd floor!"),
            vec!["the", "dragon", "s", "lair", "2nd", "floor"]
        );
        assert!(tokenize("  --- ").is_empty());
    }

    #[test]
    fn test_count_terms_is_non_overlapping() {
        let terms = vec!["aa".to_string()];
        assert_eq!(count_terms("aaaa", &terms), 2);
        assert_eq!(count_terms("aaa", &terms), 1);
    }

    #[test]
    fn test_snippet_of_term_only_text_starts_at_zero() {
        let terms = tokenize("dragon");
        let snippet = extract_snippet("dragon", &terms, DEFAULT_SNIPPET_WINDOW);
        assert_eq!(snippet.offset, 0);
        assert_eq!(snippet.text, "dragon");
    }

    #[test]
    fn test_snippet_prefers_densest_window() {
        let text = format!("{}dragon dragon dragon{}", "x".repeat(30), "y".repeat(30));
        let terms = tokenize("dragon");
        let snippet = extract_snippet(&text, &terms, 20);
        assert_eq!(snippet.offset, 30);
        assert_eq!(snippet.text, "dragon dragon dragon");
    }

    #[test]
    fn test_snippet_ties_keep_first_window() {
        let text = format!("gate{}gate", " ".repeat(16));
        let terms = tokenize("gate");
        let snippet = extract_snippet(&text, &terms, 10);
        assert_eq!(snippet.offset, 0);
    }

    #[test]
    fn test_snippet_respects_multibyte_text() {
        let text = "ééé dragon ééé";
        let terms = tokenize("dragon");
        let snippet = extract_snippet(text, &terms, 400);
        assert_eq!(snippet.text, text);
    }
}
