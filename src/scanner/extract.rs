//! Candidate extraction from raw file contents
//!
//! Extraction is permissive: anything that could be a utility
//! class is returned, and the compiler ignores tokens it does not know.

use std::collections::HashSet;

/// Longest token still considered a candidate
const MAX_CANDIDATE_LEN: usize = 256;

/// Characters that may appear in a candidate outside of brackets
fn is_candidate_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(c, '-' | '_' | ':' | '/' | '.' | '!' | '#' | '%' | '@' | '[')
}

/// Characters that may start a candidate
fn is_candidate_start(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '!' | '@' | '[')
}

fn is_valid_candidate(token: &str) -> bool {
    let Some(first) = token.chars().next() else {
        return false;
    };

    if !is_candidate_start(first) || token.len() > MAX_CANDIDATE_LEN {
        return false;
    }

    // A dangling separator means the token was cut mid-variant or mid-value
    if token.ends_with('-') || token.ends_with('/') {
        return false;
    }

    token.chars().any(|c| c.is_ascii_alphabetic())
}

/// Extract every candidate-looking token from `content`.
///
/// Arbitrary values in brackets (`w-[calc(100%-1rem)]`) are kept whole; a
/// bracket left open at a quote or whitespace discards the token.
pub fn extract_candidates(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut token = String::new();
    let mut depth = 0usize;

    let mut flush = |token: &mut String, depth: &mut usize| {
        if *depth == 0 {
            let trimmed = token.trim_end_matches(['.', ',', ':']);
            if is_valid_candidate(trimmed) && seen.insert(trimmed.to_string()) {
                out.push(trimmed.to_string());
            }
        }
        token.clear();
        *depth = 0;
    };

    for c in content.chars() {
        if depth > 0 {
            if c.is_whitespace() || matches!(c, '"' | '\'' | '`') {
                flush(&mut token, &mut depth);
                continue;
            }
            token.push(c);
            match c {
                '[' => depth += 1,
                ']' => depth -= 1,
                _ => {}
            }
        } else if is_candidate_char(c) {
            token.push(c);
            if c == '[' {
                depth = 1;
            }
        } else {
            flush(&mut token, &mut depth);
        }
    }
    flush(&mut token, &mut depth);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_class_attribute() {
        let candidates = extract_candidates(r#"<div class="underline flex">Hello, world!</div>"#);
        assert!(candidates.contains(&"underline".to_string()));
        assert!(candidates.contains(&"flex".to_string()));
        assert!(!candidates.iter().any(|c| c.starts_with('/')));
    }

    #[test]
    fn test_variants_and_arbitrary_values() {
        let candidates = extract_candidates(r#"className="md:hover:bg-red-500 w-[calc(100%-1rem)]""#);
        assert!(candidates.contains(&"md:hover:bg-red-500".to_string()));
        assert!(candidates.contains(&"w-[calc(100%-1rem)]".to_string()));
    }

    #[test]
    fn test_unclosed_bracket_discarded() {
        let candidates = extract_candidates("w-[10px flex");
        assert_eq!(candidates, vec!["flex".to_string()]);
    }

    #[test]
    fn test_numbers_and_dangling_separators_rejected() {
        let candidates = extract_candidates("123 foo- bar/ 4.5 m-4");
        assert_eq!(candidates, vec!["m-4".to_string()]);
    }

    #[test]
    fn test_duplicates_collapsed() {
        let candidates = extract_candidates("flex flex 'flex'");
        assert_eq!(candidates, vec!["flex".to_string()]);
    }

    #[test]
    fn test_trailing_punctuation_trimmed() {
        let candidates = extract_candidates("use underline.");
        assert!(candidates.contains(&"underline".to_string()));
    }
}
