//! Module id filters for the host hooks

use std::path::Path;

/// Query flags marking a style sheet as a static asset rather than CSS input
const SPECIAL_QUERIES: &[&str] = &["worker", "sharedworker", "raw", "url"];

/// Extension of the file part of a module id, query string ignored
fn get_extension(id: &str) -> &str {
    let filename = id.split('?').next().unwrap_or(id);
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `id` carries `?name` or `&name` as a whole word
fn has_query_flag(id: &str, names: &[&str]) -> bool {
    id.match_indices(['?', '&']).any(|(at, _)| {
        let rest = &id[at + 1..];
        names.iter().any(|name| {
            rest.strip_prefix(name)
                .map_or(false, |after| !after.starts_with(is_word_char))
        })
    })
}

/// `?index=0.css` / `&index=12.css` at the end of the id, as produced for
/// inline `<style>` blocks
fn is_inline_style_id(id: &str) -> bool {
    let Some(stem) = id.strip_suffix(".css") else {
        return false;
    };
    let Some(at) = stem.rfind("index=") else {
        return false;
    };
    let digits = &stem[at + "index=".len()..];
    let preceded = stem[..at].ends_with(['?', '&']);
    preceded && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Whether the load hook should try to treat `id` as a style-sheet root
pub fn is_potential_css_root_file(id: &str) -> bool {
    if id.contains("/.bun/") {
        return false;
    }

    let is_css_file =
        get_extension(id) == "css" || id.contains("&lang.css") || is_inline_style_id(id);

    is_css_file && !has_query_flag(id, SPECIAL_QUERIES) && !id.contains("?commonjs-proxy")
}

/// Whether the out-of-band scan should look at `id`: every module that is
/// not itself a style sheet, plus cached and raw/url imports.
pub fn is_module_graph_file(id: &str) -> bool {
    if id.contains("/.bun/") || has_query_flag(id, &["raw", "url"]) {
        return true;
    }
    get_extension(id) != "css" && !id.contains("&lang.css")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_css_is_potential_root() {
        assert!(is_potential_css_root_file("/project/src/index.css"));
        assert!(is_potential_css_root_file("/project/src/index.css?direct"));
    }

    #[test]
    fn test_framework_style_blocks() {
        assert!(is_potential_css_root_file(
            "/project/App.vue?vue&type=style&index=0&lang.css"
        ));
        assert!(is_potential_css_root_file("/project/index.html?html-proxy&index=0.css"));
    }

    #[test]
    fn test_special_queries_rejected() {
        assert!(!is_potential_css_root_file("/project/a.css?url"));
        assert!(!is_potential_css_root_file("/project/a.css?raw"));
        assert!(!is_potential_css_root_file("/project/a.css?worker"));
        assert!(!is_potential_css_root_file("/project/a.css?commonjs-proxy"));
        assert!(!is_potential_css_root_file("/project/.bun/cache/a.css"));
        // Only whole words count
        assert!(is_potential_css_root_file("/project/a.css?urlish"));
    }

    #[test]
    fn test_non_css_rejected() {
        assert!(!is_potential_css_root_file("/project/src/app.ts"));
        assert!(!is_potential_css_root_file("/project/src/index.html"));
    }

    #[test]
    fn test_module_graph_filter() {
        assert!(is_module_graph_file("/project/src/app.ts"));
        assert!(is_module_graph_file("/project/index.html"));
        assert!(is_module_graph_file("/project/a.css?raw"));
        assert!(is_module_graph_file("/project/.bun/install/cache/x.css"));
        assert!(!is_module_graph_file("/project/src/index.css"));
        assert!(!is_module_graph_file("/project/App.vue?vue&type=style&index=0&lang.css"));
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(get_extension("/a/b.css?x=y.js"), "css");
        assert_eq!(get_extension("/a/b"), "");
    }
}
