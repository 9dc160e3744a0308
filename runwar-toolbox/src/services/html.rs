//! Minimal regex-based HTML extraction for the scraped lookup pages.
//!
//! The pages are small and their structure is fixed, so a handful of patterns
//! is enough; this is not a general HTML parser.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").ok());
static SPACE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

/// Compile a pattern; `None` for an invalid one.
pub(crate) fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern).ok()
}

/// Strip tags, decode common entities and collapse whitespace.
pub(crate) fn text(fragment: &str) -> String {
    let stripped = TAG_RE
        .as_ref()
        .map_or_else(|| fragment.to_string(), |re| re.replace_all(fragment, " ").into_owned());
    let decoded = decode_entities(&stripped);
    SPACE_RE
        .as_ref()
        .map_or_else(|| decoded.clone(), |re| re.replace_all(&decoded, " ").into_owned())
        .trim()
        .to_string()
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Inner HTML of every `<tag ...>...</tag>` in `html`, in document order.
pub(crate) fn elements<'a>(html: &'a str, tag: &str) -> Vec<&'a str> {
    let Some(re) = compile(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}>")) else {
        return Vec::new();
    };
    re.captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Inner HTML of the first `<tag>` whose opening tag matches `attr_pattern`
/// (e.g. `id="list"`).
pub(crate) fn element_with<'a>(html: &'a str, tag: &str, attr_pattern: &str) -> Option<&'a str> {
    let re = compile(&format!(
        r#"(?is)<{tag}\b[^>]*{attr_pattern}[^>]*>(.*?)</{tag}>"#
    ))?;
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_invalid_pattern() {
        assert!(compile(r"(unclosed").is_none());
        assert!(compile(r"(?i)registrar").is_some());
    }

    #[test]
    fn test_text_strips_tags_and_whitespace() {
        assert_eq!(
            text("<p>  中国 <b>广东</b>\n  深圳&nbsp;电信 </p>"),
            "中国 广东 深圳 电信"
        );
    }

    #[test]
    fn test_text_decodes_entities() {
        assert_eq!(text("A &amp; B &lt;C&gt;"), "A & B <C>");
    }

    #[test]
    fn test_elements_in_order() {
        let html = "<ul><li>a</li><li class=\"x\">b</li>\n<li>c</li></ul>";
        assert_eq!(elements(html, "li"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_elements_ignores_longer_tag_names() {
        let html = "<link rel=\"x\"><li>a</li>";
        assert_eq!(elements(html, "li"), vec!["a"]);
    }

    #[test]
    fn test_element_with_attribute() {
        let html = r#"<ul id="other"><li>x</li></ul><ul class="c" id="list"><li>y</li></ul>"#;
        assert_eq!(element_with(html, "ul", r#"id="list""#), Some("<li>y</li>"));
        assert_eq!(element_with(html, "ul", r#"id="none""#), None);
    }
}
