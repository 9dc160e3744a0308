//! Fixed-width text layout shared by the report renderers.
//!
//! Widths are terminal display columns, so CJK labels (two columns each) line
//! up with ASCII ones.

use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";

/// Left-align `text` in `width` columns. Wider text is returned unchanged.
pub(crate) fn pad_right(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

/// Center `text` in `width` columns; the odd column goes to the right.
pub(crate) fn pad_center(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    let left = fill / 2;
    format!("{}{text}{}", " ".repeat(left), " ".repeat(fill - left))
}

/// Replace control characters (newlines, tabs, ...) with spaces so `text`
/// stays on one table row.
pub(crate) fn single_line(text: &str) -> Cow<'_, str> {
    if text.chars().any(char::is_control) {
        Cow::Owned(text.chars().map(|c| if c.is_control() { ' ' } else { c }).collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Cut `text` so it fits `width` display columns, ending in `...` when cut.
pub fn truncate_to_width(text: &str, width: usize) -> Cow<'_, str> {
    if text.width() <= width {
        return Cow::Borrowed(text);
    }

    let budget = width.saturating_sub(ELLIPSIS.len());
    let mut used = 0;
    let mut out = String::with_capacity(width);
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str(ELLIPSIS);
    Cow::Owned(out)
}
