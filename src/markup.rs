//! Markup escaping and fragment sanitizing.
//!
//! The compiler escapes everything it interpolates itself. Content that
//! crosses a trust boundary (host gateway replies, engine fallback output in
//! the same adapter) additionally passes [`sanitize_fragment`] so both paths
//! are held to the same rule.

use once_cell::sync::Lazy;
use regex::Regex;

/// Escape text for interpolation into element content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text for interpolation into a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?(?:</script\s*>|$)").expect("script pattern"));
static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("handler pattern")
});

/// Strip executable surface from a markup fragment.
///
/// Removes `<script>` blocks and inline event-handler attributes. The result
/// is displayable markup with no interactive or executable content, which is
/// the bar placeholder substitutions are held to regardless of where the
/// fragment came from.
pub fn sanitize_fragment(fragment: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(fragment, "");
    EVENT_HANDLER.replace_all(&without_scripts, "").into_owned()
}
