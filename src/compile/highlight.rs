//! Syntax highlighting for plain code fences.
//!
//! Fences whose language is not a notation fall through here. Syntax and
//! theme sets are expensive to build, so both load lazily and once.

use std::sync::OnceLock;

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::markup::{escape_attr, escape_text};

/// Highlighted markup for a code fence.
///
/// Unknown languages and highlighter failures degrade to an escaped plain
/// block; this never errors out of the compile pass.
pub fn highlight_fence(language: Option<&str>, code: &str) -> String {
    let Some(language) = language.filter(|l| !l.is_empty()) else {
        return plain_block(None, code);
    };

    let syntaxes = syntax_set();
    let syntax = syntaxes
        .find_syntax_by_token(language)
        .or_else(|| syntaxes.find_syntax_by_name(language));
    let Some(syntax) = syntax else {
        return plain_block(Some(language), code);
    };

    match highlighted_html_for_string(code, syntaxes, syntax, theme()) {
        Ok(html) => format!(
            r#"<div class="ink-code" data-lang="{}">{html}</div>"#,
            escape_attr(language)
        ),
        Err(_) => plain_block(Some(language), code),
    }
}

fn plain_block(language: Option<&str>, code: &str) -> String {
    let lang_attr = language
        .map(|l| format!(r#" data-lang="{}""#, escape_attr(l)))
        .unwrap_or_default();
    format!(
        "<div class=\"ink-code\"{lang_attr}><pre><code>{}</code></pre></div>",
        escape_text(code)
    )
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let theme_set = ThemeSet::load_defaults();
        for name in ["InspiredGitHub", "base16-ocean.light", "Solarized (light)"] {
            if let Some(theme) = theme_set.themes.get(name) {
                return theme.clone();
            }
        }
        theme_set.themes.values().next().cloned().unwrap_or_default()
    })
}
