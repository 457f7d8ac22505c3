//! Math typesetting core.
//!
//! Always present in the runtime, so the registry resolves it through
//! `embedded_resolve` without any loading step. The output is semantic
//! markup (sup/sub structure over escaped source); full layout is the host
//! stylesheet's business.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EngineError;
use crate::library::descriptor::SourceKind;
use crate::library::engine::EngineHandle;
use crate::markup::escape_text;

static SUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^(?:\{([^}]*)\}|(\w))").expect("superscript pattern"));
static SUB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(?:\{([^}]*)\}|(\w))").expect("subscript pattern"));

pub fn construct(origin: SourceKind) -> EngineHandle {
    EngineHandle::new("mathcore", origin)
        .with_capability("render_inline", |payload| typeset(payload, false))
        .with_capability("render_display", |payload| typeset(payload, true))
}

/// The runtime-resident handle used by `embedded_resolve`.
pub fn embedded() -> Option<EngineHandle> {
    Some(construct(SourceKind::Embedded))
}

fn typeset(payload: &str, display: bool) -> Result<String, EngineError> {
    let source = payload.trim();
    if source.is_empty() {
        return Err(EngineError::Rejected {
            engine: "mathcore".to_string(),
            message: "empty expression".to_string(),
        });
    }

    let escaped = escape_text(source);
    let with_sup = SUP.replace_all(&escaped, |caps: &regex::Captures<'_>| {
        let body = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("<sup>{body}</sup>")
    });
    let with_sub = SUB.replace_all(&with_sup, |caps: &regex::Captures<'_>| {
        let body = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("<sub>{body}</sub>")
    });

    let class = if display { "ink-math ink-math-display" } else { "ink-math" };
    Ok(format!(r#"<span class="{class}">{with_sub}</span>"#))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_superscript() {
        let handle = construct(SourceKind::Embedded);
        let out = handle.invoke("render_inline", "x^2").unwrap();
        assert_eq!(out, r#"<span class="ink-math">x<sup>2</sup></span>"#);
    }

    #[test]
    fn test_braced_subscript() {
        let handle = construct(SourceKind::Embedded);
        let out = handle.invoke("render_inline", "a_{ij}").unwrap();
        assert!(out.contains("<sub>ij</sub>"));
    }

    #[test]
    fn test_display_class_differs() {
        let handle = construct(SourceKind::Embedded);
        let out = handle.invoke("render_display", "E = mc^2").unwrap();
        assert!(out.contains("ink-math-display"));
    }

    #[test]
    fn test_source_is_escaped() {
        let handle = construct(SourceKind::Embedded);
        let out = handle.invoke("render_inline", "a < b").unwrap();
        assert!(out.contains("a &lt; b"));
    }

    #[test]
    fn test_empty_expression_rejected() {
        let handle = construct(SourceKind::Embedded);
        let err = handle.invoke("render_inline", "   ").unwrap_err();
        assert!(matches!(err, EngineError::Rejected { .. }));
    }

    #[test]
    fn test_embedded_handle_is_ready_material() {
        let handle = embedded().unwrap();
        assert!(handle.is_warm());
        assert!(handle.has_capability("render_inline"));
        assert!(handle.has_capability("render_display"));
    }
}
