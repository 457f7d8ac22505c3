//! Music tablature core.
//!
//! Tablature is already a monospace notation; the core validates the
//! string lines and wraps them in a figure the host styles, keeping column
//! alignment byte-for-byte.

use crate::error::EngineError;
use crate::library::descriptor::SourceKind;
use crate::library::engine::EngineHandle;
use crate::markup::escape_text;

pub fn construct(origin: SourceKind) -> EngineHandle {
    EngineHandle::new("staffline", origin).with_capability("render", render)
}

fn render(payload: &str) -> Result<String, EngineError> {
    let lines: Vec<&str> = payload.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Err(EngineError::Rejected {
            engine: "staffline".to_string(),
            message: "empty tablature".to_string(),
        });
    }
    let string_lines = lines.iter().filter(|l| l.contains('|')).count();
    if string_lines == 0 {
        return Err(EngineError::Rejected {
            engine: "staffline".to_string(),
            message: "no string lines (expected `|` separators)".to_string(),
        });
    }

    let mut out = String::from(r#"<figure class="ink-tab"><pre>"#);
    for line in lines {
        out.push_str(&escape_text(line));
        out.push('\n');
    }
    out.push_str("</pre></figure>");
    Ok(out)
}
