//! In-process circuit diagram core.
//!
//! The fallback behind the privileged host typesetter: renders the netlist
//! as an annotated component listing rather than a typeset schematic, which
//! is the degraded-but-useful shape the preview shows when the host helper
//! is unavailable.

use crate::error::EngineError;
use crate::library::descriptor::SourceKind;
use crate::library::engine::EngineHandle;
use crate::markup::escape_text;

pub fn construct(origin: SourceKind) -> EngineHandle {
    EngineHandle::new("circuitex", origin).with_capability("render", render)
}

fn render(payload: &str) -> Result<String, EngineError> {
    let lines: Vec<&str> = payload
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('%'))
        .collect();
    if lines.is_empty() {
        return Err(EngineError::Rejected {
            engine: "circuitex".to_string(),
            message: "empty netlist".to_string(),
        });
    }

    let height = 24 + lines.len() as u32 * 18;
    let mut svg = format!(
        r#"<svg class="ink-circuit" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 360 {height}"><rect x="1" y="1" width="358" height="{rh}" fill="none"/>"#,
        rh = height - 2
    );
    for (idx, line) in lines.iter().enumerate() {
        svg.push_str(&format!(
            r#"<text x="12" y="{y}" class="ink-net">{line}</text>"#,
            y = 22 + idx as u32 * 18,
            line = escape_text(line),
        ));
    }
    svg.push_str("</svg>");
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netlist_lines_become_rows() {
        let handle = construct(SourceKind::Embedded);
        let svg = handle.invoke("render", "R1 1 2 10k\nC1 2 0 100n").unwrap();
        assert_eq!(svg.matches("<text").count(), 2);
        assert!(svg.contains("R1 1 2 10k"));
    }

    #[test]
    fn test_comments_and_blanks_are_skipped() {
        let handle = construct(SourceKind::Embedded);
        let svg = handle.invoke("render", "% comment\n\nR1 1 2 10k").unwrap();
        assert_eq!(svg.matches("<text").count(), 1);
    }

    #[test]
    fn test_empty_netlist_rejected() {
        let handle = construct(SourceKind::Embedded);
        let err = handle.invoke("render", "% only comments").unwrap_err();
        assert!(matches!(err, EngineError::Rejected { .. }));
    }
}
