//! Mind-map transform core.
//!
//! Turns heading/outline markers into a nested list the host styles as a
//! radial map. The mindmap adapter keeps its own cruder copy of this
//! derivation as a structural fallback; this core is the visual transform.

use crate::error::EngineError;
use crate::library::descriptor::SourceKind;
use crate::library::engine::EngineHandle;
use crate::markup::escape_text;

pub fn construct(origin: SourceKind) -> EngineHandle {
    EngineHandle::new("mindgraph", origin).with_capability("transform", transform)
}

/// Outline depth and text of a single payload line, if it is a node.
fn node_of(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return None;
    }

    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if hashes > 0 && trimmed.chars().nth(hashes).is_some_and(char::is_whitespace) {
        return Some((hashes, trimmed[hashes..].trim().to_string()));
    }

    if let Some(rest) = trimmed.strip_prefix("- ") {
        let indent = line.len() - trimmed.len();
        // Two indent columns per outline level, below any heading levels.
        return Some((7 + indent / 2, rest.trim().to_string()));
    }

    None
}

fn transform(payload: &str) -> Result<String, EngineError> {
    let nodes: Vec<(usize, String)> = payload.lines().filter_map(node_of).collect();
    if nodes.is_empty() {
        return Err(EngineError::Rejected {
            engine: "mindgraph".to_string(),
            message: "no headings or outline items".to_string(),
        });
    }

    let mut out = String::from(r#"<div class="ink-mindmap">"#);
    let mut open: Vec<usize> = Vec::new();
    for (depth, text) in nodes {
        while open.last().is_some_and(|&d| d >= depth) {
            out.push_str("</li></ul>");
            open.pop();
        }
        out.push_str("<ul><li>");
        out.push_str(&format!(r#"<span class="ink-node">{}</span>"#, escape_text(&text)));
        open.push(depth);
    }
    for _ in open {
        out.push_str("</li></ul>");
    }
    out.push_str("</div>");
    Ok(out)
}
