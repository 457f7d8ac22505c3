//! Flow, sequence, and class diagram core.
//!
//! Compiles its edge/message grammars up front on a background task when a
//! runtime is available, so a freshly loaded handle is briefly not warm.
//! That window is what the resolver's readiness poll covers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EngineError;
use crate::library::descriptor::SourceKind;
use crate::library::engine::EngineHandle;
use crate::markup::escape_text;

const NODE_W: u32 = 150;
const NODE_H: u32 = 34;
const GAP: u32 = 26;

static EDGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\w+)(?:\[([^\]]*)\]|\(([^)]*)\))?\s*-->\s*(?:\|([^|]*)\|\s*)?(\w+)(?:\[([^\]]*)\]|\(([^)]*)\))?\s*$")
        .expect("edge pattern")
});
static MESSAGE: Lazy<Regex> = Lazy::new(|| {
    // Solid and dashed arrows, sync and async: ->, -->, ->>, -->>.
    Regex::new(r"^\s*(\w+)\s*-+>{1,2}\s*(\w+)\s*:\s*(.+)$").expect("message pattern")
});

pub fn construct(origin: SourceKind) -> EngineHandle {
    let handle = EngineHandle::new("flowkit", origin)
        .with_capability("render", render_flow)
        .with_capability("render_sequence", render_sequence)
        .with_capability("render_class", render_class)
        .begin_warmup();

    let token = handle.warmup_token();
    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        runtime.spawn(async move {
            warm_grammars();
            token.complete();
        });
    } else {
        warm_grammars();
        token.complete();
    }
    handle
}

fn warm_grammars() {
    Lazy::force(&EDGE);
    Lazy::force(&MESSAGE);
}

fn reject(message: impl Into<String>) -> EngineError {
    EngineError::Rejected {
        engine: "flowkit".to_string(),
        message: message.into(),
    }
}

struct FlowGraph {
    nodes: Vec<(String, String)>,
    edges: Vec<(usize, usize, Option<String>)>,
}

fn parse_flow(payload: &str) -> Result<FlowGraph, EngineError> {
    let mut graph = FlowGraph {
        nodes: Vec::new(),
        edges: Vec::new(),
    };

    for line in payload.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("flowchart") || trimmed.starts_with("graph") {
            continue;
        }
        let caps = EDGE
            .captures(trimmed)
            .ok_or_else(|| reject(format!("unparseable edge: {trimmed}")))?;

        let from_id = caps[1].to_string();
        let from_label = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map_or_else(|| from_id.clone(), |m| m.as_str().to_string());
        let edge_label = caps.get(4).map(|m| m.as_str().trim().to_string());
        let to_id = caps[5].to_string();
        let to_label = caps
            .get(6)
            .or_else(|| caps.get(7))
            .map_or_else(|| to_id.clone(), |m| m.as_str().to_string());

        let from = intern(&mut graph.nodes, from_id, from_label);
        let to = intern(&mut graph.nodes, to_id, to_label);
        graph.edges.push((from, to, edge_label));
    }

    if graph.nodes.is_empty() {
        return Err(reject("no edges found"));
    }
    Ok(graph)
}

fn push_unique(items: &mut Vec<String>, item: &str) {
    if !items.iter().any(|existing| existing == item) {
        items.push(item.to_string());
    }
}

fn intern(nodes: &mut Vec<(String, String)>, id: String, label: String) -> usize {
    if let Some(idx) = nodes.iter().position(|(existing, _)| *existing == id) {
        // A later occurrence may carry the label the first one lacked.
        if nodes[idx].1 == nodes[idx].0 && label != id {
            nodes[idx].1 = label;
        }
        return idx;
    }
    nodes.push((id, label));
    nodes.len() - 1
}

/// Render a flowchart as a vertical node stack with labeled connectors.
fn render_flow(payload: &str) -> Result<String, EngineError> {
    let graph = parse_flow(payload)?;
    let height = graph.nodes.len() as u32 * (NODE_H + GAP);
    let mut svg = format!(
        r#"<svg class="ink-flow" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {height}">"#,
        w = NODE_W + 120
    );

    for (idx, (_, label)) in graph.nodes.iter().enumerate() {
        let y = idx as u32 * (NODE_H + GAP);
        svg.push_str(&format!(
            r#"<rect x="10" y="{y}" width="{NODE_W}" height="{NODE_H}" rx="4"/><text x="{tx}" y="{ty}" text-anchor="middle">{label}</text>"#,
            tx = 10 + NODE_W / 2,
            ty = y + NODE_H / 2 + 5,
            label = escape_text(label),
        ));
    }

    for (from, to, label) in &graph.edges {
        let y1 = *from as u32 * (NODE_H + GAP) + NODE_H;
        let y2 = *to as u32 * (NODE_H + GAP);
        svg.push_str(&format!(
            r#"<line x1="{x}" y1="{y1}" x2="{x}" y2="{y2}" marker-end="url(#ink-arrow)"/>"#,
            x = 10 + NODE_W / 2,
        ));
        if let Some(label) = label {
            svg.push_str(&format!(
                r#"<text x="{x}" y="{y}" class="ink-edge-label">{label}</text>"#,
                x = 20 + NODE_W,
                y = (y1 + y2) / 2,
                label = escape_text(label),
            ));
        }
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// Render a sequence diagram: lifelines plus ordered messages.
fn render_sequence(payload: &str) -> Result<String, EngineError> {
    let mut actors: Vec<String> = Vec::new();
    let mut messages: Vec<(String, String, String)> = Vec::new();

    for line in payload.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("sequenceDiagram") {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("participant ") {
            push_unique(&mut actors, rest.trim());
            continue;
        }
        let caps = MESSAGE
            .captures(trimmed)
            .ok_or_else(|| reject(format!("unparseable message: {trimmed}")))?;
        push_unique(&mut actors, &caps[1]);
        push_unique(&mut actors, &caps[2]);
        messages.push((caps[1].to_string(), caps[2].to_string(), caps[3].trim().to_string()));
    }

    if messages.is_empty() {
        return Err(reject("no messages found"));
    }

    let mut svg = String::from(r#"<svg class="ink-sequence" xmlns="http://www.w3.org/2000/svg">"#);
    for (idx, actor) in actors.iter().enumerate() {
        svg.push_str(&format!(
            r#"<text x="{x}" y="16" class="ink-actor">{name}</text>"#,
            x = 20 + idx * 140,
            name = escape_text(actor),
        ));
    }
    for (idx, (from, to, text)) in messages.iter().enumerate() {
        svg.push_str(&format!(
            r#"<text x="20" y="{y}">{from} → {to}: {text}</text>"#,
            y = 44 + idx * 22,
            from = escape_text(from),
            to = escape_text(to),
            text = escape_text(text),
        ));
    }
    svg.push_str("</svg>");
    Ok(svg)
}

/// Render a class diagram: one titled box per `class Name { members }`.
fn render_class(payload: &str) -> Result<String, EngineError> {
    let mut classes: Vec<(String, Vec<String>)> = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for line in payload.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("class ") {
            let name = rest.trim_end_matches('{').trim().to_string();
            if name.is_empty() {
                return Err(reject("class with empty name"));
            }
            if let Some(done) = current.take() {
                classes.push(done);
            }
            current = Some((name, Vec::new()));
        } else if trimmed == "}" {
            if let Some(done) = current.take() {
                classes.push(done);
            }
        } else if !trimmed.is_empty() {
            match current.as_mut() {
                Some((_, members)) => members.push(trimmed.to_string()),
                None => return Err(reject(format!("member outside class: {trimmed}"))),
            }
        }
    }
    if let Some(done) = current.take() {
        classes.push(done);
    }
    if classes.is_empty() {
        return Err(reject("no classes found"));
    }

    let mut svg = String::from(r#"<svg class="ink-class" xmlns="http://www.w3.org/2000/svg">"#);
    for (idx, (name, members)) in classes.iter().enumerate() {
        let x = 10 + idx as u32 * (NODE_W + 30);
        svg.push_str(&format!(
            r#"<rect x="{x}" y="10" width="{NODE_W}" height="{h}"/><text x="{tx}" y="30" text-anchor="middle" class="ink-class-name">{name}</text>"#,
            h = 30 + members.len() as u32 * 18,
            tx = x + NODE_W / 2,
            name = escape_text(name),
        ));
        for (m_idx, member) in members.iter().enumerate() {
            svg.push_str(&format!(
                r#"<text x="{mx}" y="{my}">{member}</text>"#,
                mx = x + 8,
                my = 48 + m_idx as u32 * 18,
                member = escape_text(member),
            ));
        }
    }
    svg.push_str("</svg>");
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flow_renders_nodes_and_edges() {
        let handle = construct(SourceKind::Embedded);
        let svg = handle.invoke("render", "A[Start]-->B[End]").unwrap();
        assert!(svg.contains("Start"));
        assert!(svg.contains("End"));
        assert!(svg.contains("<line"));
    }

    #[tokio::test]
    async fn test_flow_edge_labels_survive() {
        let handle = construct(SourceKind::Embedded);
        let svg = handle.invoke("render", "A-->|yes|B").unwrap();
        assert!(svg.contains("yes"));
    }

    #[tokio::test]
    async fn test_flow_rejects_garbage() {
        let handle = construct(SourceKind::Embedded);
        let err = handle.invoke("render", "not a diagram at all!").unwrap_err();
        assert!(matches!(err, EngineError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_flow_escapes_labels() {
        let handle = construct(SourceKind::Embedded);
        let svg = handle.invoke("render", "A[a<b]-->B").unwrap();
        assert!(svg.contains("a&lt;b"));
        assert!(!svg.contains("a<b]"));
    }

    #[tokio::test]
    async fn test_sequence_orders_messages() {
        let handle = construct(SourceKind::Embedded);
        let svg = handle
            .invoke("render_sequence", "Alice->>Bob: Hello\nBob-->Alice: Hi")
            .unwrap();
        let hello = svg.find("Hello").unwrap();
        let hi = svg.find("Hi").unwrap();
        assert!(hello < hi);
    }

    #[tokio::test]
    async fn test_class_boxes_carry_members() {
        let handle = construct(SourceKind::Embedded);
        let svg = handle
            .invoke("render_class", "class Pass {\n  id: u64\n  markup: String\n}")
            .unwrap();
        assert!(svg.contains("Pass"));
        assert!(svg.contains("id: u64"));
    }

    #[tokio::test]
    async fn test_handle_becomes_warm() {
        let handle = construct(SourceKind::Embedded);
        // Warmup is spawned; yield until it lands.
        for _ in 0..100 {
            if handle.is_warm() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(handle.is_warm());
    }
}
