//! Timing diagram core.
//!
//! Each payload line is `name: pattern` where the pattern is a run of
//! `1`/`0`/`.` (high, low, gap). Rows render as stepped polylines.

use crate::error::EngineError;
use crate::library::descriptor::SourceKind;
use crate::library::engine::EngineHandle;
use crate::markup::escape_text;

const STEP: u32 = 14;
const ROW_H: u32 = 30;

pub fn construct(origin: SourceKind) -> EngineHandle {
    EngineHandle::new("waveform", origin).with_capability("render", render)
}

fn render(payload: &str) -> Result<String, EngineError> {
    let mut rows: Vec<(String, String)> = Vec::new();
    for line in payload.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((name, pattern)) = trimmed.split_once(':') else {
            return Err(reject(format!("missing `:` in `{trimmed}`")));
        };
        let pattern = pattern.trim();
        if pattern.is_empty() || !pattern.chars().all(|c| matches!(c, '1' | '0' | '.')) {
            return Err(reject(format!("bad pattern for `{}`", name.trim())));
        }
        rows.push((name.trim().to_string(), pattern.to_string()));
    }
    if rows.is_empty() {
        return Err(reject("no signal rows".to_string()));
    }

    let mut svg = format!(
        r#"<svg class="ink-wave" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 {h}">"#,
        h = rows.len() as u32 * ROW_H
    );
    for (idx, (name, pattern)) in rows.iter().enumerate() {
        let base = idx as u32 * ROW_H;
        svg.push_str(&format!(
            r#"<text x="2" y="{y}">{name}</text>"#,
            y = base + 18,
            name = escape_text(name),
        ));
        let mut points = String::new();
        for (t, ch) in pattern.chars().enumerate() {
            let x0 = 60 + t as u32 * STEP;
            let y = match ch {
                '1' => base + 6,
                '0' => base + 24,
                _ => continue,
            };
            points.push_str(&format!("{x0},{y} {x1},{y} ", x1 = x0 + STEP));
        }
        svg.push_str(&format!(
            r#"<polyline points="{}" fill="none"/>"#,
            points.trim_end()
        ));
    }
    svg.push_str("</svg>");
    Ok(svg)
}

fn reject(message: String) -> EngineError {
    EngineError::Rejected {
        engine: "waveform".to_string(),
        message,
    }
}
