//! Declarative chart core.
//!
//! Receives a normalized JSON spec (the adapter owns JSON5 parsing and
//! rejects malformed specs before this core is ever invoked) and emits a
//! bar/line figure. The palette is registered by `preconfigure` before any
//! source attempt, because bundles read it at load time.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::config::PreviewConfig;
use crate::error::EngineError;
use crate::library::descriptor::SourceKind;
use crate::library::engine::EngineHandle;
use crate::markup::{escape_attr, escape_text};

static PALETTE: OnceLock<Vec<&'static str>> = OnceLock::new();

/// Register the shared palette; runs once before any chartisan source is
/// attempted.
pub fn preconfigure(_config: &PreviewConfig) {
    PALETTE.get_or_init(|| vec!["#4c78a8", "#f58518", "#54a24b", "#e45756", "#72b7b2"]);
}

fn palette() -> &'static [&'static str] {
    PALETTE.get_or_init(|| vec!["#4c78a8", "#f58518", "#54a24b", "#e45756", "#72b7b2"])
}

#[derive(Debug, Deserialize)]
struct ChartSpec {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: Option<String>,
    series: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    name: String,
    data: Vec<f64>,
}

pub fn construct(origin: SourceKind) -> EngineHandle {
    EngineHandle::new("chartisan", origin).with_capability("render", render)
}

fn reject(message: impl Into<String>) -> EngineError {
    EngineError::Rejected {
        engine: "chartisan".to_string(),
        message: message.into(),
    }
}

fn render(payload: &str) -> Result<String, EngineError> {
    let spec: ChartSpec =
        serde_json::from_str(payload).map_err(|e| reject(format!("bad chart spec: {e}")))?;
    if spec.series.is_empty() {
        return Err(reject("chart has no series"));
    }
    let peak = spec
        .series
        .iter()
        .flat_map(|s| s.data.iter().copied())
        .fold(0.0_f64, f64::max);
    if peak <= 0.0 {
        return Err(reject("chart has no positive values"));
    }

    let mut out = format!(
        r#"<figure class="ink-chart" data-kind="{}">"#,
        escape_attr(&spec.kind)
    );
    if let Some(title) = &spec.title {
        out.push_str(&format!("<figcaption>{}</figcaption>", escape_text(title)));
    }
    out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 320 120">"#);

    for (s_idx, series) in spec.series.iter().enumerate() {
        let color = palette()[s_idx % palette().len()];
        for (idx, value) in series.data.iter().enumerate() {
            let h = (value / peak * 100.0).max(0.0);
            out.push_str(&format!(
                r#"<rect x="{x:.1}" y="{y:.1}" width="8" height="{h:.1}" fill="{color}"><title>{name}: {value}</title></rect>"#,
                x = 10.0 + (idx * spec.series.len() + s_idx) as f64 * 10.0,
                y = 110.0 - h,
                name = escape_text(&series.name),
            ));
        }
    }

    out.push_str("</svg></figure>");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> &'static str {
        r#"{"type":"bar","title":"Latency","series":[{"name":"p50","data":[3,5,2]}]}"#
    }

    #[test]
    fn test_renders_bars_for_each_point() {
        let handle = construct(SourceKind::Embedded);
        let out = handle.invoke("render", spec()).unwrap();
        assert_eq!(out.matches("<rect").count(), 3);
        assert!(out.contains("Latency"));
        assert!(out.contains(r#"data-kind="bar""#));
    }

    #[test]
    fn test_bad_json_is_rejected() {
        let handle = construct(SourceKind::Embedded);
        let err = handle.invoke("render", "{nope").unwrap_err();
        assert!(matches!(err, EngineError::Rejected { .. }));
    }

    #[test]
    fn test_empty_series_rejected() {
        let handle = construct(SourceKind::Embedded);
        let err = handle
            .invoke("render", r#"{"type":"bar","series":[]}"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::Rejected { .. }));
    }

    #[test]
    fn test_preconfigure_is_idempotent() {
        let config = PreviewConfig::default();
        preconfigure(&config);
        preconfigure(&config);
        assert!(!palette().is_empty());
    }
}
