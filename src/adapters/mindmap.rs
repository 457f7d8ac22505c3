//! Mind-map adapter: single engine with a graceful structural fallback.
//!
//! When the mindgraph transform is unusable, the adapter derives a bare
//! hierarchical list from the heading markers itself, so the user sees a
//! tree rather than an error panel. Payloads with no derivable structure
//! are content failures either way.

use async_trait::async_trait;

use crate::compile::NotationType;
use crate::error::{BlockError, EngineError};
use crate::markup::escape_text;

use super::{AdapterContext, AdapterPhase, NotationAdapter, PhaseTrace};

pub struct MindmapAdapter;

#[async_trait]
impl NotationAdapter for MindmapAdapter {
    fn notation(&self) -> NotationType {
        NotationType::Mindmap
    }

    async fn render(&self, payload: &str, cx: &AdapterContext) -> Result<String, BlockError> {
        let mut trace = PhaseTrace::new(self.notation());

        trace.advance(AdapterPhase::InvokingPrimary);
        match cx.invoke_engine("mindgraph", "transform", payload).await {
            Ok(content) => {
                trace.advance(AdapterPhase::Succeeded);
                Ok(content)
            }
            Err(EngineError::Rejected { message, .. }) => {
                // The engine saw the payload and found nothing to map;
                // the fallback would not do better.
                trace.advance(AdapterPhase::Failed);
                Err(BlockError::Content(message))
            }
            Err(err) => {
                trace.advance(AdapterPhase::InvokingFallback);
                tracing::debug!(error = %err, "mindgraph unusable; deriving structural tree");
                match heading_tree(payload) {
                    Some(tree) => {
                        trace.advance(AdapterPhase::Succeeded);
                        Ok(tree)
                    }
                    None => {
                        trace.advance(AdapterPhase::Failed);
                        Err(BlockError::Content("no headings to map".to_string()))
                    }
                }
            }
        }
    }
}

/// Minimal non-visual tree: heading markers only, nested by level.
fn heading_tree(payload: &str) -> Option<String> {
    let mut items: Vec<(usize, &str)> = Vec::new();
    for line in payload.lines() {
        let trimmed = line.trim_start();
        let level = trimmed.chars().take_while(|&c| c == '#').count();
        if level > 0 && trimmed.chars().nth(level).is_some_and(char::is_whitespace) {
            items.push((level, trimmed[level..].trim()));
        }
    }
    if items.is_empty() {
        return None;
    }

    let mut out = String::from(r#"<div class="ink-mindmap ink-mindmap-outline">"#);
    let mut open: Vec<usize> = Vec::new();
    for (level, text) in items {
        while open.last().is_some_and(|&l| l >= level) {
            out.push_str("</li></ul>");
            open.pop();
        }
        out.push_str("<ul><li>");
        out.push_str(&escape_text(text));
        open.push(level);
    }
    for _ in open {
        out.push_str("</li></ul>");
    }
    out.push_str("</div>");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::super::tests_support::{context_without_engines, offline_context};
    use super::*;

    #[tokio::test]
    async fn test_engine_transform_is_primary() {
        let cx = offline_context();
        let out = MindmapAdapter.render("# Core\n## Resolver", &cx).await.unwrap();
        assert!(out.contains("ink-node"), "expected the engine's visual transform");
    }

    #[tokio::test]
    async fn test_structural_fallback_when_engine_unavailable() {
        let cx = context_without_engines();
        let out = MindmapAdapter.render("# Core\n## Resolver", &cx).await.unwrap();
        assert!(out.contains("ink-mindmap-outline"));
        assert!(out.contains("Resolver"));
    }

    #[tokio::test]
    async fn test_headingless_payload_fails_even_with_fallback() {
        let cx = context_without_engines();
        let err = MindmapAdapter.render("just prose", &cx).await.unwrap_err();
        assert!(matches!(err, BlockError::Content(_)));
    }

    #[test]
    fn test_heading_tree_balances_tags() {
        let tree = heading_tree("# a\n## b\n### c\n## d").unwrap();
        assert_eq!(tree.matches("<ul>").count(), tree.matches("</ul>").count());
    }
}
