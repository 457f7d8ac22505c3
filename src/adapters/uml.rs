//! UML adapter: remote-service by reference.
//!
//! The payload is never executed or rendered locally: it is encoded into
//! an image reference against the configured rendering endpoint and the
//! host's document view fetches it like any other image. Failure to build
//! the reference surfaces as a broken-reference placeholder, not an error
//! propagation.

use async_trait::async_trait;
use base64::Engine;

use crate::compile::NotationType;
use crate::error::BlockError;
use crate::markup::{escape_attr, escape_text};

use super::{AdapterContext, NotationAdapter};

pub struct UmlAdapter;

#[async_trait]
impl NotationAdapter for UmlAdapter {
    fn notation(&self) -> NotationType {
        NotationType::Uml
    }

    async fn render(&self, payload: &str, cx: &AdapterContext) -> Result<String, BlockError> {
        if payload.trim().is_empty() {
            return Err(BlockError::Content("empty uml source".to_string()));
        }

        let Some(endpoint) = cx.config().uml_endpoint.as_deref() else {
            tracing::debug!("no uml endpoint configured; emitting broken reference");
            return Ok(broken_reference("no rendering endpoint configured"));
        };

        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());
        Ok(format!(
            r#"<img class="ink-uml" src="{endpoint}/svg/{encoded}" alt="uml diagram"/>"#,
            endpoint = escape_attr(endpoint.trim_end_matches('/')),
        ))
    }
}

/// The non-propagating failure shape for this adapter: a visibly broken
/// reference in place of the diagram.
fn broken_reference(reason: &str) -> String {
    format!(
        r#"<div class="ink-uml ink-uml-broken">uml diagram unavailable: {}</div>"#,
        escape_text(reason)
    )
}
