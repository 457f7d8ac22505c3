//! Flow, sequence, and class diagram adapters.
//!
//! Three notation types, one engine: each instance binds a different
//! flowkit capability. There is no secondary engine to fall back to; an
//! unusable flowkit yields a diagnostic error block for the one diagram.

use async_trait::async_trait;

use crate::compile::NotationType;
use crate::error::BlockError;

use super::{AdapterContext, NotationAdapter, engine_failure};

pub struct DiagramAdapter {
    notation: NotationType,
    capability: &'static str,
}

impl DiagramAdapter {
    pub const fn flowchart() -> Self {
        Self {
            notation: NotationType::Flowchart,
            capability: "render",
        }
    }

    pub const fn sequence() -> Self {
        Self {
            notation: NotationType::Sequence,
            capability: "render_sequence",
        }
    }

    pub const fn class_diagram() -> Self {
        Self {
            notation: NotationType::ClassDiagram,
            capability: "render_class",
        }
    }
}

#[async_trait]
impl NotationAdapter for DiagramAdapter {
    fn notation(&self) -> NotationType {
        self.notation
    }

    async fn render(&self, payload: &str, cx: &AdapterContext) -> Result<String, BlockError> {
        cx.invoke_engine("flowkit", self.capability, payload)
            .await
            .map_err(|e| engine_failure(&e))
    }
}
