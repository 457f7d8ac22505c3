//! Chart adapter: spec-compile before any engine call.
//!
//! Chart blocks are structured data, and authors get JSON5 leniency. A
//! malformed spec is reported immediately as a content failure and the
//! charting engine is never invoked for it. Valid specs are normalized to
//! strict JSON before they reach the engine.

use async_trait::async_trait;

use crate::compile::NotationType;
use crate::error::BlockError;

use super::{AdapterContext, NotationAdapter, engine_failure};

pub struct ChartAdapter;

#[async_trait]
impl NotationAdapter for ChartAdapter {
    fn notation(&self) -> NotationType {
        NotationType::Chart
    }

    async fn render(&self, payload: &str, cx: &AdapterContext) -> Result<String, BlockError> {
        let spec: serde_json::Value = json5::from_str(payload)
            .map_err(|e| BlockError::Content(format!("malformed chart spec: {e}")))?;
        let normalized = spec.to_string();

        cx.invoke_engine("chartisan", "render", &normalized)
            .await
            .map_err(|e| engine_failure(&e))
    }
}
