//! Display math adapter.

use async_trait::async_trait;

use crate::compile::NotationType;
use crate::error::BlockError;

use super::{AdapterContext, NotationAdapter, engine_failure};

pub struct MathAdapter;

#[async_trait]
impl NotationAdapter for MathAdapter {
    fn notation(&self) -> NotationType {
        NotationType::Math
    }

    async fn render(&self, payload: &str, cx: &AdapterContext) -> Result<String, BlockError> {
        cx.invoke_engine("mathcore", "render_display", payload)
            .await
            .map_err(|e| engine_failure(&e))
    }
}
