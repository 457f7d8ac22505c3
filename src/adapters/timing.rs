//! Timing diagram adapter.

use async_trait::async_trait;

use crate::compile::NotationType;
use crate::error::BlockError;

use super::{AdapterContext, NotationAdapter, engine_failure};

pub struct TimingAdapter;

#[async_trait]
impl NotationAdapter for TimingAdapter {
    fn notation(&self) -> NotationType {
        NotationType::Timing
    }

    async fn render(&self, payload: &str, cx: &AdapterContext) -> Result<String, BlockError> {
        cx.invoke_engine("waveform", "render", payload)
            .await
            .map_err(|e| engine_failure(&e))
    }
}
