//! Music tablature adapter.

use async_trait::async_trait;

use crate::compile::NotationType;
use crate::error::BlockError;

use super::{AdapterContext, NotationAdapter, engine_failure};

pub struct TablatureAdapter;

#[async_trait]
impl NotationAdapter for TablatureAdapter {
    fn notation(&self) -> NotationType {
        NotationType::Tablature
    }

    async fn render(&self, payload: &str, cx: &AdapterContext) -> Result<String, BlockError> {
        cx.invoke_engine("staffline", "render", payload)
            .await
            .map_err(|e| engine_failure(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests_support::offline_context;
    use super::*;

    #[tokio::test]
    async fn test_tab_renders_verbatim_strings() {
        let cx = offline_context();
        let out = TablatureAdapter
            .render("e|--0--2--|\nB|--1--3--|", &cx)
            .await
            .unwrap();
        assert!(out.contains("e|--0--2--|"));
    }

    #[tokio::test]
    async fn test_prose_is_a_content_failure() {
        let cx = offline_context();
        let err = TablatureAdapter.render("no strings here", &cx).await.unwrap_err();
        assert!(matches!(err, BlockError::Content(_)));
    }
}
