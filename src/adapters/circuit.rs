//! Circuit diagram adapter: local-first, then in-process fallback.
//!
//! Proper schematic typesetting needs the privileged host helper, so the
//! gateway is primary. When the helper is missing, times out, or refuses
//! the source, the in-process circuitex engine renders a degraded listing.
//! Content from *both* paths passes the same sanitizer before it is
//! allowed into the document.

use async_trait::async_trait;
use tracing::debug;

use crate::compile::NotationType;
use crate::error::BlockError;
use crate::host::TypesetRequest;
use crate::markup::sanitize_fragment;

use super::{AdapterContext, AdapterPhase, NotationAdapter, PhaseTrace, engine_failure};

pub struct CircuitAdapter;

#[async_trait]
impl NotationAdapter for CircuitAdapter {
    fn notation(&self) -> NotationType {
        NotationType::Circuit
    }

    async fn render(&self, payload: &str, cx: &AdapterContext) -> Result<String, BlockError> {
        let mut trace = PhaseTrace::new(self.notation());

        if cx.gateway().is_connected() {
            trace.advance(AdapterPhase::InvokingPrimary);
            let request = TypesetRequest {
                source: payload.to_string(),
                variant: "circuit".to_string(),
            };
            let exchange =
                tokio::time::timeout(cx.config().gateway_timeout, cx.gateway().typeset(request))
                    .await;
            match exchange {
                Ok(Ok(reply)) if reply.success => {
                    if let Some(content) = reply.content {
                        trace.advance(AdapterPhase::Succeeded);
                        return Ok(sanitize_fragment(&content));
                    }
                    debug!("host typesetter succeeded without content");
                }
                Ok(Ok(reply)) => {
                    debug!(error = reply.error.as_deref().unwrap_or("unspecified"), "host typesetter refused source");
                }
                Ok(Err(err)) => {
                    debug!(error = %err, "host typeset exchange failed");
                }
                Err(_) => {
                    debug!("host typeset exchange timed out");
                }
            }
        }

        trace.advance(AdapterPhase::InvokingFallback);
        match cx.invoke_engine("circuitex", "render", payload).await {
            Ok(content) => {
                trace.advance(AdapterPhase::Succeeded);
                Ok(sanitize_fragment(&content))
            }
            Err(err) => {
                trace.advance(AdapterPhase::Failed);
                Err(engine_failure(&err))
            }
        }
    }
}
