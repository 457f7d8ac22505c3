//! The renderer adapter set: one strategy per notation type.
//!
//! Adapters all share the same internal shape, `idle → invoking-primary →
//! {success | invoking-fallback} → {success | failed}`, but each encodes a
//! fallback policy appropriate to its engine's reliability. `failed` is
//! always a structured [`BlockError`] value; nothing an adapter does may
//! escape as a panic or unwind into the orchestrator.

mod chart;
mod circuit;
mod diagram;
mod math;
mod mindmap;
mod tablature;
mod timing;
mod uml;

pub use chart::ChartAdapter;
pub use circuit::CircuitAdapter;
pub use diagram::DiagramAdapter;
pub use math::MathAdapter;
pub use mindmap::MindmapAdapter;
pub use tablature::TablatureAdapter;
pub use timing::TimingAdapter;
pub use uml::UmlAdapter;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::compile::NotationType;
use crate::config::PreviewConfig;
use crate::error::{BlockError, EngineError};
use crate::host::HostGateway;
use crate::library::patch;
use crate::library::resolver::Resolver;

/// Shared services an adapter renders with.
#[derive(Clone)]
pub struct AdapterContext {
    resolver: Arc<Resolver>,
    gateway: Arc<dyn HostGateway>,
    config: Arc<PreviewConfig>,
}

impl AdapterContext {
    pub fn new(
        resolver: Arc<Resolver>,
        gateway: Arc<dyn HostGateway>,
        config: Arc<PreviewConfig>,
    ) -> Self {
        Self {
            resolver,
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn gateway(&self) -> &dyn HostGateway {
        self.gateway.as_ref()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve an engine and invoke one of its capabilities.
    ///
    /// The expected capability surface is re-asserted before the call
    /// (the defensive patch point), and a missing-capability crash is
    /// contained and retried once through the stand-in path.
    ///
    /// # Errors
    ///
    /// Returns the engine's own error; callers map it with
    /// [`engine_failure`] or use it to trigger their fallback.
    pub async fn invoke_engine(
        &self,
        engine: &str,
        capability: &str,
        payload: &str,
    ) -> Result<String, EngineError> {
        let handle = self.resolver.resolve(engine).await;
        if !handle.is_available() {
            return Err(EngineError::Unavailable {
                engine: engine.to_string(),
            });
        }

        self.resolver.ensure_expected(&handle);
        match handle.invoke(capability, payload) {
            Err(err) => {
                let expected = self.resolver.expected_capabilities(engine);
                if patch::contain_missing_capability(&handle, expected, &err) {
                    handle.invoke(capability, payload)
                } else {
                    Err(err)
                }
            }
            ok => ok,
        }
    }
}

/// One strategy for turning a payload into final content.
#[async_trait]
pub trait NotationAdapter: Send + Sync {
    fn notation(&self) -> NotationType;

    /// Render a decoded payload to markup.
    ///
    /// # Errors
    ///
    /// Returns a [`BlockError`] that the orchestrator contains to this
    /// block alone.
    async fn render(&self, payload: &str, cx: &AdapterContext) -> Result<String, BlockError>;
}

/// Map an engine error onto the block-failure taxonomy.
pub fn engine_failure(err: &EngineError) -> BlockError {
    match err {
        EngineError::Rejected { message, .. } => BlockError::Content(message.clone()),
        other => BlockError::Engine(other.to_string()),
    }
}

/// The shared adapter state machine, made observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterPhase {
    Idle,
    InvokingPrimary,
    InvokingFallback,
    Succeeded,
    Failed,
}

/// Phase tracker for adapters with a real fallback chain.
pub struct PhaseTrace {
    notation: NotationType,
    phase: AdapterPhase,
}

impl PhaseTrace {
    pub const fn new(notation: NotationType) -> Self {
        Self {
            notation,
            phase: AdapterPhase::Idle,
        }
    }

    pub fn advance(&mut self, phase: AdapterPhase) {
        debug!(notation = %self.notation, ?phase, "adapter phase");
        self.phase = phase;
    }

    pub const fn phase(&self) -> AdapterPhase {
        self.phase
    }
}

/// All registered adapters, keyed by notation type.
pub struct AdapterSet {
    adapters: HashMap<NotationType, Arc<dyn NotationAdapter>>,
}

impl AdapterSet {
    /// The stock set covering every notation the compiler defers.
    pub fn stock() -> Self {
        let adapters: Vec<Arc<dyn NotationAdapter>> = vec![
            Arc::new(MathAdapter),
            Arc::new(DiagramAdapter::flowchart()),
            Arc::new(DiagramAdapter::sequence()),
            Arc::new(DiagramAdapter::class_diagram()),
            Arc::new(CircuitAdapter),
            Arc::new(MindmapAdapter),
            Arc::new(UmlAdapter),
            Arc::new(ChartAdapter),
            Arc::new(TablatureAdapter),
            Arc::new(TimingAdapter),
        ];
        Self {
            adapters: adapters.into_iter().map(|a| (a.notation(), a)).collect(),
        }
    }

    pub fn get(&self, notation: NotationType) -> Option<Arc<dyn NotationAdapter>> {
        self.adapters.get(&notation).cloned()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_set_covers_every_notation() {
        let set = AdapterSet::stock();
        for notation in NotationType::ALL {
            assert!(set.get(notation).is_some(), "no adapter for {notation}");
        }
    }

    #[test]
    fn test_engine_failure_maps_rejection_to_content() {
        let rejected = EngineError::Rejected {
            engine: "chartisan".to_string(),
            message: "bad spec".to_string(),
        };
        assert_eq!(engine_failure(&rejected), BlockError::Content("bad spec".to_string()));

        let unavailable = EngineError::Unavailable {
            engine: "flowkit".to_string(),
        };
        assert!(matches!(engine_failure(&unavailable), BlockError::Engine(_)));
    }

    #[test]
    fn test_phase_trace_walks_the_state_machine() {
        let mut trace = PhaseTrace::new(NotationType::Circuit);
        assert_eq!(trace.phase(), AdapterPhase::Idle);
        trace.advance(AdapterPhase::InvokingPrimary);
        trace.advance(AdapterPhase::InvokingFallback);
        trace.advance(AdapterPhase::Succeeded);
        assert_eq!(trace.phase(), AdapterPhase::Succeeded);
    }
}
