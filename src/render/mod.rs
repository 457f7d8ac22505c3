//! The post-processing orchestrator.
//!
//! `process` is the whole contract the host UI consumes: compile the
//! document synchronously, then resolve every placeholder asynchronously
//! and independently, substituting rendered content or a contained error
//! panel. A newer pass supersedes older in-flight passes: stale results
//! are discarded, never applied over fresher output.

mod error_block;

pub use error_block::error_block;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::adapters::{AdapterContext, AdapterSet};
use crate::compile::{BlockFailure, CompiledDocument, Compiler, PlaceholderContainer};
use crate::config::PreviewConfig;
use crate::error::BlockError;
use crate::host::{CommandGateway, DisconnectedGateway, HostGateway};
use crate::library::patch;
use crate::library::resolver::{ReadinessSummary, Resolver};
use crate::remote::{HttpTransport, OfflineTransport, Transport};

/// How one render pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass ran to completion and this is its final markup.
    Completed(String),
    /// A newer pass started before this one settled; its results were
    /// discarded.
    Superseded,
}

impl PassOutcome {
    pub fn into_markup(self) -> Option<String> {
        match self {
            Self::Completed(markup) => Some(markup),
            Self::Superseded => None,
        }
    }
}

/// One compile-plus-post-process cycle over a document snapshot.
struct RenderPass {
    number: u64,
    markup: String,
    placeholders: Vec<PlaceholderContainer>,
}

/// The rendering core's inbound surface.
pub struct Renderer {
    resolver: Arc<Resolver>,
    adapters: AdapterSet,
    context: AdapterContext,
    passes: AtomicU64,
    newest: AtomicU64,
}

impl Renderer {
    /// Assemble a renderer from configuration, choosing the transport and
    /// gateway the configuration implies.
    pub fn new(config: PreviewConfig) -> Self {
        let transport: Arc<dyn Transport> = if config.offline {
            Arc::new(OfflineTransport)
        } else {
            Arc::new(HttpTransport::new())
        };
        let gateway: Arc<dyn HostGateway> = match &config.typeset_program {
            Some(program) => Arc::new(CommandGateway::new(program.clone())),
            None => Arc::new(DisconnectedGateway),
        };
        Self::assemble(config, transport, gateway)
    }

    /// Assemble from explicit parts; the seam tests and embedders use.
    pub fn assemble(
        config: PreviewConfig,
        transport: Arc<dyn Transport>,
        gateway: Arc<dyn HostGateway>,
    ) -> Self {
        patch::install_panic_hook();
        let resolver = Arc::new(Resolver::new(config.clone(), transport));
        Self::with_resolver(resolver, gateway, config)
    }

    /// Assemble around a caller-built resolver (custom registries).
    pub fn with_resolver(
        resolver: Arc<Resolver>,
        gateway: Arc<dyn HostGateway>,
        config: PreviewConfig,
    ) -> Self {
        let context = AdapterContext::new(Arc::clone(&resolver), gateway, Arc::new(config));
        Self {
            resolver,
            adapters: AdapterSet::stock(),
            context,
            passes: AtomicU64::new(0),
            newest: AtomicU64::new(0),
        }
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Resolve every registered engine; called once at startup and safe to
    /// retry.
    pub async fn ensure_libraries_ready(&self) -> ReadinessSummary {
        let summary = self.resolver.resolve_all().await;
        if summary.all_ready() {
            info!(engines = summary.succeeded.len(), "all engines ready");
        } else {
            warn!(failed = ?summary.failed, "some engines unavailable");
        }
        summary
    }

    /// The synchronous compile half, exposed for callers that only need
    /// structure.
    pub fn compile(&self, text: &str) -> CompiledDocument {
        Compiler::new(self.resolver.peek_ready("mathcore")).compile(text)
    }

    /// Run one full render pass over a document snapshot.
    ///
    /// Never errors and never panics across this boundary: per-block
    /// failures are substituted as error panels, and a superseded pass
    /// reports [`PassOutcome::Superseded`] instead of applying stale
    /// output.
    pub async fn process(&self, text: &str) -> PassOutcome {
        let number = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
        self.newest.store(number, Ordering::SeqCst);
        debug!(pass = number, "render pass started");

        let compiled = self.compile(text);
        let mut pass = RenderPass {
            number,
            markup: compiled.markup,
            placeholders: compiled.placeholders,
        };

        if pass.placeholders.is_empty() {
            return self.finish(pass.number, pass.markup);
        }

        // Dispatch in document order; completions land in any order.
        let mut tasks: JoinSet<(u64, Result<String, BlockError>)> = JoinSet::new();
        for placeholder in &mut pass.placeholders {
            placeholder.begin_rendering();
            let id = placeholder.id();
            let payload = placeholder.decoded_payload();
            let Some(adapter) = self.adapters.get(placeholder.notation()) else {
                // Unreachable with the stock set; contained anyway.
                warn!(notation = %placeholder.notation(), "no adapter registered");
                continue;
            };
            let cx = self.context.clone();
            tasks.spawn(async move { (id, adapter.render(&payload, &cx).await) });
        }

        let mut outcomes: HashMap<u64, Result<String, BlockError>> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            if self.superseded(pass.number) {
                tasks.abort_all();
                debug!(pass = pass.number, "pass superseded mid-flight; discarding results");
                return PassOutcome::Superseded;
            }
            match joined {
                Ok((id, outcome)) => {
                    outcomes.insert(id, outcome);
                }
                Err(join_err) => {
                    // A panicking adapter task is contained to its block;
                    // the placeholder falls back to the default failure.
                    warn!(error = %join_err, "adapter task died");
                }
            }
        }

        for placeholder in &mut pass.placeholders {
            let outcome = outcomes
                .remove(&placeholder.id())
                .unwrap_or_else(|| Err(BlockError::Engine("render task failed".to_string())));
            let substitution = match outcome {
                Ok(content) => {
                    placeholder.complete_rendered(content.clone());
                    content
                }
                Err(err) => {
                    let failure = BlockFailure {
                        message: err.to_string(),
                        source: placeholder.decoded_payload(),
                    };
                    placeholder.complete_error(failure.clone());
                    error_block(placeholder.notation(), &failure)
                }
            };
            pass.markup = pass.markup.replacen(&placeholder.marker(), &substitution, 1);
        }

        self.finish(pass.number, pass.markup)
    }

    fn finish(&self, number: u64, markup: String) -> PassOutcome {
        if self.superseded(number) {
            debug!(pass = number, "pass superseded at completion; discarding results");
            PassOutcome::Superseded
        } else {
            debug!(pass = number, "render pass completed");
            PassOutcome::Completed(markup)
        }
    }

    fn superseded(&self, number: u64) -> bool {
        self.newest.load(Ordering::SeqCst) != number
    }
}
