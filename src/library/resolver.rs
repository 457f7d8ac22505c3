//! The library resolution engine.
//!
//! One [`Resolver`] lives for the process. Each engine resolves at most
//! once at a time: concurrent `resolve` calls for the same name share a
//! single in-flight acquisition, and a settled engine is served from cache
//! without re-fetching. Resolution never errors: an engine that cannot be
//! obtained from any source settles as the unavailable sentinel, and
//! adapters degrade per block instead of crashing the pass.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::PreviewConfig;
use crate::engines::{self, EngineBundle};
use crate::error::AcquireError;
use crate::remote::Transport;

use super::descriptor::{LibraryDescriptor, LibrarySource, SourceLocator, registry};
use super::engine::EngineHandle;
use super::{patch, readiness};

/// Observable lifecycle of one engine's resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    Unresolved,
    Resolving,
    Ready,
    Failed,
}

/// Outcome of [`Resolver::resolve_all`], reported to the host at startup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReadinessSummary {
    pub succeeded: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

impl ReadinessSummary {
    pub fn all_ready(&self) -> bool {
        self.failed.is_empty()
    }
}

struct ResolutionCell {
    cell: OnceCell<Arc<EngineHandle>>,
    resolving: AtomicBool,
}

impl ResolutionCell {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            resolving: AtomicBool::new(false),
        }
    }
}

pub struct Resolver {
    descriptors: Vec<LibraryDescriptor>,
    states: Mutex<HashMap<&'static str, Arc<ResolutionCell>>>,
    preconfigured: Mutex<HashSet<&'static str>>,
    transport: Arc<dyn Transport>,
    config: PreviewConfig,
}

impl Resolver {
    /// A resolver over the stock engine registry.
    pub fn new(config: PreviewConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_registry(registry(), config, transport)
    }

    /// A resolver over a caller-supplied descriptor table.
    pub fn with_registry(
        descriptors: Vec<LibraryDescriptor>,
        config: PreviewConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            descriptors,
            states: Mutex::new(HashMap::new()),
            preconfigured: Mutex::new(HashSet::new()),
            transport,
            config,
        }
    }

    pub fn descriptor(&self, name: &str) -> Option<&LibraryDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Names of every registered engine, in registry order.
    pub fn engine_names(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.name).collect()
    }

    /// Resolve an engine to a handle, acquiring it if necessary.
    ///
    /// Always settles: the result is either a ready handle or the
    /// unavailable sentinel. Concurrent calls for the same name share one
    /// acquisition and observe the same handle.
    pub async fn resolve(&self, name: &str) -> Arc<EngineHandle> {
        let Some(descriptor) = self.descriptor(name) else {
            warn!(engine = name, "resolve requested for unregistered engine");
            return Arc::new(EngineHandle::unavailable(name));
        };

        let cell = self.cell_for(descriptor.name);
        cell.cell
            .get_or_init(|| async {
                cell.resolving.store(true, Ordering::Release);
                let handle = self.acquire(descriptor).await;
                cell.resolving.store(false, Ordering::Release);
                handle
            })
            .await
            .clone()
    }

    /// The cached handle, if this engine has already resolved ready.
    ///
    /// Never triggers acquisition; used for strictly synchronous callers
    /// like inline math in the compiler.
    pub fn peek_ready(&self, name: &str) -> Option<Arc<EngineHandle>> {
        let states = self.lock_states();
        let handle = states.get(name)?.cell.get()?;
        handle.is_available().then(|| Arc::clone(handle))
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.status(name) == ResolutionStatus::Ready
    }

    pub fn status(&self, name: &str) -> ResolutionStatus {
        let states = self.lock_states();
        let Some(cell) = states.get(name) else {
            return ResolutionStatus::Unresolved;
        };
        if let Some(handle) = cell.cell.get() {
            if handle.is_available() {
                ResolutionStatus::Ready
            } else {
                ResolutionStatus::Failed
            }
        } else if cell.resolving.load(Ordering::Acquire) {
            ResolutionStatus::Resolving
        } else {
            ResolutionStatus::Unresolved
        }
    }

    /// Allow a failed engine to resolve again.
    ///
    /// The only permitted backwards transition. Ready engines and in-flight
    /// resolutions are left untouched; re-resolution creates a new handle.
    pub fn retry(&self, name: &str) {
        let mut states = self.lock_states();
        let failed = states
            .get(name)
            .is_some_and(|cell| cell.cell.get().is_some_and(|h| !h.is_available()));
        if failed {
            states.remove(name);
            debug!(engine = name, "failed engine cleared for re-resolution");
        }
    }

    /// Resolve every registered engine and summarize the outcome.
    pub async fn resolve_all(&self) -> ReadinessSummary {
        let mut summary = ReadinessSummary::default();
        for name in self.engine_names() {
            let handle = self.resolve(name).await;
            if handle.is_available() {
                summary.succeeded.push(name);
            } else {
                summary.failed.push(name);
            }
        }
        summary
    }

    /// Defensive pre-invocation patch: re-assert the expected capability
    /// surface on a handle before an adapter uses it.
    pub fn ensure_expected(&self, handle: &EngineHandle) {
        if let Some(descriptor) = self.descriptor(handle.name()) {
            patch::ensure_capabilities(handle, descriptor.expected_capabilities);
        }
    }

    /// The expected capability names for an engine, if registered.
    pub fn expected_capabilities(&self, name: &str) -> &[&str] {
        self.descriptor(name).map_or(&[], |d| d.expected_capabilities)
    }

    async fn acquire(&self, descriptor: &LibraryDescriptor) -> Arc<EngineHandle> {
        self.run_preconfigure(descriptor);

        if let Some(embedded) = descriptor.embedded_resolve {
            if let Some(handle) = embedded() {
                if (descriptor.is_ready)(&handle) {
                    debug!(engine = descriptor.name, "resolved from the runtime, no load");
                    return self.finish(descriptor, handle);
                }
                warn!(
                    engine = descriptor.name,
                    "runtime-resident handle failed readiness; falling back to sources"
                );
            }
        }

        for source in &descriptor.sources {
            if self.config.offline && matches!(source.locator, SourceLocator::Url(_)) {
                debug!(
                    engine = descriptor.name,
                    source = source.kind.as_str(),
                    "skipping remote source while offline"
                );
                continue;
            }

            let handle = match self.load_source(source).await {
                Ok(handle) => handle,
                Err(err) => {
                    warn!(
                        engine = descriptor.name,
                        source = source.kind.as_str(),
                        error = %err,
                        "source load failed"
                    );
                    continue;
                }
            };

            match readiness::wait_ready(&handle, descriptor.is_ready, self.config.readiness).await {
                Ok(attempts) => {
                    debug!(
                        engine = descriptor.name,
                        source = source.kind.as_str(),
                        attempts,
                        "engine ready"
                    );
                    return self.finish(descriptor, handle);
                }
                Err(err) => {
                    warn!(
                        engine = descriptor.name,
                        source = source.kind.as_str(),
                        error = %err,
                        "engine loaded but never became ready"
                    );
                }
            }
        }

        warn!(engine = descriptor.name, "all sources exhausted; engine unavailable");
        Arc::new(EngineHandle::unavailable(descriptor.name))
    }

    async fn load_source(&self, source: &LibrarySource) -> Result<EngineHandle, AcquireError> {
        match &source.locator {
            SourceLocator::Builtin(core) => engines::construct(core, source.kind),
            SourceLocator::Bundle(relative) => {
                let path = self.config.asset_dir.join(relative);
                let bytes = std::fs::read(&path).map_err(|e| {
                    AcquireError::SourceUnusable(format!("{}: {e}", path.display()))
                })?;
                Self::bundle_to_handle(&bytes, source)
            }
            SourceLocator::Url(url) => {
                let bytes = self.transport.fetch(url).await?;
                Self::bundle_to_handle(&bytes, source)
            }
        }
    }

    fn bundle_to_handle(
        bytes: &[u8],
        source: &LibrarySource,
    ) -> Result<EngineHandle, AcquireError> {
        let bundle: EngineBundle = serde_json::from_slice(bytes)
            .map_err(|e| AcquireError::BundleRejected(e.to_string()))?;
        engines::from_bundle(&bundle, source.kind)
    }

    /// Post-resolution patch point: the first of the two deterministic
    /// places the expected capability surface is asserted.
    fn finish(&self, descriptor: &LibraryDescriptor, handle: EngineHandle) -> Arc<EngineHandle> {
        patch::ensure_capabilities(&handle, descriptor.expected_capabilities);
        Arc::new(handle)
    }

    fn run_preconfigure(&self, descriptor: &LibraryDescriptor) {
        let Some(preconfigure) = descriptor.preconfigure else {
            return;
        };
        let mut done = match self.preconfigured.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if done.insert(descriptor.name) {
            preconfigure(&self.config);
        }
    }

    fn cell_for(&self, name: &'static str) -> Arc<ResolutionCell> {
        let mut states = self.lock_states();
        Arc::clone(states.entry(name).or_insert_with(|| Arc::new(ResolutionCell::new())))
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<&'static str, Arc<ResolutionCell>>> {
        match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
