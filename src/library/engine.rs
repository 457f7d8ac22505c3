//! Engine handles and their capability tables.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::EngineError;

use super::descriptor::SourceKind;

/// A single named rendering capability: payload text in, markup out.
pub type CapabilityFn = Arc<dyn Fn(&str) -> Result<String, EngineError> + Send + Sync>;

/// Whether a capability is a real implementation or a patched stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Native,
    StandIn,
}

#[derive(Clone)]
struct Capability {
    kind: CapabilityKind,
    call: CapabilityFn,
}

/// A resolved, ready-to-use reference to a rendering engine.
///
/// Handles are shared read-only across adapters (`Arc`). The capability
/// table is the one interior-mutable part: capability patching may *add*
/// stand-ins for expected-but-missing entries, but existing entries are
/// never replaced, so an installed capability behaves identically for the
/// handle's whole lifetime.
pub struct EngineHandle {
    name: String,
    origin: Option<SourceKind>,
    warm: Arc<AtomicBool>,
    available: bool,
    capabilities: Mutex<HashMap<String, Capability>>,
}

/// Completion token for background engine initialization.
///
/// Cores that warm up on a spawned task take one of these with them; the
/// readiness poll observes the flip through the shared handle.
pub struct WarmupToken(Arc<AtomicBool>);

impl WarmupToken {
    pub fn complete(self) {
        self.0.store(true, Ordering::Release);
    }
}

impl EngineHandle {
    /// A handle under construction by an engine core or bundle loader.
    ///
    /// Starts warm; cores that initialize in the background call
    /// [`EngineHandle::begin_warmup`] before handing the handle out.
    pub fn new(name: impl Into<String>, origin: SourceKind) -> Self {
        Self {
            name: name.into(),
            origin: Some(origin),
            warm: Arc::new(AtomicBool::new(true)),
            available: true,
            capabilities: Mutex::new(HashMap::new()),
        }
    }

    /// The sentinel produced when every source is exhausted.
    ///
    /// Resolution settles with this rather than erroring so callers can
    /// degrade per block instead of crashing the pass.
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: None,
            warm: Arc::new(AtomicBool::new(false)),
            available: false,
            capabilities: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_capability(
        self,
        capability: impl Into<String>,
        call: impl Fn(&str) -> Result<String, EngineError> + Send + Sync + 'static,
    ) -> Self {
        self.install(capability.into(), CapabilityKind::Native, Arc::new(call));
        self
    }

    /// Mark the handle as still initializing; readiness polling will wait
    /// for [`EngineHandle::finish_warmup`].
    pub fn begin_warmup(self) -> Self {
        self.warm.store(false, Ordering::Release);
        self
    }

    pub fn finish_warmup(&self) {
        self.warm.store(true, Ordering::Release);
    }

    /// A token that completes this handle's warmup from another task.
    pub fn warmup_token(&self) -> WarmupToken {
        WarmupToken(Arc::clone(&self.warm))
    }

    /// Drop every capability not vouched for by a bundle's `provides` list.
    ///
    /// Used by the bundle loader; an empty `provides` list means the bundle
    /// vouches for the full surface and nothing is dropped.
    pub fn retain_capabilities(self, provides: &[String]) -> Self {
        if !provides.is_empty() {
            let mut table = match self.capabilities.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            table.retain(|name, _| provides.iter().any(|p| p == name));
            drop(table);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source kind that produced this handle, if any.
    pub const fn origin(&self) -> Option<SourceKind> {
        self.origin
    }

    pub fn is_warm(&self) -> bool {
        self.warm.load(Ordering::Acquire)
    }

    /// False only for the unavailable sentinel.
    pub const fn is_available(&self) -> bool {
        self.available
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.lock_capabilities().contains_key(capability)
    }

    /// The kind of an installed capability, if present.
    pub fn capability_kind(&self, capability: &str) -> Option<CapabilityKind> {
        self.lock_capabilities().get(capability).map(|c| c.kind)
    }

    /// Install a stand-in for `capability` unless any implementation is
    /// already present. Returns true if a stand-in was installed.
    pub fn install_stand_in(&self, capability: &str) -> bool {
        let mut table = self.lock_capabilities();
        if table.contains_key(capability) {
            return false;
        }
        let engine = self.name.clone();
        let cap = capability.to_string();
        table.insert(
            capability.to_string(),
            Capability {
                kind: CapabilityKind::StandIn,
                call: Arc::new(move |_payload| {
                    Err(EngineError::Degraded {
                        engine: engine.clone(),
                        capability: cap.clone(),
                    })
                }),
            },
        );
        true
    }

    /// Invoke a capability by name.
    ///
    /// An absent capability yields [`EngineError::MissingCapability`], the
    /// crash signature capability patching exists to prevent. A stand-in
    /// yields the inert [`EngineError::Degraded`] instead.
    pub fn invoke(&self, capability: &str, payload: &str) -> Result<String, EngineError> {
        if !self.available {
            return Err(EngineError::Unavailable {
                engine: self.name.clone(),
            });
        }
        let call = self.lock_capabilities().get(capability).map(|c| c.call.clone());
        match call {
            Some(call) => call(payload),
            None => Err(EngineError::MissingCapability {
                engine: self.name.clone(),
                capability: capability.to_string(),
            }),
        }
    }

    fn install(&self, capability: String, kind: CapabilityKind, call: CapabilityFn) {
        self.lock_capabilities().insert(capability, Capability { kind, call });
    }

    fn lock_capabilities(&self) -> std::sync::MutexGuard<'_, HashMap<String, Capability>> {
        match self.capabilities.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capabilities: Vec<String> = self.lock_capabilities().keys().cloned().collect();
        f.debug_struct("EngineHandle")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("warm", &self.is_warm())
            .field("available", &self.available)
            .field("capabilities", &capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> EngineHandle {
        EngineHandle::new("flowkit", SourceKind::Embedded)
            .with_capability("render", |payload| Ok(format!("<svg>{payload}</svg>")))
    }

    #[test]
    fn test_invoke_native_capability() {
        let h = handle();
        assert_eq!(h.invoke("render", "x").unwrap(), "<svg>x</svg>");
    }

    #[test]
    fn test_invoke_absent_capability_is_the_crash_signature() {
        let h = handle();
        let err = h.invoke("render_class", "x").unwrap_err();
        assert!(matches!(err, EngineError::MissingCapability { .. }));
    }

    #[test]
    fn test_stand_in_never_replaces_native() {
        let h = handle();
        assert!(!h.install_stand_in("render"));
        assert_eq!(h.capability_kind("render"), Some(CapabilityKind::Native));
        assert_eq!(h.invoke("render", "x").unwrap(), "<svg>x</svg>");
    }

    #[test]
    fn test_stand_in_install_is_idempotent() {
        let h = handle();
        assert!(h.install_stand_in("render_class"));
        assert!(!h.install_stand_in("render_class"));
        assert_eq!(h.capability_kind("render_class"), Some(CapabilityKind::StandIn));
    }

    #[test]
    fn test_stand_in_invocation_is_inert() {
        let h = handle();
        h.install_stand_in("render_class");
        let err = h.invoke("render_class", "x").unwrap_err();
        assert!(matches!(err, EngineError::Degraded { .. }));
    }

    #[test]
    fn test_unavailable_sentinel_refuses_everything() {
        let h = EngineHandle::unavailable("flowkit");
        assert!(!h.is_available());
        let err = h.invoke("render", "x").unwrap_err();
        assert!(matches!(err, EngineError::Unavailable { .. }));
    }

    #[test]
    fn test_warmup_flag_round_trip() {
        let h = handle().begin_warmup();
        assert!(!h.is_warm());
        h.finish_warmup();
        assert!(h.is_warm());
    }

    #[test]
    fn test_warmup_token_completes_through_clone() {
        let h = handle().begin_warmup();
        let token = h.warmup_token();
        assert!(!h.is_warm());
        token.complete();
        assert!(h.is_warm());
    }

    #[test]
    fn test_retain_capabilities_drops_unvouched_entries() {
        let h = handle()
            .with_capability("render_sequence", |_| Ok(String::new()))
            .retain_capabilities(&["render".to_string()]);
        assert!(h.has_capability("render"));
        assert!(!h.has_capability("render_sequence"));
    }

    #[test]
    fn test_retain_capabilities_with_empty_list_keeps_all() {
        let h = handle()
            .with_capability("render_sequence", |_| Ok(String::new()))
            .retain_capabilities(&[]);
        assert!(h.has_capability("render"));
        assert!(h.has_capability("render_sequence"));
    }
}
