//! Corrective capability patching and the last-resort interceptor.
//!
//! Some engine bundles ship with an incomplete capability surface (older
//! bundles predate `render_class`, mirrors occasionally strip entries).
//! Rather than letting adapters hit the missing-capability crash signature,
//! [`ensure_capabilities`] installs inert stand-ins at two deterministic
//! points: right after an engine reaches ready, and defensively before each
//! invocation.
//!
//! The interceptor is the safety net behind that: it recognizes the crash
//! signature at the narrowest catch point, re-applies the stand-ins, and
//! records the occurrence. It is a metric/log point, never the primary
//! correctness mechanism.

use std::panic;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, warn};

use crate::error::EngineError;

use super::engine::EngineHandle;

/// Install stand-ins for every expected capability the handle lacks.
///
/// Idempotent; never overwrites an existing implementation, native or
/// stand-in. A pure function of the handle's expected surface: applying it
/// twice is the same as applying it once.
pub fn ensure_capabilities(handle: &EngineHandle, expected: &[&str]) {
    if !handle.is_available() {
        return;
    }
    for &capability in expected {
        if handle.install_stand_in(capability) {
            warn!(
                engine = handle.name(),
                capability, "installed stand-in for missing capability"
            );
        }
    }
}

static CONTAINED: AtomicU64 = AtomicU64::new(0);

/// Number of missing-capability crashes the interceptor has contained.
pub fn contained_count() -> u64 {
    CONTAINED.load(Ordering::Relaxed)
}

/// Last-resort containment for the missing-capability crash signature.
///
/// Returns true if the error was that signature and the stand-ins were
/// re-applied; the caller should retry the invocation once, which will
/// then take the inert stand-in path. Any other error is left untouched.
pub fn contain_missing_capability(
    handle: &EngineHandle,
    expected: &[&str],
    err: &EngineError,
) -> bool {
    let EngineError::MissingCapability { engine, capability } = err else {
        return false;
    };
    CONTAINED.fetch_add(1, Ordering::Relaxed);
    error!(
        engine,
        capability, "missing-capability crash intercepted; re-applying stand-ins"
    );
    ensure_capabilities(handle, expected);
    true
}

/// Install the process-wide panic hook, once.
///
/// The hook only logs; control flow is never recovered here. Chained in
/// front of the previous hook so default behavior is preserved.
pub fn install_panic_hook() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown".to_string());
            error!(location = %location, "panic in rendering core");
            previous(info);
        }));
    });
}
