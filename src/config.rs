//! Configuration for the preview core.
//!
//! Settings persistence belongs to the surrounding application; this is the
//! plain value the host hands in when assembling a [`crate::render::Renderer`].

use std::path::PathBuf;
use std::time::Duration;

/// How long to keep polling an engine for readiness after its source loaded.
///
/// Engines may finish loading before they finish internal initialization,
/// so a single load-complete signal is not trusted; readiness is polled
/// with bounded retries instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyPoll {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ReadyPoll {
    fn default() -> Self {
        Self {
            attempts: 50,
            interval: Duration::from_millis(100),
        }
    }
}

/// Assembly-time configuration for the rendering core.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Directory holding direct-load engine bundles.
    pub asset_dir: PathBuf,
    /// Endpoint of the remote UML image service, if any.
    pub uml_endpoint: Option<String>,
    /// Disable all remote engine sources.
    pub offline: bool,
    /// Readiness polling bounds applied after each source load.
    pub readiness: ReadyPoll,
    /// Helper program for privileged typesetting, if installed.
    pub typeset_program: Option<PathBuf>,
    /// Upper bound on a single host-gateway exchange.
    pub gateway_timeout: Duration,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            asset_dir: default_asset_dir(),
            uml_endpoint: None,
            offline: false,
            readiness: ReadyPoll::default(),
            typeset_program: None,
            gateway_timeout: Duration::from_secs(10),
        }
    }
}

/// Platform-conventional location for engine bundles.
pub fn default_asset_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("inkpane").join("engines");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("inkpane")
                .join("engines");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("inkpane").join("engines");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("inkpane")
                .join("engines");
        }
    }

    PathBuf::from(".inkpane-engines")
}
