//! Compiled-in engine cores.
//!
//! Acquisition sources never deliver executable code: a source either names
//! a core directly (embedded) or delivers an [`EngineBundle`], data that
//! binds one of these cores and may restrict the capability surface it
//! vouches for. The drawing grammar of each notation is deliberately
//! minimal; the cores exist to give the resolution and rendering pipeline
//! real capabilities to acquire, patch, and invoke.

pub mod chartisan;
pub mod circuitex;
pub mod flowkit;
pub mod mathcore;
pub mod mindgraph;
pub mod staffline;
pub mod waveform;

use serde::{Deserialize, Serialize};

use crate::error::AcquireError;
use crate::library::descriptor::SourceKind;
use crate::library::engine::EngineHandle;

/// The wire model of a direct-load or remote engine source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineBundle {
    /// Core id the bundle binds.
    pub engine: String,
    pub version: String,
    /// Capability names the bundle vouches for; empty means all.
    #[serde(default)]
    pub provides: Vec<String>,
}

/// Construct a core by id.
///
/// # Errors
///
/// Returns [`AcquireError::SourceUnusable`] for an unknown core id.
pub fn construct(core: &str, origin: SourceKind) -> Result<EngineHandle, AcquireError> {
    match core {
        "mathcore" => Ok(mathcore::construct(origin)),
        "flowkit" => Ok(flowkit::construct(origin)),
        "circuitex" => Ok(circuitex::construct(origin)),
        "mindgraph" => Ok(mindgraph::construct(origin)),
        "chartisan" => Ok(chartisan::construct(origin)),
        "staffline" => Ok(staffline::construct(origin)),
        "waveform" => Ok(waveform::construct(origin)),
        other => Err(AcquireError::SourceUnusable(format!(
            "unknown engine core `{other}`"
        ))),
    }
}

/// Build a handle from a loaded bundle.
///
/// # Errors
///
/// Returns [`AcquireError::BundleRejected`] when the bundle names a core
/// this build does not carry; the resolver then tries the next source.
pub fn from_bundle(bundle: &EngineBundle, origin: SourceKind) -> Result<EngineHandle, AcquireError> {
    let handle = construct(&bundle.engine, origin).map_err(|_| {
        AcquireError::BundleRejected(format!("bundle names unknown core `{}`", bundle.engine))
    })?;
    Ok(handle.retain_capabilities(&bundle.provides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_rejects_unknown_core() {
        let err = construct("sparkle", SourceKind::Embedded).unwrap_err();
        assert!(err.to_string().contains("sparkle"));
    }

    #[test]
    fn test_bundle_with_partial_provides_restricts_surface() {
        let bundle = EngineBundle {
            engine: "flowkit".to_string(),
            version: "2.1.0".to_string(),
            provides: vec!["render".to_string(), "render_sequence".to_string()],
        };
        let handle = from_bundle(&bundle, SourceKind::RemotePrimary).unwrap();
        assert!(handle.has_capability("render"));
        assert!(!handle.has_capability("render_class"));
    }

    #[test]
    fn test_bundle_json_round_trip() {
        let json = r#"{"engine":"chartisan","version":"0.9.0"}"#;
        let bundle: EngineBundle = serde_json::from_str(json).unwrap();
        assert_eq!(bundle.engine, "chartisan");
        assert!(bundle.provides.is_empty());
    }
}
