//! The library descriptor registry.
//!
//! Every renderer engine the preview can use is described here: how to
//! acquire it (ranked sources), how to tell it is actually usable
//! (`is_ready`), and which capabilities adapters will invoke on it.
//! Descriptors are defined at process start and never mutated.

use crate::config::PreviewConfig;
use crate::engines;

use super::engine::EngineHandle;

/// Rank order of acquisition sources.
///
/// Lower ranks are tried first: a compiled-in copy beats a local bundle,
/// which beats the primary remote, which beats the alternates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceKind {
    Embedded,
    DirectLoad,
    RemotePrimary,
    RemoteAlternate,
}

impl SourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::DirectLoad => "direct-load",
            Self::RemotePrimary => "remote-primary",
            Self::RemoteAlternate => "remote-alternate",
        }
    }
}

/// Where a source's engine actually comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// A compiled-in engine core, by core id.
    Builtin(String),
    /// An engine bundle on disk, relative to the configured asset dir.
    Bundle(String),
    /// An engine bundle fetched over the transport.
    Url(String),
}

/// One ranked acquisition source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySource {
    pub kind: SourceKind,
    pub locator: SourceLocator,
}

impl LibrarySource {
    pub fn embedded(core: &str) -> Self {
        Self {
            kind: SourceKind::Embedded,
            locator: SourceLocator::Builtin(core.to_string()),
        }
    }

    pub fn direct_load(path: &str) -> Self {
        Self {
            kind: SourceKind::DirectLoad,
            locator: SourceLocator::Bundle(path.to_string()),
        }
    }

    pub fn remote_primary(url: &str) -> Self {
        Self {
            kind: SourceKind::RemotePrimary,
            locator: SourceLocator::Url(url.to_string()),
        }
    }

    pub fn remote_alternate(url: &str) -> Self {
        Self {
            kind: SourceKind::RemoteAlternate,
            locator: SourceLocator::Url(url.to_string()),
        }
    }
}

/// Immutable description of one renderer engine.
pub struct LibraryDescriptor {
    /// Unique key, used by adapters to request the engine.
    pub name: &'static str,
    /// Ranked acquisition sources, tried in order.
    pub sources: Vec<LibrarySource>,
    /// Capability names adapters will invoke; patching installs stand-ins
    /// for any of these an acquired handle lacks.
    pub expected_capabilities: &'static [&'static str],
    /// Side-effect-free readiness probe, polled after each source load.
    pub is_ready: fn(&EngineHandle) -> bool,
    /// One-shot setup that must precede any load attempt.
    pub preconfigure: Option<fn(&PreviewConfig)>,
    /// Obtain the engine without any loading step, if it is already
    /// present in the runtime.
    pub embedded_resolve: Option<fn() -> Option<EngineHandle>>,
}

fn ready_with(handle: &EngineHandle, capability: &str) -> bool {
    handle.is_warm() && handle.has_capability(capability)
}

/// The static engine table for the stock notation set.
pub fn registry() -> Vec<LibraryDescriptor> {
    vec![
        LibraryDescriptor {
            name: "mathcore",
            sources: vec![LibrarySource::embedded("mathcore")],
            expected_capabilities: &["render_inline", "render_display"],
            is_ready: |h| ready_with(h, "render_inline"),
            preconfigure: None,
            embedded_resolve: Some(engines::mathcore::embedded),
        },
        LibraryDescriptor {
            name: "flowkit",
            sources: vec![
                LibrarySource::embedded("flowkit"),
                LibrarySource::direct_load("flowkit/bundle.json"),
                LibrarySource::remote_primary("https://engines.inkpane.dev/flowkit/bundle.json"),
                LibrarySource::remote_alternate("https://mirror.inkpane.dev/flowkit/bundle.json"),
            ],
            expected_capabilities: &["render", "render_sequence", "render_class"],
            is_ready: |h| ready_with(h, "render"),
            preconfigure: None,
            embedded_resolve: None,
        },
        LibraryDescriptor {
            name: "circuitex",
            sources: vec![
                LibrarySource::embedded("circuitex"),
                LibrarySource::remote_primary("https://engines.inkpane.dev/circuitex/bundle.json"),
            ],
            expected_capabilities: &["render"],
            is_ready: |h| ready_with(h, "render"),
            preconfigure: None,
            embedded_resolve: None,
        },
        LibraryDescriptor {
            name: "mindgraph",
            sources: vec![LibrarySource::embedded("mindgraph")],
            expected_capabilities: &["transform"],
            is_ready: |h| ready_with(h, "transform"),
            preconfigure: None,
            embedded_resolve: None,
        },
        LibraryDescriptor {
            name: "chartisan",
            sources: vec![
                LibrarySource::embedded("chartisan"),
                LibrarySource::direct_load("chartisan/bundle.json"),
            ],
            expected_capabilities: &["render"],
            is_ready: |h| ready_with(h, "render"),
            preconfigure: Some(engines::chartisan::preconfigure),
            embedded_resolve: None,
        },
        LibraryDescriptor {
            name: "staffline",
            sources: vec![
                LibrarySource::embedded("staffline"),
                LibrarySource::remote_alternate("https://mirror.inkpane.dev/staffline/bundle.json"),
            ],
            expected_capabilities: &["render"],
            is_ready: |h| ready_with(h, "render"),
            preconfigure: None,
            embedded_resolve: None,
        },
        LibraryDescriptor {
            name: "waveform",
            sources: vec![LibrarySource::embedded("waveform")],
            expected_capabilities: &["render"],
            is_ready: |h| ready_with(h, "render"),
            preconfigure: None,
            embedded_resolve: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let names: Vec<_> = registry().iter().map(|d| d.name).collect();
        let mut deduped = names.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
    }

    #[test]
    fn test_registry_sources_are_rank_ordered() {
        for descriptor in registry() {
            let kinds: Vec<_> = descriptor.sources.iter().map(|s| s.kind).collect();
            let mut sorted = kinds.clone();
            sorted.sort();
            assert_eq!(kinds, sorted, "sources out of rank order for {}", descriptor.name);
        }
    }

    #[test]
    fn test_every_descriptor_expects_at_least_one_capability() {
        for descriptor in registry() {
            assert!(
                !descriptor.expected_capabilities.is_empty(),
                "{} expects no capabilities",
                descriptor.name
            );
        }
    }

    #[test]
    fn test_source_kind_labels() {
        assert_eq!(SourceKind::Embedded.as_str(), "embedded");
        assert_eq!(SourceKind::RemoteAlternate.as_str(), "remote-alternate");
    }
}
