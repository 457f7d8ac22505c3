// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. render::RenderPass)
    clippy::module_name_repetitions
)]

//! # Inkpane
//!
//! The preview-pane rendering core of a desktop markdown editor.
//!
//! Inkpane turns document text into HTML markup where a dozen heterogeneous
//! notations (math, flowcharts, circuit diagrams, mind maps, UML, charts,
//! tablature, timing diagrams) render through pluggable engines:
//! - Engines are acquired from ranked sources (embedded, local bundle,
//!   remote primary, remote alternates) with readiness detection and
//!   corrective capability patching
//! - Documents compile synchronously to markup plus typed placeholders,
//!   which resolve asynchronously and independently
//! - Every failure is contained: to a readiness-summary entry, a patched
//!   capability, or a single block's error panel
//!
//! ## Architecture
//!
//! Two phases per document snapshot:
//! - **Compile** (sync): Markdown structure to markup, deferred blocks to
//!   placeholder containers
//! - **Post-process** (async): each placeholder through its notation's
//!   adapter, results substituted in place; newer passes supersede older
//!   in-flight ones
//!
//! ## Modules
//!
//! - [`render`]: The orchestrator and the `process` entry point
//! - [`compile`]: Placeholder compiler
//! - [`library`]: Engine descriptors, resolution, readiness, patching
//! - [`adapters`]: One rendering strategy per notation type
//! - [`engines`]: Compiled-in engine cores
//! - [`host`]: Privileged typesetting gateway (IPC)
//! - [`remote`]: Transport for remote engine sources
//! - [`watch`]: Debounced file watching for the binary's watch mode

pub mod adapters;
pub mod compile;
pub mod config;
pub mod engines;
pub mod error;
pub mod host;
pub mod library;
pub mod markup;
pub mod remote;
pub mod render;
pub mod watch;

pub use compile::{CompiledDocument, Compiler, NotationType};
pub use config::PreviewConfig;
pub use library::{ReadinessSummary, ResolutionStatus, Resolver};
pub use render::{PassOutcome, Renderer};
