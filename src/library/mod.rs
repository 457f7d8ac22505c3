//! Engine acquisition: descriptors, resolution, readiness, and patching.

pub mod descriptor;
pub mod engine;
pub mod patch;
pub mod readiness;
pub mod resolver;

pub use descriptor::{LibraryDescriptor, LibrarySource, SourceKind, SourceLocator};
pub use engine::{CapabilityKind, EngineHandle};
pub use resolver::{ReadinessSummary, ResolutionStatus, Resolver};
