//! Error taxonomy for the rendering core.
//!
//! Four kinds of failure flow through the crate, and they deliberately stay
//! typed all the way to the containment point:
//!
//! - acquisition failures ([`AcquireError`]) end up in the readiness summary
//! - API-shape failures ([`EngineError::MissingCapability`]) are contained by
//!   capability patching
//! - content failures ([`BlockError::Content`]) become a block-local error
//!   panel
//! - transport failures ([`TransportError`], [`GatewayError`]) trigger an
//!   adapter's fallback chain first

use thiserror::Error;

/// A single acquisition attempt (one source of one engine) failed.
///
/// Resolution itself never surfaces these to callers; exhausting every
/// source settles the engine as unavailable instead.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("source locator unusable: {0}")]
    SourceUnusable(String),

    #[error("engine bundle rejected: {0}")]
    BundleRejected(String),

    #[error("engine not ready after {attempts} readiness checks")]
    NeverReady { attempts: u32 },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// An engine handle misbehaved at invocation time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The capability is absent from the handle entirely. This is the
    /// crash signature the interceptor recognizes; patching replaces it
    /// with the inert [`EngineError::Degraded`] outcome.
    #[error("engine `{engine}` has no `{capability}` capability")]
    MissingCapability { engine: String, capability: String },

    /// A stand-in installed by capability patching was invoked.
    #[error("engine `{engine}` capability `{capability}` is degraded to a stand-in")]
    Degraded { engine: String, capability: String },

    /// The engine looked at the payload and refused it.
    #[error("engine `{engine}` rejected input: {message}")]
    Rejected { engine: String, message: String },

    /// The sentinel handle produced when every source was exhausted.
    #[error("engine `{engine}` is unavailable")]
    Unavailable { engine: String },
}

/// Remote fetch failures for engine bundle sources.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is offline")]
    Offline,

    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),
}

/// Failures talking to the privileged host typesetter.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("host gateway is disconnected")]
    Disconnected,

    #[error("host exchange failed: {0}")]
    Exchange(String),

    #[error("host refused request: {0}")]
    Refused(String),
}

/// A block-local failure handed back to the orchestrator.
///
/// This is a value, not an exception path: every adapter invocation settles
/// to rendered content or to one of these, and the orchestrator turns it
/// into an error panel for that block alone.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlockError {
    /// The block's source is malformed for its notation.
    #[error("{0}")]
    Content(String),

    /// The engine for this notation could not be used.
    #[error("{0}")]
    Engine(String),

    /// An IPC or remote exchange failed after every fallback.
    #[error("{0}")]
    Transport(String),
}
