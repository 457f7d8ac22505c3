//! Placeholder containers for deferred content.

use super::encode::{decode_payload, encode_payload};
use super::notation::NotationType;

/// Forward-only lifecycle of one placeholder within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStatus {
    Pending,
    Rendering,
    Rendered,
    Error,
}

/// The structured error a failed block settles to: a message plus the
/// original payload for diagnostic display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFailure {
    pub message: String,
    pub source: String,
}

/// Terminal result of a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockResult {
    Rendered(String),
    Error(BlockFailure),
}

/// A typed, positioned marker standing in for not-yet-rendered content.
///
/// Created by the compiler, owned by the orchestrator for the duration of
/// one render pass, and discarded when a newer pass supersedes it. The
/// status only advances forward; a container is never rendered twice
/// within one pass.
#[derive(Debug, Clone)]
pub struct PlaceholderContainer {
    id: u64,
    notation: NotationType,
    encoded_payload: String,
    status: PlaceholderStatus,
    result: Option<BlockResult>,
}

impl PlaceholderContainer {
    pub fn new(id: u64, notation: NotationType, payload: &str) -> Self {
        Self {
            id,
            notation,
            encoded_payload: encode_payload(payload),
            status: PlaceholderStatus::Pending,
            result: None,
        }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn notation(&self) -> NotationType {
        self.notation
    }

    pub const fn status(&self) -> PlaceholderStatus {
        self.status
    }

    pub const fn result(&self) -> Option<&BlockResult> {
        self.result.as_ref()
    }

    pub fn encoded_payload(&self) -> &str {
        &self.encoded_payload
    }

    /// The verbatim block body, exactly as it appeared in the document.
    pub fn decoded_payload(&self) -> String {
        decode_payload(&self.encoded_payload)
    }

    /// The container element the compiler emits into the markup.
    ///
    /// The id makes the marker unique within its pass, which is what lets
    /// the orchestrator substitute results positionally by string identity.
    pub fn marker(&self) -> String {
        format!(
            r#"<div class="ink-placeholder" data-ink-id="{id}" data-notation="{notation}" data-payload="{payload}">{notation}</div>"#,
            id = self.id,
            notation = self.notation.as_str(),
            payload = self.encoded_payload,
        )
    }

    pub fn begin_rendering(&mut self) {
        debug_assert_eq!(self.status, PlaceholderStatus::Pending);
        self.status = PlaceholderStatus::Rendering;
    }

    pub fn complete_rendered(&mut self, content: String) {
        debug_assert_eq!(self.status, PlaceholderStatus::Rendering);
        self.status = PlaceholderStatus::Rendered;
        self.result = Some(BlockResult::Rendered(content));
    }

    pub fn complete_error(&mut self, failure: BlockFailure) {
        debug_assert_eq!(self.status, PlaceholderStatus::Rendering);
        self.status = PlaceholderStatus::Error;
        self.result = Some(BlockResult::Error(failure));
    }
}
