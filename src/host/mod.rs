//! The privileged host typesetting gateway.
//!
//! The circuit adapter's first choice is a native typesetter running with
//! host privileges the preview itself does not have. The exchange is one
//! JSON request and one JSON reply over a helper process's stdio, the only
//! trusted execution boundary in the crate. Replies are data, not markup
//! the preview trusts: the adapter sanitizes them exactly like content from
//! the in-process fallback path.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::GatewayError;

/// Request to the host typesetter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypesetRequest {
    pub source: String,
    pub variant: String,
}

/// Reply from the host typesetter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypesetReply {
    pub success: bool,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The trusted-boundary contract.
#[async_trait]
pub trait HostGateway: Send + Sync {
    /// Exchange one request for one reply.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the helper is unreachable or the
    /// exchange breaks down; the adapter treats that as a transport
    /// failure and falls back.
    async fn typeset(&self, request: TypesetRequest) -> Result<TypesetReply, GatewayError>;

    /// Cheap liveness hint so adapters can skip a doomed exchange.
    fn is_connected(&self) -> bool {
        true
    }
}

/// Gateway that spawns the configured helper once per exchange.
///
/// Protocol: the request as one JSON line on stdin, the reply as JSON on
/// stdout, helper exits. Stateless by construction.
pub struct CommandGateway {
    program: PathBuf,
}

impl CommandGateway {
    pub const fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

#[async_trait]
impl HostGateway for CommandGateway {
    async fn typeset(&self, request: TypesetRequest) -> Result<TypesetReply, GatewayError> {
        debug!(program = %self.program.display(), variant = request.variant, "host typeset exchange");
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| GatewayError::Exchange(format!("spawn failed: {e}")))?;

        let line = serde_json::to_string(&request)
            .map_err(|e| GatewayError::Exchange(format!("encode failed: {e}")))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| GatewayError::Exchange("helper stdin unavailable".to_string()))?;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| GatewayError::Exchange(format!("write failed: {e}")))?;
        stdin
            .write_all(b"\n")
            .await
            .map_err(|e| GatewayError::Exchange(format!("write failed: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| GatewayError::Exchange(format!("wait failed: {e}")))?;
        if !output.status.success() {
            return Err(GatewayError::Refused(format!(
                "helper exited with {}",
                output.status
            )));
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| GatewayError::Exchange(format!("bad reply: {e}")))
    }
}

/// Gateway used when no helper is installed; always routes callers to
/// their fallback path.
pub struct DisconnectedGateway;

#[async_trait]
impl HostGateway for DisconnectedGateway {
    async fn typeset(&self, _request: TypesetRequest) -> Result<TypesetReply, GatewayError> {
        Err(GatewayError::Disconnected)
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// Scripted gateway for tests: replies are consumed in order, and the
/// requests made are recorded.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<TypesetReply, GatewayError>>>,
    requests: Mutex<Vec<TypesetRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: Result<TypesetReply, GatewayError>) {
        self.lock_replies().push_back(reply);
    }

    pub fn requests(&self) -> Vec<TypesetRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<TypesetReply, GatewayError>>> {
        match self.replies.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl HostGateway for ScriptedGateway {
    async fn typeset(&self, request: TypesetRequest) -> Result<TypesetReply, GatewayError> {
        match self.requests.lock() {
            Ok(mut guard) => guard.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
        self.lock_replies()
            .pop_front()
            .unwrap_or(Err(GatewayError::Disconnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disconnected_gateway_reports_itself() {
        let gateway = DisconnectedGateway;
        assert!(!gateway.is_connected());
        let err = gateway
            .typeset(TypesetRequest {
                source: "R1 1 2 10k".to_string(),
                variant: "circuit".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Disconnected));
    }

    #[tokio::test]
    async fn test_scripted_gateway_replays_in_order() {
        let gateway = ScriptedGateway::new();
        gateway.push_reply(Ok(TypesetReply {
            success: true,
            content: Some("<svg/>".to_string()),
            error: None,
        }));

        let reply = gateway
            .typeset(TypesetRequest {
                source: "R1".to_string(),
                variant: "circuit".to_string(),
            })
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(gateway.requests().len(), 1);

        // Exhausted scripts behave like a dropped connection.
        let err = gateway
            .typeset(TypesetRequest {
                source: "R2".to_string(),
                variant: "circuit".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Disconnected));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_gateway_contains_a_misbehaving_helper() {
        // `cat` echoes the request back, which is not a valid reply; the
        // breakdown must surface as a typed exchange error, not a panic.
        let gateway = CommandGateway::new(PathBuf::from("/bin/cat"));
        let err = gateway
            .typeset(TypesetRequest {
                source: "R1".to_string(),
                variant: "circuit".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Exchange(_)));
    }

    #[test]
    fn test_wire_format_round_trips() {
        let request = TypesetRequest {
            source: "R1 1 2 10k".to_string(),
            variant: "circuit".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(serde_json::from_str::<TypesetRequest>(&json).unwrap(), request);

        let reply: TypesetReply = serde_json::from_str(r#"{"success":false,"error":"no pdf"}"#).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("no pdf"));
        assert!(reply.content.is_none());
    }
}
