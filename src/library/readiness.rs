//! Bounded readiness polling.
//!
//! A source load completing does not mean the engine is usable: cores may
//! still be warming caches on a background task. Readiness is therefore a
//! bounded-retry poll with a fixed interval, returning a definite outcome
//! instead of an open-ended wait. Each iteration is a scheduled await, not
//! a spin-wait.

use crate::config::ReadyPoll;
use crate::error::AcquireError;

use super::engine::EngineHandle;

/// Poll `is_ready` until it passes or the attempts run out.
///
/// # Errors
///
/// Returns [`AcquireError::NeverReady`] if the predicate never passed
/// within the configured attempts.
pub async fn wait_ready(
    handle: &EngineHandle,
    is_ready: fn(&EngineHandle) -> bool,
    poll: ReadyPoll,
) -> Result<u32, AcquireError> {
    for attempt in 0..poll.attempts {
        if is_ready(handle) {
            return Ok(attempt);
        }
        tokio::time::sleep(poll.interval).await;
    }
    // One last look after the final sleep.
    if is_ready(handle) {
        Ok(poll.attempts)
    } else {
        Err(AcquireError::NeverReady {
            attempts: poll.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::library::descriptor::SourceKind;

    use super::*;

    fn quick_poll() -> ReadyPoll {
        ReadyPoll {
            attempts: 5,
            interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_ready_handle_passes_on_first_attempt() {
        let handle = EngineHandle::new("waveform", SourceKind::Embedded)
            .with_capability("render", |_| Ok(String::new()));
        let attempts = wait_ready(&handle, |h| h.has_capability("render"), quick_poll())
            .await
            .unwrap();
        assert_eq!(attempts, 0);
    }

    #[tokio::test]
    async fn test_warming_handle_becomes_ready_mid_poll() {
        let handle = Arc::new(
            EngineHandle::new("flowkit", SourceKind::Embedded)
                .with_capability("render", |_| Ok(String::new()))
                .begin_warmup(),
        );
        let warmer = Arc::clone(&handle);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            warmer.finish_warmup();
        });

        let attempts = wait_ready(&handle, EngineHandle::is_warm, quick_poll())
            .await
            .unwrap();
        assert!(attempts > 0, "readiness should require at least one retry");
    }

    #[tokio::test]
    async fn test_timeout_is_bounded() {
        let handle = EngineHandle::new("flowkit", SourceKind::Embedded).begin_warmup();
        let err = wait_ready(&handle, EngineHandle::is_warm, quick_poll())
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::NeverReady { attempts: 5 }));
    }
}
