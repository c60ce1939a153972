//! The sync-over-async bridge (§4.E).
//!
//! The original implementation pins a command's execution to a nested
//! `GMainContext` and races it against a guard timer set to
//! `session_timeout_ms + 1000`, because GLib's synchronous call convention
//! has no other way to bound an async operation from a blocking call site.
//! `rmcp` tool handlers are already `async fn`, so that whole mechanism
//! collapses to one `tokio::time::timeout` around the operation -- the
//! external contract (guard fires strictly after the inner timeout could,
//! `Timeout` on guard-fire, otherwise propagate the inner result) is
//! preserved verbatim. See DESIGN.md, Open Question resolution #1.

use crate::error::GdbError;
use std::future::Future;
use std::time::Duration;

/// Extra slack added atop a session's configured timeout so the guard only
/// ever fires after the operation's own internal timeout would have.
const GUARD_SLACK_MS: u64 = 1000;

/// Run `operation`, bounding its total wall-clock time to
/// `timeout_ms + GUARD_SLACK_MS`. If the guard fires first, the in-flight
/// operation is dropped and [`GdbError::Timeout`] is returned; otherwise the
/// operation's own result (success or error) is returned unchanged.
pub async fn guarded<F, T>(timeout_ms: u64, operation: F) -> Result<T, GdbError>
where
    F: Future<Output = Result<T, GdbError>>,
{
    let guard = Duration::from_millis(timeout_ms + GUARD_SLACK_MS);
    match tokio::time::timeout(guard, operation).await {
        Ok(result) => result,
        Err(_elapsed) => Err(GdbError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn propagates_inner_success() {
        let result = guarded(1000, async { Ok::<_, GdbError>(42) }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn propagates_inner_error() {
        let result = guarded(1000, async { Err::<i32, _>(GdbError::CommandFailed("x".into())) }).await;
        assert_eq!(result, Err(GdbError::CommandFailed("x".into())));
    }

    #[tokio::test]
    async fn guard_fires_on_operation_that_never_resolves() {
        let result: Result<(), GdbError> = guarded(10, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(GdbError::Timeout));
    }
}
