//! Single choke point for every call into a backend.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::error;

use crate::errors::{PvrError, PvrResult};

/// Readiness and blocking flags of one client, plus the invocation rules
/// that depend on them.
#[derive(Debug, Default)]
pub struct CallGateway {
    ready: AtomicBool,
    blocked: AtomicBool,
}

impl CallGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }

    /// Rejects every new call that requires readiness. Calls already running
    /// are not interrupted.
    pub fn block(&self) {
        self.blocked.store(true, Ordering::Release);
    }

    pub fn unblock(&self) {
        self.blocked.store(false, Ordering::Release);
    }

    /// True when calls requiring readiness would be let through.
    pub fn calls_allowed(&self) -> bool {
        self.is_ready() && !self.is_blocked()
    }

    /// Runs `call` against the backend of `client`.
    ///
    /// - `implemented == false` answers `NotImplemented` without calling.
    /// - `requires_ready` with a client not ready or blocked answers
    ///   `ServerError` without calling.
    /// - Any failure other than `NotImplemented` is logged with the
    ///   function and client names.
    pub fn invoke<T, F>(
        &self,
        client: &str,
        function: &str,
        implemented: bool,
        requires_ready: bool,
        call: F,
    ) -> PvrResult<T>
    where
        F: FnOnce() -> PvrResult<T>,
    {
        if !implemented {
            return Err(PvrError::NotImplemented);
        }

        if requires_ready && !self.calls_allowed() {
            return Err(PvrError::ServerError);
        }

        let result = call();
        if let Err(err) = &result {
            if err.is_backend_failure() {
                error!(
                    function = function,
                    client = client,
                    error = %err,
                    code = err.code(),
                    "Add-on call failed"
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn ready_gateway() -> CallGateway {
        let gateway = CallGateway::new();
        gateway.set_ready(true);
        gateway
    }

    #[test]
    fn test_not_implemented_never_calls() {
        let gateway = ready_gateway();
        let called = Cell::new(false);
        for requires_ready in [true, false] {
            let result: PvrResult<()> =
                gateway.invoke("test", "op", false, requires_ready, || {
                    called.set(true);
                    Ok(())
                });
            assert_eq!(result, Err(PvrError::NotImplemented));
        }
        assert!(!called.get());
    }

    #[test]
    fn test_not_ready_short_circuits() {
        let gateway = CallGateway::new();
        let called = Cell::new(false);
        let result = gateway.invoke("test", "op", true, true, || {
            called.set(true);
            Ok(1)
        });
        assert_eq!(result, Err(PvrError::ServerError));
        assert!(!called.get());

        // Les appels qui ne demandent pas l'état "prêt" passent
        let result = gateway.invoke("test", "op", true, false, || Ok(2));
        assert_eq!(result, Ok(2));
    }

    #[test]
    fn test_block_and_continue() {
        let gateway = ready_gateway();
        gateway.block();
        let called = Cell::new(0);
        let result = gateway.invoke("test", "op", true, true, || {
            called.set(called.get() + 1);
            Ok(())
        });
        assert_eq!(result, Err(PvrError::ServerError));
        assert_eq!(called.get(), 0);

        gateway.unblock();
        let result = gateway.invoke("test", "op", true, true, || {
            called.set(called.get() + 1);
            Ok(())
        });
        assert_eq!(result, Ok(()));
        assert_eq!(called.get(), 1);
    }

    #[test]
    fn test_backend_error_is_returned_unchanged() {
        let gateway = ready_gateway();
        let result: PvrResult<()> =
            gateway.invoke("test", "op", true, true, || Err(PvrError::Rejected));
        assert_eq!(result, Err(PvrError::Rejected));
    }
}
