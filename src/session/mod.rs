//! Session lifecycle and execution protocol over one interpreter
//! context.
//!
//! A [`Session`] owns exactly one context for its whole life: created
//! against an engine, fed source fragments one at a time, and torn
//! down exactly once. Successful fragments accumulate bindings inside
//! the context; failed ones report a [`Diagnostic`] and leave the
//! visible state alone.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::engine::{AllocError, ContextId, Diagnostic, Engine, InitError};

/// Outcome of one [`Session::submit`] call: the fragment's printable
/// output, or the printable reason it was rejected.
pub type ExecutionResult = Result<String, Diagnostic>;

/// A failed attempt to create a session. In either case no partial
/// session is handed back and nothing is left allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The interpreter runtime failed its process-wide bootstrap.
    #[error("interpreter runtime failed to initialize: {0}")]
    Initialization(#[from] InitError),
    /// The runtime came up but no fresh context could be allocated.
    #[error("interpreter context allocation failed: {0}")]
    ContextAllocation(#[from] AllocError),
}

/// One live interpreter session.
///
/// A constructed `Session` always holds a valid context, and
/// [`Session::destroy`] consumes the value, so use after teardown does
/// not compile. Dropping a session on any other exit path releases the
/// context the same way, exactly once.
pub struct Session {
    engine: Arc<dyn Engine>,
    context: ContextId,
}

impl Session {
    /// Bootstraps the engine runtime (a once-guarded no-op after the
    /// first session against this engine) and allocates a fresh
    /// context.
    pub fn create(engine: Arc<dyn Engine>) -> Result<Self, SessionError> {
        engine.init()?;
        let context = engine.new_context()?;
        debug!(%context, "session ready");
        Ok(Self { engine, context })
    }

    /// Evaluates one source fragment in the environment accumulated by
    /// all prior successful submissions on this session.
    ///
    /// Blocks until the engine finishes. Erroneous user code is an
    /// ordinary outcome, reported as `Err(diagnostic)`; it never
    /// escalates past this call and never changes the visible context
    /// state. Taking `&mut self` serializes submissions per session.
    pub fn submit(&mut self, code: &str) -> ExecutionResult {
        self.engine.eval(self.context, code)
    }

    /// Tears the session down, releasing its interpreter context.
    ///
    /// Equivalent to dropping the session; this form marks the
    /// hand-back explicitly at the call site.
    pub fn destroy(self) {}
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(context = %self.context, "session closed");
        self.engine.free_context(self.context);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::engine::mock::MockEngine;

    #[derive(Default)]
    struct CountingEngine {
        next: Mutex<u64>,
        freed: Mutex<Vec<ContextId>>,
    }

    impl Engine for CountingEngine {
        fn init(&self) -> Result<(), InitError> {
            Ok(())
        }

        fn new_context(&self) -> Result<ContextId, AllocError> {
            let mut next = self.next.lock().unwrap();
            let id = ContextId::from_raw(*next);
            *next += 1;
            Ok(id)
        }

        fn eval(&self, _context: ContextId, code: &str) -> Result<String, Diagnostic> {
            Ok(code.to_uppercase())
        }

        fn free_context(&self, context: ContextId) {
            self.freed.lock().unwrap().push(context);
        }
    }

    #[test]
    fn destroy_releases_the_context_exactly_once() {
        let engine = Arc::new(CountingEngine::default());
        let session = Session::create(engine.clone()).expect("session");
        session.destroy();
        assert_eq!(engine.freed.lock().unwrap().len(), 1);
    }

    #[test]
    fn dropping_without_destroy_releases_too() {
        let engine = Arc::new(CountingEngine::default());
        {
            let _session = Session::create(engine.clone()).expect("session");
        }
        assert_eq!(engine.freed.lock().unwrap().len(), 1);
    }

    #[test]
    fn submit_is_a_plain_engine_exchange() {
        let engine = Arc::new(CountingEngine::default());
        let mut session = Session::create(engine).expect("session");
        assert_eq!(session.submit("ok"), Ok("OK".to_string()));
    }

    #[test]
    fn init_failure_maps_to_initialization_error() {
        let err = Session::create(Arc::new(MockEngine::failing_init())).unwrap_err();
        assert!(matches!(err, SessionError::Initialization(_)));
    }

    #[test]
    fn alloc_failure_maps_to_context_allocation_error() {
        let err = Session::create(Arc::new(MockEngine::failing_alloc())).unwrap_err();
        assert!(matches!(err, SessionError::ContextAllocation(_)));
    }
}
