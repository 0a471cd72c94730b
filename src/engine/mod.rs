//! Interpreter engine contract: the narrow call interface the session
//! core drives, plus the handle and error types shared by engines.

use std::fmt;

use thiserror::Error;

pub mod mock;
pub mod process;

/// Opaque handle to one interpreter context.
///
/// An arena-style key minted by an engine in [`Engine::new_context`].
/// The numeric value has no meaning outside the engine that issued it,
/// and hosts only ever see the handle through a `Session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Mints a handle from an engine-internal key.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// The interpreter runtime failed its process-wide bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InitError {
    message: String,
}

impl InitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The runtime came up but a fresh context could not be allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AllocError {
    message: String,
}

impl AllocError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Printable description of why a submission failed, as supplied by
/// the engine. Opaque text from the caller's point of view: the
/// session core does not distinguish parse errors, type errors, and
/// runtime exceptions. Suitable for direct display to whoever wrote
/// the fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic(String);

impl Diagnostic {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Diagnostic {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Diagnostic {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Narrow interface to the external interpreter.
///
/// Implementations own every engine-internal detail; the session core
/// reaches the interpreter exclusively through these four calls.
pub trait Engine: Send + Sync {
    /// Process-wide runtime bootstrap.
    ///
    /// Called once per session created against this engine, so
    /// implementations must gate the underlying work behind a one-shot
    /// guard: the first call does the bootstrap, every later call
    /// observes its (possibly failed) outcome.
    fn init(&self) -> Result<(), InitError>;

    /// Allocates one fresh interpreter context.
    fn new_context(&self) -> Result<ContextId, AllocError>;

    /// Evaluates one source fragment against a context.
    ///
    /// On success the context's accumulated state absorbs the
    /// fragment's bindings and effects; on failure the observable
    /// state is unchanged and the diagnostic is ready for display.
    fn eval(&self, context: ContextId, code: &str) -> Result<String, Diagnostic>;

    /// Releases a context's native resources.
    ///
    /// Never fails observably; engines log underlying faults instead
    /// of returning them.
    fn free_context(&self, context: ContextId);
}
