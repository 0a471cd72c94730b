//! Incremental MicroHs evaluation sessions over a pluggable
//! interpreter engine.
//!
//! The heart of the crate is [`Session`]: it owns exactly one
//! interpreter context, accumulates state across successful
//! submissions, and releases the context exactly once on teardown.
//! Interpreters are reached through the narrow [`Engine`] trait;
//! [`ProcessEngine`] drives an external adapter process and
//! [`MockEngine`] is a deterministic stand-in for development and
//! tests.

pub mod cli;
pub mod config;
pub mod engine;
pub mod handlers;
pub mod printer;
pub mod session;
pub mod utils;

pub use engine::mock::MockEngine;
pub use engine::process::ProcessEngine;
pub use engine::{AllocError, ContextId, Diagnostic, Engine, InitError};
pub use session::{ExecutionResult, Session, SessionError};
