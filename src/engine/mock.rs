//! Deterministic in-memory engine for local development and
//! contract-level integration testing.
//!
//! This is a test double, not an interpreter: a fragment either binds
//! a name (`name = value`, empty output), resolves a previously bound
//! fragment verbatim, or fails with a parse diagnostic when its
//! parentheses do not balance. That is exactly enough surface to
//! exercise the session protocol: accumulation, failure atomicity,
//! and teardown.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{AllocError, ContextId, Diagnostic, Engine, InitError};

#[derive(Debug, Default)]
struct MockState {
    bootstrapped: bool,
    bootstraps: u32,
    next_context: u64,
    contexts: HashMap<ContextId, HashMap<String, String>>,
}

/// Scripted engine with observable lifecycle counters.
#[derive(Debug, Default)]
pub struct MockEngine {
    fail_init: bool,
    fail_alloc: bool,
    state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose runtime bootstrap always fails.
    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    /// Engine that bootstraps fine but cannot allocate contexts.
    pub fn failing_alloc() -> Self {
        Self {
            fail_alloc: true,
            ..Self::default()
        }
    }

    /// Number of contexts currently allocated and not yet freed.
    pub fn live_contexts(&self) -> usize {
        self.lock_state().contexts.len()
    }

    /// Number of times the underlying bootstrap actually ran.
    pub fn bootstraps(&self) -> u32 {
        self.lock_state().bootstraps
    }

    fn lock_state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock engine state lock poisoned")
    }
}

impl Engine for MockEngine {
    fn init(&self) -> Result<(), InitError> {
        if self.fail_init {
            return Err(InitError::new("mock engine bootstrap refused"));
        }
        let mut state = self.lock_state();
        if !state.bootstrapped {
            state.bootstrapped = true;
            state.bootstraps += 1;
        }
        Ok(())
    }

    fn new_context(&self) -> Result<ContextId, AllocError> {
        if self.fail_alloc {
            return Err(AllocError::new("mock engine is out of contexts"));
        }
        let mut state = self.lock_state();
        let id = ContextId::from_raw(state.next_context);
        state.next_context += 1;
        state.contexts.insert(id, HashMap::new());
        Ok(id)
    }

    fn eval(&self, context: ContextId, code: &str) -> Result<String, Diagnostic> {
        let fragment = code.trim();
        // Validation happens before any mutation: a rejected fragment
        // must leave the context's bindings untouched.
        if fragment.is_empty() {
            return Err(Diagnostic::from("cannot evaluate an empty fragment"));
        }
        if !balanced(fragment) {
            return Err(Diagnostic::from(format!(
                "parse error in fragment: {fragment}"
            )));
        }

        let mut state = self.lock_state();
        let bindings = state
            .contexts
            .get_mut(&context)
            .ok_or_else(|| Diagnostic::from(format!("unknown interpreter context {context}")))?;

        if let Some((name, value)) = fragment.split_once('=') {
            bindings.insert(name.trim().to_string(), value.trim().to_string());
            Ok(String::new())
        } else {
            bindings
                .get(fragment)
                .cloned()
                .ok_or_else(|| Diagnostic::from(format!("not in scope: {fragment}")))
        }
    }

    fn free_context(&self, context: ContextId) {
        self.lock_state().contexts.remove(&context);
    }
}

fn balanced(fragment: &str) -> bool {
    let mut depth = 0i32;
    for c in fragment.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_then_lookup_resolves() {
        let engine = MockEngine::new();
        engine.init().expect("bootstrap");
        let ctx = engine.new_context().expect("context");

        assert_eq!(engine.eval(ctx, "x = 1"), Ok(String::new()));
        assert_eq!(engine.eval(ctx, "x"), Ok("1".to_string()));
    }

    #[test]
    fn rejected_fragment_mutates_nothing() {
        let engine = MockEngine::new();
        engine.init().expect("bootstrap");
        let ctx = engine.new_context().expect("context");

        // Contains '=', but the paren check rejects it before binding.
        assert!(engine.eval(ctx, "y = (").is_err());
        let diagnostic = engine.eval(ctx, "y").expect_err("y must stay unbound");
        assert_eq!(diagnostic.as_str(), "not in scope: y");
    }

    #[test]
    fn unbalanced_and_empty_fragments_fail_to_parse() {
        let engine = MockEngine::new();
        engine.init().expect("bootstrap");
        let ctx = engine.new_context().expect("context");

        assert!(engine.eval(ctx, "malformed(((").is_err());
        assert!(engine.eval(ctx, "also)bad(").is_err());
        assert!(engine.eval(ctx, "   ").is_err());
    }

    #[test]
    fn freed_contexts_stop_counting_as_live() {
        let engine = MockEngine::new();
        engine.init().expect("bootstrap");
        let ctx = engine.new_context().expect("context");
        assert_eq!(engine.live_contexts(), 1);

        engine.free_context(ctx);
        assert_eq!(engine.live_contexts(), 0);
        assert!(engine.eval(ctx, "x").is_err());
    }

    #[test]
    fn bootstrap_runs_at_most_once() {
        let engine = MockEngine::new();
        engine.init().expect("bootstrap");
        engine.init().expect("bootstrap");
        engine.init().expect("bootstrap");
        assert_eq!(engine.bootstraps(), 1);
    }

    #[test]
    fn failure_constructors_fail_the_advertised_stage() {
        let engine = MockEngine::failing_init();
        assert!(engine.init().is_err());

        let engine = MockEngine::failing_alloc();
        engine.init().expect("bootstrap still succeeds");
        assert!(engine.new_context().is_err());
    }
}
