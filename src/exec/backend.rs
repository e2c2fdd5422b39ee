// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The task executor and job coordinator talk to an `ExecutorBackend`
//! instead of a concrete script runner. This makes it easy to swap in a fake
//! executor in tests while keeping the production implementation in
//! [`super::script_runner`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::Script;
use crate::engine::ScriptOutcome;

/// Trait abstracting how a single script is executed.
///
/// Production code uses [`super::ScriptRunner`]; tests can provide their own
/// implementation that doesn't spawn real processes. Implementations are
/// shared by every task of a job and called concurrently.
pub trait ExecutorBackend: Send + Sync {
    /// Run one script to its terminal outcome.
    ///
    /// Never fails: start-up problems are reported inside the outcome.
    fn run_script<'a>(
        &'a self,
        script: &'a Script,
    ) -> Pin<Box<dyn Future<Output = ScriptOutcome> + Send + 'a>>;
}

impl<B: ExecutorBackend + ?Sized> ExecutorBackend for Arc<B> {
    fn run_script<'a>(
        &'a self,
        script: &'a Script,
    ) -> Pin<Box<dyn Future<Output = ScriptOutcome> + Send + 'a>> {
        (**self).run_script(script)
    }
}
