//! Non-fatal assertion recording.
//!
//! A failed check must not stop the remaining independent checks from
//! running, and a failed run must report every failure, not just the
//! first.  [`Checks`] accumulates failures as strings; [`Checks::finish`]
//! turns a non-empty set into one error listing all of them.

use std::fmt::Debug;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Checks {
    scope: String,
    failures: Vec<String>,
}

impl Checks {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            failures: Vec::new(),
        }
    }

    /// Unwrap a fallible lookup: an `Err` becomes a recorded failure and
    /// the dependent checks are skipped by the caller via the `None`.
    pub fn value<T>(&mut self, what: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.failures.push(format!("{what}: {e}"));
                None
            }
        }
    }

    pub fn eq<A, E>(&mut self, what: &str, actual: A, expected: E)
    where
        A: PartialEq<E> + Debug,
        E: Debug,
    {
        if actual != expected {
            self.failures
                .push(format!("{what}: expected {expected:?}, got {actual:?}"));
        }
    }

    pub fn starts_with(&mut self, what: &str, actual: &str, prefix: &str) {
        if !actual.starts_with(prefix) {
            self.failures
                .push(format!("{what}: {actual:?} does not start with {prefix:?}"));
        }
    }

    pub fn ends_with(&mut self, what: &str, actual: &str, suffix: &str) {
        if !actual.ends_with(suffix) {
            self.failures
                .push(format!("{what}: {actual:?} does not end with {suffix:?}"));
        }
    }

    pub fn has_len<T>(&mut self, what: &str, items: &[T], expected: usize) {
        if items.len() != expected {
            self.failures.push(format!(
                "{what}: expected {expected} item(s), got {}",
                items.len()
            ));
        }
    }

    pub fn non_empty(&mut self, what: &str, actual: &str) {
        if actual.is_empty() {
            self.failures.push(format!("{what}: unexpectedly empty"));
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// `Ok` when every check passed, otherwise one error listing each
    /// recorded failure.
    pub fn finish(self) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        let mut message = format!(
            "{} check(s) failed in {}:",
            self.failures.len(),
            self.scope
        );
        for failure in &self.failures {
            message.push_str("\n  - ");
            message.push_str(failure);
        }
        Err(Error::Checks(message))
    }
}
