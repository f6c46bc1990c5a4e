//! Explicit registration of test cases.
//!
//! Cases are plain functions registered under their name at
//! construction time, replacing any notion of looking methods up by
//! string at call time. Registration order is preserved; `run()`
//! resolves requested names against this registry.

use crate::runner::class::TestClass;
use crate::runner::engine::TestRunner;
use crate::signal::TestOutcome;

/// A registered test-case body. Receives the runner (for signal
/// helpers, generated expansion, and access to the class under test)
/// and the case's parameter list.
pub type CaseFn<T> = fn(&mut TestRunner<T>, &[String]) -> TestOutcome;

/// Insertion-ordered map from test-case name to body.
pub struct CaseRegistry<T: TestClass> {
    cases: Vec<(String, CaseFn<T>)>,
}

impl<T: TestClass> CaseRegistry<T> {
    pub fn new() -> Self {
        Self { cases: Vec::new() }
    }

    /// Register a case under `name`. Later registrations under the same
    /// name shadow earlier ones for lookup but both entries remain in
    /// registration order.
    pub fn register(&mut self, name: impl Into<String>, func: CaseFn<T>) {
        self.cases.push((name.into(), func));
    }

    /// Look up a case by name.
    pub fn get(&self, name: &str) -> Option<CaseFn<T>> {
        self.cases
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, f)| *f)
    }

    /// All registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl<T: TestClass> Default for CaseRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
