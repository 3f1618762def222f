//! Named frontend factories, assembled by a process's composition root.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::FrontendError;
use crate::frontend::Frontend;
use crate::process::ProcessFrontend;
use crate::scan::ScanFrontend;

/// Creates a frontend instance.
pub type FrontendFactory = Box<dyn Fn() -> Arc<dyn Frontend> + Send + Sync>;

/// Maps frontend names to factories.
///
/// There is no process-wide registry: whoever builds the object graph owns
/// one and hands the created frontend down.
#[derive(Default)]
pub struct FrontendRegistry {
    factories: BTreeMap<String, FrontendFactory>,
}

impl FrontendRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `scan` and `process` frontends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("scan", || Arc::new(ScanFrontend::new()));
        registry.register("process", || Arc::new(ProcessFrontend::new()));
        registry
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Frontend> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Creates the frontend registered under `name`.
    pub fn create(&self, name: &str) -> Result<Arc<dyn Frontend>, FrontendError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| FrontendError::UnknownFrontend(name.to_string()))
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_registered() {
        let registry = FrontendRegistry::with_defaults();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["process", "scan"]);
        assert_eq!(registry.create("scan").unwrap().name(), "scan");
        assert_eq!(registry.create("process").unwrap().name(), "process");
    }

    #[test]
    fn unknown_name_fails() {
        let registry = FrontendRegistry::with_defaults();
        let err = registry.create("libclang").err().unwrap();
        assert!(matches!(err, FrontendError::UnknownFrontend(name) if name == "libclang"));
    }

    #[test]
    fn register_replaces() {
        let mut registry = FrontendRegistry::new();
        registry.register("scan", || Arc::new(ProcessFrontend::new()));
        assert_eq!(registry.create("scan").unwrap().name(), "process");
    }
}
