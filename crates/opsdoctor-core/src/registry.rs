use std::{collections::BTreeMap, fmt, sync::Arc};

use thiserror::Error;

use crate::module::Module;

/// Errors raised while populating a [`Registry`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("nil module not allowed")]
    NilModule,
    #[error("module name cannot be empty")]
    EmptyModuleName,
    #[error("module `{name}` already registered")]
    ModuleAlreadyRegistered { name: String },
}

/// In-memory store of modules keyed by unique name.
///
/// Populated once during setup and handed to [`crate::Engine::new`]; names
/// enumerate in ascending order.
#[derive(Default)]
pub struct Registry {
    modules: BTreeMap<String, Arc<dyn Module>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: Module + 'static>(&mut self, module: M) -> Result<(), RegistryError> {
        let module: Arc<dyn Module> = Arc::new(module);
        self.register_dyn(Some(module))
    }

    /// Register a module that may not have been constructed (for example a
    /// factory that yields `None` on misconfiguration).
    pub fn register_dyn(&mut self, module: Option<Arc<dyn Module>>) -> Result<(), RegistryError> {
        let module = module.ok_or(RegistryError::NilModule)?;
        let name = module.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyModuleName);
        }
        if self.modules.contains_key(&name) {
            return Err(RegistryError::ModuleAlreadyRegistered { name });
        }
        self.modules.insert(name, module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name).cloned()
    }

    pub fn list(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        finding::Finding,
        module::{ModuleError, RunContext},
    };
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Module for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, _ctx: &RunContext) -> Result<Vec<Finding>, ModuleError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn registers_module() {
        let mut registry = Registry::new();
        registry.register(Named("test")).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("test").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = Registry::new();
        registry.register(Named("test")).unwrap();
        let err = registry.register(Named("test")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::ModuleAlreadyRegistered {
                name: "test".into()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_nil_module() {
        let mut registry = Registry::new();
        assert_eq!(registry.register_dyn(None), Err(RegistryError::NilModule));
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_empty_name() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.register(Named("")),
            Err(RegistryError::EmptyModuleName)
        );
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn lists_every_name() {
        let mut registry = Registry::new();
        for name in ["terraform", "aws", "git"] {
            registry.register(Named(name)).unwrap();
        }
        let mut names = registry.list();
        names.sort();
        assert_eq!(names, vec!["aws", "git", "terraform"]);
    }
}
