//! Controller registry: string identifiers to handler instances, populated at startup.

use crate::error::AppError;
use async_trait::async_trait;
use axum::response::Response;
use std::collections::HashMap;
use std::sync::Arc;

/// A named, discoverable handler grouping callable operations. Implementors
/// capture their own dependencies (database handle, templates, ...) at
/// construction; the dispatcher knows nothing about them.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Operation names callable from the URL.
    fn methods(&self) -> &[&'static str];

    /// Invoke one operation with the positional URL parameters.
    async fn call(&self, method: &str, params: &[String]) -> Result<Response, AppError>;
}

/// Identifier -> controller map. Keys are namespace-qualified CamelCase
/// identifiers as produced by resolution, e.g. "Home" or "Admin/TopSales".
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, controller: Arc<dyn Controller>) {
        self.controllers.insert(key.into(), controller);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.controllers.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn Controller>> {
        self.controllers.get(key)
    }

    /// Whether `key` names a controller exposing `method`.
    pub fn has_method(&self, key: &str, method: &str) -> bool {
        self.controllers
            .get(key)
            .map(|c| c.methods().iter().any(|m| *m == method))
            .unwrap_or(false)
    }
}
