//! Function registry: the functions a member can execute, by id.

use super::Function;
use crate::error::{FunctionError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Functions registered on a member
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RwLock<HashMap<String, Arc<dyn Function>>>,
}

impl FunctionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under its id.
    pub fn register(&self, function: Arc<dyn Function>) -> Result<()> {
        let id = function.id().to_string();
        if id.trim().is_empty() {
            return Err(FunctionError::Registration(
                "Function ID must not be empty".to_string(),
            ));
        }

        let mut functions = self.functions.write();
        if functions.contains_key(&id) {
            return Err(FunctionError::Registration(format!(
                "Function '{}' is already registered",
                id
            )));
        }

        info!(function_id = %id, has_result = function.has_result(), "Registering function");
        functions.insert(id, function);
        Ok(())
    }

    /// Unregister a function.
    pub fn unregister(&self, id: &str) -> Result<Arc<dyn Function>> {
        let removed = self
            .functions
            .write()
            .remove(id)
            .ok_or_else(|| FunctionError::Registration(format!("Function '{}' not found", id)))?;
        debug!(function_id = id, "Unregistered function");
        Ok(removed)
    }

    /// Look a function up at call time.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Function>> {
        self.functions.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.functions.read().contains_key(id)
    }

    /// Registered function ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.functions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Count registered functions.
    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }
}
