use crate::core::{EntityType, MutationError, Result, User};
use crate::mutators::Mutators;
use crate::storage::Collection;
use std::collections::HashMap;
use std::sync::Arc;

/// Request-scoped state handed to every mutation handler.
#[derive(Clone)]
pub struct MutationContext {
    current_user: Option<User>,
    collections: HashMap<String, Arc<dyn Collection>>,
    mutators: Arc<dyn Mutators>,
}

impl MutationContext {
    /// Creates an anonymous context without collections
    pub fn new(mutators: Arc<dyn Mutators>) -> Self {
        Self {
            current_user: None,
            collections: HashMap::new(),
            mutators,
        }
    }

    /// Sets the caller
    pub fn with_user(mut self, user: User) -> Self {
        self.current_user = Some(user);
        self
    }

    /// Binds an entity type name to its storage collection
    pub fn with_collection(mut self, entity_name: impl Into<String>, collection: Arc<dyn Collection>) -> Self {
        self.collections.insert(entity_name.into(), collection);
        self
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn mutators(&self) -> &Arc<dyn Mutators> {
        &self.mutators
    }

    /// Looks up the collection of an entity type
    pub fn collection(&self, entity: &EntityType) -> Result<Arc<dyn Collection>> {
        self.collections
            .get(entity.name())
            .cloned()
            .ok_or_else(|| MutationError::CollectionNotFound(entity.name().to_string()))
    }
}
