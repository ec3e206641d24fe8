// ============================================================================
// docmutate Library
// ============================================================================

pub mod auth;
pub mod callbacks;
pub mod context;
pub mod core;
pub mod form;
pub mod mutations;
pub mod mutators;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{CrudAction, Document, EntityType, MutationError, Result, User, ValidationError};
pub use crate::context::MutationContext;

pub use auth::{
    Action, ActionName, ActionScope, AuthorizationOracle, CheckFn, GroupPermissions,
    PermissionResolver, resolve_permission,
};
pub use callbacks::{
    CallbackDefinition, CallbackHook, CallbackPhase, CallbackProperties, CallbackRegistry,
    ExecutionMode, ReturnShape,
};
pub use mutations::{
    GeneratedMutations, MutationFactory, MutationFlags, MutationInput, MutationKind,
    MutationOptions, OperationDescriptor,
};
pub use mutators::{CallbackMutators, Mutators};
pub use storage::{Collection, Connectors, GetOptions, MemoryCollection, Selector};

// ============================================================================
// Bootstrap
// ============================================================================

use std::sync::Arc;

/// Wires an oracle, a callback registry and the default mutators together.
///
/// # Examples
///
/// ```
/// use docmutate::{Crud, GroupPermissions, MutationOptions};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let crud = Crud::new(Arc::new(GroupPermissions::new()));
/// let posts = crud.build_mutations("Posts", MutationOptions::new())?;
/// assert_eq!(posts.len(), 4);
/// assert_eq!(crud.registry().len()?, 12);
/// # Ok(())
/// # }
/// ```
pub struct Crud {
    factory: MutationFactory,
    mutators: Arc<CallbackMutators>,
}

impl Crud {
    pub fn new(oracle: Arc<dyn AuthorizationOracle>) -> Self {
        Self::with_registry(oracle, Arc::new(CallbackRegistry::new()))
    }

    pub fn with_registry(oracle: Arc<dyn AuthorizationOracle>, registry: Arc<CallbackRegistry>) -> Self {
        Self {
            factory: MutationFactory::new(oracle, registry.clone()),
            mutators: Arc::new(CallbackMutators::new(registry)),
        }
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        self.factory.registry()
    }

    pub fn build_mutations(
        &self,
        entity: impl Into<EntityType>,
        options: MutationOptions,
    ) -> Result<GeneratedMutations> {
        self.factory.build_mutations(entity, options)
    }

    /// A request context backed by the default mutators
    pub fn context(&self) -> MutationContext {
        MutationContext::new(self.mutators.clone())
    }
}
