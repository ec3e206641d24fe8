//! Persistence helpers invoked by generated mutations.
//!
//! A [`Mutators`] implementation performs the actual create/update/delete
//! against storage. [`CallbackMutators`] is the default one: it runs the
//! registered lifecycle callbacks around every write.

pub mod callback_mutators;

pub use callback_mutators::CallbackMutators;

use crate::context::MutationContext;
use crate::core::{Document, EntityType, Result, User};
use crate::storage::Collection;
use async_trait::async_trait;
use std::sync::Arc;

pub struct CreateMutatorArgs {
    pub collection: Arc<dyn Collection>,
    pub entity: EntityType,
    pub data: Document,
    pub current_user: Option<User>,
    /// Run `validate` callbacks before writing
    pub validate: bool,
}

pub struct UpdateMutatorArgs {
    pub collection: Arc<dyn Collection>,
    pub entity: EntityType,
    pub document_id: String,
    pub data: Document,
    pub current_user: Option<User>,
    pub validate: bool,
}

pub struct DeleteMutatorArgs {
    pub collection: Arc<dyn Collection>,
    pub entity: EntityType,
    pub document_id: String,
    pub current_user: Option<User>,
    pub validate: bool,
}

#[async_trait]
pub trait Mutators: Send + Sync {
    /// Persists a new document and returns it as stored
    async fn create_mutator(&self, args: CreateMutatorArgs, context: &MutationContext) -> Result<Document>;

    /// Applies update data to a stored document and returns the new state
    async fn update_mutator(&self, args: UpdateMutatorArgs, context: &MutationContext) -> Result<Document>;

    /// Removes a stored document and returns its last state
    async fn delete_mutator(&self, args: DeleteMutatorArgs, context: &MutationContext) -> Result<Document>;
}
