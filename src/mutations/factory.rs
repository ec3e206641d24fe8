use super::descriptor::{MutationKind, OperationDescriptor, UpsertBranches};
use super::options::MutationOptions;
use crate::auth::{AuthorizationOracle, PermissionResolver};
use crate::callbacks::CallbackRegistry;
use crate::core::{EntityType, Result};
use std::sync::Arc;
use tracing::{Level, event};

/// The descriptors generated for one entity type.
#[derive(Debug, Clone)]
pub struct GeneratedMutations {
    pub entity: EntityType,
    pub create: Option<Arc<OperationDescriptor>>,
    pub update: Option<Arc<OperationDescriptor>>,
    pub upsert: Option<Arc<OperationDescriptor>>,
    pub delete: Option<Arc<OperationDescriptor>>,
}

impl GeneratedMutations {
    pub fn get(&self, kind: MutationKind) -> Option<&Arc<OperationDescriptor>> {
        match kind {
            MutationKind::Create => self.create.as_ref(),
            MutationKind::Update => self.update.as_ref(),
            MutationKind::Upsert => self.upsert.as_ref(),
            MutationKind::Delete => self.delete.as_ref(),
        }
    }

    /// Kinds present, in create/update/upsert/delete order
    pub fn kinds(&self) -> Vec<MutationKind> {
        MutationKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_some())
            .collect()
    }

    /// Exposed operation names, e.g. `createPosts`
    pub fn operation_names(&self) -> Vec<String> {
        self.kinds()
            .into_iter()
            .map(|kind| format!("{}{}", kind, self.entity))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.kinds().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds CRUD descriptors for entity types.
///
/// Shares one authorization oracle and one callback registry across every
/// entity type it is run for.
pub struct MutationFactory {
    resolver: PermissionResolver,
    registry: Arc<CallbackRegistry>,
}

impl MutationFactory {
    pub fn new(oracle: Arc<dyn AuthorizationOracle>, registry: Arc<CallbackRegistry>) -> Self {
        Self {
            resolver: PermissionResolver::new(oracle),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    /// Produces the descriptors enabled by `options.flags` and registers
    /// the entity type's lifecycle callbacks.
    ///
    /// Fails with `InvalidInput` for an empty or dotted entity name.
    ///
    /// The upsert descriptor always dispatches to create and update
    /// branches carrying the configured checks, even when those two are
    /// not exposed themselves.
    pub fn build_mutations(
        &self,
        entity: impl Into<EntityType>,
        options: MutationOptions,
    ) -> Result<GeneratedMutations> {
        let entity = entity.into();
        let MutationOptions {
            flags,
            new_check,
            edit_check,
            remove_check,
            validate,
        } = options;

        entity.validate()?;
        self.registry.register_collection_callbacks(&entity)?;

        let descriptor = |kind, check| {
            Arc::new(OperationDescriptor::new(
                kind,
                entity.clone(),
                self.resolver.clone(),
                check,
                validate,
            ))
        };

        let create = descriptor(MutationKind::Create, new_check);
        let update = descriptor(MutationKind::Update, edit_check);
        let delete = descriptor(MutationKind::Delete, remove_check);

        let upsert = flags.upsert.then(|| {
            Arc::new(OperationDescriptor::upsert(
                entity.clone(),
                self.resolver.clone(),
                UpsertBranches {
                    create: create.clone(),
                    update: update.clone(),
                },
            ))
        });

        let mutations = GeneratedMutations {
            entity: entity.clone(),
            create: flags.create.then_some(create),
            update: flags.update.then_some(update),
            upsert,
            delete: flags.delete.then_some(delete),
        };

        event!(
            Level::INFO,
            entity_type = %entity,
            operations = ?mutations.kinds(),
            "mutations generated"
        );
        Ok(mutations)
    }
}
