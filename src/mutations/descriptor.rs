use crate::auth::{CheckFn, PermissionResolver};
use crate::context::MutationContext;
use crate::core::{CrudAction, Document, EntityType, MutationError, Result, User};
use crate::mutators::{CreateMutatorArgs, DeleteMutatorArgs, UpdateMutatorArgs};
use crate::storage::{Connectors, GetOptions, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

/// The generated operations of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Upsert,
    Delete,
}

impl MutationKind {
    pub const ALL: [MutationKind; 4] = [Self::Create, Self::Update, Self::Upsert, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }

    fn description(&self, entity: &EntityType) -> String {
        match self {
            Self::Create => format!("Mutation for creating new {} documents", entity),
            Self::Update => format!("Mutation for updating a {} document", entity),
            Self::Upsert => format!("Mutation for upserting a {} document", entity),
            Self::Delete => format!("Mutation for deleting a {} document", entity),
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `input` argument of a generated mutation.
///
/// `{ data }` for create and upsert (upsert also takes a selector),
/// `{ selector: { documentId }, data }` for update,
/// `{ selector: { documentId } }` for delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Document>,
}

impl MutationInput {
    pub fn create(data: Document) -> Self {
        Self {
            selector: None,
            data: Some(data),
        }
    }

    pub fn update(document_id: impl Into<String>, data: Document) -> Self {
        Self {
            selector: Some(Selector::by_id(document_id)),
            data: Some(data),
        }
    }

    pub fn upsert(selector: Selector, data: Document) -> Self {
        Self {
            selector: Some(selector),
            data: Some(data),
        }
    }

    pub fn delete(document_id: impl Into<String>) -> Self {
        Self {
            selector: Some(Selector::by_id(document_id)),
            data: None,
        }
    }

    /// Reads the GraphQL-style argument object
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    fn document_id(&self) -> Option<&str> {
        self.selector.as_ref()?.document_id.as_deref()
    }
}

/// Create and update descriptors an upsert dispatches to.
#[derive(Clone)]
pub(crate) struct UpsertBranches {
    pub(crate) create: Arc<OperationDescriptor>,
    pub(crate) update: Arc<OperationDescriptor>,
}

/// Permission check plus handler for one CRUD operation of an entity type.
#[derive(Clone)]
pub struct OperationDescriptor {
    kind: MutationKind,
    entity: EntityType,
    description: String,
    resolver: PermissionResolver,
    override_check: Option<CheckFn>,
    validate: bool,
    branches: Option<UpsertBranches>,
}

impl OperationDescriptor {
    pub(crate) fn new(
        kind: MutationKind,
        entity: EntityType,
        resolver: PermissionResolver,
        override_check: Option<CheckFn>,
        validate: bool,
    ) -> Self {
        Self {
            description: kind.description(&entity),
            kind,
            entity,
            resolver,
            override_check,
            validate,
            branches: None,
        }
    }

    pub(crate) fn upsert(entity: EntityType, resolver: PermissionResolver, branches: UpsertBranches) -> Self {
        Self {
            branches: Some(branches),
            ..Self::new(MutationKind::Upsert, entity, resolver, None, false)
        }
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// `<Type>.<kind>`, used in errors and logs
    pub fn operation_name(&self) -> String {
        format!("{}.{}", self.entity, self.kind)
    }

    /// Whether `user` may run this operation against `document`.
    ///
    /// Upsert has no rule of its own: a document carrying an `_id` is
    /// judged by the update check, anything else by the create check.
    pub fn check(&self, user: Option<&User>, document: Option<&Document>) -> bool {
        let action = match self.kind {
            MutationKind::Create => CrudAction::Create,
            MutationKind::Update => CrudAction::Update,
            MutationKind::Delete => CrudAction::Delete,
            MutationKind::Upsert => {
                let Some(branches) = &self.branches else {
                    return false;
                };
                return match document.and_then(Document::id) {
                    Some(_) => branches.update.check(user, document),
                    None => branches.create.check(user, document),
                };
            }
        };

        self.resolver.resolve(
            action,
            &self.entity,
            user,
            document,
            self.override_check.as_ref(),
        )
    }

    /// Runs the operation.
    ///
    /// `root` is the GraphQL parent value; generated mutations ignore it.
    pub async fn mutation(
        &self,
        _root: &Value,
        input: MutationInput,
        context: &MutationContext,
    ) -> Result<Document> {
        let span = info_span!(
            "mutation",
            operation = %self.operation_name(),
            document_id = input.document_id().unwrap_or_default()
        );

        async move {
            let result = match self.kind {
                MutationKind::Create => self.run_create(input, context).await,
                MutationKind::Update => self.run_update(input, context).await,
                MutationKind::Upsert => self.run_upsert(input, context).await,
                MutationKind::Delete => self.run_delete(input, context).await,
            };

            match &result {
                Ok(document) => event!(
                    Level::DEBUG,
                    document_id = document.id().unwrap_or_default(),
                    "mutation applied"
                ),
                Err(err) if err.is_rejection() => {
                    event!(Level::INFO, error = %err, "mutation rejected")
                }
                Err(err) => event!(Level::ERROR, error = %err, "mutation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn perform_check(
        &self,
        user: Option<&User>,
        document: &Document,
        document_id: Option<&str>,
    ) -> Result<()> {
        if self.check(user, Some(document)) {
            return Ok(());
        }

        Err(MutationError::AuthorizationDenied {
            operation: self.operation_name(),
            document_id: document_id.map(str::to_string),
        })
    }

    fn require_data(&self, input: &mut MutationInput) -> Result<Document> {
        input.data.take().ok_or_else(|| {
            MutationError::InvalidInput(format!("{} requires input.data", self.operation_name()))
        })
    }

    fn require_document_id(&self, input: &MutationInput) -> Result<String> {
        input.document_id().map(str::to_string).ok_or_else(|| {
            MutationError::InvalidInput(format!(
                "{} requires input.selector.documentId",
                self.operation_name()
            ))
        })
    }

    /// Fetches the stored document an update or delete applies to
    async fn current_document(
        &self,
        document_id: &str,
        context: &MutationContext,
    ) -> Result<Document> {
        let collection = context.collection(&self.entity)?;
        Connectors::get_by_id(collection.as_ref(), document_id)
            .await?
            .ok_or_else(|| MutationError::NotFound {
                operation: self.operation_name(),
                document_id: Some(document_id.to_string()),
            })
    }

    async fn run_create(&self, mut input: MutationInput, context: &MutationContext) -> Result<Document> {
        let data = self.require_data(&mut input)?;
        let current_user = context.current_user();

        // checked against the incoming data, before anything touches storage
        self.perform_check(current_user, &data, None)?;

        let collection = context.collection(&self.entity)?;
        context
            .mutators()
            .create_mutator(
                CreateMutatorArgs {
                    collection,
                    entity: self.entity.clone(),
                    data,
                    current_user: current_user.cloned(),
                    validate: self.validate,
                },
                context,
            )
            .await
    }

    async fn run_update(&self, mut input: MutationInput, context: &MutationContext) -> Result<Document> {
        let document_id = self.require_document_id(&input)?;
        let data = self.require_data(&mut input)?;
        let current_user = context.current_user();

        let document = self.current_document(&document_id, context).await?;
        self.perform_check(current_user, &document, Some(&document_id))?;

        let collection = context.collection(&self.entity)?;
        context
            .mutators()
            .update_mutator(
                UpdateMutatorArgs {
                    collection,
                    entity: self.entity.clone(),
                    document_id,
                    data,
                    current_user: current_user.cloned(),
                    validate: self.validate,
                },
                context,
            )
            .await
    }

    async fn run_delete(&self, input: MutationInput, context: &MutationContext) -> Result<Document> {
        let document_id = self.require_document_id(&input)?;
        let current_user = context.current_user();

        let document = self.current_document(&document_id, context).await?;
        self.perform_check(current_user, &document, Some(&document_id))?;

        let collection = context.collection(&self.entity)?;
        context
            .mutators()
            .delete_mutator(
                DeleteMutatorArgs {
                    collection,
                    entity: self.entity.clone(),
                    document_id,
                    current_user: current_user.cloned(),
                    validate: self.validate,
                },
                context,
            )
            .await
    }

    async fn run_upsert(&self, mut input: MutationInput, context: &MutationContext) -> Result<Document> {
        let branches = self.branches.as_ref().ok_or_else(|| {
            MutationError::InvalidInput(format!("{} has no branches", self.operation_name()))
        })?;
        let data = self.require_data(&mut input)?;
        let selector = input.selector.take().ok_or_else(|| {
            MutationError::InvalidInput(format!("{} requires input.selector", self.operation_name()))
        })?;

        let collection = context.collection(&self.entity)?;
        let existing =
            Connectors::get(collection.as_ref(), &selector, GetOptions::id_only()).await?;

        match existing.as_ref().and_then(Document::id) {
            Some(document_id) => {
                event!(Level::DEBUG, document_id = %document_id, "upsert matched, updating");
                branches
                    .update
                    .run_update(MutationInput::update(document_id, data), context)
                    .await
            }
            None => {
                event!(Level::DEBUG, "upsert found no document, creating");
                branches
                    .create
                    .run_create(MutationInput::create(data), context)
                    .await
            }
        }
    }
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("kind", &self.kind)
            .field("entity", &self.entity)
            .field("description", &self.description)
            .field("override_check", &self.override_check.is_some())
            .field("validate", &self.validate)
            .finish()
    }
}
