use super::{CreateMutatorArgs, DeleteMutatorArgs, Mutators, UpdateMutatorArgs};
use crate::callbacks::{CallbackPhase, CallbackProperties, CallbackRegistry, callback_name};
use crate::context::MutationContext;
use crate::core::{
    CREATED_AT_FIELD, CrudAction, Document, EntityType, MutationError, OWNER_FIELD, Result, User,
};
use crate::storage::{Collection, Connectors};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{Level, event};

/// Default persistence helpers.
///
/// Every write runs the entity's callbacks in a fixed order:
/// validate → before → persist → after → async (detached).
#[derive(Clone)]
pub struct CallbackMutators {
    registry: Arc<CallbackRegistry>,
}

impl CallbackMutators {
    pub fn new(registry: Arc<CallbackRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    fn properties(
        collection: &dyn Collection,
        current_user: Option<User>,
        document: Option<Document>,
    ) -> CallbackProperties {
        CallbackProperties {
            current_user,
            document,
            collection: collection.name().to_string(),
        }
    }

    fn validate(
        &self,
        entity: &EntityType,
        action: CrudAction,
        value: &Document,
        properties: &CallbackProperties,
    ) -> Result<()> {
        let name = callback_name(entity, action, CallbackPhase::Validate);
        let errors = self.registry.run_validators(&name, value, properties)?;
        if errors.is_empty() {
            return Ok(());
        }

        event!(
            Level::INFO,
            callback = %name,
            errors = errors.len(),
            "document rejected by validation"
        );
        Err(MutationError::ValidationFailed(errors))
    }

    fn transform(
        &self,
        entity: &EntityType,
        action: CrudAction,
        phase: CallbackPhase,
        value: Document,
        properties: &CallbackProperties,
    ) -> Result<Document> {
        let name = callback_name(entity, action, phase);
        self.registry.run_transforms(&name, value, properties)
    }

    fn spawn_async(
        &self,
        entity: &EntityType,
        action: CrudAction,
        value: Document,
        properties: CallbackProperties,
    ) {
        let name = callback_name(entity, action, CallbackPhase::Async);
        // the primary result is already settled; scheduling problems are only logged
        if let Err(err) = self.registry.run_async(&name, value, properties) {
            event!(Level::ERROR, callback = %name, error = %err, "failed to schedule async callbacks");
        }
    }

    async fn fetch(
        collection: &dyn Collection,
        entity: &EntityType,
        action: CrudAction,
        document_id: &str,
    ) -> Result<Document> {
        Connectors::get_by_id(collection, document_id)
            .await?
            .ok_or_else(|| MutationError::NotFound {
                operation: format!("{}.{}", entity, action),
                document_id: Some(document_id.to_string()),
            })
    }
}

/// Fields every created document receives when the caller left them out
fn stamp_new_document(mut document: Document, current_user: Option<&User>) -> Document {
    if let Some(user) = current_user {
        if !document.contains(OWNER_FIELD) {
            document.set(OWNER_FIELD, user.id());
        }
    }
    if !document.contains(CREATED_AT_FIELD) {
        document.set(
            CREATED_AT_FIELD,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    }
    document
}

#[async_trait]
impl Mutators for CallbackMutators {
    async fn create_mutator(&self, args: CreateMutatorArgs, _context: &MutationContext) -> Result<Document> {
        let CreateMutatorArgs {
            collection,
            entity,
            data,
            current_user,
            validate,
        } = args;
        let properties = Self::properties(collection.as_ref(), current_user, None);

        if validate {
            self.validate(&entity, CrudAction::Create, &data, &properties)?;
        }

        let document = stamp_new_document(data, properties.current_user.as_ref());
        let document =
            self.transform(&entity, CrudAction::Create, CallbackPhase::Before, document, &properties)?;
        let stored = collection.insert(document).await?;
        let stored =
            self.transform(&entity, CrudAction::Create, CallbackPhase::After, stored, &properties)?;

        event!(
            Level::DEBUG,
            entity_type = %entity,
            document_id = stored.id().unwrap_or_default(),
            "document created"
        );
        self.spawn_async(&entity, CrudAction::Create, stored.clone(), properties);
        Ok(stored)
    }

    async fn update_mutator(&self, args: UpdateMutatorArgs, _context: &MutationContext) -> Result<Document> {
        let UpdateMutatorArgs {
            collection,
            entity,
            document_id,
            data,
            current_user,
            validate,
        } = args;

        let document =
            Self::fetch(collection.as_ref(), &entity, CrudAction::Update, &document_id).await?;
        let properties = Self::properties(collection.as_ref(), current_user, Some(document));

        if validate {
            self.validate(&entity, CrudAction::Update, &data, &properties)?;
        }

        let data =
            self.transform(&entity, CrudAction::Update, CallbackPhase::Before, data, &properties)?;
        let new_document = collection.update(&document_id, &data).await?;
        let new_document = self.transform(
            &entity,
            CrudAction::Update,
            CallbackPhase::After,
            new_document,
            &properties,
        )?;

        event!(
            Level::DEBUG,
            entity_type = %entity,
            document_id = %document_id,
            "document updated"
        );
        self.spawn_async(&entity, CrudAction::Update, new_document.clone(), properties);
        Ok(new_document)
    }

    async fn delete_mutator(&self, args: DeleteMutatorArgs, _context: &MutationContext) -> Result<Document> {
        let DeleteMutatorArgs {
            collection,
            entity,
            document_id,
            current_user,
            validate,
        } = args;

        let document =
            Self::fetch(collection.as_ref(), &entity, CrudAction::Delete, &document_id).await?;
        let properties = Self::properties(collection.as_ref(), current_user, Some(document.clone()));

        if validate {
            self.validate(&entity, CrudAction::Delete, &document, &properties)?;
        }

        let document =
            self.transform(&entity, CrudAction::Delete, CallbackPhase::Before, document, &properties)?;
        // hooks see the before-phase result, storage only confirms removal
        if collection.remove(&document_id).await?.is_none() {
            return Err(MutationError::NotFound {
                operation: format!("{}.{}", entity, CrudAction::Delete),
                document_id: Some(document_id),
            });
        }
        let document =
            self.transform(&entity, CrudAction::Delete, CallbackPhase::After, document, &properties)?;

        event!(
            Level::DEBUG,
            entity_type = %entity,
            document_id = %document_id,
            "document deleted"
        );
        self.spawn_async(&entity, CrudAction::Delete, document.clone(), properties);
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::CallbackHook;
    use crate::core::{ID_FIELD, ValidationError};
    use crate::storage::MemoryCollection;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn posts() -> EntityType {
        EntityType::new("Posts")
    }

    fn doc(value: serde_json::Value) -> Document {
        Document::from_value(value).unwrap()
    }

    fn setup() -> (Arc<CallbackRegistry>, CallbackMutators, MutationContext) {
        let registry = Arc::new(CallbackRegistry::new());
        registry.register_collection_callbacks(&posts()).unwrap();
        let mutators = CallbackMutators::new(registry.clone());
        let context = MutationContext::new(Arc::new(mutators.clone()));
        (registry, mutators, context)
    }

    fn create_args(collection: Arc<MemoryCollection>, data: Document) -> CreateMutatorArgs {
        CreateMutatorArgs {
            collection,
            entity: posts(),
            data,
            current_user: Some(User::new("u1", "alice")),
            validate: true,
        }
    }

    #[tokio::test]
    async fn test_create_runs_phases_in_order() {
        let (registry, mutators, context) = setup();
        let trace = Arc::new(Mutex::new(Vec::new()));

        let t = trace.clone();
        registry
            .add_callback(
                "posts.create.validate",
                CallbackHook::validate(move |_, _| {
                    t.lock().unwrap().push("validate");
                    Vec::new()
                }),
            )
            .unwrap();
        let t = trace.clone();
        registry
            .add_callback(
                "posts.create.before",
                CallbackHook::transform(move |doc, _| {
                    assert!(doc.id().is_none());
                    t.lock().unwrap().push("before");
                    Ok(doc.with("slug", "hello"))
                }),
            )
            .unwrap();
        let t = trace.clone();
        registry
            .add_callback(
                "posts.create.after",
                CallbackHook::transform(move |doc, _| {
                    assert!(doc.id().is_some());
                    t.lock().unwrap().push("after");
                    Ok(doc)
                }),
            )
            .unwrap();
        let (done_tx, done_rx) = oneshot::channel();
        let done_tx = Arc::new(Mutex::new(Some(done_tx)));
        let t = trace.clone();
        registry
            .add_callback(
                "posts.create.async",
                CallbackHook::background(move |doc, props| {
                    t.lock().unwrap().push("async");
                    if let Some(tx) = done_tx.lock().unwrap().take() {
                        let _ = tx.send((doc, props.collection));
                    }
                    async { Ok::<(), MutationError>(()) }.boxed()
                }),
            )
            .unwrap();

        let collection = Arc::new(MemoryCollection::new("Posts"));
        let created = mutators
            .create_mutator(create_args(collection.clone(), doc(json!({"title": "Hello"}))), &context)
            .await
            .unwrap();

        assert_eq!(created.get_str("slug"), Some("hello"));
        assert_eq!(created.owner_id(), Some("u1"));
        assert!(created.contains(CREATED_AT_FIELD));

        let (async_doc, async_collection) = done_rx.await.unwrap();
        assert_eq!(async_doc, created);
        assert_eq!(async_collection, "Posts");
        assert_eq!(*trace.lock().unwrap(), vec!["validate", "before", "after", "async"]);
    }

    #[tokio::test]
    async fn test_create_validation_failure_prevents_write() {
        let (registry, mutators, context) = setup();
        registry
            .add_callback(
                "posts.create.validate",
                CallbackHook::validate(|doc, _| {
                    if doc.contains("title") {
                        Vec::new()
                    } else {
                        vec![ValidationError::new("errors.required", "title is required").at("title")]
                    }
                }),
            )
            .unwrap();

        let collection = Arc::new(MemoryCollection::new("Posts"));
        let result = mutators
            .create_mutator(create_args(collection.clone(), Document::new()), &context)
            .await;

        assert!(matches!(result, Err(MutationError::ValidationFailed(ref errors)) if errors.len() == 1));
        assert_eq!(collection.access_count(), 0);
    }

    #[tokio::test]
    async fn test_create_skips_validation_when_disabled() {
        let (registry, mutators, context) = setup();
        registry
            .add_callback(
                "posts.create.validate",
                CallbackHook::validate(|_, _| vec![ValidationError::new("errors.always", "no")]),
            )
            .unwrap();

        let collection = Arc::new(MemoryCollection::new("Posts"));
        let mut args = create_args(collection, Document::new());
        args.validate = false;
        assert!(mutators.create_mutator(args, &context).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_passes_previous_document_to_hooks() {
        let (registry, mutators, context) = setup();
        registry
            .add_callback(
                "posts.update.before",
                CallbackHook::transform(|data, props| {
                    let previous = props.document.as_ref().and_then(|d| d.get_str("title"));
                    assert_eq!(previous, Some("Hello"));
                    Ok(data.with("editedBy", props.current_user.as_ref().map(|u| u.id().to_string())))
                }),
            )
            .unwrap();

        let collection = Arc::new(
            MemoryCollection::with_documents("Posts", [doc(json!({"_id": "p1", "title": "Hello"}))])
                .unwrap(),
        );
        let updated = mutators
            .update_mutator(
                UpdateMutatorArgs {
                    collection: collection.clone(),
                    entity: posts(),
                    document_id: "p1".into(),
                    data: doc(json!({"title": "Bye"})),
                    current_user: Some(User::new("u1", "alice")),
                    validate: true,
                },
                &context,
            )
            .await
            .unwrap();

        assert_eq!(updated, doc(json!({"_id": "p1", "title": "Bye", "editedBy": "u1"})));
        assert_eq!(collection.peek("p1").await, Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let (_registry, mutators, context) = setup();
        let collection = Arc::new(MemoryCollection::new("Posts"));
        let result = mutators
            .update_mutator(
                UpdateMutatorArgs {
                    collection,
                    entity: posts(),
                    document_id: "nope".into(),
                    data: Document::new(),
                    current_user: None,
                    validate: true,
                },
                &context,
            )
            .await;
        assert!(matches!(result, Err(MutationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_returns_removed_document() {
        let (registry, mutators, context) = setup();
        registry
            .add_callback(
                "posts.delete.after",
                CallbackHook::transform(|doc, _| Ok(doc.with("deleted", true))),
            )
            .unwrap();

        let collection = Arc::new(
            MemoryCollection::with_documents("Posts", [doc(json!({"_id": "p1", "title": "Hello"}))])
                .unwrap(),
        );
        let removed = mutators
            .delete_mutator(
                DeleteMutatorArgs {
                    collection: collection.clone(),
                    entity: posts(),
                    document_id: "p1".into(),
                    current_user: None,
                    validate: false,
                },
                &context,
            )
            .await
            .unwrap();

        assert_eq!(removed.get_str(ID_FIELD), Some("p1"));
        assert_eq!(removed.get("deleted"), Some(&json!(true)));
        assert!(collection.peek("p1").await.is_none());
    }

    #[test]
    fn test_stamp_keeps_explicit_owner() {
        let alice = User::new("u1", "alice");
        let stamped = stamp_new_document(doc(json!({"userId": "u2"})), Some(&alice));
        assert_eq!(stamped.owner_id(), Some("u2"));

        let anonymous = stamp_new_document(Document::new(), None);
        assert!(anonymous.owner_id().is_none());
        assert!(anonymous.contains(CREATED_AT_FIELD));
    }
}
