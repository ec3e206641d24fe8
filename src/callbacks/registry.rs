use super::definition::{CallbackDefinition, CallbackPhase, collection_callback_definitions};
use crate::core::{Document, EntityType, MutationError, Result, User, ValidationError};
use futures::future::BoxFuture;
use log::warn;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::{Instrument, Level, event, info_span};

/// Arguments handed to every hook besides the value it processes.
#[derive(Debug, Clone, Default)]
pub struct CallbackProperties {
    pub current_user: Option<User>,
    /// Stored document before the operation (update and delete only)
    pub document: Option<Document>,
    /// Name of the collection the operation targets
    pub collection: String,
}

/// Inspects a document and reports rule violations.
pub type ValidateHook =
    Arc<dyn Fn(&Document, &CallbackProperties) -> Vec<ValidationError> + Send + Sync>;
/// Receives the current value and returns the value passed to the next hook.
pub type TransformHook =
    Arc<dyn Fn(Document, &CallbackProperties) -> Result<Document> + Send + Sync>;
/// Detached side effect run after the mutation returned.
pub type AsyncHook =
    Arc<dyn Fn(Document, CallbackProperties) -> BoxFuture<'static, Result<()>> + Send + Sync>;

#[derive(Clone)]
pub enum CallbackHook {
    Validate(ValidateHook),
    Transform(TransformHook),
    Async(AsyncHook),
}

impl CallbackHook {
    pub fn validate<F>(hook: F) -> Self
    where
        F: Fn(&Document, &CallbackProperties) -> Vec<ValidationError> + Send + Sync + 'static,
    {
        Self::Validate(Arc::new(hook))
    }

    pub fn transform<F>(hook: F) -> Self
    where
        F: Fn(Document, &CallbackProperties) -> Result<Document> + Send + Sync + 'static,
    {
        Self::Transform(Arc::new(hook))
    }

    pub fn background<F>(hook: F) -> Self
    where
        F: Fn(Document, CallbackProperties) -> BoxFuture<'static, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Self::Async(Arc::new(hook))
    }

    fn accepts(&self, phase: CallbackPhase) -> bool {
        matches!(
            (self, phase),
            (Self::Validate(_), CallbackPhase::Validate)
                | (Self::Transform(_), CallbackPhase::Before | CallbackPhase::After)
                | (Self::Async(_), CallbackPhase::Async)
        )
    }
}

fn expected_hook(phase: CallbackPhase) -> &'static str {
    match phase {
        CallbackPhase::Validate => "validate",
        CallbackPhase::Before | CallbackPhase::After => "transform",
        CallbackPhase::Async => "async",
    }
}

#[derive(Default)]
struct RegistryState {
    definitions: HashMap<String, CallbackDefinition>,
    hooks: HashMap<String, Vec<CallbackHook>>,
}

/// Named lifecycle hooks and their metadata.
///
/// Populated once per entity type when mutations are built and read-only
/// afterwards. Owned explicitly and shared through `Arc`, so tests can build
/// a fresh registry or `reset` a shared one.
#[derive(Default)]
pub struct CallbackRegistry {
    state: RwLock<RegistryState>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition. Returns `false` if the name was already taken,
    /// in which case the existing definition is kept.
    pub fn register_callback(&self, definition: CallbackDefinition) -> Result<bool> {
        let mut state = self.state.write()?;

        if state.definitions.contains_key(&definition.name) {
            warn!("callback '{}' already registered", definition.name);
            return Ok(false);
        }

        state.definitions.insert(definition.name.clone(), definition);
        Ok(true)
    }

    /// Registers the twelve create/update/delete hooks of an entity type.
    ///
    /// Returns how many of them were new.
    pub fn register_collection_callbacks(&self, entity: &EntityType) -> Result<usize> {
        let mut registered = 0;
        for definition in collection_callback_definitions(entity) {
            if self.register_callback(definition)? {
                registered += 1;
            }
        }
        event!(
            Level::DEBUG,
            entity_type = %entity,
            registered,
            "collection callbacks registered"
        );
        Ok(registered)
    }

    pub fn get(&self, name: &str) -> Result<Option<CallbackDefinition>> {
        let state = self.state.read()?;
        Ok(state.definitions.get(name).cloned())
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        let state = self.state.read()?;
        Ok(state.definitions.contains_key(name))
    }

    /// All definitions, sorted by name
    pub fn definitions(&self) -> Result<Vec<CallbackDefinition>> {
        let state = self.state.read()?;
        let mut definitions: Vec<CallbackDefinition> = state.definitions.values().cloned().collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(definitions)
    }

    pub fn len(&self) -> Result<usize> {
        let state = self.state.read()?;
        Ok(state.definitions.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Attaches a hook to a registered callback name.
    ///
    /// The hook flavour must match the callback's phase.
    pub fn add_callback(&self, name: &str, hook: CallbackHook) -> Result<()> {
        let mut state = self.state.write()?;

        let phase = state
            .definitions
            .get(name)
            .map(|definition| definition.phase)
            .ok_or_else(|| MutationError::CallbackNotRegistered(name.to_string()))?;

        if !hook.accepts(phase) {
            return Err(MutationError::CallbackPhaseMismatch {
                name: name.to_string(),
                expected: expected_hook(phase).to_string(),
            });
        }

        state.hooks.entry(name.to_string()).or_default().push(hook);
        Ok(())
    }

    /// Number of hooks attached to a name
    pub fn hook_count(&self, name: &str) -> Result<usize> {
        let state = self.state.read()?;
        Ok(state.hooks.get(name).map_or(0, Vec::len))
    }

    /// Drops every definition and hook.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.state.write()?;
        state.definitions.clear();
        state.hooks.clear();
        Ok(())
    }

    fn hooks(&self, name: &str) -> Result<Vec<CallbackHook>> {
        let state = self.state.read()?;
        Ok(state.hooks.get(name).cloned().unwrap_or_default())
    }

    /// Runs every validate hook and collects the reported errors.
    pub fn run_validators(
        &self,
        name: &str,
        document: &Document,
        properties: &CallbackProperties,
    ) -> Result<Vec<ValidationError>> {
        let mut errors = Vec::new();
        for hook in self.hooks(name)? {
            if let CallbackHook::Validate(validate) = hook {
                errors.extend(validate(document, properties));
            }
        }
        Ok(errors)
    }

    /// Threads `value` through every transform hook in insertion order.
    pub fn run_transforms(
        &self,
        name: &str,
        value: Document,
        properties: &CallbackProperties,
    ) -> Result<Document> {
        let mut value = value;
        for hook in self.hooks(name)? {
            if let CallbackHook::Transform(transform) = hook {
                value = transform(value, properties)?;
            }
        }
        Ok(value)
    }

    /// Spawns the async hooks of `name` as one detached task.
    ///
    /// Failures are logged and never reach the caller. Returns `None` when no
    /// hooks are attached or no tokio runtime is available.
    pub fn run_async(
        &self,
        name: &str,
        value: Document,
        properties: CallbackProperties,
    ) -> Result<Option<JoinHandle<()>>> {
        let hooks: Vec<AsyncHook> = self
            .hooks(name)?
            .into_iter()
            .filter_map(|hook| match hook {
                CallbackHook::Async(hook) => Some(hook),
                _ => None,
            })
            .collect();

        if hooks.is_empty() {
            return Ok(None);
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available, skipping '{}' callbacks", name);
            return Ok(None);
        };

        let span = info_span!("callbacks.async", callback = %name);
        let name = name.to_string();
        let handle = runtime.spawn(
            async move {
                for hook in hooks {
                    if let Err(err) = hook(value.clone(), properties.clone()).await {
                        event!(Level::ERROR, callback = %name, error = %err, "async callback failed");
                    }
                }
            }
            .instrument(span),
        );

        Ok(Some(handle))
    }
}
