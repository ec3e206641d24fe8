use crate::core::{CrudAction, EntityType};
use std::fmt;

/// Point in an operation's lifecycle where hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackPhase {
    Validate,
    Before,
    After,
    Async,
}

impl CallbackPhase {
    /// Phases in execution order
    pub const ORDER: [CallbackPhase; 4] = [Self::Validate, Self::Before, Self::After, Self::Async];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Before => "before",
            Self::After => "after",
            Self::Async => "async",
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        match self {
            Self::Async => ExecutionMode::Async,
            _ => ExecutionMode::Sync,
        }
    }
}

impl fmt::Display for CallbackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether hooks run in-process before the mutation returns, or detached after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sync,
    Async,
}

/// What a hook is expected to hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    Document,
    Modifier,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackArgument {
    pub name: String,
    pub description: String,
}

impl CallbackArgument {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Introspection metadata for a named hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackDefinition {
    pub name: String,
    pub phase: CallbackPhase,
    pub arguments: Vec<CallbackArgument>,
    pub mode: ExecutionMode,
    pub returns: ReturnShape,
    pub description: String,
}

impl CallbackDefinition {
    pub fn new(name: impl Into<String>, phase: CallbackPhase) -> Self {
        Self {
            name: name.into(),
            phase,
            arguments: Vec::new(),
            mode: phase.mode(),
            returns: ReturnShape::None,
            description: String::new(),
        }
    }

    pub fn argument(mut self, name: &str, description: &str) -> Self {
        self.arguments.push(CallbackArgument::new(name, description));
        self
    }

    pub fn returns(mut self, returns: ReturnShape) -> Self {
        self.returns = returns;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn argument_names(&self) -> Vec<&str> {
        self.arguments.iter().map(|arg| arg.name.as_str()).collect()
    }
}

/// `<lowercased-type>.<action>.<phase>`
pub fn callback_name(entity: &EntityType, action: CrudAction, phase: CallbackPhase) -> String {
    format!("{}.{}.{}", entity.namespace(), action.as_str(), phase.as_str())
}

const DOCUMENT: (&str, &str) = ("document", "The document being processed");
const CURRENT_USER: (&str, &str) = ("currentUser", "The user performing the operation");
const VALIDATION_ERRORS: (&str, &str) = (
    "validationErrors",
    "Accumulated validation errors; push to reject the operation",
);
const COLLECTION: (&str, &str) = ("collection", "The collection the document belongs to");
const DATA: (&str, &str) = ("data", "The update data applied to the document");
const NEW_DOCUMENT: (&str, &str) = ("newDocument", "The document after the update");
const OLD_DOCUMENT: (&str, &str) = ("document", "The document before the update");

fn with_args(definition: CallbackDefinition, args: &[(&str, &str)]) -> CallbackDefinition {
    args.iter()
        .fold(definition, |def, (name, description)| def.argument(name, description))
}

/// The twelve lifecycle hooks of an entity type: every action × every phase.
pub fn collection_callback_definitions(entity: &EntityType) -> Vec<CallbackDefinition> {
    let mut definitions = Vec::with_capacity(12);

    for action in CrudAction::ALL {
        for phase in CallbackPhase::ORDER {
            let name = callback_name(entity, action, phase);
            let (args, returns): (Vec<(&str, &str)>, ReturnShape) = match (action, phase) {
                (CrudAction::Create, CallbackPhase::Validate) => {
                    (vec![DOCUMENT, CURRENT_USER, VALIDATION_ERRORS], ReturnShape::Document)
                }
                (CrudAction::Create, CallbackPhase::Before | CallbackPhase::After) => {
                    (vec![DOCUMENT, CURRENT_USER], ReturnShape::Document)
                }
                (CrudAction::Create, CallbackPhase::Async) => {
                    (vec![DOCUMENT, CURRENT_USER, COLLECTION], ReturnShape::None)
                }
                (CrudAction::Update, CallbackPhase::Validate) => (
                    vec![DATA, OLD_DOCUMENT, CURRENT_USER, VALIDATION_ERRORS],
                    ReturnShape::Modifier,
                ),
                (CrudAction::Update, CallbackPhase::Before) => {
                    (vec![DATA, OLD_DOCUMENT, CURRENT_USER], ReturnShape::Modifier)
                }
                (CrudAction::Update, CallbackPhase::After) => {
                    (vec![NEW_DOCUMENT, OLD_DOCUMENT, CURRENT_USER], ReturnShape::Document)
                }
                (CrudAction::Update, CallbackPhase::Async) => (
                    vec![NEW_DOCUMENT, OLD_DOCUMENT, CURRENT_USER, COLLECTION],
                    ReturnShape::None,
                ),
                (CrudAction::Delete, CallbackPhase::Validate) => {
                    (vec![DOCUMENT, CURRENT_USER, VALIDATION_ERRORS], ReturnShape::Document)
                }
                (CrudAction::Delete, CallbackPhase::Before | CallbackPhase::After) => {
                    (vec![DOCUMENT, CURRENT_USER], ReturnShape::Document)
                }
                (CrudAction::Delete, CallbackPhase::Async) => {
                    (vec![DOCUMENT, CURRENT_USER, COLLECTION], ReturnShape::None)
                }
            };

            let description = match phase {
                CallbackPhase::Validate => format!(
                    "Validate a document before {} of a {} document",
                    action,
                    entity.name()
                ),
                CallbackPhase::Before => format!(
                    "Modify the {} input before it is persisted for {}",
                    action,
                    entity.name()
                ),
                CallbackPhase::After => format!(
                    "Modify the {} result after it is persisted for {}",
                    action,
                    entity.name()
                ),
                CallbackPhase::Async => format!(
                    "Perform side effects after {} of a {} document, not awaited",
                    action,
                    entity.name()
                ),
            };

            definitions.push(
                with_args(CallbackDefinition::new(name, phase), &args)
                    .returns(returns)
                    .description(description),
            );
        }
    }

    definitions
}
