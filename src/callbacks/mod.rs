pub mod definition;
pub mod registry;

pub use definition::{
    CallbackArgument, CallbackDefinition, CallbackPhase, ExecutionMode, ReturnShape,
    callback_name, collection_callback_definitions,
};
pub use registry::{
    AsyncHook, CallbackHook, CallbackProperties, CallbackRegistry, TransformHook, ValidateHook,
};
