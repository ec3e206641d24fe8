pub mod descriptor;
pub mod factory;
pub mod options;

pub use descriptor::{MutationInput, MutationKind, OperationDescriptor};
pub use factory::{GeneratedMutations, MutationFactory};
pub use options::{MutationFlags, MutationOptions};
