pub mod document;
pub mod entity;
pub mod error;
pub mod operation;
pub mod user;

pub use document::{CREATED_AT_FIELD, Document, ID_FIELD, OWNER_FIELD};
pub use entity::EntityType;
pub use error::{MutationError, Result, ValidationError};
pub use operation::CrudAction;
pub use user::User;
