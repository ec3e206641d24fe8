pub mod action;
pub mod oracle;
pub mod resolver;

pub use action::{Action, ActionDomain, ActionName, ActionScope};
pub use oracle::{ADMINS_GROUP, AuthorizationOracle, GUESTS_GROUP, GroupPermissions, MEMBERS_GROUP};
pub use resolver::{CheckFn, PermissionResolver, resolve_permission};
