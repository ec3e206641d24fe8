use super::action::{Action, ActionScope};
use super::oracle::AuthorizationOracle;
use crate::core::{CrudAction, Document, EntityType, User};
use std::sync::Arc;

/// User-supplied permission override.
///
/// When configured, its result is the only thing that decides access.
pub type CheckFn = Arc<dyn Fn(Option<&User>, Option<&Document>) -> bool + Send + Sync>;

/// Decides whether a caller may perform a CRUD action on a document.
#[derive(Clone)]
pub struct PermissionResolver {
    oracle: Arc<dyn AuthorizationOracle>,
}

impl PermissionResolver {
    pub fn new(oracle: Arc<dyn AuthorizationOracle>) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &Arc<dyn AuthorizationOracle> {
        &self.oracle
    }

    /// Resolves a permission check.
    ///
    /// `create` is checked against the incoming document; `update` and
    /// `delete` need both a caller and the current document, and are gated
    /// on ownership (`edit.own` vs `edit.all`, `remove.own` vs `remove.all`).
    pub fn resolve(
        &self,
        operation: CrudAction,
        entity: &EntityType,
        user: Option<&User>,
        document: Option<&Document>,
        override_fn: Option<&CheckFn>,
    ) -> bool {
        if let Some(check) = override_fn {
            return check(user, document);
        }

        match operation {
            CrudAction::Create => self.oracle.can_do(user, &Action::NEW.on(entity)),
            CrudAction::Update => self.resolve_owned(Action::edit, entity, user, document),
            CrudAction::Delete => self.resolve_owned(Action::remove, entity, user, document),
        }
    }

    fn resolve_owned(
        &self,
        action: fn(ActionScope) -> Action,
        entity: &EntityType,
        user: Option<&User>,
        document: Option<&Document>,
    ) -> bool {
        let (Some(user), Some(document)) = (user, document) else {
            return false;
        };

        let scope = if self.oracle.owns(user, document) {
            ActionScope::Own
        } else {
            ActionScope::All
        };

        self.oracle.can_do(Some(user), &action(scope).on(entity))
    }
}

/// Free-function form of [`PermissionResolver::resolve`].
pub fn resolve_permission(
    oracle: Arc<dyn AuthorizationOracle>,
    operation: CrudAction,
    entity: &EntityType,
    user: Option<&User>,
    document: Option<&Document>,
    override_fn: Option<&CheckFn>,
) -> bool {
    PermissionResolver::new(oracle).resolve(operation, entity, user, document, override_fn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oracle::{GroupPermissions, MEMBERS_GROUP};
    use serde_json::json;

    fn posts() -> EntityType {
        EntityType::new("Posts")
    }

    fn post_owned_by(owner: &str) -> Document {
        Document::from_value(json!({"_id": "p1", "userId": owner, "title": "Hello"})).unwrap()
    }

    fn resolver_with(grants: &[(&str, Action)]) -> PermissionResolver {
        let perms = GroupPermissions::new();
        for (group, action) in grants {
            perms.grant(group, action.on(&posts())).unwrap();
        }
        PermissionResolver::new(Arc::new(perms))
    }

    #[test]
    fn test_create_uses_new_action() {
        let resolver = resolver_with(&[(MEMBERS_GROUP, Action::NEW)]);
        let alice = User::new("u1", "alice");
        let data = Document::new();

        assert!(resolver.resolve(CrudAction::Create, &posts(), Some(&alice), Some(&data), None));
        assert!(!resolver.resolve(CrudAction::Create, &posts(), None, Some(&data), None));
    }

    #[test]
    fn test_update_requires_user_and_document() {
        let resolver = resolver_with(&[(MEMBERS_GROUP, Action::edit(ActionScope::All))]);
        let alice = User::new("u1", "alice");
        let post = post_owned_by("u1");

        assert!(!resolver.resolve(CrudAction::Update, &posts(), None, Some(&post), None));
        assert!(!resolver.resolve(CrudAction::Update, &posts(), Some(&alice), None, None));
        assert!(!resolver.resolve(CrudAction::Delete, &posts(), None, None, None));
    }

    #[test]
    fn test_update_branches_on_ownership() {
        let resolver = resolver_with(&[(MEMBERS_GROUP, Action::edit(ActionScope::Own))]);
        let alice = User::new("u1", "alice");
        let bob = User::new("u2", "bob");
        let post = post_owned_by("u1");

        assert!(resolver.resolve(CrudAction::Update, &posts(), Some(&alice), Some(&post), None));
        assert!(!resolver.resolve(CrudAction::Update, &posts(), Some(&bob), Some(&post), None));
    }

    #[test]
    fn test_edit_all_does_not_cover_own_documents() {
        let resolver = resolver_with(&[(MEMBERS_GROUP, Action::edit(ActionScope::All))]);
        let alice = User::new("u1", "alice");
        let bob = User::new("u2", "bob");
        let post = post_owned_by("u1");

        assert!(resolver.resolve(CrudAction::Update, &posts(), Some(&bob), Some(&post), None));
        assert!(!resolver.resolve(CrudAction::Update, &posts(), Some(&alice), Some(&post), None));
    }

    #[test]
    fn test_delete_uses_remove_actions() {
        let resolver = resolver_with(&[
            (MEMBERS_GROUP, Action::remove(ActionScope::Own)),
            (MEMBERS_GROUP, Action::edit(ActionScope::All)),
        ]);
        let alice = User::new("u1", "alice");
        let bob = User::new("u2", "bob");
        let post = post_owned_by("u1");

        assert!(resolver.resolve(CrudAction::Delete, &posts(), Some(&alice), Some(&post), None));
        assert!(!resolver.resolve(CrudAction::Delete, &posts(), Some(&bob), Some(&post), None));
    }

    #[test]
    fn test_remove_all_grants_non_owners_only() {
        let resolver = resolver_with(&[(MEMBERS_GROUP, Action::remove(ActionScope::All))]);
        let alice = User::new("u1", "alice");
        let bob = User::new("u2", "bob");
        let post = post_owned_by("u1");

        assert!(resolver.resolve(CrudAction::Delete, &posts(), Some(&bob), Some(&post), None));
        assert!(!resolver.resolve(CrudAction::Delete, &posts(), Some(&alice), Some(&post), None));
    }

    #[test]
    fn test_override_is_authoritative() {
        let resolver = resolver_with(&[(MEMBERS_GROUP, Action::edit(ActionScope::Own))]);
        let alice = User::new("u1", "alice");
        let post = post_owned_by("u1");

        let deny_all: CheckFn = Arc::new(|_, _| false);
        let allow_all: CheckFn = Arc::new(|_, _| true);

        assert!(!resolver.resolve(CrudAction::Update, &posts(), Some(&alice), Some(&post), Some(&deny_all)));
        assert!(resolver.resolve(CrudAction::Delete, &posts(), None, None, Some(&allow_all)));
    }
}
