use super::action::ActionName;
use crate::core::{Document, ID_FIELD, MutationError, Result, User};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Group consulted for anonymous callers
pub const GUESTS_GROUP: &str = "guests";
/// Group every logged-in user belongs to
pub const MEMBERS_GROUP: &str = "members";
/// Group whose members bypass every action check
pub const ADMINS_GROUP: &str = "admins";

/// External authorization decisions consumed by permission checks.
pub trait AuthorizationOracle: Send + Sync {
    /// Whether `user` (or an anonymous caller) may perform `action`.
    fn can_do(&self, user: Option<&User>, action: &ActionName) -> bool;

    /// Whether `user` owns `document`.
    fn owns(&self, user: &User, document: &Document) -> bool;
}

/// Group-based authorization
///
/// Every group holds a set of granted actions. Anonymous callers are checked
/// against `guests`; logged-in users against `members` plus their own groups.
/// Administrators can do everything.
pub struct GroupPermissions {
    groups: RwLock<HashMap<String, HashSet<ActionName>>>,
}

impl GroupPermissions {
    /// Creates the manager with the built-in groups and no grants
    pub fn new() -> Self {
        let groups = [GUESTS_GROUP, MEMBERS_GROUP, ADMINS_GROUP]
            .into_iter()
            .map(|name| (name.to_string(), HashSet::new()))
            .collect();

        Self {
            groups: RwLock::new(groups),
        }
    }

    /// Creates a custom group
    pub fn create_group(&self, group: &str) -> Result<()> {
        Self::validate_group_name(group)?;
        let mut groups = self.groups.write()?;

        if groups.contains_key(group) {
            return Err(MutationError::InvalidInput(format!(
                "Group '{}' already exists",
                group
            )));
        }

        groups.insert(group.to_string(), HashSet::new());
        Ok(())
    }

    /// Grants an action to a group, creating the group on first use
    pub fn grant(&self, group: &str, action: ActionName) -> Result<()> {
        Self::validate_group_name(group)?;
        let mut groups = self.groups.write()?;
        groups.entry(group.to_string()).or_default().insert(action);
        Ok(())
    }

    /// Grants several actions to a group
    pub fn grant_all(&self, group: &str, actions: impl IntoIterator<Item = ActionName>) -> Result<()> {
        for action in actions {
            self.grant(group, action)?;
        }
        Ok(())
    }

    /// Revokes an action, returning whether it was granted
    pub fn revoke(&self, group: &str, action: &ActionName) -> Result<bool> {
        let mut groups = self.groups.write()?;

        let actions = groups.get_mut(group).ok_or_else(|| {
            MutationError::InvalidInput(format!("Group '{}' not found", group))
        })?;

        Ok(actions.remove(action))
    }

    /// Returns the actions granted to a group, sorted by name
    pub fn group_actions(&self, group: &str) -> Result<Vec<String>> {
        let groups = self.groups.read()?;

        let mut actions: Vec<String> = groups
            .get(group)
            .ok_or_else(|| MutationError::InvalidInput(format!("Group '{}' not found", group)))?
            .iter()
            .map(ToString::to_string)
            .collect();
        actions.sort();

        Ok(actions)
    }

    /// Returns all group names, sorted
    pub fn list_groups(&self) -> Result<Vec<String>> {
        let groups = self.groups.read()?;

        let mut names: Vec<String> = groups.keys().cloned().collect();
        names.sort();

        Ok(names)
    }

    /// Groups whose grants apply to the caller
    fn effective_groups(user: Option<&User>) -> Vec<&str> {
        match user {
            None => vec![GUESTS_GROUP],
            Some(user) => {
                let mut groups = vec![MEMBERS_GROUP];
                groups.extend(user.groups().iter().map(String::as_str));
                if user.is_admin() {
                    groups.push(ADMINS_GROUP);
                }
                groups
            }
        }
    }

    fn validate_group_name(group: &str) -> Result<()> {
        if group.is_empty() {
            return Err(MutationError::InvalidInput("Group name cannot be empty".into()));
        }

        if group.len() > 50 {
            return Err(MutationError::InvalidInput(
                "Group name too long (max 50 characters)".into(),
            ));
        }

        Ok(())
    }
}

impl Default for GroupPermissions {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationOracle for GroupPermissions {
    fn can_do(&self, user: Option<&User>, action: &ActionName) -> bool {
        if user.is_some_and(User::is_admin) {
            return true;
        }

        // A poisoned table denies rather than guessing.
        let Ok(groups) = self.groups.read() else {
            return false;
        };

        Self::effective_groups(user).into_iter().any(|group| {
            groups
                .get(group)
                .is_some_and(|actions| actions.contains(action))
        })
    }

    fn owns(&self, user: &User, document: &Document) -> bool {
        if document.owner_id() == Some(user.id()) {
            return true;
        }
        // user records are owned by themselves
        document.owner_id().is_none() && document.get_str(ID_FIELD) == Some(user.id())
    }
}
