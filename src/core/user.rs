use serde::{Deserialize, Serialize};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    id: String,
    username: String,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default, rename = "isAdmin")]
    is_admin: bool,
}

impl User {
    /// Creates a new member without extra groups
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            groups: Vec::new(),
            is_admin: false,
        }
    }

    /// Creates an administrator
    pub fn admin(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(id, username)
        }
    }

    /// Adds the user to a group
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        let group = group.into();
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Groups explicitly assigned to the user
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_group_is_deduplicated() {
        let user = User::new("u1", "alice").in_group("editors").in_group("editors");
        assert_eq!(user.groups(), &["editors".to_string()]);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_deserialize_from_context_json() {
        let user: User = serde_json::from_str(
            r#"{"_id": "u9", "username": "root", "isAdmin": true}"#,
        )
        .unwrap();
        assert_eq!(user.id(), "u9");
        assert!(user.is_admin());
        assert!(user.groups().is_empty());
    }
}
