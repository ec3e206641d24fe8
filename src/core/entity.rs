use super::error::{MutationError, Result};
use std::fmt;

/// A named, schema-described document kind (e.g. `Posts`).
///
/// The lower-cased name namespaces permission actions (`posts.new`) and
/// callback names (`posts.create.before`), so a usable name is non-empty
/// and has no `.` in it. See [`EntityType::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityType {
    name: String,
    namespace: String,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let namespace = name.to_lowercase();
        Self { name, namespace }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Rejects names that cannot appear as one segment of a dotted action
    /// or callback name.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(MutationError::InvalidInput("Entity type name cannot be empty".into()));
        }

        if self.name.contains('.') {
            return Err(MutationError::InvalidInput(format!(
                "Entity type name '{}' cannot contain '.'",
                self.name
            )));
        }

        Ok(())
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_is_lowercased() {
        let posts = EntityType::new("Posts");
        assert_eq!(posts.name(), "Posts");
        assert_eq!(posts.namespace(), "posts");
        assert_eq!(posts.to_string(), "Posts");
        assert!(posts.validate().is_ok());
    }

    #[test]
    fn test_dotted_and_empty_names_are_rejected() {
        assert!(matches!(
            EntityType::new("Blog.Posts").validate(),
            Err(MutationError::InvalidInput(_))
        ));
        assert!(EntityType::new("").validate().is_err());
    }
}
