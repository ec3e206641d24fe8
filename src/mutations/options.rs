use crate::auth::CheckFn;
use crate::core::{Document, Result, User};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which descriptors a factory run produces.
///
/// Missing keys default to `true` when loaded from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationFlags {
    pub create: bool,
    pub update: bool,
    pub upsert: bool,
    pub delete: bool,
}

impl Default for MutationFlags {
    fn default() -> Self {
        Self {
            create: true,
            update: true,
            upsert: true,
            delete: true,
        }
    }
}

impl MutationFlags {
    /// Parses flags from a JSON object such as `{"upsert": false}`
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Mutation factory configuration
///
/// # Examples
///
/// ```
/// use docmutate::MutationOptions;
///
/// let options = MutationOptions::new()
///     .upsert(false)
///     .edit_check(|user, _document| user.is_some_and(|u| u.is_admin()));
/// assert!(!options.flags.upsert);
/// ```
#[derive(Clone)]
pub struct MutationOptions {
    pub flags: MutationFlags,

    /// Replaces the default `create` permission rule
    pub new_check: Option<CheckFn>,

    /// Replaces the default `update` permission rule
    pub edit_check: Option<CheckFn>,

    /// Replaces the default `delete` permission rule
    pub remove_check: Option<CheckFn>,

    /// Forwarded to the mutators; runs `validate` callbacks when true
    pub validate: bool,
}

impl MutationOptions {
    /// All four descriptors, default permission rules, validation on
    pub fn new() -> Self {
        Self {
            flags: MutationFlags::default(),
            new_check: None,
            edit_check: None,
            remove_check: None,
            validate: true,
        }
    }

    pub fn flags(mut self, flags: MutationFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn create(mut self, enabled: bool) -> Self {
        self.flags.create = enabled;
        self
    }

    pub fn update(mut self, enabled: bool) -> Self {
        self.flags.update = enabled;
        self
    }

    pub fn upsert(mut self, enabled: bool) -> Self {
        self.flags.upsert = enabled;
        self
    }

    pub fn delete(mut self, enabled: bool) -> Self {
        self.flags.delete = enabled;
        self
    }

    pub fn new_check<F>(mut self, check: F) -> Self
    where
        F: Fn(Option<&User>, Option<&Document>) -> bool + Send + Sync + 'static,
    {
        self.new_check = Some(Arc::new(check));
        self
    }

    pub fn edit_check<F>(mut self, check: F) -> Self
    where
        F: Fn(Option<&User>, Option<&Document>) -> bool + Send + Sync + 'static,
    {
        self.edit_check = Some(Arc::new(check));
        self
    }

    pub fn remove_check<F>(mut self, check: F) -> Self
    where
        F: Fn(Option<&User>, Option<&Document>) -> bool + Send + Sync + 'static,
    {
        self.remove_check = Some(Arc::new(check));
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MutationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationOptions")
            .field("flags", &self.flags)
            .field("new_check", &self.new_check.is_some())
            .field("edit_check", &self.edit_check.is_some())
            .field("remove_check", &self.remove_check.is_some())
            .field("validate", &self.validate)
            .finish()
    }
}
