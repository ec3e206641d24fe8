use std::fmt;

/// The three persisted lifecycle actions of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudAction {
    Create,
    Update,
    Delete,
}

impl CrudAction {
    pub const ALL: [CrudAction; 3] = [Self::Create, Self::Update, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for CrudAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
