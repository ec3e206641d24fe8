use crate::core::EntityType;
use std::fmt;

/// What an action does to documents of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionDomain {
    /// Create new documents
    New,
    /// Edit existing documents
    Edit,
    /// Remove existing documents
    Remove,
}

impl ActionDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Edit => "edit",
            Self::Remove => "remove",
        }
    }
}

/// Which documents an edit or remove action covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionScope {
    /// Documents owned by the caller
    Own,
    /// Any document
    All,
}

impl ActionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Own => "own",
            Self::All => "all",
        }
    }
}

/// A typed permission action, e.g. `edit.own`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    domain: ActionDomain,
    scope: Option<ActionScope>,
}

impl Action {
    pub const NEW: Action = Action {
        domain: ActionDomain::New,
        scope: None,
    };

    pub fn edit(scope: ActionScope) -> Self {
        Self {
            domain: ActionDomain::Edit,
            scope: Some(scope),
        }
    }

    pub fn remove(scope: ActionScope) -> Self {
        Self {
            domain: ActionDomain::Remove,
            scope: Some(scope),
        }
    }

    pub fn domain(&self) -> ActionDomain {
        self.domain
    }

    pub fn scope(&self) -> Option<ActionScope> {
        self.scope
    }

    /// Binds the action to an entity type.
    pub fn on(self, entity: &EntityType) -> ActionName {
        ActionName {
            namespace: entity.namespace().to_string(),
            action: self,
        }
    }
}

/// An action qualified by an entity namespace: `posts.edit.own`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionName {
    namespace: String,
    action: Action,
}

impl ActionName {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Parses the dotted form back into a typed action.
    ///
    /// Returns `None` for strings that are not a known CRUD action.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split('.');
        let namespace = parts.next().filter(|ns| !ns.is_empty())?;
        let domain = parts.next()?;
        let scope = parts.next();
        if parts.next().is_some() {
            return None;
        }

        let scope = match scope {
            None => None,
            Some("own") => Some(ActionScope::Own),
            Some("all") => Some(ActionScope::All),
            Some(_) => return None,
        };

        let action = match (domain, scope) {
            ("new", None) => Action::NEW,
            ("edit", Some(scope)) => Action::edit(scope),
            ("remove", Some(scope)) => Action::remove(scope),
            _ => return None,
        };

        Some(Self {
            namespace: namespace.to_lowercase(),
            action,
        })
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.action.domain.as_str())?;
        if let Some(scope) = self.action.scope {
            write!(f, ".{}", scope.as_str())?;
        }
        Ok(())
    }
}
