//! Read-only access to the current tenant context.

use crate::key::{CacheKey, Scope};

/// Exposes the scope of the current session.
pub trait SessionAccessor: Send + Sync {
    /// Scope of the current tenant, or [`Scope::global`] when none.
    fn current_scope(&self) -> Scope;

    /// Builds a key in the current scope.
    fn key_for(&self, identifier: &str) -> CacheKey {
        CacheKey::new(self.current_scope(), identifier)
    }
}

/// Session accessor pinned to one scope.
#[derive(Debug, Clone)]
pub struct StaticSession {
    scope: Scope,
}

impl StaticSession {
    /// Creates an accessor that always reports `scope`.
    pub fn new(scope: impl Into<Scope>) -> Self {
        Self {
            scope: scope.into(),
        }
    }
}

impl Default for StaticSession {
    fn default() -> Self {
        Self::new(Scope::global())
    }
}

impl SessionAccessor for StaticSession {
    fn current_scope(&self) -> Scope {
        self.scope.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_session_key() {
        let session = StaticSession::new("acme");
        let key = session.key_for("/contracts");

        assert_eq!(key.scope(), &Scope::new("acme"));
        assert_eq!(key.identifier(), "/contracts");
    }

    #[test]
    fn test_default_is_global() {
        assert!(StaticSession::default().current_scope().is_global());
    }
}
