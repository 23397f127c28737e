//! Cache scopes and keys.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Isolation boundary for cached data, typically a tenant identifier.
///
/// Tenant ids are kept verbatim; only the empty id means "no tenant".
/// Internally the scope is held as a label: [`Scope::GLOBAL`] for the
/// global scope, and the tenant id otherwise, with one extra `_` in front
/// of ids that already start with `_`. No tenant id can therefore produce
/// the global label, nor the label of another tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope(String);

impl Scope {
    /// Label of the "no tenant" scope.
    pub const GLOBAL: &'static str = "_global";

    const RESERVED: char = '_';

    /// Creates a scope from a tenant identifier.
    pub fn new(tenant: impl Into<String>) -> Self {
        let tenant = tenant.into();
        if tenant.is_empty() {
            Self::global()
        } else if tenant.starts_with(Self::RESERVED) {
            Self(format!("{}{tenant}", Self::RESERVED))
        } else {
            Self(tenant)
        }
    }

    /// Returns the "no tenant" scope.
    pub fn global() -> Self {
        Self(Self::GLOBAL.to_string())
    }

    /// Creates a scope from an optional tenant identifier.
    pub fn from_tenant(tenant: Option<&str>) -> Self {
        tenant.map(Self::new).unwrap_or_else(Self::global)
    }

    /// Rebuilds a scope from its label, as produced by [`Scope::as_str`].
    ///
    /// Returns `None` for labels no scope can have, such as `_x`.
    pub fn from_label(label: impl Into<String>) -> Option<Self> {
        let label = label.into();
        if label.is_empty() || label == Self::GLOBAL {
            Some(Self::global())
        } else if label.starts_with(Self::RESERVED)
            && !label[Self::RESERVED.len_utf8()..].starts_with(Self::RESERVED)
        {
            None
        } else {
            Some(Self(label))
        }
    }

    /// Returns true for the "no tenant" scope.
    pub fn is_global(&self) -> bool {
        self.0 == Self::GLOBAL
    }

    /// Tenant id this scope was created from, `None` for the global scope.
    pub fn tenant(&self) -> Option<&str> {
        if self.is_global() {
            None
        } else if self.0.starts_with(Self::RESERVED) {
            Some(&self.0[Self::RESERVED.len_utf8()..])
        } else {
            Some(&self.0)
        }
    }

    /// Returns the label. Distinct scopes always have distinct labels.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Scope {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Scope {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Scope> for String {
    fn from(value: Scope) -> Self {
        value.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Serialized as the label, so a round-trip never re-escapes.
impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Scope::from_label(label.as_str())
            .ok_or_else(|| de::Error::custom(format!("reserved scope label '{label}'")))
    }
}

/// Composite cache key: `(scope, identifier)`.
///
/// The identifier names the logical page or data group, for example a
/// route path (`/customers`) or `all-reference-data`. It is kept verbatim.
///
/// # Examples
///
/// ```
/// use pagecache_core::{CacheKey, Scope};
///
/// let key = CacheKey::new("tenant-a", "/customers");
/// assert_eq!(key.scope(), &Scope::new("tenant-a"));
/// assert_eq!(key.identifier(), "/customers");
/// assert_eq!(key.to_string(), "tenant-a//customers");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    scope: Scope,
    identifier: String,
}

impl CacheKey {
    /// Creates a new key.
    pub fn new(scope: impl Into<Scope>, identifier: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            identifier: identifier.into(),
        }
    }

    /// Creates a key in the global scope.
    pub fn global(identifier: impl Into<String>) -> Self {
        Self::new(Scope::global(), identifier)
    }

    /// Returns the scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns true if this key belongs to the given scope.
    pub fn in_scope(&self, scope: &Scope) -> bool {
        &self.scope == scope
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.identifier)
    }
}
