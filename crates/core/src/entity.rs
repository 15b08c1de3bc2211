//! Entity trait: identity + continuity across state changes.

use crate::error::DomainResult;

/// Optimistic-concurrency counter stamped by storage.
///
/// Storage assigns `0` on create and increments by exactly one on every
/// successful update.
pub type Version = u64;

/// Persisted entity with a storage-assigned identity.
///
/// An entity has no identifier until it is first saved; storage assigns both
/// the identifier and the initial version.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Strongly-typed entity identifier.
    type Id: Copy
        + Eq
        + core::hash::Hash
        + core::fmt::Debug
        + core::fmt::Display
        + Send
        + Sync
        + 'static;

    /// Entity kind used in error messages and logs (e.g. "event").
    const KIND: &'static str;

    /// Returns the identifier, or `None` if the entity was never persisted.
    fn id(&self) -> Option<Self::Id>;

    /// Returns the version the entity was read at.
    fn version(&self) -> Version;

    /// Stamp server-assigned identity fields.
    fn set_identity(&mut self, id: Self::Id, version: Version);

    /// Check field constraints before the entity reaches storage.
    fn validate(&self) -> DomainResult<()>;
}

/// Identity equality: equal only when both identifiers are assigned and match.
///
/// Two unsaved entities are never equal.
pub fn same_identity<I: PartialEq>(a: Option<I>, b: Option<I>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigned_ids_compare_by_value() {
        assert!(same_identity(Some(1), Some(1)));
        assert!(!same_identity(Some(1), Some(2)));
    }

    #[test]
    fn unsaved_entities_are_never_equal() {
        assert!(!same_identity::<i64>(None, None));
        assert!(!same_identity(Some(1), None));
        assert!(!same_identity(None, Some(1)));
    }
}
