//! `eventhub-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! entity identity, identifiers, paging/sorting requests and the domain error.

pub mod entity;
pub mod error;
pub mod id;
pub mod query;
pub mod validation;

pub use entity::{Entity, Version, same_identity};
pub use error::{DomainError, DomainResult};
pub use id::{EventId, SubscriberId};
pub use query::{PageRequest, SortDirection, SortOrder, SortValue, Sortable};
