//! Event entity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use eventhub_core::validation::not_blank;
use eventhub_core::{DomainError, DomainResult, Entity, EventId, SortValue, Sortable, Version, same_identity};

/// An event attendees can subscribe to.
///
/// # Invariants
/// - `name` is never blank once stored.
/// - `nb_attendees` is derived by storage from the subscriber table on every
///   read; it is never accepted from a client payload.
///
/// Every field has a default so that a bare `{"id": 1}` reference (as sent
/// inside a subscription payload) deserializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: Option<EventId>,
    pub version: Version,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    pub description: String,
    /// `None` means unscheduled.
    pub event_date: Option<NaiveDateTime>,
    pub location: String,
    /// Advertised capacity; not enforced.
    pub max_attendees: Option<i32>,
    #[serde(skip_deserializing)]
    pub nb_attendees: u64,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A reference-only event carrying nothing but its identifier.
    pub fn reference(id: EventId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self.id, other.id)
    }
}

impl Entity for Event {
    type Id = EventId;

    const KIND: &'static str = "event";

    fn id(&self) -> Option<Self::Id> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_identity(&mut self, id: Self::Id, version: Version) {
        self.id = Some(id);
        self.version = version;
    }

    fn validate(&self) -> DomainResult<()> {
        <Self as Validate>::validate(self).map_err(DomainError::from)
    }
}

impl Sortable for Event {
    fn sort_value(&self, path: &str) -> Option<SortValue> {
        let value = match path {
            "id" => SortValue::from(self.id.map(EventId::get)),
            "name" => SortValue::from(self.name.as_str()),
            "description" => SortValue::from(self.description.as_str()),
            "eventDate" => SortValue::from(self.event_date),
            "location" => SortValue::from(self.location.as_str()),
            "maxAttendees" => SortValue::from(self.max_attendees.map(i64::from)),
            _ => return None,
        };
        Some(value)
    }

    fn is_sortable(path: &str) -> bool {
        matches!(
            path,
            "id" | "name" | "description" | "eventDate" | "location" | "maxAttendees"
        )
    }
}
