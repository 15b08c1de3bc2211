//! Subscriber entity.

use serde::{Deserialize, Serialize};
use validator::Validate;

use eventhub_core::validation::not_blank;
use eventhub_core::{
    DomainError, DomainResult, Entity, EventId, SortValue, Sortable, SubscriberId, Version,
    same_identity,
};
use eventhub_events::Event;

/// One registration of a person to an event.
///
/// # Invariants
/// - `first_name`, `last_name` and `email` are non-blank; `last_name` has at
///   least 3 characters; `email` is syntactically valid.
/// - `event` is required. Storage persists only its identifier; the nested
///   object is never written back to the event table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Subscriber {
    pub id: Option<SubscriberId>,
    pub version: Version,
    #[validate(custom(function = "not_blank"))]
    pub first_name: String,
    #[validate(
        custom(function = "not_blank"),
        length(min = 3, message = "must be at least 3 characters")
    )]
    pub last_name: String,
    #[validate(
        custom(function = "not_blank"),
        email(message = "must be a valid email address")
    )]
    pub email: String,
    #[validate(required(message = "is required"))]
    pub event: Option<Event>,
}

impl Subscriber {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        event: Event,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            event: Some(event),
            ..Default::default()
        }
    }

    /// Identifier of the referenced event, if both the reference and its id
    /// are present.
    pub fn event_id(&self) -> Option<EventId> {
        self.event.as_ref().and_then(|e| e.id)
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self.id, other.id)
    }
}

impl Entity for Subscriber {
    type Id = SubscriberId;

    const KIND: &'static str = "subscriber";

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

impl Sortable for Subscriber {
    fn sort_value(&self, path: &str) -> Option<SortValue> {
        let value = match path {
            "id" => SortValue::from(self.id.map(SubscriberId::get)),
            "firstName" => SortValue::from(self.first_name.as_str()),
            "lastName" => SortValue::from(self.last_name.as_str()),
            "email" => SortValue::from(self.email.as_str()),
            _ => return None,
        };
        Some(value)
    }

    fn is_sortable(path: &str) -> bool {
        matches!(path, "id" | "firstName" | "lastName" | "email")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> Subscriber {
        Subscriber::new("Ann", "Lee", "ann@x.com", Event::reference(EventId::new(1)))
    }

    fn validation_message(s: &Subscriber) -> String {
        match Entity::validate(s) {
            Err(DomainError::Validation(msg)) => msg,
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_subscriber_passes_validation() {
        assert!(Entity::validate(&ann()).is_ok());
    }

    #[test]
    fn short_last_name_is_rejected() {
        let mut s = ann();
        s.last_name = "Li".to_string();
        assert!(validation_message(&s).contains("last_name"));
    }

    #[test]
    fn blank_first_name_is_rejected() {
        let mut s = ann();
        s.first_name = "  ".to_string();
        assert!(validation_message(&s).contains("first_name: must not be blank"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut s = ann();
        s.email = "not-an-email".to_string();
        assert!(validation_message(&s).contains("email: must be a valid email address"));
    }

    #[test]
    fn missing_event_is_rejected() {
        let mut s = ann();
        s.event = None;
        assert!(validation_message(&s).contains("event: is required"));
    }

    #[test]
    fn event_id_reads_through_the_reference() {
        assert_eq!(ann().event_id(), Some(EventId::new(1)));

        let mut s = ann();
        s.event = Some(Event::new("stub without id"));
        assert_eq!(s.event_id(), None);
    }

    #[test]
    fn payload_with_event_stub_deserializes() {
        let s: Subscriber = serde_json::from_value(serde_json::json!({
            "firstName": "Ann",
            "lastName": "Lee",
            "email": "ann@x.com",
            "event": { "id": 1 }
        }))
        .unwrap();
        assert_eq!(s.id, None);
        assert_eq!(s.event_id(), Some(EventId::new(1)));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: last names shorter than three characters never validate.
            #[test]
            fn last_names_under_three_chars_are_invalid(last in "[A-Za-z]{0,2}") {
                let mut s = ann();
                s.last_name = last;
                prop_assert!(Entity::validate(&s).is_err());
            }

            /// Property: well-formed registrations always validate.
            #[test]
            fn well_formed_registrations_are_valid(
                first in "[A-Z][a-z]{0,15}",
                last in "[A-Z][a-z]{2,15}",
                user in "[a-z]{1,10}",
                domain in "[a-z]{2,10}",
            ) {
                let s = Subscriber::new(
                    first,
                    last,
                    format!("{user}@{domain}.com"),
                    Event::reference(EventId::new(1)),
                );
                prop_assert!(Entity::validate(&s).is_ok());
            }
        }
    }
}
