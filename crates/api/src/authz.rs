//! API-side authorization guard for exposed operations.
//!
//! Every routed operation has an entry in [`Operation`]. The access class is
//! checked before the handler touches any service.

use tracing::debug;

use eventhub_auth::{AccessLevel, AuthError, Principal, RequestIdentity, require};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    ListEvents,
    FindAllEvents,
    CountEvents,
    GetEvent,
    UpdateEvent,
    DeleteEvent,
    SubscribeTo,
    CurrentUser,
    ListSubscribers,
    GetSubscriber,
    UpdateSubscriber,
    DeleteSubscriber,
    CountSubscribers,
}

impl Operation {
    pub const fn name(self) -> &'static str {
        match self {
            Operation::ListEvents => "event.list",
            Operation::FindAllEvents => "event.findAll",
            Operation::CountEvents => "event.count",
            Operation::GetEvent => "event.get",
            Operation::UpdateEvent => "event.update",
            Operation::DeleteEvent => "event.delete",
            Operation::SubscribeTo => "subscriber.subscribeTo",
            Operation::CurrentUser => "userInfo.getCurrentUser",
            Operation::ListSubscribers => "subscriber.list",
            Operation::GetSubscriber => "subscriber.get",
            Operation::UpdateSubscriber => "subscriber.update",
            Operation::DeleteSubscriber => "subscriber.delete",
            Operation::CountSubscribers => "subscriber.count",
        }
    }

    /// Access class of the operation.
    ///
    /// Subscriber CRUD is never opened; registrations go through
    /// `SubscribeTo` only.
    pub const fn access(self) -> AccessLevel {
        match self {
            Operation::SubscribeTo => AccessLevel::Open,
            Operation::ListEvents
            | Operation::FindAllEvents
            | Operation::CountEvents
            | Operation::GetEvent
            | Operation::UpdateEvent
            | Operation::DeleteEvent
            | Operation::CurrentUser => AccessLevel::Authenticated,
            Operation::ListSubscribers
            | Operation::GetSubscriber
            | Operation::UpdateSubscriber
            | Operation::DeleteSubscriber
            | Operation::CountSubscribers => AccessLevel::Denied,
        }
    }
}

/// Check the caller against `operation`'s access class.
pub fn authorize(
    operation: Operation,
    identity: &RequestIdentity,
) -> Result<Option<&Principal>, AuthError> {
    require(operation.access(), operation.name(), identity).inspect_err(|e| {
        debug!(operation = operation.name(), error = %e, "access denied");
    })
}
