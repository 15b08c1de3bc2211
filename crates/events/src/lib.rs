//! Events domain module.
//!
//! Contains the `Event` entity: a scheduled (or unscheduled) happening that
//! subscribers register for.

pub mod event;

pub use event::Event;
