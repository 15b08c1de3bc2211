//! Subscribers domain module.
//!
//! A `Subscriber` is one person's registration to one `Event`.

pub mod subscriber;

pub use subscriber::Subscriber;
