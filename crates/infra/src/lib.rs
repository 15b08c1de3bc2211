//! Infrastructure layer: storage, domain services, configuration.

pub mod config;
pub mod repository;
pub mod services;
