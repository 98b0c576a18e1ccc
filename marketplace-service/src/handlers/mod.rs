//! HTTP handlers for the marketplace backend.

pub mod account;
pub mod listings;
pub mod metrics;
pub mod profile;
