//! Business logic services.

pub mod provisioning;
