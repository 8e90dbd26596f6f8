//! Core types for Reparto onboarding.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod balance;
pub mod email;
pub mod id;
pub mod phone;
pub mod status;

pub use balance::Balance;
pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{CanonicalPhone, PhoneError};
pub use status::*;
