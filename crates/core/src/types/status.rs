//! Status enums for onboarding entities.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a domain entity (restaurant or courier profile).
///
/// Every entity is created as `Pending` and moves forward only after a
/// human review on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    /// Freshly registered, awaiting review.
    #[default]
    Pending,
    /// Approved and visible in the marketplace.
    Active,
    /// Temporarily removed from the marketplace.
    Suspended,
    /// Rejected during review.
    Rejected,
}

impl EntityStatus {
    /// Returns the wire representation used by the backend RPC surface.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Rejected => "rejected",
        }
    }
}

/// Kind of domain entity being registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A restaurant and its owner.
    Restaurant,
    /// A delivery courier.
    DeliveryAgent,
}

impl EntityKind {
    /// The role tag stored on the user profile for this entity kind.
    #[must_use]
    pub const fn role(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::DeliveryAgent => "delivery_agent",
        }
    }
}
