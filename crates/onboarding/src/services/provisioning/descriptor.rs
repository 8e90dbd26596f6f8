//! Entity descriptors: capability tables and payload-to-parameter mappings.
//!
//! The restaurant and courier flows are the same orchestration over
//! different RPC names and parameter spellings. Each payload implements
//! [`EntityRegistration`], which hands the orchestrator an ordered
//! capability table per stage plus the exact parameter object to send.
//!
//! Function names, fallback order and parameter names are part of the
//! backend compatibility contract and must not be reworded.

use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};

use reparto_core::{CanonicalPhone, EntityKind, EntityStatus, UserId};

// =============================================================================
// Capability Tables
// =============================================================================

/// Profile-ensure functions, newest first. Both take identical parameters.
pub const ENSURE_PROFILE_FUNCTIONS: &[&str] =
    &["ensure_user_profile_v2", "ensure_user_profile_public"];

/// Atomic restaurant registration (entity + financial account together).
pub const REGISTER_RESTAURANT_FUNCTIONS: &[&str] = &["register_restaurant_v2"];

/// Decomposed restaurant entity write for backends without the atomic
/// function.
pub const CREATE_RESTAURANT_FUNCTIONS: &[&str] = &["create_restaurant_public"];

/// Best-effort financial account creation.
pub const CREATE_ACCOUNT_FUNCTIONS: &[&str] = &["create_account_public"];

/// Atomic courier registration, newest first.
pub const REGISTER_COURIER_FUNCTIONS: &[&str] =
    &["register_delivery_agent_v2", "register_delivery_agent"];

/// Email availability precheck.
pub const CHECK_EMAIL_FUNCTIONS: &[&str] = &["check_email_availability"];

/// Phone availability precheck.
pub const CHECK_PHONE_FUNCTIONS: &[&str] = &["check_phone_availability"];

/// Restaurant name availability precheck; two historical spellings.
pub const CHECK_RESTAURANT_NAME_FUNCTIONS: &[&str] = &[
    "check_restaurant_name_availability",
    "check_restaurant_name_available",
];

// =============================================================================
// Call Plans
// =============================================================================

/// An RPC invocation plan: an ordered capability table plus the parameter
/// object every candidate accepts.
#[derive(Debug, Clone)]
pub struct RpcCall {
    /// Candidate function names, probed in order; the first to resolve wins.
    pub candidates: &'static [&'static str],
    /// JSON parameter object shared by all candidates.
    pub params: Value,
}

/// A direct table write used when no RPC path is available.
#[derive(Debug, Clone)]
pub struct TableWrite {
    /// Target table.
    pub table: &'static str,
    /// Conflict column for upsert merging.
    pub on_conflict: &'static str,
    /// Row to upsert.
    pub row: Value,
}

/// How the domain entity is written when the atomic function is absent.
#[derive(Debug, Clone)]
pub enum EntityWrite {
    /// A decomposed entity-creation RPC.
    Rpc(RpcCall),
    /// Sequential table upserts (oldest backends only).
    Tables(Vec<TableWrite>),
}

/// The decomposed fallback sequence for a stale backend: the entity write,
/// then a best-effort financial account.
#[derive(Debug, Clone)]
pub struct FallbackPlan {
    /// The domain entity write; its failure degrades the outcome.
    pub entity: EntityWrite,
    /// The financial account call; its failure is logged and ignored.
    pub account: Option<RpcCall>,
}

// =============================================================================
// EntityRegistration
// =============================================================================

/// A registration payload the generic orchestrator can provision.
///
/// Implementors supply the raw contact fields for validation and prechecks,
/// and the per-stage call plans with their exact parameter spellings.
pub trait EntityRegistration {
    /// The entity kind this payload registers.
    fn kind(&self) -> EntityKind;

    /// Raw email as submitted.
    fn email(&self) -> &str;

    /// Plaintext password as submitted.
    fn password(&self) -> &SecretString;

    /// Raw phone number as submitted.
    fn raw_phone(&self) -> &str;

    /// Business name to precheck, for entity kinds that have one.
    fn business_name(&self) -> Option<&str> {
        None
    }

    /// Flat attribute bag attached to the identity account as opaque
    /// metadata.
    fn signup_metadata(&self, phone: &CanonicalPhone) -> Value;

    /// Call plan for the profile-ensure stage.
    fn profile_call(&self, user_id: UserId, phone: &CanonicalPhone) -> RpcCall;

    /// Call plan for the atomic domain registration stage.
    fn register_call(&self, user_id: UserId, phone: &CanonicalPhone) -> RpcCall;

    /// Decomposed writes for backends without an atomic registration
    /// function.
    fn fallback_plan(&self, user_id: UserId, phone: &CanonicalPhone) -> FallbackPlan;
}

// =============================================================================
// Restaurant
// =============================================================================

/// Registration payload submitted by the restaurant onboarding wizard.
///
/// Wire field names are snake_case, matching the wizard's final-step payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRestaurantPayload {
    /// Owner's display name.
    pub owner_name: String,
    /// Contact email; becomes the identity account login.
    pub email: String,
    /// Raw phone number; canonicalized before any backend call.
    pub phone: String,
    /// Plaintext password for the identity account.
    pub password: SecretString,
    /// Public restaurant name; uniqueness-prechecked.
    pub restaurant_name: String,
    /// Street address as entered.
    pub address: String,
    /// Geolocation latitude.
    pub location_lat: f64,
    /// Geolocation longitude.
    pub location_lon: f64,
    /// Place identifier from the map picker, when one was chosen.
    #[serde(default)]
    pub location_place_id: Option<String>,
    /// Structured address components from the map picker.
    #[serde(default)]
    pub address_structured: Option<Value>,
}

impl RegisterRestaurantPayload {
    fn register_params(&self, user_id: UserId, phone: &CanonicalPhone) -> Value {
        json!({
            "p_user_id": user_id,
            "p_restaurant_name": self.restaurant_name,
            "p_phone": phone,
            "p_address": self.address,
            "p_location_lat": self.location_lat,
            "p_location_lon": self.location_lon,
            "p_location_place_id": self.location_place_id,
            "p_address_structured": self.address_structured,
        })
    }
}

impl EntityRegistration for RegisterRestaurantPayload {
    fn kind(&self) -> EntityKind {
        EntityKind::Restaurant
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn password(&self) -> &SecretString {
        &self.password
    }

    fn raw_phone(&self) -> &str {
        &self.phone
    }

    fn business_name(&self) -> Option<&str> {
        Some(&self.restaurant_name)
    }

    fn signup_metadata(&self, phone: &CanonicalPhone) -> Value {
        json!({
            "name": self.owner_name,
            "phone": phone,
            "address": self.address,
            "role": EntityKind::Restaurant.role(),
            "restaurant_name": self.restaurant_name,
            "lat": self.location_lat,
            "lon": self.location_lon,
        })
    }

    fn profile_call(&self, user_id: UserId, phone: &CanonicalPhone) -> RpcCall {
        RpcCall {
            candidates: ENSURE_PROFILE_FUNCTIONS,
            params: json!({
                "p_user_id": user_id,
                "p_email": self.email,
                "p_name": self.owner_name,
                "p_role": EntityKind::Restaurant.role(),
                "p_phone": phone,
                "p_address": self.address,
                "p_lat": self.location_lat,
                "p_lon": self.location_lon,
            }),
        }
    }

    fn register_call(&self, user_id: UserId, phone: &CanonicalPhone) -> RpcCall {
        RpcCall {
            candidates: REGISTER_RESTAURANT_FUNCTIONS,
            params: self.register_params(user_id, phone),
        }
    }

    fn fallback_plan(&self, user_id: UserId, phone: &CanonicalPhone) -> FallbackPlan {
        FallbackPlan {
            entity: EntityWrite::Rpc(RpcCall {
                candidates: CREATE_RESTAURANT_FUNCTIONS,
                params: self.register_params(user_id, phone),
            }),
            account: Some(RpcCall {
                candidates: CREATE_ACCOUNT_FUNCTIONS,
                params: json!({ "p_user_id": user_id }),
            }),
        }
    }
}

// =============================================================================
// Courier
// =============================================================================

/// Registration payload submitted by the courier onboarding wizard.
///
/// Wire field names are camelCase, matching the wizard's final-step payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCourierPayload {
    /// Courier's first name.
    pub first_name: String,
    /// Courier's last name.
    pub last_name: String,
    /// Contact email; becomes the identity account login.
    pub email: String,
    /// Plaintext password for the identity account.
    pub password: SecretString,
    /// Raw phone number; canonicalized before any backend call.
    pub phone: String,
    /// City the courier operates in.
    pub city: String,
}

impl EntityRegistration for RegisterCourierPayload {
    fn kind(&self) -> EntityKind {
        EntityKind::DeliveryAgent
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn password(&self) -> &SecretString {
        &self.password
    }

    fn raw_phone(&self) -> &str {
        &self.phone
    }

    fn signup_metadata(&self, phone: &CanonicalPhone) -> Value {
        json!({
            "name": format!("{} {}", self.first_name, self.last_name),
            "first_name": self.first_name,
            "last_name": self.last_name,
            "phone": phone,
            "city": self.city,
            "role": EntityKind::DeliveryAgent.role(),
        })
    }

    fn profile_call(&self, user_id: UserId, phone: &CanonicalPhone) -> RpcCall {
        RpcCall {
            candidates: ENSURE_PROFILE_FUNCTIONS,
            params: json!({
                "p_user_id": user_id,
                "p_email": self.email,
                "p_first_name": self.first_name,
                "p_last_name": self.last_name,
                "p_user_type": EntityKind::DeliveryAgent.role(),
                "p_phone": phone,
                "p_address": self.city,
            }),
        }
    }

    fn register_call(&self, user_id: UserId, phone: &CanonicalPhone) -> RpcCall {
        RpcCall {
            candidates: REGISTER_COURIER_FUNCTIONS,
            params: json!({
                "p_user_id": user_id,
                "p_email": self.email,
                "p_phone": phone,
                "p_first_name": self.first_name,
                "p_last_name": self.last_name,
                "p_city": self.city,
            }),
        }
    }

    fn fallback_plan(&self, user_id: UserId, phone: &CanonicalPhone) -> FallbackPlan {
        FallbackPlan {
            entity: EntityWrite::Tables(vec![
                TableWrite {
                    table: "users",
                    on_conflict: "id",
                    row: json!({
                        "id": user_id,
                        "email": self.email,
                        "phone": phone,
                        "first_name": self.first_name,
                        "last_name": self.last_name,
                        "role": EntityKind::DeliveryAgent.role(),
                    }),
                },
                TableWrite {
                    table: "delivery_agent_profiles",
                    on_conflict: "user_id",
                    row: json!({
                        "user_id": user_id,
                        "city": self.city,
                        "status": EntityStatus::Pending,
                    }),
                },
            ]),
            account: Some(RpcCall {
                candidates: CREATE_ACCOUNT_FUNCTIONS,
                params: json!({ "p_user_id": user_id }),
            }),
        }
    }
}
