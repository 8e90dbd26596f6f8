//! Availability prechecks.
//!
//! Best-effort uniqueness checks before committing to signup. A check that
//! answers "not available" fails the registration fast with a field-specific
//! message and no side effects. A check that cannot run (the function is
//! absent on this backend deployment, or the call errors) is inconclusive
//! and never blocks: prechecks are a UX optimization, not a correctness
//! gate; the backend's own constraints remain the authority.

use serde_json::json;
use tracing::{debug, warn};

use reparto_core::{CanonicalPhone, Email};

use super::call_first_available;
use super::descriptor::{
    CHECK_EMAIL_FUNCTIONS, CHECK_PHONE_FUNCTIONS, CHECK_RESTAURANT_NAME_FUNCTIONS, RpcCall,
};
use super::outcome::messages;
use crate::supabase::{ErrorCode, SupabaseGateway};

/// Run the prechecks for one registration.
///
/// Returns the user-facing rejection message for the first value that is
/// already taken, or `None` when every check passed or was inconclusive.
pub(crate) async fn run<G: SupabaseGateway>(
    gateway: &G,
    email: &Email,
    phone: &CanonicalPhone,
    business_name: Option<&str>,
) -> Option<&'static str> {
    let email_check = RpcCall {
        candidates: CHECK_EMAIL_FUNCTIONS,
        params: json!({ "p_email": email }),
    };
    if is_taken(gateway, &email_check).await {
        return Some(messages::EMAIL_TAKEN);
    }

    let phone_check = RpcCall {
        candidates: CHECK_PHONE_FUNCTIONS,
        params: json!({ "p_phone": phone }),
    };
    if is_taken(gateway, &phone_check).await {
        return Some(messages::PHONE_TAKEN);
    }

    if let Some(name) = business_name {
        let name_check = RpcCall {
            candidates: CHECK_RESTAURANT_NAME_FUNCTIONS,
            params: json!({ "p_name": name }),
        };
        if is_taken(gateway, &name_check).await {
            return Some(messages::NAME_TAKEN);
        }
    }

    None
}

/// Whether an availability check conclusively answered "taken".
///
/// The check functions answer `true` when the value is still available.
async fn is_taken<G: SupabaseGateway>(gateway: &G, call: &RpcCall) -> bool {
    match call_first_available(gateway, call).await {
        Ok(resolved) => resolved.value.as_bool() == Some(false),
        Err(err) if err.code() == ErrorCode::FunctionNotFound => {
            debug!(
                candidates = ?call.candidates,
                "availability check not present on this backend, proceeding"
            );
            false
        }
        Err(err) => {
            warn!(
                candidates = ?call.candidates,
                error = %err,
                "availability check failed, treating as inconclusive"
            );
            false
        }
    }
}
