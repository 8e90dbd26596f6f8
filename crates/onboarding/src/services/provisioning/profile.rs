//! Profile provisioning with consistency-lag absorption.
//!
//! The identity created moments earlier may not yet be visible to the
//! profile RPC's foreign-key check against the identity store. This stage
//! retries that one failure class on a fixed schedule and otherwise gives up
//! silently: the domain registrar's fallback path can create the profile row
//! itself, so failing the request here would abandon an identity account the
//! next stage can still complete.

use std::time::Duration;

use tracing::{debug, warn};

use super::call_first_available;
use super::descriptor::RpcCall;
use super::outcome::FailureClass;
use crate::supabase::SupabaseGateway;

/// Retry ceiling for the ensure loop.
pub const ENSURE_ATTEMPTS: u32 = 10;

/// Fixed spacing between ensure attempts.
pub const ENSURE_RETRY_DELAY: Duration = Duration::from_millis(300);

/// Ensure the user profile row exists.
///
/// Returns whether the row is known to exist. Never fails the request:
/// after [`ENSURE_ATTEMPTS`] attempts at [`ENSURE_RETRY_DELAY`] spacing, or
/// on any non-retryable error, the stage falls through with `false`.
///
/// Repeated calls with the same `user_id` are no-ops on the backend, so the
/// registrar can safely re-invoke this during its own retry.
pub(crate) async fn ensure<G: SupabaseGateway>(gateway: &G, call: &RpcCall) -> bool {
    for attempt in 1..=ENSURE_ATTEMPTS {
        match call_first_available(gateway, call).await {
            Ok(resolved) => {
                if attempt > 1 {
                    debug!(attempt, function = resolved.function, "profile ensured after retry");
                }
                return true;
            }
            Err(err) if err.code().is_consistency_lag() => {
                if attempt == ENSURE_ATTEMPTS {
                    break;
                }
                debug!(
                    class = ?FailureClass::Consistency,
                    attempt,
                    error = %err,
                    "identity not visible yet, retrying profile ensure"
                );
                tokio::time::sleep(ENSURE_RETRY_DELAY).await;
            }
            Err(err) => {
                warn!(
                    attempt,
                    code = ?err.code(),
                    error = %err,
                    "profile ensure gave up; domain registration may self-heal"
                );
                return false;
            }
        }
    }

    warn!(
        attempts = ENSURE_ATTEMPTS,
        "profile ensure exhausted its retry budget"
    );
    false
}

/// Single ensure attempt, used by the domain registrar between its
/// foreign-key retry and the final atomic re-invocation.
pub(crate) async fn ensure_once<G: SupabaseGateway>(gateway: &G, call: &RpcCall) -> bool {
    match call_first_available(gateway, call).await {
        Ok(_) => true,
        Err(err) => {
            warn!(code = ?err.code(), error = %err, "profile re-ensure failed");
            false
        }
    }
}
