//! Domain registration: the entity and its financial account.
//!
//! Prefers one atomic RPC that creates both records together. A foreign-key
//! rejection gets exactly one more chance after a fixed wait and a profile
//! re-ensure. A backend without the atomic function gets the decomposed
//! fallback sequence. By the time this stage runs an identity account
//! already exists, so no path here fails the request outright: the worst
//! outcome is a degraded success flagged for manual reconciliation.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::call_first_available;
use super::descriptor::{EntityWrite, FallbackPlan, RpcCall};
use super::profile;
use crate::supabase::{ErrorCode, SupabaseGateway};

/// Fixed wait before the single foreign-key retry.
pub const FK_RETRY_DELAY: Duration = Duration::from_millis(350);

/// Result of the domain registration stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegistrarResult {
    /// The domain entity exists (atomic or fallback path). A missing
    /// financial account is possible and left to background reconciliation.
    Registered,
    /// The entity write failed after the identity was created; the account
    /// is flagged for manual follow-up.
    Degraded,
}

/// Register the domain entity and its financial account.
pub(crate) async fn register_domain<G: SupabaseGateway>(
    gateway: &G,
    register: &RpcCall,
    profile_call: &RpcCall,
    fallback: &FallbackPlan,
) -> RegistrarResult {
    match call_first_available(gateway, register).await {
        Ok(resolved) => {
            debug!(function = resolved.function, "domain entity registered");
            RegistrarResult::Registered
        }
        Err(err) if err.code().is_consistency_lag() => {
            info!(
                error = %err,
                "atomic registration hit consistency lag, retrying once"
            );
            tokio::time::sleep(FK_RETRY_DELAY).await;
            profile::ensure_once(gateway, profile_call).await;

            match call_first_available(gateway, register).await {
                Ok(resolved) => {
                    debug!(
                        function = resolved.function,
                        "domain entity registered on retry"
                    );
                    RegistrarResult::Registered
                }
                Err(retry_err) if retry_err.code() == ErrorCode::FunctionNotFound => {
                    run_fallback(gateway, fallback).await
                }
                Err(retry_err) => {
                    error!(
                        error = %retry_err,
                        "atomic registration failed after its single retry"
                    );
                    RegistrarResult::Degraded
                }
            }
        }
        Err(err) if err.code() == ErrorCode::FunctionNotFound => {
            debug!(
                candidates = ?register.candidates,
                "no atomic registration function on this backend, decomposing"
            );
            run_fallback(gateway, fallback).await
        }
        Err(err) => {
            error!(code = ?err.code(), error = %err, "domain registration failed");
            RegistrarResult::Degraded
        }
    }
}

/// The decomposed sequence for stale backends: entity write, then a
/// best-effort financial account.
async fn run_fallback<G: SupabaseGateway>(
    gateway: &G,
    plan: &FallbackPlan,
) -> RegistrarResult {
    let entity_written = match &plan.entity {
        EntityWrite::Rpc(call) => match call_first_available(gateway, call).await {
            Ok(_) => true,
            Err(err) => {
                error!(code = ?err.code(), error = %err, "fallback entity write failed");
                false
            }
        },
        EntityWrite::Tables(writes) => {
            let mut ok = true;
            for write in writes {
                if let Err(err) = gateway.upsert(write.table, write.on_conflict, &write.row).await
                {
                    error!(
                        table = write.table,
                        code = ?err.code(),
                        error = %err,
                        "fallback table upsert failed"
                    );
                    ok = false;
                    break;
                }
            }
            ok
        }
    };

    if !entity_written {
        return RegistrarResult::Degraded;
    }

    if let Some(account) = &plan.account {
        // A missing financial account is recoverable by the background
        // reconciliation job, not by the interactive request.
        if let Err(err) = call_first_available(gateway, account).await {
            warn!(
                code = ?err.code(),
                error = %err,
                "financial account creation failed, leaving to reconciliation"
            );
        }
    }

    RegistrarResult::Registered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fk_retry_delay_matches_backend_contract() {
        assert_eq!(FK_RETRY_DELAY, Duration::from_millis(350));
    }
}
