//! Account-provisioning orchestrator.
//!
//! Runs one registration end to end against a backend whose RPC surface may
//! be incomplete (older/newer function names), eventually consistent (a
//! fresh identity may not be visible to foreign-key checks yet) and
//! partially failing (domain registration failing after the identity
//! exists). Stages run strictly in sequence:
//!
//! 1. Availability prechecks (advisory, never a gate when unavailable)
//! 2. Identity account creation (never retried)
//! 3. Profile ensure (bounded consistency retry, never fails the request)
//! 4. Domain registration (atomic RPC, single FK retry, decomposed fallback)
//! 5. Outcome mapping ([`ProvisioningOutcome`], pre-localized messages)
//!
//! Once the identity account exists the orchestrator always runs to
//! completion: aborting would orphan the account, so every later failure
//! degrades the outcome instead of discarding it.

pub mod descriptor;
pub mod outcome;
pub mod precheck;
pub mod profile;
pub mod registrar;

pub use descriptor::{
    EntityRegistration, RegisterCourierPayload, RegisterRestaurantPayload, RpcCall,
};
pub use outcome::{FailureClass, messages};
pub use registrar::FK_RETRY_DELAY;
pub use profile::{ENSURE_ATTEMPTS, ENSURE_RETRY_DELAY};

use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use reparto_core::{CanonicalPhone, Email, ProvisioningOutcome, UserId};

use crate::supabase::{ErrorCode, SignupRequest, SupabaseError, SupabaseGateway};

use registrar::RegistrarResult;

/// Minimum password length enforced by the identity store.
const MIN_PASSWORD_LENGTH: usize = 6;

/// The account-provisioning orchestrator.
///
/// Generic over the backend gateway so tests can inject a scripted fake;
/// production injects a fresh [`crate::supabase::SupabaseClient`] per
/// request.
pub struct Provisioner<'a, G> {
    gateway: &'a G,
    dialing_code: &'a str,
}

impl<'a, G: SupabaseGateway> Provisioner<'a, G> {
    /// Create an orchestrator over an injected gateway.
    ///
    /// `dialing_code` supplies the country prefix for canonicalizing bare
    /// national phone numbers.
    #[must_use]
    pub const fn new(gateway: &'a G, dialing_code: &'a str) -> Self {
        Self {
            gateway,
            dialing_code,
        }
    }

    /// Run one registration to its terminal outcome.
    ///
    /// Never returns an error: every failure mode maps to a
    /// [`ProvisioningOutcome`] with a pre-localized message, and raw backend
    /// errors are only logged.
    #[instrument(skip(self, request), fields(kind = ?request.kind()))]
    pub async fn register<R: EntityRegistration>(&self, request: &R) -> ProvisioningOutcome {
        // Stage 0: local validation and canonicalization
        let Ok(email) = Email::parse(request.email()) else {
            info!(class = ?FailureClass::Validation, "rejected: malformed email");
            return ProvisioningOutcome::failure(messages::INVALID_EMAIL.to_owned());
        };
        let phone = match CanonicalPhone::parse(request.raw_phone(), self.dialing_code) {
            Ok(phone) => phone,
            Err(err) => {
                info!(class = ?FailureClass::Validation, error = %err, "rejected: bad phone");
                return ProvisioningOutcome::failure(messages::INVALID_PHONE.to_owned());
            }
        };
        if request.password().expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            info!(class = ?FailureClass::Validation, "rejected: weak password");
            return ProvisioningOutcome::failure(messages::WEAK_PASSWORD.to_owned());
        }

        // Stage 1: availability prechecks
        if let Some(message) =
            precheck::run(self.gateway, &email, &phone, request.business_name()).await
        {
            info!(class = ?FailureClass::Validation, message, "rejected by precheck");
            return ProvisioningOutcome::failure(message.to_owned());
        }

        // Stage 2: identity account
        let signup = SignupRequest {
            email,
            password: request.password().clone(),
            metadata: request.signup_metadata(&phone),
        };
        let user_id = match self.gateway.sign_up(&signup).await {
            Ok(session) => session.user_id,
            Err(err) => return signup_failure(&err),
        };
        info!(%user_id, "identity account created");

        // An identity account now exists: every path below ends in ok=true.
        self.provision_for(request, user_id, &phone).await
    }

    /// Stages 3-5, entered once an identity account exists.
    async fn provision_for<R: EntityRegistration>(
        &self,
        request: &R,
        user_id: UserId,
        phone: &CanonicalPhone,
    ) -> ProvisioningOutcome {
        let profile_call = request.profile_call(user_id, phone);
        if !profile::ensure(self.gateway, &profile_call).await {
            debug!(%user_id, "profile not ensured; registrar fallback can self-heal");
        }

        let register_call = request.register_call(user_id, phone);
        let fallback = request.fallback_plan(user_id, phone);
        match registrar::register_domain(self.gateway, &register_call, &profile_call, &fallback)
            .await
        {
            RegistrarResult::Registered => ProvisioningOutcome::success(user_id),
            RegistrarResult::Degraded => {
                warn!(
                    %user_id,
                    class = ?FailureClass::DegradedSuccess,
                    "domain entity missing, account flagged for manual review"
                );
                ProvisioningOutcome::degraded(user_id, messages::DEGRADED.to_owned())
            }
        }
    }
}

/// Map a signup failure to its terminal outcome.
fn signup_failure(err: &SupabaseError) -> ProvisioningOutcome {
    if matches!(err, SupabaseError::MissingUserId) {
        error!(class = ?FailureClass::Fatal, "signup answered success without a user id");
        return ProvisioningOutcome::failure(messages::MISSING_USER_ID.to_owned());
    }

    // Covers the race where the precheck passed but another request won the
    // insert.
    if err.code() == ErrorCode::DuplicateUser {
        info!(class = ?FailureClass::Validation, "rejected: email already registered");
        return ProvisioningOutcome::failure(messages::EMAIL_TAKEN.to_owned());
    }

    error!(class = ?FailureClass::Fatal, error = %err, "identity creation failed");
    ProvisioningOutcome::failure(messages::SIGNUP_FAILED.to_owned())
}

/// Result of probing a capability table: which candidate resolved and what
/// it returned.
pub(crate) struct ResolvedCall {
    /// The function name that resolved.
    pub function: &'static str,
    /// The function's return value.
    pub value: Value,
}

/// Probe an ordered capability table and invoke the first function the
/// backend resolves.
///
/// Candidates that answer [`ErrorCode::FunctionNotFound`] are skipped; any
/// other failure propagates immediately. When no candidate resolves, the
/// last not-found error is returned so callers see
/// `ErrorCode::FunctionNotFound`.
pub(crate) async fn call_first_available<G: SupabaseGateway>(
    gateway: &G,
    call: &RpcCall,
) -> Result<ResolvedCall, SupabaseError> {
    let mut last_missing = None;

    for &function in call.candidates {
        match gateway.rpc(function, &call.params).await {
            Ok(value) => {
                if last_missing.is_some() {
                    debug!(
                        class = ?FailureClass::TransientResolved,
                        function,
                        "resolved via fallback function name"
                    );
                }
                return Ok(ResolvedCall { function, value });
            }
            Err(err) if err.code() == ErrorCode::FunctionNotFound => {
                debug!(function, "function not present on this backend");
                last_missing = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_missing.unwrap_or_else(|| SupabaseError::Rpc {
        function: call.candidates.first().copied().unwrap_or("").to_owned(),
        code: ErrorCode::FunctionNotFound,
        raw_code: None,
        message: "empty capability table".to_owned(),
    }))
}
