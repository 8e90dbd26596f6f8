//! Terminal result of an account-provisioning run.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// The terminal result of a registration, returned to the onboarding UI.
///
/// Wire shape is `{ ok, userId?, error? }`. Callers must treat `ok == true`
/// with `error` set as **degraded success** (identity and profile exist, the
/// domain entity is missing or incomplete and flagged for manual follow-up),
/// not as failure.
///
/// Invariant: `ok == true` implies an identity account exists, so `user_id`
/// is always present on success paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningOutcome {
    /// Whether an identity account exists for this registration.
    pub ok: bool,
    /// The identity account id, present whenever `ok` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// User-facing message: on `ok == false` the reason the registration was
    /// rejected, on `ok == true` the degraded-success follow-up notice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProvisioningOutcome {
    /// Full success: identity, profile and domain entity all exist.
    #[must_use]
    pub const fn success(user_id: UserId) -> Self {
        Self {
            ok: true,
            user_id: Some(user_id),
            error: None,
        }
    }

    /// Degraded success: the identity account exists but the domain entity is
    /// missing or incomplete and needs manual reconciliation.
    #[must_use]
    pub fn degraded(user_id: UserId, message: String) -> Self {
        Self {
            ok: true,
            user_id: Some(user_id),
            error: Some(message),
        }
    }

    /// Failure before any identity account was created.
    #[must_use]
    pub fn failure(message: String) -> Self {
        Self {
            ok: false,
            user_id: None,
            error: Some(message),
        }
    }

    /// Whether this outcome is a degraded success requiring follow-up.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.ok && self.error.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_user_id_and_no_error() {
        let user_id = UserId::new(uuid::Uuid::new_v4());
        let outcome = ProvisioningOutcome::success(user_id);
        assert!(outcome.ok);
        assert_eq!(outcome.user_id, Some(user_id));
        assert!(outcome.error.is_none());
        assert!(!outcome.is_degraded());
    }

    #[test]
    fn test_degraded_is_still_ok() {
        let user_id = UserId::new(uuid::Uuid::new_v4());
        let outcome = ProvisioningOutcome::degraded(user_id, "seguimiento manual".to_owned());
        assert!(outcome.ok);
        assert!(outcome.is_degraded());
    }

    #[test]
    fn test_failure_has_no_user_id() {
        let outcome = ProvisioningOutcome::failure("rechazado".to_owned());
        assert!(!outcome.ok);
        assert!(outcome.user_id.is_none());
        assert!(!outcome.is_degraded());
    }

    #[test]
    fn test_wire_shape_camel_case() {
        let user_id = UserId::new(uuid::Uuid::new_v4());
        let json = serde_json::to_value(ProvisioningOutcome::success(user_id)).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["userId"], user_id.to_string());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_wire_shape_omits_absent_fields() {
        let json = serde_json::to_string(&ProvisioningOutcome::failure("no".to_owned())).unwrap();
        assert!(!json.contains("userId"));
    }
}
