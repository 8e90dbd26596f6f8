//! Identity store signup.
//!
//! Creates the authentication identity (email + password) with the caller's
//! profile attributes attached as an opaque metadata bag. Identity creation
//! is not idempotent from the client's perspective, so this call is never
//! retried; callers classify the failure and stop.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::instrument;

use reparto_core::{Email, UserId};

use super::SupabaseClient;
use super::error::{AuthErrorBody, ErrorCode, SupabaseError};

/// A signup request against the identity store.
///
/// `Debug` redacts the password via [`SecretString`].
#[derive(Debug, Clone)]
pub struct SignupRequest {
    /// Validated email address.
    pub email: Email,
    /// Plaintext password, kept secret in memory.
    pub password: SecretString,
    /// Flat bag of profile attributes stored as opaque identity metadata
    /// (name, canonical phone, address, role tag, geolocation).
    pub metadata: Value,
}

/// The identity account created by a successful signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignupSession {
    /// Opaque identifier issued by the identity store.
    pub user_id: UserId,
}

impl SupabaseClient {
    /// Create an identity account.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Signup`] when the identity store rejects the
    /// request (classified, e.g. [`ErrorCode::DuplicateUser`]) and
    /// [`SupabaseError::MissingUserId`] when a success response carries no
    /// user id.
    #[instrument(skip(self, signup), fields(email_domain = %signup.email.domain()))]
    pub(crate) async fn create_identity(
        &self,
        signup: &SignupRequest,
    ) -> Result<SignupSession, SupabaseError> {
        let url = self.auth_endpoint("signup")?;

        let body = serde_json::json!({
            "email": signup.email.as_str(),
            "password": signup.password.expose_secret(),
            "data": signup.metadata,
        });

        let response = self
            .http()
            .post(url)
            .header("apikey", self.anon_key())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<AuthErrorBody>(&text)
                .map(AuthErrorBody::into_message)
                .unwrap_or_else(|_| text.clone());
            let code = ErrorCode::classify(None, &message);
            return Err(SupabaseError::Signup { code, message });
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| SupabaseError::Parse(format!("signup response: {e}")))?;

        parse_user_id(&value)
            .map(|user_id| SignupSession { user_id })
            .ok_or(SupabaseError::MissingUserId)
    }
}

/// Extract the user id from a signup response.
///
/// The auth surface has returned two shapes over time: the user object at
/// the top level (`{"id": ...}`) and nested under a session
/// (`{"user": {"id": ...}}`).
fn parse_user_id(value: &Value) -> Option<UserId> {
    let raw = value
        .get("id")
        .or_else(|| value.get("user").and_then(|user| user.get("id")))?
        .as_str()?;

    raw.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id_top_level() {
        let uuid = uuid::Uuid::new_v4();
        let value = serde_json::json!({ "id": uuid.to_string(), "email": "a@b.c" });
        assert_eq!(parse_user_id(&value), Some(UserId::new(uuid)));
    }

    #[test]
    fn test_parse_user_id_nested_under_session() {
        let uuid = uuid::Uuid::new_v4();
        let value = serde_json::json!({
            "access_token": "jwt",
            "user": { "id": uuid.to_string() }
        });
        assert_eq!(parse_user_id(&value), Some(UserId::new(uuid)));
    }

    #[test]
    fn test_parse_user_id_missing() {
        assert_eq!(parse_user_id(&serde_json::json!({})), None);
        assert_eq!(
            parse_user_id(&serde_json::json!({ "user": {} })),
            None
        );
    }

    #[test]
    fn test_parse_user_id_rejects_non_uuid() {
        let value = serde_json::json!({ "id": "not-a-uuid" });
        assert_eq!(parse_user_id(&value), None);
    }

    #[test]
    fn test_signup_request_debug_redacts_password() {
        let request = SignupRequest {
            email: Email::parse("owner@tacos.mx").unwrap(),
            password: SecretString::from("hunter2-hunter2"),
            metadata: serde_json::json!({}),
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("hunter2"));
    }
}
