//! Error types for the Supabase backend client.
//!
//! The RPC surface this service talks to has evolved across backend
//! deployments, so failures are classified once, here, into a
//! machine-checkable [`ErrorCode`]. Decision sites in the orchestrator branch
//! on the code, never on message text; the message signatures below exist
//! only as a compatibility shim for backend versions that omit structured
//! codes.

use thiserror::Error;

/// Machine-checkable classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The RPC function name does not resolve on this backend deployment
    /// (`PGRST202` from PostgREST, `42883` from Postgres).
    FunctionNotFound,
    /// A foreign-key check rejected the write (Postgres `23503`). During
    /// provisioning this means the referenced identity was not yet visible.
    ForeignKeyViolation,
    /// A unique constraint rejected the write (Postgres `23505`).
    UniqueViolation,
    /// The referenced identity "does not exist" yet on the backend's read
    /// path (replication lag between the identity store and the database).
    IdentityNotVisible,
    /// The identity store rejected a signup for an email that already has an
    /// account.
    DuplicateUser,
    /// Any failure outside the classified set.
    Other,
}

impl ErrorCode {
    /// Classify a backend failure from its structured code and message.
    ///
    /// The structured `code` field wins; message signatures are consulted
    /// only when no known code is present.
    #[must_use]
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        match code {
            Some("PGRST202" | "42883") => return Self::FunctionNotFound,
            Some("23503") => return Self::ForeignKeyViolation,
            Some("23505") => return Self::UniqueViolation,
            _ => {}
        }

        // Compat shim: older backend versions only speak through messages.
        if message.contains("could not find the function")
            || message.contains("Could not find the function")
        {
            Self::FunctionNotFound
        } else if message.contains("User already registered") {
            Self::DuplicateUser
        } else if message.contains("violates foreign key constraint") {
            Self::ForeignKeyViolation
        } else if message.contains("does not exist") {
            Self::IdentityNotVisible
        } else {
            Self::Other
        }
    }

    /// Whether this failure means a just-created identity is not yet visible
    /// to the call path (the consistency-lag class absorbed via bounded
    /// retry).
    #[must_use]
    pub const fn is_consistency_lag(self) -> bool {
        matches!(self, Self::ForeignKeyViolation | Self::IdentityNotVisible)
    }
}

/// Errors that can occur when talking to the Supabase backend.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP transport failed before the backend could answer.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An RPC or table write was rejected by the backend.
    #[error("backend error in {function} ({code:?}): {message}")]
    Rpc {
        /// The function or table the call targeted.
        function: String,
        /// Machine-checkable classification.
        code: ErrorCode,
        /// The raw code string from the backend, when present.
        raw_code: Option<String>,
        /// The raw backend message (logged, never shown to users).
        message: String,
    },

    /// The identity store rejected a signup.
    #[error("signup error ({code:?}): {message}")]
    Signup {
        /// Machine-checkable classification.
        code: ErrorCode,
        /// The raw backend message (logged, never shown to users).
        message: String,
    },

    /// The identity store reported success but returned no user id.
    #[error("signup succeeded but no user id was returned")]
    MissingUserId,

    /// A response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The configured backend base URL is not a valid URL.
    #[error("invalid backend URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

impl SupabaseError {
    /// The machine-checkable classification of this failure.
    ///
    /// Transport and decode failures classify as [`ErrorCode::Other`].
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Rpc { code, .. } | Self::Signup { code, .. } => *code,
            _ => ErrorCode::Other,
        }
    }
}

/// Error body returned by the PostgREST RPC surface.
#[derive(Debug, serde::Deserialize)]
pub struct PostgrestErrorBody {
    /// PostgREST or Postgres error code (e.g. `PGRST202`, `23503`).
    pub code: Option<String>,
    /// Human-readable message.
    pub message: Option<String>,
    /// Additional details, when present.
    pub details: Option<String>,
    /// Remediation hint, when present.
    pub hint: Option<String>,
}

/// Error body returned by the identity store.
///
/// The auth surface has shipped several shapes over time; all observed
/// spellings are accepted.
#[derive(Debug, serde::Deserialize)]
pub struct AuthErrorBody {
    /// Newer deployments: `{"msg": "..."}`
    pub msg: Option<String>,
    /// Older deployments: `{"message": "..."}`
    pub message: Option<String>,
    /// OAuth-style deployments: `{"error_description": "..."}`
    pub error_description: Option<String>,
}

impl AuthErrorBody {
    /// The best available message across the shapes this surface has shipped.
    #[must_use]
    pub fn into_message(self) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_structured_codes_win() {
        assert_eq!(
            ErrorCode::classify(Some("PGRST202"), "anything"),
            ErrorCode::FunctionNotFound
        );
        assert_eq!(
            ErrorCode::classify(Some("42883"), "anything"),
            ErrorCode::FunctionNotFound
        );
        assert_eq!(
            ErrorCode::classify(Some("23503"), "anything"),
            ErrorCode::ForeignKeyViolation
        );
        assert_eq!(
            ErrorCode::classify(Some("23505"), "anything"),
            ErrorCode::UniqueViolation
        );
    }

    #[test]
    fn test_classify_message_shim_function_not_found() {
        assert_eq!(
            ErrorCode::classify(
                None,
                "Could not find the function public.register_restaurant_v2 in the schema cache"
            ),
            ErrorCode::FunctionNotFound
        );
    }

    #[test]
    fn test_classify_message_shim_identity_not_visible() {
        assert_eq!(
            ErrorCode::classify(
                None,
                "insert or update on table \"user_profiles\" failed: user does not exist in auth.users"
            ),
            ErrorCode::IdentityNotVisible
        );
    }

    #[test]
    fn test_classify_message_shim_fk_before_not_visible() {
        // A message carrying both signatures classifies as the FK violation
        assert_eq!(
            ErrorCode::classify(
                None,
                "insert violates foreign key constraint; key does not exist"
            ),
            ErrorCode::ForeignKeyViolation
        );
    }

    #[test]
    fn test_classify_duplicate_user() {
        assert_eq!(
            ErrorCode::classify(None, "User already registered"),
            ErrorCode::DuplicateUser
        );
    }

    #[test]
    fn test_classify_unknown_is_other() {
        assert_eq!(
            ErrorCode::classify(Some("57014"), "canceling statement due to timeout"),
            ErrorCode::Other
        );
        assert_eq!(ErrorCode::classify(None, "boom"), ErrorCode::Other);
    }

    #[test]
    fn test_consistency_lag_class() {
        assert!(ErrorCode::ForeignKeyViolation.is_consistency_lag());
        assert!(ErrorCode::IdentityNotVisible.is_consistency_lag());
        assert!(!ErrorCode::FunctionNotFound.is_consistency_lag());
        assert!(!ErrorCode::Other.is_consistency_lag());
    }

    #[test]
    fn test_postgrest_error_body_deserialization() {
        let json = r#"{
            "code": "PGRST202",
            "message": "Could not find the function public.register_restaurant_v2",
            "details": null,
            "hint": "Perhaps you meant to call create_restaurant_public"
        }"#;

        let body: PostgrestErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.code.as_deref(), Some("PGRST202"));
        assert!(body.hint.is_some());
    }

    #[test]
    fn test_auth_error_body_shapes() {
        let newer: AuthErrorBody = serde_json::from_str(r#"{"msg":"User already registered"}"#)
            .unwrap();
        assert_eq!(newer.into_message(), "User already registered");

        let oauth: AuthErrorBody =
            serde_json::from_str(r#"{"error_description":"Signups not allowed"}"#).unwrap();
        assert_eq!(oauth.into_message(), "Signups not allowed");

        let empty: AuthErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.into_message(), "");
    }

    #[test]
    fn test_supabase_error_code_accessor() {
        let err = SupabaseError::Rpc {
            function: "ensure_user_profile_v2".to_owned(),
            code: ErrorCode::IdentityNotVisible,
            raw_code: None,
            message: "user does not exist".to_owned(),
        };
        assert_eq!(err.code(), ErrorCode::IdentityNotVisible);
        assert_eq!(SupabaseError::MissingUserId.code(), ErrorCode::Other);
    }
}
