//! Failure taxonomy and user-facing messages.
//!
//! Every condition the orchestrator can raise maps to exactly one
//! [`FailureClass`]. Only `Validation` and `Fatal` produce `ok = false`;
//! consistency and transient conditions are absorbed internally, degrading
//! to `DegradedSuccess` when their budget is exhausted.
//!
//! All strings handed to the UI are pre-localized; raw backend errors go to
//! the logs only.

/// Classification of a raised condition (used in log fields, never on the
/// wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// User-correctable input problem (duplicate email/phone/name, malformed
    /// email, weak password). Halts with `ok = false`.
    Validation,
    /// RPC name mismatch absorbed via the fallback chain; invisible to the
    /// caller.
    TransientResolved,
    /// Foreign-key/visibility lag absorbed via bounded retry; degrades when
    /// the retry budget exhausts.
    Consistency,
    /// Identity creation failed outright; no account exists, nothing to
    /// reconcile. Halts with `ok = false`.
    Fatal,
    /// Identity and profile exist, the domain entity is missing or
    /// incomplete; `ok = true` with a follow-up message.
    DegradedSuccess,
}

impl FailureClass {
    /// Whether this class terminates the request with `ok = false`.
    #[must_use]
    pub const fn halts(self) -> bool {
        matches!(self, Self::Validation | Self::Fatal)
    }
}

/// Pre-localized messages returned to the onboarding UI.
pub mod messages {
    /// Duplicate email, from precheck or the signup race.
    pub const EMAIL_TAKEN: &str = "Este correo electrónico ya está registrado.";

    /// Duplicate phone, from precheck.
    pub const PHONE_TAKEN: &str = "Este número de teléfono ya está registrado.";

    /// Duplicate restaurant name, from precheck.
    pub const NAME_TAKEN: &str = "Este nombre de restaurante ya está en uso.";

    /// Malformed email address.
    pub const INVALID_EMAIL: &str = "El correo electrónico no es válido.";

    /// Unparseable phone number.
    pub const INVALID_PHONE: &str = "El número de teléfono no es válido.";

    /// Password below the identity store's minimum length.
    pub const WEAK_PASSWORD: &str = "La contraseña debe tener al menos 6 caracteres.";

    /// Identity creation failed for a reason the user cannot correct.
    pub const SIGNUP_FAILED: &str =
        "No se pudo crear la cuenta. Inténtalo de nuevo más tarde.";

    /// The identity store answered success without a user id.
    pub const MISSING_USER_ID: &str =
        "No se pudo crear la cuenta: el servidor no devolvió un identificador de usuario.";

    /// Degraded success: the account exists, the domain entity does not.
    pub const DEGRADED: &str = "Cuenta creada, pero hubo un problema al registrar tu perfil. \
         Nuestro equipo revisará tu cuenta y la activará manualmente.";
}
