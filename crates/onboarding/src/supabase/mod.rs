//! Supabase backend client.
//!
//! The onboarding service reaches its managed backend exclusively through
//! this module: the identity store (`/auth/v1`) for account creation and the
//! PostgREST surface (`/rest/v1`) for RPCs and direct table writes.
//!
//! The client is never ambient state: route handlers construct a fresh
//! [`SupabaseClient`] per request and inject it into the orchestrator, so no
//! authentication or connection state can bleed across registrations.

pub mod auth;
pub mod error;
pub mod rpc;

pub use auth::{SignupRequest, SignupSession};
pub use error::{ErrorCode, SupabaseError};

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::SupabaseConfig;

/// Seam through which every backend interaction flows.
///
/// The orchestrator is generic over this trait; production code injects
/// [`SupabaseClient`], tests inject an in-memory fake.
#[allow(async_fn_in_trait)] // call sites are generic over concrete gateways
pub trait SupabaseGateway {
    /// Create an identity account with an opaque metadata bag.
    async fn sign_up(&self, signup: &SignupRequest) -> Result<SignupSession, SupabaseError>;

    /// Invoke a named RPC function with a JSON parameter object.
    async fn rpc(
        &self,
        function: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, SupabaseError>;

    /// Upsert rows into a table, merging on the given conflict column.
    async fn upsert(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &serde_json::Value,
    ) -> Result<(), SupabaseError>;
}

/// HTTP client for the Supabase backend.
///
/// Holds the base URL and the two API keys: the anon key authenticates
/// signups, the service-role key authenticates the privileged RPC surface.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    base: Url,
    anon_key: SecretString,
    service_role_key: SecretString,
}

impl SupabaseClient {
    /// Create a new backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL cannot be parsed or the
    /// HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        // A trailing slash keeps Url::join from swallowing the last path segment
        let mut base = Url::parse(&config.url)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                http,
                base,
                anon_key: config.anon_key.clone(),
                service_role_key: config.service_role_key.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(self.inner.base.join(path)?)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn anon_key(&self) -> &str {
        self.inner.anon_key.expose_secret()
    }

    pub(crate) fn service_role_key(&self) -> &str {
        self.inner.service_role_key.expose_secret()
    }

    pub(crate) fn auth_endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        self.endpoint(&format!("auth/v1/{path}"))
    }

    pub(crate) fn rest_endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        self.endpoint(&format!("rest/v1/{path}"))
    }
}

impl SupabaseGateway for SupabaseClient {
    async fn sign_up(&self, signup: &SignupRequest) -> Result<SignupSession, SupabaseError> {
        self.create_identity(signup).await
    }

    async fn rpc(
        &self,
        function: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, SupabaseError> {
        self.call_rpc(function, params).await
    }

    async fn upsert(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &serde_json::Value,
    ) -> Result<(), SupabaseError> {
        self.upsert_rows(table, on_conflict, rows).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config(url: &str) -> SupabaseConfig {
        SupabaseConfig {
            url: url.to_owned(),
            anon_key: SecretString::from("anon-key"),
            service_role_key: SecretString::from("service-key"),
        }
    }

    #[test]
    fn test_endpoints_join_cleanly_without_trailing_slash() {
        let client = SupabaseClient::new(&test_config("https://project.supabase.co")).unwrap();
        assert_eq!(
            client.auth_endpoint("signup").unwrap().as_str(),
            "https://project.supabase.co/auth/v1/signup"
        );
        assert_eq!(
            client
                .rest_endpoint("rpc/check_email_availability")
                .unwrap()
                .as_str(),
            "https://project.supabase.co/rest/v1/rpc/check_email_availability"
        );
    }

    #[test]
    fn test_endpoints_join_cleanly_with_trailing_slash() {
        let client = SupabaseClient::new(&test_config("https://project.supabase.co/")).unwrap();
        assert_eq!(
            client.rest_endpoint("users").unwrap().as_str(),
            "https://project.supabase.co/rest/v1/users"
        );
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(SupabaseClient::new(&test_config("not a url")).is_err());
    }
}
