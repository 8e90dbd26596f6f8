//! PostgREST RPC calls and direct table writes.
//!
//! All privileged writes go through here with the service-role key. Failures
//! are decoded into [`PostgrestErrorBody`] and classified once into an
//! [`ErrorCode`]; callers branch on the code.

use serde_json::Value;
use tracing::instrument;

use super::SupabaseClient;
use super::error::{ErrorCode, PostgrestErrorBody, SupabaseError};

impl SupabaseClient {
    /// Invoke a named RPC function.
    ///
    /// Functions declared `void` answer with an empty body, which maps to
    /// `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Rpc`] with a classified [`ErrorCode`] when
    /// the backend rejects the call.
    #[instrument(skip(self, params), fields(function = %function))]
    pub(crate) async fn call_rpc(
        &self,
        function: &str,
        params: &Value,
    ) -> Result<Value, SupabaseError> {
        let url = self.rest_endpoint(&format!("rpc/{function}"))?;

        let response = self
            .http()
            .post(url)
            .header("apikey", self.service_role_key())
            .bearer_auth(self.service_role_key())
            .json(params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(rpc_error(function, &text));
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| SupabaseError::Parse(format!("rpc {function} response: {e}")))
    }

    /// Upsert rows into a table, merging on `on_conflict`.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Rpc`] with a classified [`ErrorCode`] when
    /// the backend rejects the write.
    #[instrument(skip(self, rows), fields(table = %table))]
    pub(crate) async fn upsert_rows(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &Value,
    ) -> Result<(), SupabaseError> {
        let mut url = self.rest_endpoint(table)?;
        url.query_pairs_mut().append_pair("on_conflict", on_conflict);

        let response = self
            .http()
            .post(url)
            .header("apikey", self.service_role_key())
            .bearer_auth(self.service_role_key())
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(rpc_error(table, &text));
        }

        Ok(())
    }
}

/// Decode a PostgREST error body and classify it.
fn rpc_error(target: &str, body: &str) -> SupabaseError {
    let parsed = serde_json::from_str::<PostgrestErrorBody>(body).ok();
    let (raw_code, message) = match parsed {
        Some(parsed) => (
            parsed.code,
            parsed.message.unwrap_or_else(|| body.to_owned()),
        ),
        None => (None, body.to_owned()),
    };

    let code = ErrorCode::classify(raw_code.as_deref(), &message);
    SupabaseError::Rpc {
        function: target.to_owned(),
        code,
        raw_code,
        message,
    }
}
