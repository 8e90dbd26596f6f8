//! Integration test support for Reparto onboarding.
//!
//! Provides [`FakeSupabase`], a scriptable in-memory gateway implementing
//! the orchestrator's backend seam, plus payload builders. Each test scripts
//! the RPC surface it wants to simulate (complete, stale, lagging or
//! failing) and asserts on the recorded call log.
//!
//! Unscripted functions answer "function not found", which mirrors a
//! backend deployment that simply does not have them.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Value, json};

use reparto_core::UserId;
use reparto_onboarding::services::provisioning::{
    RegisterCourierPayload, RegisterRestaurantPayload,
};
use reparto_onboarding::supabase::{
    ErrorCode, SignupRequest, SignupSession, SupabaseError, SupabaseGateway,
};

/// Scripted behavior for one RPC function.
#[derive(Debug, Clone)]
pub enum RpcScript {
    /// Answer with this value every time.
    Ok(Value),
    /// Fail with a classified error every time.
    Fail(ErrorCode, &'static str),
    /// Fail with a classified error for the first `failures` calls, then
    /// answer with the value.
    FailThenOk {
        /// Number of leading failures.
        failures: usize,
        /// Classification of the leading failures.
        code: ErrorCode,
        /// Message of the leading failures.
        message: &'static str,
        /// Value answered once the failures are exhausted.
        value: Value,
    },
}

/// Scripted behavior for the identity store signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupScript {
    /// Issue the fake's user id.
    Ok,
    /// Reject with "User already registered".
    Duplicate,
    /// Answer success without a user id.
    MissingUserId,
    /// Reject with an unclassified error.
    Fail,
}

/// One recorded backend interaction, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRecord {
    /// Identity signup with the submitted email and metadata.
    SignUp {
        /// Email submitted to the identity store.
        email: String,
        /// Opaque metadata bag.
        metadata: Value,
    },
    /// RPC invocation.
    Rpc {
        /// Function name.
        function: String,
        /// Parameter object.
        params: Value,
    },
    /// Direct table upsert.
    Upsert {
        /// Target table.
        table: String,
        /// Upserted row.
        row: Value,
    },
}

/// In-memory scriptable backend gateway.
pub struct FakeSupabase {
    user_id: UserId,
    signup: Mutex<SignupScript>,
    rpc_scripts: Mutex<HashMap<String, RpcScript>>,
    upsert_scripts: Mutex<HashMap<String, (ErrorCode, &'static str)>>,
    calls: Mutex<Vec<CallRecord>>,
}

impl Default for FakeSupabase {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSupabase {
    /// A fake backend with a fresh user id, successful signup, no RPC
    /// functions and permissive table upserts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_id: UserId::new(uuid::Uuid::new_v4()),
            signup: Mutex::new(SignupScript::Ok),
            rpc_scripts: Mutex::new(HashMap::new()),
            upsert_scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The user id this backend issues on signup.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Script the signup behavior.
    pub fn script_signup(&self, script: SignupScript) {
        *self.signup.lock().expect("signup lock") = script;
    }

    /// Script one RPC function.
    pub fn script_rpc(&self, function: &str, script: RpcScript) {
        self.rpc_scripts
            .lock()
            .expect("rpc lock")
            .insert(function.to_owned(), script);
    }

    /// Script the listed functions to answer `true` (the availability-check
    /// convention for "still available").
    pub fn script_available(&self, functions: &[&str]) {
        for function in functions {
            self.script_rpc(function, RpcScript::Ok(Value::Bool(true)));
        }
    }

    /// Make an upsert into `table` fail with the given classification.
    pub fn script_upsert_failure(&self, table: &str, code: ErrorCode, message: &'static str) {
        self.upsert_scripts
            .lock()
            .expect("upsert lock")
            .insert(table.to_owned(), (code, message));
    }

    /// All recorded calls, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// How many times an RPC function was invoked.
    #[must_use]
    pub fn rpc_calls(&self, function: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, CallRecord::Rpc { function: f, .. } if f == function))
            .count()
    }

    /// Whether a signup was attempted.
    #[must_use]
    pub fn signed_up(&self) -> bool {
        self.calls()
            .iter()
            .any(|call| matches!(call, CallRecord::SignUp { .. }))
    }

    /// Position of the first call matching `function` in the call log.
    #[must_use]
    pub fn first_rpc_position(&self, function: &str) -> Option<usize> {
        self.calls().iter().position(
            |call| matches!(call, CallRecord::Rpc { function: f, .. } if f == function),
        )
    }

    fn record(&self, call: CallRecord) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn not_found(function: &str) -> SupabaseError {
        SupabaseError::Rpc {
            function: function.to_owned(),
            code: ErrorCode::FunctionNotFound,
            raw_code: Some("PGRST202".to_owned()),
            message: format!("Could not find the function public.{function} in the schema cache"),
        }
    }
}

impl SupabaseGateway for FakeSupabase {
    async fn sign_up(&self, signup: &SignupRequest) -> Result<SignupSession, SupabaseError> {
        self.record(CallRecord::SignUp {
            email: signup.email.as_str().to_owned(),
            metadata: signup.metadata.clone(),
        });

        match *self.signup.lock().expect("signup lock") {
            SignupScript::Ok => Ok(SignupSession {
                user_id: self.user_id,
            }),
            SignupScript::Duplicate => Err(SupabaseError::Signup {
                code: ErrorCode::DuplicateUser,
                message: "User already registered".to_owned(),
            }),
            SignupScript::MissingUserId => Err(SupabaseError::MissingUserId),
            SignupScript::Fail => Err(SupabaseError::Signup {
                code: ErrorCode::Other,
                message: "Database error saving new user".to_owned(),
            }),
        }
    }

    async fn rpc(&self, function: &str, params: &Value) -> Result<Value, SupabaseError> {
        self.record(CallRecord::Rpc {
            function: function.to_owned(),
            params: params.clone(),
        });

        let mut scripts = self.rpc_scripts.lock().expect("rpc lock");
        match scripts.get_mut(function) {
            None => Err(Self::not_found(function)),
            Some(RpcScript::Ok(value)) => Ok(value.clone()),
            Some(RpcScript::Fail(code, message)) => Err(SupabaseError::Rpc {
                function: function.to_owned(),
                code: *code,
                raw_code: None,
                message: (*message).to_owned(),
            }),
            Some(RpcScript::FailThenOk {
                failures,
                code,
                message,
                value,
            }) => {
                if *failures > 0 {
                    *failures -= 1;
                    Err(SupabaseError::Rpc {
                        function: function.to_owned(),
                        code: *code,
                        raw_code: None,
                        message: (*message).to_owned(),
                    })
                } else {
                    Ok(value.clone())
                }
            }
        }
    }

    async fn upsert(
        &self,
        table: &str,
        _on_conflict: &str,
        rows: &Value,
    ) -> Result<(), SupabaseError> {
        self.record(CallRecord::Upsert {
            table: table.to_owned(),
            row: rows.clone(),
        });

        match self.upsert_scripts.lock().expect("upsert lock").get(table) {
            None => Ok(()),
            Some((code, message)) => Err(SupabaseError::Rpc {
                function: table.to_owned(),
                code: *code,
                raw_code: None,
                message: (*message).to_owned(),
            }),
        }
    }
}

// =============================================================================
// Payload Builders
// =============================================================================

/// A valid restaurant registration payload.
///
/// # Panics
///
/// Panics if the fixture JSON stops matching the payload shape.
#[must_use]
pub fn restaurant_payload() -> RegisterRestaurantPayload {
    serde_json::from_value(json!({
        "owner_name": "Ana Soto",
        "email": "ana@lacasita.mx",
        "phone": "+52 55 1234 5678",
        "password": "tamales-verdes",
        "restaurant_name": "La Casita",
        "address": "Av. Juárez 10, CDMX",
        "location_lat": 19.4326,
        "location_lon": -99.1332,
        "location_place_id": "ChIJb3F-EXAMPLE"
    }))
    .expect("restaurant payload fixture")
}

/// A valid courier registration payload.
///
/// # Panics
///
/// Panics if the fixture JSON stops matching the payload shape.
#[must_use]
pub fn courier_payload() -> RegisterCourierPayload {
    serde_json::from_value(json!({
        "firstName": "Luis",
        "lastName": "Paredes",
        "email": "luis@example.com",
        "password": "pedal-rapido",
        "phone": "33 1234 5678",
        "city": "Guadalajara"
    }))
    .expect("courier payload fixture")
}
