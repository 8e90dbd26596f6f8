//! Testable properties of the orchestrator: retry bounds, fallback
//! ordering, idempotence and the no-orphaned-accounts invariant.

use serde_json::Value;

use reparto_integration_tests::{
    CallRecord, FakeSupabase, RpcScript, SignupScript, courier_payload, restaurant_payload,
};
use reparto_onboarding::services::provisioning::{
    ENSURE_ATTEMPTS, ENSURE_RETRY_DELAY, FK_RETRY_DELAY, Provisioner,
};
use reparto_onboarding::supabase::ErrorCode;

const DIALING_CODE: &str = "52";

// =============================================================================
// Retry bound
// =============================================================================

#[tokio::test(start_paused = true)]
async fn persistent_consistency_lag_stops_after_ten_spaced_attempts() {
    let fake = FakeSupabase::new();
    fake.script_rpc(
        "ensure_user_profile_v2",
        RpcScript::Fail(
            ErrorCode::IdentityNotVisible,
            "User with the given id does not exist in auth.users",
        ),
    );
    fake.script_rpc("register_restaurant_v2", RpcScript::Ok(Value::Null));

    let started = tokio::time::Instant::now();
    let outcome = Provisioner::new(&fake, DIALING_CODE)
        .register(&restaurant_payload())
        .await;
    let elapsed = started.elapsed();

    // Exactly ten attempts, nine fixed-delay gaps, then graceful fallthrough
    assert_eq!(fake.rpc_calls("ensure_user_profile_v2"), 10);
    assert_eq!(fake.rpc_calls("ensure_user_profile_public"), 0);
    assert_eq!(elapsed, ENSURE_RETRY_DELAY * (ENSURE_ATTEMPTS - 1));

    // The stage never fails the request; registration still completed
    assert!(outcome.ok);
    assert!(outcome.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn non_retryable_ensure_error_falls_through_immediately() {
    let fake = FakeSupabase::new();
    fake.script_rpc(
        "ensure_user_profile_v2",
        RpcScript::Fail(ErrorCode::Other, "canceling statement due to timeout"),
    );
    fake.script_rpc("register_restaurant_v2", RpcScript::Ok(Value::Null));

    let started = tokio::time::Instant::now();
    let outcome = Provisioner::new(&fake, DIALING_CODE)
        .register(&restaurant_payload())
        .await;

    assert_eq!(fake.rpc_calls("ensure_user_profile_v2"), 1);
    assert_eq!(started.elapsed(), std::time::Duration::ZERO);
    assert!(outcome.ok);
}

// =============================================================================
// Fallback ordering
// =============================================================================

#[tokio::test(start_paused = true)]
async fn ensure_probes_v2_before_the_public_fallback() {
    let fake = FakeSupabase::new();
    // ensure_user_profile_v2 is unscripted: absent from this deployment
    fake.script_rpc("ensure_user_profile_public", RpcScript::Ok(Value::Null));
    fake.script_rpc("register_restaurant_v2", RpcScript::Ok(Value::Null));

    let outcome = Provisioner::new(&fake, DIALING_CODE)
        .register(&restaurant_payload())
        .await;

    let v2 = fake
        .first_rpc_position("ensure_user_profile_v2")
        .expect("v2 probed");
    let public = fake
        .first_rpc_position("ensure_user_profile_public")
        .expect("fallback probed");
    assert!(v2 < public);
    assert!(outcome.ok);
    assert!(outcome.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn courier_registration_probes_v2_then_v1_then_tables() {
    let fake = FakeSupabase::new();
    fake.script_rpc("ensure_user_profile_v2", RpcScript::Ok(Value::Null));
    // Both register functions are absent; the direct table writes succeed

    let outcome = Provisioner::new(&fake, DIALING_CODE)
        .register(&courier_payload())
        .await;

    let v2 = fake
        .first_rpc_position("register_delivery_agent_v2")
        .expect("v2 probed");
    let v1 = fake
        .first_rpc_position("register_delivery_agent")
        .expect("v1 probed");
    assert!(v2 < v1);

    let calls = fake.calls();
    let users = calls
        .iter()
        .position(|call| {
            matches!(call, CallRecord::Upsert { table, .. } if table == "users")
        })
        .expect("users upsert");
    let profile = calls
        .iter()
        .position(|call| {
            matches!(call, CallRecord::Upsert { table, .. } if table == "delivery_agent_profiles")
        })
        .expect("profile upsert");
    assert!(v1 < users);
    assert!(users < profile);

    assert!(outcome.ok);
    assert!(outcome.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn courier_stops_probing_after_the_first_resolving_function() {
    let fake = FakeSupabase::new();
    fake.script_rpc("ensure_user_profile_v2", RpcScript::Ok(Value::Null));
    fake.script_rpc("register_delivery_agent_v2", RpcScript::Ok(Value::Null));

    let outcome = Provisioner::new(&fake, DIALING_CODE)
        .register(&courier_payload())
        .await;

    assert!(outcome.ok);
    assert_eq!(fake.rpc_calls("register_delivery_agent_v2"), 1);
    assert_eq!(fake.rpc_calls("register_delivery_agent"), 0);
    assert!(
        !fake
            .calls()
            .iter()
            .any(|call| matches!(call, CallRecord::Upsert { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn missing_ensure_functions_degrade_silently_not_fatally() {
    let fake = FakeSupabase::new();
    // Neither ensure function exists; the atomic register still works
    fake.script_rpc("register_restaurant_v2", RpcScript::Ok(Value::Null));

    let outcome = Provisioner::new(&fake, DIALING_CODE)
        .register(&restaurant_payload())
        .await;

    assert_eq!(fake.rpc_calls("ensure_user_profile_v2"), 1);
    assert_eq!(fake.rpc_calls("ensure_user_profile_public"), 1);
    assert!(outcome.ok);
    assert!(outcome.error.is_none());
}

// =============================================================================
// Foreign-key retry and ensure idempotence
// =============================================================================

#[tokio::test(start_paused = true)]
async fn fk_violation_gets_one_spaced_retry_after_a_re_ensure() {
    let fake = FakeSupabase::new();
    fake.script_rpc("ensure_user_profile_v2", RpcScript::Ok(Value::Null));
    fake.script_rpc(
        "register_restaurant_v2",
        RpcScript::FailThenOk {
            failures: 1,
            code: ErrorCode::ForeignKeyViolation,
            message: "insert violates foreign key constraint \"restaurants_user_id_fkey\"",
            value: Value::Null,
        },
    );

    let started = tokio::time::Instant::now();
    let outcome = Provisioner::new(&fake, DIALING_CODE)
        .register(&restaurant_payload())
        .await;
    let elapsed = started.elapsed();

    assert!(outcome.ok);
    assert!(outcome.error.is_none());
    assert_eq!(fake.rpc_calls("register_restaurant_v2"), 2);
    // The ensure ran once in stage order and once more before the retry;
    // the repeat is a backend no-op and raises no second error
    assert_eq!(fake.rpc_calls("ensure_user_profile_v2"), 2);
    assert_eq!(elapsed, FK_RETRY_DELAY);
}

#[tokio::test(start_paused = true)]
async fn fk_violation_is_retried_exactly_once() {
    let fake = FakeSupabase::new();
    fake.script_rpc("ensure_user_profile_v2", RpcScript::Ok(Value::Null));
    fake.script_rpc(
        "register_restaurant_v2",
        RpcScript::Fail(
            ErrorCode::ForeignKeyViolation,
            "insert violates foreign key constraint \"restaurants_user_id_fkey\"",
        ),
    );

    let outcome = Provisioner::new(&fake, DIALING_CODE)
        .register(&restaurant_payload())
        .await;

    // Initial attempt plus the single retry, then degraded; no third call
    assert_eq!(fake.rpc_calls("register_restaurant_v2"), 2);
    assert!(outcome.ok);
    assert!(outcome.is_degraded());
}

// =============================================================================
// No orphaned accounts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn every_ok_outcome_carries_the_identity_user_id() {
    // Degraded: the entity write failed but the identity must survive
    let degraded_backend = FakeSupabase::new();
    degraded_backend.script_upsert_failure("users", ErrorCode::Other, "permission denied");
    let degraded = Provisioner::new(&degraded_backend, DIALING_CODE)
        .register(&courier_payload())
        .await;
    assert!(degraded.ok);
    assert_eq!(degraded.user_id, Some(degraded_backend.user_id()));
    assert!(degraded.error.is_some(), "missing entity must be reported");

    // Full success
    let healthy_backend = FakeSupabase::new();
    healthy_backend.script_rpc("ensure_user_profile_v2", RpcScript::Ok(Value::Null));
    healthy_backend.script_rpc("register_delivery_agent_v2", RpcScript::Ok(Value::Null));
    let success = Provisioner::new(&healthy_backend, DIALING_CODE)
        .register(&courier_payload())
        .await;
    assert!(success.ok);
    assert_eq!(success.user_id, Some(healthy_backend.user_id()));
}

#[tokio::test(start_paused = true)]
async fn failed_outcomes_never_leak_a_user_id() {
    let fake = FakeSupabase::new();
    fake.script_signup(SignupScript::Fail);

    let outcome = Provisioner::new(&fake, DIALING_CODE)
        .register(&courier_payload())
        .await;

    assert!(!outcome.ok);
    assert!(outcome.user_id.is_none());
}

// =============================================================================
// Canonical phone consistency
// =============================================================================

#[tokio::test(start_paused = true)]
async fn canonical_phone_is_bit_identical_across_every_call() {
    let fake = FakeSupabase::new();
    fake.script_available(&[
        "check_email_availability",
        "check_phone_availability",
        "check_restaurant_name_availability",
    ]);
    fake.script_rpc("ensure_user_profile_v2", RpcScript::Ok(Value::Null));
    fake.script_rpc("register_restaurant_v2", RpcScript::Ok(Value::Null));

    Provisioner::new(&fake, DIALING_CODE)
        .register(&restaurant_payload())
        .await;

    let expected = "+525512345678";
    let mut seen = 0;
    for call in fake.calls() {
        match call {
            CallRecord::Rpc { function, params } => {
                let key = match function.as_str() {
                    "check_phone_availability" => "p_phone",
                    "ensure_user_profile_v2" | "register_restaurant_v2" => "p_phone",
                    _ => continue,
                };
                assert_eq!(params[key], serde_json::json!(expected), "{function}");
                seen += 1;
            }
            CallRecord::SignUp { metadata, .. } => {
                assert_eq!(metadata["phone"], serde_json::json!(expected));
                seen += 1;
            }
            CallRecord::Upsert { .. } => {}
        }
    }
    assert_eq!(seen, 4);
}
