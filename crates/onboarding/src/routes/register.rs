//! Registration intake handlers.
//!
//! Each handler constructs a fresh backend client, runs the orchestrator and
//! answers `200 OK` with the outcome JSON. The wizard branches on the body's
//! `ok`/`error` fields, not on HTTP status: a rejected registration is a
//! normal response, not an HTTP error.

use axum::{Json, extract::State};
use tracing::instrument;

use reparto_core::ProvisioningOutcome;

use crate::error::Result;
use crate::services::provisioning::{
    Provisioner, RegisterCourierPayload, RegisterRestaurantPayload,
};
use crate::state::AppState;
use crate::supabase::SupabaseClient;

/// Provision a restaurant account.
#[instrument(skip(state, payload), fields(request_id = tracing::field::Empty))]
pub async fn register_restaurant(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRestaurantPayload>,
) -> Result<Json<ProvisioningOutcome>> {
    // Fresh client per request; no backend state crosses registrations
    let client = SupabaseClient::new(&state.config().supabase)?;
    let provisioner = Provisioner::new(&client, &state.config().dialing_code);

    Ok(Json(provisioner.register(&payload).await))
}

/// Provision a courier account.
#[instrument(skip(state, payload), fields(request_id = tracing::field::Empty))]
pub async fn register_courier(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCourierPayload>,
) -> Result<Json<ProvisioningOutcome>> {
    let client = SupabaseClient::new(&state.config().supabase)?;
    let provisioner = Provisioner::new(&client, &state.config().dialing_code);

    Ok(Json(provisioner.register(&payload).await))
}
