//! HTTP route handlers for the onboarding service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check
//!
//! # Registration intake
//! POST /api/register/restaurant  - Provision a restaurant account
//! POST /api/register/courier     - Provision a courier account
//! ```

pub mod register;

use axum::{Router, routing::post};

use crate::state::AppState;

/// Build the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/register/restaurant", post(register::register_restaurant))
        .route("/api/register/courier", post(register::register_courier))
}
