//! # Huddle Gateway Crate
//!
//! WebSocket surface of the room engine. Each room type gets its own
//! connection target, every user can hold a live notification stream, and a
//! small health route reports how many rooms are live.
//!
//! ## Architecture
//!
//! - **WebSocket**: room and notification sockets pumping frames to and from the hub
//! - **REST**: health check
//! - **State**: the hub and per-user notification channels shared by every handler
//! - **Middleware**: handshake token extraction, CORS, request tracing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use huddle_gateway::{create_router, GatewayState};
//!
//! let app = create_router(GatewayState::new(services.hub, services.channels));
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;

use axum::Router;

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .merge(rest::create_rest_routes())
        .merge(websocket::create_websocket_routes())
        .with_state(state)
        .layer(middleware::create_cors_middleware())
        .layer(middleware::create_trace_middleware())
}
