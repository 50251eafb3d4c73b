//! API Module
//!
//! HTTP handlers and routing for the peer protocol and the front-end API.
//!
//! # Peer Endpoints
//! - `GET <base-path><group>/<key>` - Raw value owned by this node
//!
//! # Front-end Endpoints
//! - `GET /api?key=<key>` - Raw value through the full read path
//! - `GET /stats` - Group and cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_api_router, create_peer_router};
