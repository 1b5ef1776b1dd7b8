//! API Module
//!
//! HTTP handlers and routing for the cache service REST API.
//!
//! # Endpoints
//! - `GET|PUT|DELETE /cache/:group/:key` - Plain key operations
//! - `GET|PUT /cache/:group/:key/:field` - Hash field operations
//! - `POST /urls/resolve` - Signed URL resolution
//! - `GET /stats` - Local-tier statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
