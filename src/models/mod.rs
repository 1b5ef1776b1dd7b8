//! Request and Response models for the cache service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_key, ResolveRequest, SetValueRequest, MAX_RESOLVE_BATCH};
pub use responses::{
    DeleteResponse, ErrorResponse, GetResponse, GroupStats, HealthResponse, ResolveResponse,
    SetResponse, StatsResponse,
};
