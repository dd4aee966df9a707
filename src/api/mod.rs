//! HTTP API: routing, handlers, request/response types and errors.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod types;
