//! HTTP API for the club ledger: routing, identity, and request/response
//! mapping.

pub mod app;
pub mod context;
pub mod middleware;
