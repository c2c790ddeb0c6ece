//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Transactional booking store, reader, and directory
//! - `memory` - In-memory store and directory for tests and local runs
//! - `stripe` - Hosted checkout gateway and its mock
//! - `http` - Axum REST API

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
