//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Session validators (JWT, mock)
//! - `gateway` - Payment gateways (HTTP processor, mock/simulation)
//! - `http` - axum REST API
//! - `memory` - In-memory storage and static terms
//! - `postgres` - sqlx storage

pub mod auth;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod postgres;
