//! Plan Commerce - Subscription checkout backend
//!
//! Sells plan subscriptions: opens orders at the catalog price, confirms
//! payments with an external gateway and provisions the purchased plan,
//! cancelling the payment again when provisioning fails.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
