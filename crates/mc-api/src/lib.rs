//! HTTP surface of the MutualCloud gateway.

pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod views;
