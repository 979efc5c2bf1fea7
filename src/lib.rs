//! Library crate for the spectator controller, exposing modules for binaries and integration tests.

pub mod config;
pub mod dto;
pub mod error;
pub mod provider;
pub mod routes;
pub mod services;
pub mod state;
