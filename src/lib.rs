// Library exports for Warbler
// This allows integration tests and the binary to share one set of modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod social;
pub mod state;
