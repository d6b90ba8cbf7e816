//! Core translation engine module

pub mod client;
pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod models;
pub mod retry;
