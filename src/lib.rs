//! Translation Client - concurrent batch document translation
//!
//! This library submits documents to a remote translation service over HTTP,
//! bounds the number of in-flight calls, retries transient failures, and
//! reports a fingerprinted outcome for every input file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod processors;

// Re-export key types for convenience
pub use crate::core::{
    client::{TranslationClient, TranslationEndpoint},
    config::ClientConfig,
    errors::TranslationError,
    fingerprint::fingerprint,
    models::{TranslationJob, TranslationResult, TranslationSettings},
    retry::RetryPolicy,
};

pub use crate::processors::{
    discovery::{discover_files, map_output_path, ExtensionFilter},
    dispatcher::{run_batch, BatchDispatcher, BatchOutcome, JobReport, JobStatus, PathPair},
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
