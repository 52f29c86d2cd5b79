//! Dispatch error types.
//!
//! Handler failures never surface here; they are contained per task and
//! reported as [`Outcome::Failed`](noderig_rewrite::Outcome). What remains
//! is configuration trouble and a driver that never reaches a fixpoint.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by configuration loading and the host-cycle driver.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`DispatchConfig`](crate::DispatchConfig).
    #[error("invalid config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value '{value}' for {key}")]
    InvalidSetting { key: String, value: String },

    /// Rewrites kept producing changes past the cycle limit.
    #[error("dispatcher did not settle after {cycles} cycles ({pending} task(s) pending)")]
    Unsettled { cycles: usize, pending: usize },
}
