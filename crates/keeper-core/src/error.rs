// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keeper backup engine.

use thiserror::Error;

/// The primary error type used across collaborator traits and engine operations.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// Configuration errors detected outside the config loader.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage errors (listing, copying or reading artifacts and state files).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The artifact producer could not be started or exited unsuccessfully.
    #[error("artifact producer failed for unit `{unit}`: {message}")]
    Producer { unit: String, message: String },

    /// The producer reported success but an expected artifact is absent.
    #[error("missing {category} artifact for unit `{unit}`: {path}")]
    MissingArtifact {
        unit: String,
        category: String,
        path: String,
    },

    /// An excess artifact could not be deleted during a retention pass.
    #[error("failed to delete {artifact}: {source}")]
    Retention {
        artifact: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A unit name contains characters that would make artifact names ambiguous.
    #[error("invalid unit name `{0}`: must be lowercase alphanumeric with hyphens")]
    InvalidUnitName(String),

    /// The requested unit is not registered.
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),

    /// A live scheduler already owns the pid file.
    #[error("scheduler already running (pid {pid})")]
    SchedulerAlreadyRunning { pid: u32 },

    /// No live scheduler is recorded in the pid file.
    #[error("scheduler not running (pid file {pid_file})")]
    SchedulerNotRunning { pid_file: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeeperError {
    /// Wrap an I/O (or any other) error as a storage error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        KeeperError::Storage {
            source: source.into(),
        }
    }
}

impl From<std::io::Error> for KeeperError {
    fn from(err: std::io::Error) -> Self {
        KeeperError::storage(err)
    }
}
