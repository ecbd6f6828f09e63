// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for the log harvesting pipeline.
//!
//! Only [`ConfigError`] is fatal. Everything else is raised inside a poll
//! cycle, where it is logged and the cycle carries on with what it has.

use std::path::PathBuf;

/// Errors raised while building the runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unable to resolve AWS credentials: {0}")]
    Credentials(String),
}

/// Errors returned by the remote log API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("describe_db_log_files failed: {0}")]
    ListLogFiles(String),

    #[error("download_db_log_file_portion failed for {log_file_name}: {message}")]
    DownloadLogPortion {
        log_file_name: String,
        message: String,
    },
}

/// Errors raised while reading or writing the position file.
#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error("failed to read position file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write position file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while pushing a record downstream.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to send record: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}: forward endpoint rejected record: {1}")]
    Status(reqwest::StatusCode, String),
}

/// A record whose `time` field could not be turned into an instant.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unable to parse record time '{0}'")]
pub struct TimeParseError(pub String);
