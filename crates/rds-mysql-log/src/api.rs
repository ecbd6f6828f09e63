// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Boundary to the remote log API.
//!
//! The harvesting pipeline only ever talks to [`LogApi`]; [`crate::rds::RdsLogApi`]
//! is the production implementation and tests substitute an in-memory one.

use async_trait::async_trait;

use crate::errors::ApiError;

/// One remote log file, as reported by the listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileDescriptor {
    pub name: String,
    /// Epoch milliseconds of the last write to the file.
    pub last_written: i64,
    /// Size in bytes.
    pub size: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLogFilesRequest {
    pub instance_id: String,
    pub max_records: i32,
    /// Only list files written at or after this epoch-millisecond timestamp.
    pub min_last_written: Option<i64>,
    /// Pagination marker returned by the previous page.
    pub marker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilePage {
    pub files: Vec<LogFileDescriptor>,
    /// Present when more pages are available.
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub instance_id: String,
    pub log_file_name: String,
    pub marker: String,
}

/// One batch of newline-delimited log text and the marker to resume from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChunk {
    pub data: String,
    pub next_marker: Option<String>,
    pub more_pending: bool,
}

impl RawChunk {
    /// Splits the chunk into lines, tolerating CRLF. A trailing newline does
    /// not produce an empty last line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.data.lines()
    }
}

#[async_trait]
pub trait LogApi: Send + Sync {
    /// Lists one page of log files for the instance.
    async fn list_log_files(&self, request: &ListLogFilesRequest) -> Result<LogFilePage, ApiError>;

    /// Downloads the portion of a log file that follows `request.marker`.
    async fn download_log_portion(&self, request: &DownloadRequest) -> Result<RawChunk, ApiError>;
}
