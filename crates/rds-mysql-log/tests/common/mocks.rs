// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-ins for the remote log API and the downstream emitter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rds_mysql_log::{
    api::{DownloadRequest, ListLogFilesRequest, LogApi, LogFileDescriptor, LogFilePage, RawChunk},
    emitter::RecordEmitter,
    errors::{ApiError, EmitError},
    record::ParsedRecord,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MockFile {
    lines: Vec<String>,
    last_written: i64,
}

/// Models an RDS instance's log files. Markers are `1:<line offset>` and
/// each download returns at most `portion_lines` lines.
#[allow(dead_code)]
pub struct MockLogApi {
    files: Mutex<BTreeMap<String, MockFile>>,
    portion_lines: usize,
    failing_downloads: Mutex<HashSet<String>>,
    fail_listing: Mutex<bool>,
    pub list_requests: Mutex<Vec<ListLogFilesRequest>>,
    pub download_requests: Mutex<Vec<DownloadRequest>>,
}

#[allow(dead_code)]
impl MockLogApi {
    pub fn new(portion_lines: usize) -> Self {
        MockLogApi {
            files: Mutex::new(BTreeMap::new()),
            portion_lines,
            failing_downloads: Mutex::new(HashSet::new()),
            fail_listing: Mutex::new(false),
            list_requests: Mutex::new(Vec::new()),
            download_requests: Mutex::new(Vec::new()),
        }
    }

    /// Appends lines to a log file, creating it if needed, and bumps its
    /// last-written time.
    pub fn append(&self, name: &str, last_written: i64, lines: &[&str]) {
        let mut files = self.files.lock().unwrap();
        let file = files.entry(name.to_string()).or_default();
        file.lines.extend(lines.iter().map(|line| line.to_string()));
        file.last_written = last_written;
    }

    pub fn fail_downloads_of(&self, name: &str) {
        self.failing_downloads
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }

    pub fn last_list_request(&self) -> ListLogFilesRequest {
        self.list_requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no listing call made")
    }

    pub fn download_markers(&self, name: &str) -> Vec<String> {
        self.download_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.log_file_name == name)
            .map(|request| request.marker.clone())
            .collect()
    }
}

fn offset_of(marker: &str) -> usize {
    marker
        .split_once(':')
        .and_then(|(_, offset)| offset.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl LogApi for MockLogApi {
    async fn list_log_files(&self, request: &ListLogFilesRequest) -> Result<LogFilePage, ApiError> {
        self.list_requests.lock().unwrap().push(request.clone());
        if *self.fail_listing.lock().unwrap() {
            return Err(ApiError::ListLogFiles("DBInstanceNotFound".to_string()));
        }

        let files: Vec<LogFileDescriptor> = self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, file)| {
                request
                    .min_last_written
                    .map_or(true, |min| file.last_written >= min)
            })
            .map(|(name, file)| LogFileDescriptor {
                name: name.clone(),
                last_written: file.last_written,
                size: file.lines.iter().map(|line| line.len() as i64 + 1).sum(),
            })
            .collect();

        let start: usize = request
            .marker
            .as_deref()
            .and_then(|marker| marker.parse().ok())
            .unwrap_or(0);
        let end = (start + request.max_records as usize).min(files.len());
        Ok(LogFilePage {
            files: files[start..end].to_vec(),
            next_marker: (end < files.len()).then(|| end.to_string()),
        })
    }

    async fn download_log_portion(&self, request: &DownloadRequest) -> Result<RawChunk, ApiError> {
        self.download_requests.lock().unwrap().push(request.clone());
        if self
            .failing_downloads
            .lock()
            .unwrap()
            .contains(&request.log_file_name)
        {
            return Err(ApiError::DownloadLogPortion {
                log_file_name: request.log_file_name.clone(),
                message: "DBLogFileNotFoundFault".to_string(),
            });
        }

        let files = self.files.lock().unwrap();
        let lines = files
            .get(&request.log_file_name)
            .map(|file| file.lines.as_slice())
            .unwrap_or_default();
        let start = offset_of(&request.marker).min(lines.len());
        let end = (start + self.portion_lines).min(lines.len());

        let mut data = lines[start..end].join("\n");
        if !data.is_empty() {
            data.push('\n');
        }
        Ok(RawChunk {
            data,
            next_marker: Some(format!("1:{end}")),
            more_pending: end < lines.len(),
        })
    }
}

/// Keeps every emitted record in memory.
#[derive(Default)]
#[allow(dead_code)]
pub struct CollectingEmitter {
    pub emitted: Mutex<Vec<(String, DateTime<Utc>, ParsedRecord)>>,
    pub fail: Mutex<bool>,
}

#[allow(dead_code)]
impl CollectingEmitter {
    pub fn records(&self) -> Vec<ParsedRecord> {
        self.emitted
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, record)| record.clone())
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records()
            .iter()
            .map(|record| record.message().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.emitted.lock().unwrap().clear();
    }
}

#[async_trait]
impl RecordEmitter for CollectingEmitter {
    async fn emit(
        &self,
        tag: &str,
        time: DateTime<Utc>,
        record: &ParsedRecord,
    ) -> Result<(), EmitError> {
        if *self.fail.lock().unwrap() {
            return Err(EmitError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "downstream closed",
            )));
        }
        self.emitted
            .lock()
            .unwrap()
            .push((tag.to_string(), time, record.clone()));
        Ok(())
    }
}
