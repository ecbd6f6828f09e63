// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Discovery of the remote log files to read this cycle.
//!
//! Once any audit log is being tracked, every log file is listed on each
//! cycle because audit files are resumed by marker and rotate without
//! reliably moving their last-written time past the watermark. Otherwise
//! only files written at or after the watermark are listed.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::api::{ListLogFilesRequest, LogApi, LogFileDescriptor};
use crate::errors::ApiError;
use crate::position::PositionState;

/// Page size for the listing call.
pub const LIST_PAGE_SIZE: i32 = 10;

fn audit_log_regex() -> &'static Regex {
    static AUDIT_LOG_REGEX: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    AUDIT_LOG_REGEX
        .get_or_init(|| Regex::new(r"(?i)server_audit\.log(\.\d+)?$").expect("audit log regex is valid"))
}

/// Whether a log file name looks like a (possibly rotated) audit log.
pub fn is_audit_log(log_file_name: &str) -> bool {
    audit_log_regex().is_match(log_file_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// List every file, no time filter.
    Audit,
    /// List files written at or after the watermark.
    Incremental { min_last_written: i64 },
}

impl DiscoveryMode {
    pub fn for_state(state: &PositionState) -> Self {
        if state.markers.keys().any(|name| is_audit_log(name)) {
            DiscoveryMode::Audit
        } else {
            DiscoveryMode::Incremental {
                min_last_written: state.global_watermark,
            }
        }
    }

    fn min_last_written(self) -> Option<i64> {
        match self {
            DiscoveryMode::Audit => None,
            DiscoveryMode::Incremental { min_last_written } => Some(min_last_written),
        }
    }
}

/// Lists every page of log files for `mode`.
pub async fn list_all(
    api: &dyn LogApi,
    instance_id: &str,
    mode: DiscoveryMode,
) -> Result<Vec<LogFileDescriptor>, ApiError> {
    let mut request = ListLogFilesRequest {
        instance_id: instance_id.to_string(),
        max_records: LIST_PAGE_SIZE,
        min_last_written: mode.min_last_written(),
        marker: None,
    };
    let mut seen_markers = HashSet::new();
    let mut files = Vec::new();

    loop {
        let page = api.list_log_files(&request).await?;
        files.extend(page.files);
        match page.next_marker {
            Some(marker) if seen_markers.insert(marker.clone()) => request.marker = Some(marker),
            Some(marker) => {
                warn!("Listing returned pagination marker {marker} twice, stopping");
                break;
            }
            None => break,
        }
    }
    Ok(files)
}

/// Returns the log files to read this cycle. A listing failure is logged
/// and yields no files.
pub async fn discover(
    api: &dyn LogApi,
    instance_id: &str,
    state: &PositionState,
) -> Vec<LogFileDescriptor> {
    let mode = DiscoveryMode::for_state(state);
    debug!(
        db_instance_identifier = instance_id,
        watermark = state.global_watermark,
        "Listing log files ({mode:?})"
    );
    match list_all(api, instance_id, mode).await {
        Ok(files) => files,
        Err(err) => {
            warn!(error = %err, "Failed to list log files");
            Vec::new()
        }
    }
}
