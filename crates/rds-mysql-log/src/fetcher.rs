// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Incremental download of one remote log file.
//!
//! The download API hands out at most one portion per call together with
//! the marker to resume from and a flag telling whether more data is
//! pending. [`fetch_log_file`] keeps calling it until the file is drained
//! and advances the file's marker in the position state as data arrives.

use tracing::{debug, warn};

use crate::api::{DownloadRequest, LogApi, LogFileDescriptor};
use crate::errors::ApiError;
use crate::position::{trackable, PositionState};

/// Lines downloaded for one log file during a cycle.
#[derive(Debug, Default)]
pub struct FetchedLines {
    pub lines: Vec<String>,
    /// Download calls that returned data.
    pub portions: usize,
    /// Set when the download loop was cut short by an API error. The
    /// lines gathered before the error are still in `lines`.
    pub error: Option<ApiError>,
}

/// Downloads everything after the stored marker of `file`.
///
/// Also raises the global watermark to the file's last-written time. The
/// marker for `file` only moves when a call returns non-empty data, and
/// never for the untracked audit file.
pub async fn fetch_log_file(
    api: &dyn LogApi,
    instance_id: &str,
    state: &mut PositionState,
    file: &LogFileDescriptor,
) -> FetchedLines {
    state.observe_last_written(file.last_written);

    let mut request = DownloadRequest {
        instance_id: instance_id.to_string(),
        log_file_name: file.name.clone(),
        marker: state.start_marker(&file.name),
    };
    let track = trackable(&file.name);
    let mut fetched = FetchedLines::default();

    debug!(
        log_file_name = %file.name,
        marker = %request.marker,
        "Downloading log file portion"
    );

    loop {
        let chunk = match api.download_log_portion(&request).await {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!(
                    log_file_name = %file.name,
                    error = %err,
                    "Download failed, keeping {} lines already fetched",
                    fetched.lines.len()
                );
                fetched.error = Some(err);
                break;
            }
        };

        if !chunk.data.is_empty() {
            fetched.portions += 1;
            fetched.lines.extend(chunk.lines().map(str::to_string));
            if track {
                if let Some(marker) = &chunk.next_marker {
                    state.markers.insert(file.name.clone(), marker.clone());
                }
            }
        }

        if !chunk.more_pending {
            break;
        }
        match chunk.next_marker {
            Some(marker) if marker != request.marker || !chunk.data.is_empty() => {
                request.marker = marker;
            }
            Some(marker) => {
                warn!(
                    log_file_name = %file.name,
                    "Download reported pending data but marker {marker} did not move"
                );
                break;
            }
            None => {
                warn!(
                    log_file_name = %file.name,
                    "Download reported pending data without a marker"
                );
                break;
            }
        }
    }

    debug!(
        log_file_name = %file.name,
        lines = fetched.lines.len(),
        portions = fetched.portions,
        "Finished downloading log file"
    );
    fetched
}
