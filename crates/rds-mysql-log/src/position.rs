// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Durable record of how far each remote log file has been read.
//!
//! The position file is plain text: the global last-written watermark on a
//! line of its own, then one `<log file name>\t<marker>` line per tracked
//! file.
//!
//! ```text
//! 1742515204000
//! audit/server_audit.log.1	4:102934
//! error/mysql-error.log	12:88123
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::errors::PositionError;

/// The one log file whose marker is never persisted.
pub const UNTRACKED_LOG_FILE: &str = "audit/server_audit.log";

/// Whether a log file's marker is carried across cycles.
pub fn trackable(log_file_name: &str) -> bool {
    log_file_name != UNTRACKED_LOG_FILE
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionState {
    /// Highest `last_written` seen across all discovered log files. Never decreases.
    pub global_watermark: i64,
    /// Resume marker per log file name. Unfiltered while a cycle runs; the
    /// untracked name is dropped only when the state is rendered.
    pub markers: BTreeMap<String, String>,
}

impl PositionState {
    pub fn observe_last_written(&mut self, last_written: i64) {
        self.global_watermark = self.global_watermark.max(last_written);
    }

    /// Marker to start downloading `log_file_name` from.
    pub fn start_marker(&self, log_file_name: &str) -> String {
        if !trackable(log_file_name) {
            return "0".to_string();
        }
        self.markers
            .get(log_file_name)
            .cloned()
            .unwrap_or_else(|| "0".to_string())
    }

    /// Parses position file contents. Malformed lines are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut state = PositionState::default();
        for line in contents.lines() {
            if !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit()) {
                match line.parse::<i64>() {
                    Ok(watermark) => state.global_watermark = watermark,
                    Err(err) => debug!("Ignoring out of range watermark {line}: {err}"),
                }
                continue;
            }
            if let Some((name, marker)) = line.rsplit_once('\t') {
                if !name.is_empty() && !marker.is_empty() {
                    state.markers.insert(name.to_string(), marker.to_string());
                }
            }
        }
        state
    }

    /// Renders the state in position file format, leaving out untracked files.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.global_watermark);
        for (name, marker) in self.markers.iter().filter(|(name, _)| trackable(name)) {
            out.push_str(name);
            out.push('\t');
            out.push_str(marker);
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PositionStore { path: path.into() }
    }

    /// Creates an empty position file if none exists yet.
    pub fn touch(&self) -> Result<(), PositionError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map(|_| ())
            .map_err(|source| PositionError::Write {
                path: self.path.clone(),
                source,
            })
    }

    pub fn try_load(&self) -> Result<PositionState, PositionError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(PositionState::parse(&contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(PositionState::default()),
            Err(source) => Err(PositionError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Loads the position state. A missing or unreadable file yields an
    /// empty state.
    pub fn load(&self) -> PositionState {
        match self.try_load() {
            Ok(state) => {
                debug!(
                    path = %self.path.display(),
                    watermark = state.global_watermark,
                    markers = state.markers.len(),
                    "Loaded position file"
                );
                state
            }
            Err(err) => {
                warn!(error = %err, "Position file unreadable, starting from empty state");
                PositionState::default()
            }
        }
    }

    /// Replaces the position file with `state`. The new contents are
    /// written to a sibling file and renamed into place.
    pub fn save(&self, state: &PositionState) -> Result<(), PositionError> {
        let write_err = |source: std::io::Error| PositionError::Write {
            path: self.path.clone(),
            source,
        };

        let tmp_path = self.tmp_path();
        let mut file = File::create(&tmp_path).map_err(write_err)?;
        file.write_all(state.render().as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(write_err)?;
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(err));
        }

        debug!(
            path = %self.path.display(),
            watermark = state.global_watermark,
            "Wrote position file"
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
