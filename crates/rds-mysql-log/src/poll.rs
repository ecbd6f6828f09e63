// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One poll cycle: load position, discover files, download and parse each
//! file, emit the records, save position.
//!
//! Nothing that goes wrong inside a cycle is fatal. Listing, download,
//! time parsing, emission and position file failures are logged and the
//! cycle carries on with what it has; the next cycle picks up from the
//! last saved position.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{LogApi, LogFileDescriptor};
use crate::assembler::assemble;
use crate::discovery::discover;
use crate::emitter::RecordEmitter;
use crate::fetcher::fetch_log_file;
use crate::position::{PositionState, PositionStore};
use crate::record::ParsedRecord;

/// What a cycle did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub files_discovered: usize,
    pub files_with_errors: usize,
    pub records_emitted: usize,
    pub records_skipped: usize,
    pub emit_failures: usize,
    pub position_saved: bool,
}

pub struct PollCycle {
    api: Arc<dyn LogApi>,
    emitter: Arc<dyn RecordEmitter>,
    store: PositionStore,
    instance_id: String,
    tag: String,
}

impl PollCycle {
    pub fn new(
        api: Arc<dyn LogApi>,
        emitter: Arc<dyn RecordEmitter>,
        store: PositionStore,
        instance_id: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        PollCycle {
            api,
            emitter,
            store,
            instance_id: instance_id.into(),
            tag: tag.into(),
        }
    }

    /// Downloads and parses one file, advancing `state` for it.
    async fn collect_file(
        &self,
        state: &mut PositionState,
        file: &LogFileDescriptor,
        summary: &mut CycleSummary,
    ) -> Vec<ParsedRecord> {
        let fetched = fetch_log_file(self.api.as_ref(), &self.instance_id, state, file).await;
        if fetched.error.is_some() {
            summary.files_with_errors += 1;
        }
        if fetched.lines.is_empty() {
            return Vec::new();
        }
        assemble(fetched.lines.iter().map(String::as_str), &file.name)
    }

    /// Runs a cycle against `state` without touching the position file or
    /// the emitter. Returns the advanced state and every record, in order.
    pub async fn harvest(&self, mut state: PositionState) -> (PositionState, Vec<ParsedRecord>) {
        let mut summary = CycleSummary::default();
        let files = discover(self.api.as_ref(), &self.instance_id, &state).await;

        let mut records = Vec::new();
        for file in &files {
            records.extend(self.collect_file(&mut state, file, &mut summary).await);
        }
        (state, records)
    }

    async fn emit(&self, record: &ParsedRecord, summary: &mut CycleSummary) {
        let time = match record.event_time() {
            Ok(time) => time,
            Err(err) => {
                warn!(
                    log_file_name = record.log_file_name(),
                    "Skipping record: {err}"
                );
                summary.records_skipped += 1;
                return;
            }
        };
        match self.emitter.emit(&self.tag, time, record).await {
            Ok(()) => summary.records_emitted += 1,
            Err(err) => {
                warn!(
                    log_file_name = record.log_file_name(),
                    error = %err,
                    "Failed to emit record"
                );
                summary.emit_failures += 1;
            }
        }
    }

    pub async fn run(&self) -> CycleSummary {
        let mut summary = CycleSummary::default();
        let mut state = self.store.load();

        let files = discover(self.api.as_ref(), &self.instance_id, &state).await;
        summary.files_discovered = files.len();

        for file in &files {
            let records = self.collect_file(&mut state, file, &mut summary).await;
            debug!(
                log_file_name = %file.name,
                "Emitting {} records",
                records.len()
            );
            for record in &records {
                self.emit(record, &mut summary).await;
            }
        }

        match self.store.save(&state) {
            Ok(()) => summary.position_saved = true,
            Err(err) => warn!(error = %err, "Failed to save position, will retry next cycle"),
        }

        debug!(?summary, "Poll cycle finished");
        summary
    }
}
