// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line classification and multi-line record reassembly.
//!
//! Every raw line is matched against a single regex with two alternatives,
//! one for the audit log CSV format and one for the server (error/general)
//! log format. A matching line opens a new record; a line that matches
//! neither format is a continuation of the record currently open, for
//! example the rest of a multi-line query or stack of notes.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::trace;

use crate::record::{AuditRecord, ParsedRecord, ServerRecord, AUDIT_DETECTED_LEVEL};

// timestamp,serverhost,username,host,connectionid,queryid,operation,database,'query',retcode,
const AUDIT_LINE: &str = r"(?P<audit>(?P<timestamp>[0-9]{8}[ \t](?:[0-9]{2}:[0-9]{2}:[0-9]{2})?),(?P<serverhost>[^,]+?),(?P<username>[^,]+?),(?P<host>[^,]+?),(?P<connectionid>[^,]+?),(?P<queryid>[^,]+?),(?P<operation>[^,]+?),(?P<database>[^,]+?),'(?P<query>.*?)',(?P<retcode>[0-9]*)(?:,,?)?)";

// time thread_id [severity] [error_code] [subsystem] message
const SERVER_LINE: &str = r"(?P<server>(?P<time>[0-9]{4}-[0-9]{2}-[0-9]{2}T(?:[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?Z?)?)[ \t](?P<thread_id>[0-9]+)[ \t]\[(?P<severity>[^\]]*)\][ \t]\[(?P<error_code>[^\]]*)\][ \t]\[(?P<subsystem>[^\]]*)\](?:[ \t](?P<message>.*))?)";

fn line_regex() -> &'static Regex {
    static LINE_REGEX: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    LINE_REGEX.get_or_init(|| {
        Regex::new(&format!("^(?:{AUDIT_LINE}|{SERVER_LINE})$"))
            .expect("log line regex is valid")
    })
}

fn capture(captures: &Captures<'_>, name: &str) -> String {
    captures
        .name(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Classifies one line. Returns the record it starts, or `None` for a
/// continuation line.
pub fn parse_line(line: &str, log_file_name: &str) -> Option<ParsedRecord> {
    let captures = line_regex().captures(line)?;

    if captures.name("audit").is_some() {
        return Some(ParsedRecord::Audit(AuditRecord {
            time: capture(&captures, "timestamp"),
            serverhost: capture(&captures, "serverhost"),
            host: capture(&captures, "host"),
            user: capture(&captures, "username"),
            database: capture(&captures, "database"),
            queryid: capture(&captures, "queryid"),
            connectionid: capture(&captures, "connectionid"),
            operation: capture(&captures, "operation"),
            message: capture(&captures, "query"),
            return_code: capture(&captures, "retcode"),
            log_file_name: log_file_name.to_string(),
            detected_level: AUDIT_DETECTED_LEVEL,
        }));
    }

    Some(ParsedRecord::Server(ServerRecord {
        time: capture(&captures, "time"),
        thread_id: capture(&captures, "thread_id"),
        severity: capture(&captures, "severity"),
        error_code: capture(&captures, "error_code"),
        subsystem: capture(&captures, "subsystem"),
        message: capture(&captures, "message"),
        log_file_name: log_file_name.to_string(),
    }))
}

/// Single left-to-right scan with one pending record slot.
#[derive(Debug)]
pub struct RecordAssembler<'a> {
    log_file_name: &'a str,
    pending: Option<ParsedRecord>,
    finished: Vec<ParsedRecord>,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(log_file_name: &'a str) -> Self {
        RecordAssembler {
            log_file_name,
            pending: None,
            finished: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        match parse_line(line, self.log_file_name) {
            Some(record) => {
                if let Some(done) = self.pending.replace(record) {
                    self.finished.push(done);
                }
            }
            None => match self.pending.as_mut() {
                Some(record) => record.append_continuation(line),
                None => trace!(
                    log_file_name = self.log_file_name,
                    "Dropping line with no record to continue: {line}"
                ),
            },
        }
    }

    /// Closes the pending record and returns everything assembled, in order.
    pub fn finish(mut self) -> Vec<ParsedRecord> {
        if let Some(done) = self.pending.take() {
            self.finished.push(done);
        }
        self.finished
    }
}

pub fn assemble<'l, I>(lines: I, log_file_name: &str) -> Vec<ParsedRecord>
where
    I: IntoIterator<Item = &'l str>,
{
    let mut assembler = RecordAssembler::new(log_file_name);
    for line in lines {
        assembler.push_line(line);
    }
    assembler.finish()
}
