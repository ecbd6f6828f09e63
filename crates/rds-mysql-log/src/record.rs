// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Structured records reconstructed from RDS MySQL log lines.
//!
//! A record is either an audit log entry (MariaDB audit plugin CSV format)
//! or a server log entry (error/general log format). Both serialize as a
//! flat map of named fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;

use crate::errors::TimeParseError;

/// Severity attached to every audit record.
pub const AUDIT_DETECTED_LEVEL: &str = "info";

/// One line of the audit log, plus any continuation lines folded into `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub time: String,
    pub serverhost: String,
    pub host: String,
    pub user: String,
    pub database: String,
    pub queryid: String,
    pub connectionid: String,
    pub operation: String,
    /// Query text without the surrounding quotes.
    pub message: String,
    pub return_code: String,
    pub log_file_name: String,
    pub detected_level: &'static str,
}

/// One line of the error/general log, plus any continuation lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRecord {
    pub time: String,
    pub thread_id: String,
    pub severity: String,
    pub error_code: String,
    pub subsystem: String,
    pub message: String,
    pub log_file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParsedRecord {
    Audit(AuditRecord),
    Server(ServerRecord),
}

impl ParsedRecord {
    pub fn time(&self) -> &str {
        match self {
            ParsedRecord::Audit(record) => &record.time,
            ParsedRecord::Server(record) => &record.time,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParsedRecord::Audit(record) => &record.message,
            ParsedRecord::Server(record) => &record.message,
        }
    }

    pub fn log_file_name(&self) -> &str {
        match self {
            ParsedRecord::Audit(record) => &record.log_file_name,
            ParsedRecord::Server(record) => &record.log_file_name,
        }
    }

    /// Folds a line that did not start a record into this record's message.
    pub fn append_continuation(&mut self, line: &str) {
        let message = match self {
            ParsedRecord::Audit(record) => &mut record.message,
            ParsedRecord::Server(record) => &mut record.message,
        };
        message.push('\n');
        message.push_str(line);
    }

    /// Derives the instant the record was written from its `time` field.
    ///
    /// RDS writes both formats in UTC, so naive timestamps are taken as UTC.
    pub fn event_time(&self) -> Result<DateTime<Utc>, TimeParseError> {
        let naive = match self {
            ParsedRecord::Audit(record) => parse_audit_time(&record.time),
            ParsedRecord::Server(record) => parse_server_time(&record.time),
        };
        naive
            .map(|time| time.and_utc())
            .ok_or_else(|| TimeParseError(self.time().to_string()))
    }
}

/// `YYYYMMDD HH:MM:SS`, with the time of day optional.
fn parse_audit_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    let (date, time) = match value.split_once(' ') {
        Some((date, time)) => (date, time.trim()),
        None => (value, ""),
    };
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = date.get(0..4)?.parse::<i32>().ok()?;
    let month = date.get(4..6)?.parse::<u32>().ok()?;
    let day = date.get(6..8)?.parse::<u32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = if time.is_empty() {
        NaiveTime::MIN
    } else {
        NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?
    };
    Some(date.and_time(time))
}

/// `YYYY-MM-DDTHH:MM:SS.ffffffZ`, with the fraction, the `Z` and the whole
/// time of day optional.
fn parse_server_time(value: &str) -> Option<NaiveDateTime> {
    let (date, time) = value.trim().split_once('T')?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = time.trim_end_matches('Z');
    let time = if time.is_empty() {
        NaiveTime::MIN
    } else {
        NaiveTime::parse_from_str(time, "%H:%M:%S%.f").ok()?
    };
    Some(date.and_time(time))
}
