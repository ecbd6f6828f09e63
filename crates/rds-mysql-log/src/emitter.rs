// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Downstream emission of finalized records.
//!
//! Every record goes out as a JSON envelope carrying the configured tag,
//! the record's event time and the record's fields:
//!
//! ```json
//! {"tag":"rds-mysql.log","time":"2025-03-21T00:00:04.275032Z","record":{"time":"...","message":"..."}}
//! ```
//!
//! Emission is fire-and-forget: a failure is reported to the caller, which
//! logs it, and the record is not retried.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

use crate::errors::EmitError;
use crate::record::ParsedRecord;

#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub tag: &'a str,
    pub time: String,
    pub record: &'a ParsedRecord,
}

impl<'a> Envelope<'a> {
    pub fn new(tag: &'a str, time: DateTime<Utc>, record: &'a ParsedRecord) -> Self {
        Envelope {
            tag,
            time: time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            record,
        }
    }
}

#[async_trait]
pub trait RecordEmitter: Send + Sync {
    async fn emit(
        &self,
        tag: &str,
        time: DateTime<Utc>,
        record: &ParsedRecord,
    ) -> Result<(), EmitError>;
}

/// Writes one JSON envelope per line to a writer, stdout by default.
pub struct JsonLinesEmitter<W> {
    writer: Mutex<W>,
}

impl JsonLinesEmitter<io::Stdout> {
    pub fn stdout() -> Self {
        JsonLinesEmitter::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesEmitter<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesEmitter {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<W: Write + Send> RecordEmitter for JsonLinesEmitter<W> {
    async fn emit(
        &self,
        tag: &str,
        time: DateTime<Utc>,
        record: &ParsedRecord,
    ) -> Result<(), EmitError> {
        let mut line = serde_json::to_vec(&Envelope::new(tag, time, record))?;
        line.push(b'\n');

        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}

/// POSTs each envelope as JSON to a forward endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmitter {
    client: reqwest::Client,
    url: String,
}

impl HttpEmitter {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        https_proxy: Option<&str>,
    ) -> Result<Self, EmitError> {
        let mut builder = reqwest::Client::builder().use_rustls_tls().timeout(timeout);
        if let Some(proxy) = https_proxy {
            builder = builder.proxy(reqwest::Proxy::https(proxy)?);
        }
        Ok(HttpEmitter {
            client: builder.build()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RecordEmitter for HttpEmitter {
    async fn emit(
        &self,
        tag: &str,
        time: DateTime<Utc>,
        record: &ParsedRecord,
    ) -> Result<(), EmitError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Envelope::new(tag, time, record))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmitError::Status(status, body));
        }
        debug!("Forwarded record from {}", record.log_file_name());
        Ok(())
    }
}
