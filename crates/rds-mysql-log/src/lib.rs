// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Incremental harvesting of Amazon RDS for MySQL/MariaDB log files.
//!
//! Each poll cycle lists the instance's log files, downloads whatever was
//! written since the last cycle, reassembles multi-line records from the
//! audit log and error/general log formats, and hands them to a
//! [`emitter::RecordEmitter`]. Progress is kept in a flat position file
//! (see [`position`]) so restarts neither lose nor re-emit data.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod api;
pub mod assembler;
pub mod config;
pub mod discovery;
pub mod emitter;
pub mod errors;
pub mod fetcher;
pub mod poll;
pub mod position;
pub mod rds;
pub mod record;
