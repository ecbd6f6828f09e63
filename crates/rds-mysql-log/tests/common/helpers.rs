// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for poll cycle integration tests

use rds_mysql_log::{poll::PollCycle, position::PositionStore};
use std::path::Path;
use std::sync::Arc;

use super::mocks::{CollectingEmitter, MockLogApi};

pub const INSTANCE_ID: &str = "mysql-prod-1";
pub const TAG: &str = "rds-mysql.log";

pub const ERROR_LOG: &str = "error/mysql-error.log";
pub const ROTATED_AUDIT_LOG: &str = "audit/server_audit.log.1";
pub const UNTRACKED_AUDIT_LOG: &str = "audit/server_audit.log";

#[allow(dead_code)]
pub fn server_line(second: u32, message: &str) -> String {
    format!("2025-03-21T00:00:{second:02}.275032Z 4071946 [Warning] [MY-010055] [Server] {message}")
}

#[allow(dead_code)]
pub fn audit_line(second: u32, query: &str) -> String {
    format!("20250403 19:41:{second:02},ip-1-1-1-1,service,1.2.3.4,12345678,1234567890,QUERY,test_db,'{query}',0,,")
}

pub fn poll_cycle(
    api: &Arc<MockLogApi>,
    emitter: &Arc<CollectingEmitter>,
    pos_file: &Path,
) -> PollCycle {
    PollCycle::new(
        Arc::clone(api) as _,
        Arc::clone(emitter) as _,
        PositionStore::new(pos_file),
        INSTANCE_ID,
        TAG,
    )
}
