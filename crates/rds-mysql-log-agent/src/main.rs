// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process, sync::Arc};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use rds_mysql_log::{
    api::LogApi,
    config::Config,
    emitter::{HttpEmitter, JsonLinesEmitter, RecordEmitter},
    poll::PollCycle,
    position::PositionStore,
    rds::RdsLogApi,
};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("RDS_MYSQL_LOG_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    // stdout carries emitted records
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter(&log_level))
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Error creating config on rds mysql log agent startup: {e}");
            process::exit(1);
        }
    };

    let api: Arc<dyn LogApi> = match RdsLogApi::from_config(&config).await {
        Ok(api) => Arc::new(api),
        Err(e) => {
            error!("Error creating RDS client: {e}");
            process::exit(1);
        }
    };

    let emitter: Arc<dyn RecordEmitter> = match config.forward_url.as_deref() {
        Some(url) => {
            match HttpEmitter::new(url, config.forward_timeout(), config.https_proxy.as_deref()) {
                Ok(emitter) => Arc::new(emitter),
                Err(e) => {
                    error!("Error creating forwarding client: {e}");
                    process::exit(1);
                }
            }
        }
        None => Arc::new(JsonLinesEmitter::stdout()),
    };

    let store = PositionStore::new(config.pos_file.clone());
    if let Err(e) = store.touch() {
        warn!("Unable to create position file, continuing: {e}");
    }

    let cycle = PollCycle::new(
        api,
        emitter,
        store,
        config.db_instance_identifier.as_str(),
        config.tag.as_str(),
    );

    let cancel_token = CancellationToken::new();
    spawn_shutdown_listener(cancel_token.clone());

    info!(
        db_instance_identifier = %config.db_instance_identifier,
        pos_file = %config.pos_file.display(),
        "Polling every {}s",
        config.refresh_interval_secs
    );

    let mut refresh_interval = interval(config.refresh_interval());
    refresh_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = refresh_interval.tick() => {}
            _ = cancel_token.cancelled() => break,
        }

        // a started cycle always runs to completion
        let summary = cycle.run().await;
        if summary.files_with_errors > 0 || !summary.position_saved {
            warn!(?summary, "Poll cycle finished with errors");
        }
    }

    info!("Shutting down rds mysql log agent");
}

fn filter_directives(log_level: &str) -> String {
    format!("h2=off,hyper=off,rustls=off,aws_smithy_runtime=off,aws_config=off,{log_level}")
}

/// Falls back to `info` when the level does not parse; the config check
/// then reports the bad value.
fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(filter_directives(log_level))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives("info")))
}

fn spawn_shutdown_listener(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(e) => {
                    warn!("Unable to listen for SIGTERM: {e}");
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        debug!("Shutdown signal received");
        cancel_token.cancel();
    });
}
