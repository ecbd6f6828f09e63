// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! [`LogApi`] backed by the Amazon RDS API.
//!
//! Uses `aws-sdk-rds` for `DescribeDBLogFiles` and
//! `DownloadDBLogFilePortion`; SigV4 signing, credential refresh and the
//! SDK's own retries come with the client.

use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_rds::error::DisplayErrorContext;
use aws_sdk_rds::Client as RdsClient;
use tracing::{debug, warn};

use crate::api::{
    DownloadRequest, ListLogFilesRequest, LogApi, LogFileDescriptor, LogFilePage, RawChunk,
};
use crate::config::Config;
use crate::errors::{ApiError, ConfigError};

pub struct RdsLogApi {
    client: RdsClient,
}

impl std::fmt::Debug for RdsLogApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdsLogApi").finish_non_exhaustive()
    }
}

impl RdsLogApi {
    pub fn from_client(client: RdsClient) -> Self {
        RdsLogApi { client }
    }

    /// Builds the client from configuration. Fails if no credentials resolve.
    pub async fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(credentials) = &config.credentials {
            let credentials = aws_sdk_rds::config::Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                None,
                None,
                "rds-mysql-log",
            );
            loader = loader.credentials_provider(credentials);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        let missing = config.missing_credential.unwrap_or("access_key_id");
        let provider = sdk_config
            .credentials_provider()
            .ok_or(ConfigError::Missing(missing))?;
        if let Err(err) = provider.provide_credentials().await {
            warn!("Unable to resolve ambient AWS credentials: {err}");
            return match config.credentials {
                Some(_) => Err(ConfigError::Credentials(err.to_string())),
                None => Err(ConfigError::Missing(missing)),
            };
        }

        debug!(
            region = %config.region,
            static_credentials = config.credentials.is_some(),
            "RDS client initialized"
        );
        Ok(RdsLogApi::from_client(RdsClient::new(&sdk_config)))
    }
}

#[async_trait]
impl LogApi for RdsLogApi {
    async fn list_log_files(&self, request: &ListLogFilesRequest) -> Result<LogFilePage, ApiError> {
        let output = self
            .client
            .describe_db_log_files()
            .db_instance_identifier(&request.instance_id)
            .max_records(request.max_records)
            .set_file_last_written(request.min_last_written)
            .set_marker(request.marker.clone())
            .send()
            .await
            .map_err(|err| ApiError::ListLogFiles(DisplayErrorContext(&err).to_string()))?;

        let files = output
            .describe_db_log_files()
            .iter()
            .filter_map(|details| {
                let name = details.log_file_name()?;
                Some(LogFileDescriptor {
                    name: name.to_string(),
                    last_written: details.last_written().unwrap_or_default(),
                    size: details.size().unwrap_or_default(),
                })
            })
            .collect();

        Ok(LogFilePage {
            files,
            next_marker: output.marker().map(str::to_string),
        })
    }

    async fn download_log_portion(&self, request: &DownloadRequest) -> Result<RawChunk, ApiError> {
        let output = self
            .client
            .download_db_log_file_portion()
            .db_instance_identifier(&request.instance_id)
            .log_file_name(&request.log_file_name)
            .marker(&request.marker)
            .send()
            .await
            .map_err(|err| ApiError::DownloadLogPortion {
                log_file_name: request.log_file_name.clone(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(RawChunk {
            data: output.log_file_data().unwrap_or_default().to_string(),
            next_marker: output.marker().map(str::to_string),
            more_pending: output.additional_data_pending().unwrap_or(false),
        })
    }
}
