// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External command artifact producer.
//!
//! Runs `command args... <unit>` and tells the command where to write via
//! environment variables:
//!
//! | variable                    | value                                   |
//! |-----------------------------|-----------------------------------------|
//! | `BACKUP_UNIT`               | unit name                               |
//! | `BACKUP_APP_ARTIFACT`       | path of the application artifact        |
//! | `BACKUP_DB_ARTIFACT`        | path of the database artifact           |
//! | `BACKUP_START_DEPENDENCIES` | `1` to start stopped dependencies, else `0` |

use async_trait::async_trait;
use keeper_config::model::ProducerConfig;
use keeper_core::{ArtifactProducer, KeeperError, ProduceRequest};
use tracing::{debug, info};

pub const ENV_UNIT: &str = "BACKUP_UNIT";
pub const ENV_APP_ARTIFACT: &str = "BACKUP_APP_ARTIFACT";
pub const ENV_DB_ARTIFACT: &str = "BACKUP_DB_ARTIFACT";
pub const ENV_START_DEPENDENCIES: &str = "BACKUP_START_DEPENDENCIES";

/// Produces artifacts by running an external command per unit.
///
/// The wait is unbounded: a hung command blocks the caller.
#[derive(Debug, Clone)]
pub struct CommandProducer {
    command: String,
    args: Vec<String>,
}

impl CommandProducer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &ProducerConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

#[async_trait]
impl ArtifactProducer for CommandProducer {
    async fn produce(&self, request: &ProduceRequest) -> Result<(), KeeperError> {
        let unit = request.unit.name();
        info!(unit, command = %self.command, "running artifact producer");

        let output = tokio::process::Command::new(&self.command)
            .args(&self.args)
            .arg(unit)
            .env(ENV_UNIT, unit)
            .env(ENV_APP_ARTIFACT, &request.application_path)
            .env(ENV_DB_ARTIFACT, &request.database_path)
            .env(
                ENV_START_DEPENDENCIES,
                if request.start_dependencies { "1" } else { "0" },
            )
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| KeeperError::Producer {
                unit: unit.to_string(),
                message: format!("failed to start `{}`: {e}", self.command),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!(unit, "producer: {line}");
        }

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit = output
            .status
            .code()
            .map(|code| format!("exit code {code}"))
            .unwrap_or_else(|| "terminated by signal".to_string());
        let message = match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(last) => format!("{exit}: {}", last.trim()),
            None => exit,
        };
        Err(KeeperError::Producer {
            unit: unit.to_string(),
            message,
        })
    }
}
