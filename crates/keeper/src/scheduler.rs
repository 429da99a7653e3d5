// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `run-scheduler`, `stop-scheduler`, and `crontab` commands.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use keeper_config::KeeperConfig;
use keeper_core::{KeeperError, SystemClock, Tier};
use keeper_cron::{SchedulerRunner, Schedules};
use keeper_storage::FileCheckpoint;
use tracing::{info, warn};

use crate::backup::build_engine;
use crate::pid::{self, PidFile, PidStatus};
use crate::shutdown::install_signal_handler;

/// Start the scheduler, detached unless `foreground` is set.
///
/// An already-running scheduler is reported as a warning, not an error.
pub async fn run_scheduler(
    config: &KeeperConfig,
    config_path: Option<&Path>,
    foreground: bool,
) -> Result<(), KeeperError> {
    let pid_file = PidFile::new(&config.scheduler.pid_file);
    if let PidStatus::Running(pid) = pid_file.status()?
        && pid != std::process::id()
    {
        let warning = KeeperError::SchedulerAlreadyRunning { pid };
        warn!(error = %warning, "not starting a second scheduler");
        eprintln!("warning: {warning}");
        return Ok(());
    }

    if foreground {
        run_foreground(config, &pid_file).await
    } else {
        spawn_detached(config, config_path)
    }
}

async fn run_foreground(config: &KeeperConfig, pid_file: &PidFile) -> Result<(), KeeperError> {
    let engine = Arc::new(build_engine(config)?);
    let mut runner = SchedulerRunner::new(
        engine,
        Arc::new(SystemClock),
        Duration::from_secs(config.scheduler.poll_interval_secs),
    );
    if let Some(state_file) = &config.scheduler.state_file {
        runner = runner.with_checkpoint(Arc::new(FileCheckpoint::new(state_file)));
    }

    let cancel = install_signal_handler();
    pid_file.write(std::process::id())?;
    info!(pid = std::process::id(), pid_file = %pid_file.path().display(), "pid file written");

    runner.run(cancel).await;

    if !pid_file.remove_if_owned(std::process::id())? {
        warn!(
            pid_file = %pid_file.path().display(),
            "pid file now owned by another scheduler, leaving it"
        );
    }
    Ok(())
}

fn spawn_detached(config: &KeeperConfig, config_path: Option<&Path>) -> Result<(), KeeperError> {
    let log_path = PathBuf::from(&config.scheduler.log_file);
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let exe = std::env::current_exe()?;
    let mut command = std::process::Command::new(exe);
    if let Some(path) = config_path {
        command.arg("--config").arg(path);
    }
    command
        .args(["run-scheduler", "--foreground"])
        .stdin(Stdio::null())
        .stdout(log.try_clone()?)
        .stderr(log);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command.spawn()?;
    println!(
        "scheduler started in background (pid {}), logging to {}",
        child.id(),
        log_path.display()
    );
    Ok(())
}

/// Signal the recorded scheduler to stop.
///
/// A missing or stale pid file is a warning, not an error; a stale one is
/// removed here.
pub fn stop_scheduler(config: &KeeperConfig) -> Result<(), KeeperError> {
    let pid_file = PidFile::new(&config.scheduler.pid_file);
    match pid_file.status()? {
        PidStatus::Running(pid) => {
            // The scheduler removes its own pid file once the current tier ends.
            pid::terminate(pid)?;
            info!(pid, "sent SIGTERM to scheduler");
            println!("scheduler stopping (pid {pid})");
        }
        PidStatus::Stale(pid) => {
            pid_file.remove_if_owned(pid)?;
            warn!(pid, "removed stale pid file");
            eprintln!("warning: scheduler not running; removed stale pid file (pid {pid})");
        }
        PidStatus::Stopped => {
            let warning = KeeperError::SchedulerNotRunning {
                pid_file: pid_file.path().display().to_string(),
            };
            eprintln!("warning: {warning}");
        }
    }
    Ok(())
}

/// Crontab lines equivalent to the configured schedules.
pub fn crontab_lines(
    schedules: &Schedules,
    exe: &Path,
    workdir: &Path,
    config_path: Option<&Path>,
    log_file: &str,
) -> Vec<String> {
    let config_arg = config_path
        .map(|p| format!(" --config {}", shell_quote(&p.display().to_string())))
        .unwrap_or_default();

    let mut lines = vec!["# keeper backup schedule".to_string()];
    for tier in Tier::ALL {
        lines.push(format!(
            "{} cd {} && {}{config_arg} {tier} >> {} 2>&1",
            schedules.get(tier).crontab_expression(),
            shell_quote(&workdir.display().to_string()),
            shell_quote(&exe.display().to_string()),
            shell_quote(log_file),
        ));
    }
    lines
}

/// Print the crontab for the current binary and working directory.
pub fn print_crontab(config: &KeeperConfig, config_path: Option<&Path>) -> Result<(), KeeperError> {
    let exe = std::env::current_exe()?;
    let workdir = std::env::current_dir()?;
    let schedules = Schedules::from_config(&config.tiers);
    for line in crontab_lines(
        &schedules,
        &exe,
        &workdir,
        config_path,
        &config.scheduler.log_file,
    ) {
        println!("{line}");
    }
    Ok(())
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:=,".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
