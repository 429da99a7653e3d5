// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler pid file handling and process liveness checks.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use keeper_core::KeeperError;

/// What the pid file says about the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidStatus {
    /// A live process owns the pid file.
    Running(u32),
    /// The pid file names a process that no longer exists.
    Stale(u32),
    /// No (readable) pid file.
    Stopped,
}

impl PidStatus {
    pub fn label(self) -> &'static str {
        match self {
            PidStatus::Running(_) => "running",
            PidStatus::Stale(_) => "stale",
            PidStatus::Stopped => "stopped",
        }
    }

    pub fn pid(self) -> Option<u32> {
        match self {
            PidStatus::Running(pid) | PidStatus::Stale(pid) => Some(pid),
            PidStatus::Stopped => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The recorded pid, if the file exists and holds a number.
    pub fn read(&self) -> Result<Option<u32>, KeeperError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.trim().parse().ok()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KeeperError::storage(e)),
        }
    }

    pub fn status(&self) -> Result<PidStatus, KeeperError> {
        Ok(match self.read()? {
            Some(pid) if process_alive(pid) => PidStatus::Running(pid),
            Some(pid) => PidStatus::Stale(pid),
            None => PidStatus::Stopped,
        })
    }

    pub fn write(&self, pid: u32) -> Result<(), KeeperError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, format!("{pid}\n"))?;
        Ok(())
    }

    pub fn remove(&self) -> Result<(), KeeperError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KeeperError::storage(e)),
        }
    }

    /// Remove the file only while it still records `pid`.
    ///
    /// Returns whether the file was removed. A file rewritten by a newer
    /// scheduler is left alone.
    pub fn remove_if_owned(&self, pid: u32) -> Result<bool, KeeperError> {
        if self.read()? != Some(pid) {
            return Ok(false);
        }
        self.remove()?;
        Ok(true)
    }
}

/// Whether a process with `pid` exists.
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs only the existence and permission check.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn process_alive(_pid: u32) -> bool {
    false
}

/// Ask the process `pid` to shut down gracefully.
#[cfg(unix)]
pub fn terminate(pid: u32) -> Result<(), KeeperError> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| KeeperError::Internal(format!("pid {pid} out of range")))?;
    // SAFETY: plain kill(2) call with a validated pid.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(KeeperError::storage(std::io::Error::last_os_error()))
    }
}

#[cfg(not(unix))]
pub fn terminate(pid: u32) -> Result<(), KeeperError> {
    Err(KeeperError::Internal(format!(
        "cannot signal pid {pid}: signals are only supported on unix"
    )))
}
