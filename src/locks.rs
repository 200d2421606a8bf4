// Stuck package-manager process and lock file cleanup

use crate::shell::{path_arg, CommandRunner, ShellCommand};
use std::fmt;
use std::path::PathBuf;

/// What counts as a stuck apt process, and what must be left alone
#[derive(Debug, Clone)]
pub struct LockSettings {
    pub apt_patterns: Vec<String>,
    /// Processes of `current_user` carrying one of these are never killed
    pub self_markers: Vec<String>,
    pub lock_files: Vec<PathBuf>,
    pub current_user: String,
    pub own_pid: u32,
}

/// One row of `ps aux`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub user: String,
    pub pid: u32,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupFailure {
    ProcessList,
    Kill { pid: u32, command: String },
    LockFile(PathBuf),
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupFailure::ProcessList => write!(f, "could not list processes"),
            CleanupFailure::Kill { pid, command } => {
                write!(f, "could not kill PID {} ({})", pid, command)
            }
            CleanupFailure::LockFile(path) => write!(f, "could not remove {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockCleanup {
    AllCleared {
        killed: Vec<u32>,
    },
    PartiallyCleared {
        killed: Vec<u32>,
        failures: Vec<CleanupFailure>,
    },
    Failed {
        failures: Vec<CleanupFailure>,
    },
}

/// Parse `ps aux` output; rows that don't look like a process are skipped
pub fn parse_ps_aux(output: &str) -> Vec<ProcessEntry> {
    output
        .lines()
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 11 {
                return None;
            }
            let pid = columns[1].parse().ok()?;
            Some(ProcessEntry {
                user: columns[0].to_string(),
                pid,
                command: columns[10..].join(" "),
            })
        })
        .collect()
}

pub struct ProcessLockCleaner<R> {
    runner: R,
    settings: LockSettings,
}

impl<R: CommandRunner> ProcessLockCleaner<R> {
    pub fn new(runner: R, settings: LockSettings) -> Self {
        Self { runner, settings }
    }

    fn is_apt_process(&self, entry: &ProcessEntry) -> bool {
        self.settings
            .apt_patterns
            .iter()
            .any(|pattern| entry.command.contains(pattern.as_str()))
    }

    fn is_protected(&self, entry: &ProcessEntry) -> bool {
        entry.pid == self.settings.own_pid
            || (entry.user == self.settings.current_user
                && self
                    .settings
                    .self_markers
                    .iter()
                    .any(|marker| entry.command.contains(marker.as_str())))
    }

    /// Kill stuck apt processes, then remove apt lock files
    pub async fn clear_stuck_locks(&self) -> LockCleanup {
        tracing::info!("Checking for stuck apt processes");

        let listing = self.runner.capture(&ShellCommand::new("ps").arg("aux")).await;
        let Some(listing) = listing.filter(|output| output.success) else {
            tracing::error!("Could not list running processes");
            return LockCleanup::Failed {
                failures: vec![CleanupFailure::ProcessList],
            };
        };

        let mut killed = Vec::new();
        let mut failures = Vec::new();
        let mut removed = 0;

        for entry in parse_ps_aux(&listing.stdout) {
            if !self.is_apt_process(&entry) {
                continue;
            }
            if self.is_protected(&entry) {
                tracing::info!("Skipping own/editor process: {}", entry.command);
                continue;
            }

            tracing::info!("Killing stuck apt process (PID: {})", entry.pid);
            let kill = ShellCommand::new("kill")
                .args(["-9".to_string(), entry.pid.to_string()])
                .privileged();
            if self.runner.run(&kill).await {
                killed.push(entry.pid);
            } else {
                failures.push(CleanupFailure::Kill {
                    pid: entry.pid,
                    command: entry.command,
                });
            }
        }

        for lock in self.settings.lock_files.iter().filter(|lock| lock.exists()) {
            tracing::info!("Removing apt lock file {}", lock.display());
            let remove = ShellCommand::new("rm")
                .args(["-f".to_string(), path_arg(lock)])
                .privileged();
            if self.runner.run(&remove).await {
                removed += 1;
            } else {
                failures.push(CleanupFailure::LockFile(lock.clone()));
            }
        }

        if failures.is_empty() {
            LockCleanup::AllCleared { killed }
        } else if !killed.is_empty() || removed > 0 {
            LockCleanup::PartiallyCleared { killed, failures }
        } else {
            LockCleanup::Failed { failures }
        }
    }
}
