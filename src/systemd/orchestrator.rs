// Unit lifecycle: create, install, uninstall

use crate::error::HostprovError;
use crate::shell::{path_arg, CommandRunner, ShellCommand};
use crate::systemd::ServiceRecord;
use std::path::PathBuf;

/// Drives generated units through systemctl
///
/// Nothing is cached: every call looks at the file system to decide what to
/// do, so each step can be re-run safely.
pub struct ServiceOrchestrator<R> {
    runner: R,
}

impl<R: CommandRunner> ServiceOrchestrator<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Write the unit text to `source_dir/name`
    pub async fn create(&self, record: &ServiceRecord) -> bool {
        match self.write_unit(record).await {
            Ok(path) => {
                tracing::info!("Unit saved: {}", path.display());
                true
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", record.name(), e);
                false
            }
        }
    }

    async fn write_unit(&self, record: &ServiceRecord) -> Result<PathBuf, HostprovError> {
        tokio::fs::create_dir_all(record.source_dir()).await?;
        let path = record.source_path();
        tokio::fs::write(&path, record.render()).await?;
        Ok(path)
    }

    /// Stop any running copy, copy the staged file into place, reload, and
    /// enable + start when the record auto-starts
    pub async fn install(&self, record: &ServiceRecord) -> bool {
        tracing::info!("Installing {}", record.name());
        self.systemctl(record, "stop").await;

        let source = record.source_path();
        if !source.exists() {
            tracing::error!("Unit file not found: {}", source.display());
            return false;
        }

        let copy = ShellCommand::new("cp")
            .arg(path_arg(&source))
            .arg(path_arg(record.destination_path()))
            .privileged();
        if !self.runner.run(&copy).await {
            tracing::error!("Failed to copy {}", record.name());
            return false;
        }
        tracing::info!("Unit copied to {}", record.destination_path().display());

        if !self.daemon_reload().await {
            return false;
        }

        if record.auto_start() {
            let enabled = self.systemctl(record, "enable").await;
            let started = self.systemctl(record, "start").await;
            return enabled && started;
        }

        true
    }

    /// Stop, disable and delete an installed unit.
    ///
    /// Returns false without running anything when the unit is not installed.
    /// If stop or disable fails the unit file is left in place.
    pub async fn uninstall(&self, record: &ServiceRecord) -> bool {
        let destination = record.destination_path();
        if !destination.exists() {
            tracing::debug!("{} is not installed", record.name());
            return false;
        }
        tracing::info!("Uninstalling {}", record.name());

        if !(self.systemctl(record, "stop").await && self.systemctl(record, "disable").await) {
            tracing::warn!(
                "{} could not be deactivated; leaving {} in place",
                record.name(),
                destination.display()
            );
            return false;
        }

        let remove = ShellCommand::new("rm").arg(path_arg(destination)).privileged();
        if !self.runner.run(&remove).await {
            tracing::error!("Failed to remove {}", destination.display());
            return false;
        }
        tracing::info!("{} uninstalled", record.name());

        self.daemon_reload().await
    }

    /// `systemctl <action> <unit>`, skipped when the unit file is absent
    async fn systemctl(&self, record: &ServiceRecord, action: &str) -> bool {
        if !record.destination_path().exists() {
            return false;
        }

        let command = ShellCommand::new("systemctl")
            .args([action, record.name()])
            .privileged();
        self.runner.run(&command).await
    }

    async fn daemon_reload(&self) -> bool {
        let command = ShellCommand::new("systemctl").arg("daemon-reload").privileged();
        self.runner.run(&command).await
    }
}
