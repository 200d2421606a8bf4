// Application wiring: managed units, components and menu dispatch

use crate::clock::{ClockSettings, ClockSynchronizer};
use crate::config::Settings;
use crate::error::{HostprovError, Result};
use crate::locks::{LockCleanup, LockSettings, ProcessLockCleaner};
use crate::menu::{self, MenuAction};
use crate::network::{
    probe_default_route, ConnectivityChecker, ConnectivityReport, DnsConfigurator, DnsOutcome,
    ProbeSettings,
};
use crate::shell::CommandRunner;
use crate::systemd::{ServiceOrchestrator, ServiceRecord, ServiceTemplateParams, UnitSet};
use anyhow::Context;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Short name of the date-sync service and its timer
pub const DATE_SYNC: &str = "date-sync";
pub const DATE_SYNC_DESCRIPTION: &str = "Synchronize system date and time.";

/// `ExecStart` of the date-sync service: this binary, its config, `date-sync`
pub fn date_sync_command(settings: &Settings) -> Result<String> {
    let binary = match &settings.exec_path {
        Some(path) => path.clone(),
        None => std::env::current_exe().context("Could not locate the hostprov executable")?,
    };

    let mut parts = vec![quote(&binary)];
    if let Some(config) = &settings.source_path {
        parts.push("--config".to_string());
        parts.push(quote(config));
    }
    parts.push(DATE_SYNC.to_string());
    Ok(parts.join(" "))
}

/// One `ExecStart` word: `%` and `$` doubled so systemd does not expand
/// them, quoted with `\` and `"` escaped when needed
fn quote(path: &Path) -> String {
    let text = path
        .to_string_lossy()
        .replace('%', "%%")
        .replace('$', "$$");
    if text.contains(|c: char| c.is_whitespace() || c == '"' || c == '\\') {
        format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        text
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Everything one run of the tool works with
pub struct App<R> {
    settings: Settings,
    runner: R,
    services: Vec<ServiceRecord>,
    timers: Vec<ServiceRecord>,
    orchestrator: ServiceOrchestrator<R>,
    dns: DnsConfigurator<R>,
    connectivity: ConnectivityChecker<R>,
    locks: ProcessLockCleaner<R>,
}

impl<R: CommandRunner + Clone> App<R> {
    pub fn new(settings: Settings, runner: R) -> Result<Self> {
        let units = UnitSet::new(
            settings.unit_prefix.clone(),
            settings.unit_dir.clone(),
            settings.staging_dir.clone(),
        );
        let params = ServiceTemplateParams::new(DATE_SYNC_DESCRIPTION, date_sync_command(&settings)?)?;
        let date_service = units.service(DATE_SYNC, params);
        let date_timer = units.timer(DATE_SYNC, &date_service)?;

        let probe = ProbeSettings {
            attempts: settings.ping_attempts,
            host_threshold: settings.host_threshold,
            ..ProbeSettings::default()
        };
        let lock_settings = LockSettings {
            apt_patterns: settings.apt_patterns.clone(),
            self_markers: settings.self_markers.clone(),
            lock_files: settings.lock_files.clone(),
            current_user: std::env::var("USER")
                .or_else(|_| std::env::var("LOGNAME"))
                .unwrap_or_default(),
            own_pid: std::process::id(),
        };

        Ok(Self {
            orchestrator: ServiceOrchestrator::new(runner.clone()),
            dns: DnsConfigurator::new(
                runner.clone(),
                settings.dns_servers.clone(),
                settings.resolv_conf.clone(),
            ),
            connectivity: ConnectivityChecker::new(runner.clone(), probe),
            locks: ProcessLockCleaner::new(runner.clone(), lock_settings),
            services: vec![date_service],
            timers: vec![date_timer],
            settings,
            runner,
        })
    }

    /// Services first, so timers find their unit in place
    pub fn install_order(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.services.iter().chain(self.timers.iter())
    }

    /// Timers first, so nothing re-triggers a service being removed
    pub fn uninstall_order(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.timers.iter().chain(self.services.iter())
    }

    /// Remove whatever is installed, re-create every unit, and install the
    /// ones that were created. Returns each install attempt and its result.
    pub async fn install_all(&self) -> Vec<(String, bool)> {
        for record in self.uninstall_order() {
            self.orchestrator.uninstall(record).await;
        }

        let mut created = Vec::new();
        for record in self.install_order() {
            if self.orchestrator.create(record).await {
                created.push(record);
            }
        }

        let mut results = Vec::with_capacity(created.len());
        for record in created {
            let installed = self.orchestrator.install(record).await;
            results.push((record.name().to_string(), installed));
        }
        results
    }

    /// Names of the units that were removed
    pub async fn uninstall_all(&self) -> Vec<String> {
        let mut removed = Vec::new();
        for record in self.uninstall_order() {
            if self.orchestrator.uninstall(record).await {
                removed.push(record.name().to_string());
            }
        }
        removed
    }

    pub async fn configure_dns(&self) -> DnsOutcome {
        self.dns.configure_dns().await
    }

    /// Log the default route, then ping the ping host and every DNS server
    pub async fn check_connection(&self) -> ConnectivityReport {
        match probe_default_route(&self.runner).await {
            Some(route) => {
                tracing::info!("Default Network Interface Info:");
                tracing::info!(" - interface: {}", route.interface.as_deref().unwrap_or("-"));
                tracing::info!(" - address: {}", route.address.as_deref().unwrap_or("-"));
                tracing::info!(" - gateway: {}", route.gateway.as_deref().unwrap_or("-"));
            }
            None => tracing::warn!("No default route found"),
        }

        let hosts: Vec<String> = std::iter::once(self.settings.ping_host.clone())
            .chain(self.settings.dns_servers.iter().cloned())
            .collect();
        self.connectivity
            .check_all(&hosts, self.settings.aggregate_threshold)
            .await
    }

    pub async fn clear_locks(&self) -> LockCleanup {
        self.locks.clear_stuck_locks().await
    }

    pub async fn date_sync(&self) -> std::result::Result<(), HostprovError> {
        ClockSynchronizer::new(self.runner.clone(), ClockSettings::from(&self.settings))
            .run()
            .await
    }

    /// Every unit's text, as it would be written by `create`
    pub fn render_units(&self) -> String {
        self.install_order()
            .map(|record| format!("# {}\n{}", record.name(), record.render()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run one action and report its outcome. Returns false on Exit.
    pub async fn handle<W: Write>(&self, action: MenuAction, out: &mut W) -> io::Result<bool> {
        match action {
            MenuAction::Exit => {
                writeln!(out, "Log out of the system...")?;
                return Ok(false);
            }
            MenuAction::InstallAll => {
                writeln!(out, "### Install and Config ###\n")?;
                let results = self.install_all().await;
                if results.is_empty() {
                    writeln!(out, "[ERROR] No unit could be created")?;
                }
                for (name, installed) in results {
                    writeln!(out, "[RESULT] Installed {}: {}", name, yes_no(installed))?;
                }
            }
            MenuAction::UninstallAll => {
                writeln!(out, "### Uninstalling ###\n")?;
                let removed = self.uninstall_all().await;
                if removed.is_empty() {
                    writeln!(out, "[INFO] Nothing to uninstall.")?;
                }
                for name in removed {
                    writeln!(out, "Uninstall: {}", name)?;
                }
            }
            MenuAction::ConfigureDns => match self.configure_dns().await {
                DnsOutcome::Unchanged => writeln!(out, "[INFO] Configuration already applied.")?,
                outcome => writeln!(
                    out,
                    "[RESULT] Configuration completed: {}",
                    yes_no(outcome == DnsOutcome::Updated)
                )?,
            },
            MenuAction::CheckConnection => {
                let report = self.check_connection().await;
                if report.passed && report.all_within_threshold {
                    writeln!(out, "[SUCCESS] Successfully connected to DNS servers.")?;
                } else if report.passed {
                    writeln!(
                        out,
                        "[SUCCESS] Successfully connected to DNS servers on most attempts."
                    )?;
                } else {
                    writeln!(out, "[ERROR] Failed to connect to DNS servers.")?;
                }
                writeln!(out, "[INFO] Full test {:.1}% rate of success", report.average_rate)?;
            }
            MenuAction::CheckAptLock => match self.clear_locks().await {
                LockCleanup::AllCleared { killed } => writeln!(
                    out,
                    "[SUCCESS] apt locks cleared ({} processes killed)",
                    killed.len()
                )?,
                LockCleanup::PartiallyCleared { killed, failures } => {
                    writeln!(
                        out,
                        "[RESULT] apt locks partially cleared: {} processes killed, {} failures",
                        killed.len(),
                        failures.len()
                    )?;
                    for failure in failures {
                        writeln!(out, "[ERROR] {}", failure)?;
                    }
                }
                LockCleanup::Failed { failures } => {
                    writeln!(out, "[ERROR] Could not clear apt locks")?;
                    for failure in failures {
                        writeln!(out, "[ERROR] {}", failure)?;
                    }
                }
            },
        }

        writeln!(out)?;
        Ok(true)
    }

    /// Prompt and dispatch until Exit or end of input
    pub async fn run_menu<B: BufRead, W: Write>(&self, input: &mut B, out: &mut W) -> io::Result<()> {
        loop {
            let action = menu::prompt(input, out)?;
            writeln!(out)?;
            if !self.handle(action, out).await? {
                return Ok(());
            }
        }
    }
}
