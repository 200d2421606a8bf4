// System clock and timezone synchronization (the `date-sync` entry point)

pub mod firewall;


use crate::config::Settings;
use crate::error::HostprovError;
use crate::shell::{CommandRunner, ShellCommand};
use chrono::{DateTime, Local, NaiveDateTime};
use std::path::PathBuf;
use std::time::Duration;

/// Format of the last-sync file and of `date -s`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ClockSettings {
    pub timezone: String,
    pub ping_host: String,
    pub ntp_servers: Vec<String>,
    pub last_sync_file: PathBuf,
    /// Its mtime is the fallback minimum date
    pub config_file: Option<PathBuf>,
}

impl From<&Settings> for ClockSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            timezone: settings.timezone.clone(),
            ping_host: settings.ping_host.clone(),
            ntp_servers: settings.ntp_servers.clone(),
            last_sync_file: settings.last_sync_file.clone(),
            config_file: settings.source_path.clone(),
        }
    }
}

pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(DATE_FORMAT).to_string()
}

pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

pub struct ClockSynchronizer<R> {
    runner: R,
    settings: ClockSettings,
}

impl<R: CommandRunner> ClockSynchronizer<R> {
    pub fn new(runner: R, settings: ClockSettings) -> Self {
        Self { runner, settings }
    }

    /// Full sync: firewall, timezone, minimum date, connectivity, NTP, log
    pub async fn run(&self) -> Result<(), HostprovError> {
        if firewall::ensure_ntp_port_open(&self.runner).await {
            tracing::info!("UDP port 123 is open or not blocked");
        } else {
            tracing::error!("Failed to open UDP port 123");
        }

        if !self.ensure_timezone().await {
            return Err(HostprovError::ClockSync(format!(
                "could not set timezone {}",
                self.settings.timezone
            )));
        }

        let minimum = self.minimum_date();
        if Local::now().naive_local() < minimum {
            self.set_system_date(&minimum).await;
        } else {
            tracing::debug!("Clock is past {}; leaving it alone", format_datetime(&minimum));
        }

        if !self.check_internet().await {
            return Err(HostprovError::ClockSync("no internet connection".to_string()));
        }

        if !self.sync_with_ntp().await {
            return Err(HostprovError::ClockSync(
                "unable to synchronize with any NTP server".to_string(),
            ));
        }

        let now = Local::now().naive_local();
        tracing::info!("Synchronized date and time: {}", format_datetime(&now));
        self.save_last_sync(&now)
    }

    pub async fn ensure_timezone(&self) -> bool {
        let timezone = &self.settings.timezone;
        if let Some(status) = self.runner.capture(&ShellCommand::new("timedatectl")).await {
            if status.success && status.stdout.contains(timezone.as_str()) {
                tracing::info!("Timezone is already correct: {}", timezone);
                return true;
            }
        }

        let set = ShellCommand::new("timedatectl")
            .args(["set-timezone", timezone.as_str()])
            .privileged();
        if self.runner.run(&set).await {
            tracing::info!("Timezone set to: {}", timezone);
            true
        } else {
            tracing::error!("Failed to check/set timezone");
            false
        }
    }

    /// Last successful sync, if it was recorded and parses
    pub fn last_sync(&self) -> Option<NaiveDateTime> {
        let path = &self.settings.last_sync_file;
        let text = std::fs::read_to_string(path).ok()?;
        let parsed = parse_datetime(&text);
        if parsed.is_none() {
            tracing::warn!("Ignoring malformed date in {}: {:?}", path.display(), text.trim());
        }
        parsed
    }

    /// The clock is never set earlier than this: the last sync, else the
    /// config file's modification time, else now
    pub fn minimum_date(&self) -> NaiveDateTime {
        self.last_sync()
            .or_else(|| {
                let config = self.settings.config_file.as_ref()?;
                let modified = std::fs::metadata(config).and_then(|m| m.modified()).ok()?;
                Some(DateTime::<Local>::from(modified).naive_local())
            })
            .unwrap_or_else(|| Local::now().naive_local())
    }

    pub async fn set_system_date(&self, datetime: &NaiveDateTime) -> bool {
        let text = format_datetime(datetime);
        let command = ShellCommand::new("date")
            .args(["-s", text.as_str()])
            .privileged()
            .timeout(COMMAND_TIMEOUT);
        let done = self.runner.run(&command).await;
        if done {
            tracing::info!("System date set to {}", text);
        } else {
            tracing::error!("Failed to set system date to {}", text);
        }
        done
    }

    pub async fn check_internet(&self) -> bool {
        let command = ShellCommand::new("ping")
            .args(["-c", "1", self.settings.ping_host.as_str()])
            .timeout(COMMAND_TIMEOUT);
        let reachable = self.runner.run(&command).await;
        if reachable {
            tracing::info!("Internet connection OK");
        } else {
            tracing::error!("No internet connection");
        }
        reachable
    }

    /// Try each NTP server in order; stop at the first that answers
    pub async fn sync_with_ntp(&self) -> bool {
        for server in &self.settings.ntp_servers {
            let command = ShellCommand::new("ntpdate")
                .args(["-u", server.as_str()])
                .privileged();
            if self.runner.run(&command).await {
                tracing::info!("Synchronized with server {}", server);
                return true;
            }
            tracing::warn!("Error when syncing with {}", server);
        }
        false
    }

    pub fn save_last_sync(&self, datetime: &NaiveDateTime) -> Result<(), HostprovError> {
        let path = &self.settings.last_sync_file;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = format_datetime(datetime);
        std::fs::write(path, &text)?;
        tracing::info!("Date {} saved in {}", text, path.display());
        Ok(())
    }
}
