// Connectivity checks over ping

use crate::network::ping::parse_ping_output;
use crate::shell::{CommandRunner, ShellCommand};
use std::time::Duration;

/// How individual hosts are probed
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub attempts: u32,
    /// Minimum success rate (percent) for a single host
    pub host_threshold: f64,
    /// Seconds to wait for each reply
    pub reply_wait_secs: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            attempts: 5,
            host_threshold: 80.0,
            reply_wait_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostReport {
    pub within_threshold: bool,
    pub success_rate: f64,
}

#[derive(Debug, Clone)]
pub struct ConnectivityReport {
    pub hosts: Vec<(String, HostReport)>,
    pub average_rate: f64,
    pub all_within_threshold: bool,
    pub passed: bool,
}

pub struct ConnectivityChecker<R> {
    runner: R,
    settings: ProbeSettings,
}

impl<R: CommandRunner> ConnectivityChecker<R> {
    pub fn new(runner: R, settings: ProbeSettings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    fn ping_command(&self, host: &str, attempts: u32) -> ShellCommand {
        let command = if cfg!(windows) {
            ShellCommand::new("ping").args(["-n".to_string(), attempts.to_string()])
        } else {
            ShellCommand::new("ping").args([
                "-c".to_string(),
                attempts.to_string(),
                "-W".to_string(),
                self.settings.reply_wait_secs.to_string(),
            ])
        };
        let budget = u64::from(attempts) * (self.settings.reply_wait_secs + 1) + 5;
        command.arg(host).timeout(Duration::from_secs(budget))
    }

    /// Ping `host` `attempts` times and report the share of replies
    pub async fn check_host(&self, host: &str, attempts: u32) -> HostReport {
        tracing::info!("Testing connection to {} ({} attempts)...", host, attempts);

        let Some(output) = self.runner.capture(&self.ping_command(host, attempts)).await else {
            return HostReport {
                within_threshold: false,
                success_rate: 0.0,
            };
        };
        for line in output.stdout.lines().filter(|line| !line.trim().is_empty()) {
            tracing::debug!("{}", line);
        }

        let summary = parse_ping_output(&output.stdout);
        let success_rate = summary.success_rate(attempts);
        let transmitted = summary.transmitted.filter(|&n| n > 0).unwrap_or(attempts);
        tracing::info!(
            "Received {}/{} packets ({:.1}%)",
            summary.received.min(transmitted),
            transmitted,
            success_rate
        );

        HostReport {
            within_threshold: success_rate >= self.settings.host_threshold,
            success_rate,
        }
    }

    /// Probe every host; passes when each host is within its own threshold or
    /// the average rate reaches `threshold`
    pub async fn check_all(&self, hosts: &[String], threshold: f64) -> ConnectivityReport {
        let mut reports = Vec::with_capacity(hosts.len());
        for host in hosts {
            let report = self.check_host(host, self.settings.attempts).await;
            tracing::info!(
                "{:.1}% rate of success in test host='{}'",
                report.success_rate,
                host
            );
            reports.push((host.clone(), report));
        }

        if reports.is_empty() {
            tracing::warn!("No hosts to test");
            return ConnectivityReport {
                hosts: reports,
                average_rate: 0.0,
                all_within_threshold: false,
                passed: false,
            };
        }

        let average_rate =
            reports.iter().map(|(_, r)| r.success_rate).sum::<f64>() / reports.len() as f64;
        let all_within_threshold = reports.iter().all(|(_, r)| r.within_threshold);

        ConnectivityReport {
            passed: all_within_threshold || average_rate >= threshold,
            hosts: reports,
            average_rate,
            all_within_threshold,
        }
    }
}
