// ufw: make sure outbound NTP is allowed

use crate::shell::{CommandRunner, ShellCommand};

pub fn is_active(status_verbose: &str) -> bool {
    status_verbose
        .lines()
        .any(|line| line.trim() == "Status: active")
}

/// An outbound allow rule for 123/udp in `ufw status numbered`
pub fn has_ntp_out_rule(status_numbered: &str) -> bool {
    status_numbered.lines().any(|line| {
        let line = line.to_ascii_lowercase();
        line.contains("123/udp") && line.contains("allow out")
    })
}

/// True when UDP 123 is open afterwards, or ufw is not filtering at all
pub async fn ensure_ntp_port_open<R: CommandRunner>(runner: &R) -> bool {
    let status = runner
        .capture(&ShellCommand::new("ufw").args(["status", "verbose"]).privileged())
        .await;
    if !status.is_some_and(|output| is_active(&output.stdout)) {
        tracing::info!("Firewall 'ufw' is inactive; no port to open");
        return true;
    }

    let rules = runner
        .capture(&ShellCommand::new("ufw").args(["status", "numbered"]).privileged())
        .await;
    if rules.is_some_and(|output| has_ntp_out_rule(&output.stdout)) {
        tracing::info!("UDP port 123 is already open");
        return true;
    }

    tracing::info!("Opening outbound UDP port 123...");
    let opened = runner
        .run(&ShellCommand::new("ufw").args(["allow", "out", "123/udp"]).privileged())
        .await;
    if opened {
        tracing::info!("Rule added");
    }
    opened
}
