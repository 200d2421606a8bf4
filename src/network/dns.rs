// Resolver configuration (resolv.conf) management

use crate::error::HostprovError;
use crate::shell::{path_arg, CommandRunner, ShellCommand};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Result of a `configure_dns` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsOutcome {
    /// Every server was already listed; nothing written
    Unchanged,
    /// File replaced
    Updated,
    Failed,
}

/// `nameserver <ip>` per server, in order
pub fn resolver_content(servers: &[String]) -> String {
    servers
        .iter()
        .map(|server| format!("nameserver {}\n", server))
        .collect()
}

/// Every server has a `nameserver` entry somewhere in `content`
pub fn lists_all_servers(servers: &[String], content: &str) -> bool {
    servers
        .iter()
        .all(|server| content.contains(&format!("nameserver {}", server)))
}

/// Rewrites the resolver file and marks it immutable so DHCP clients and
/// friends leave it alone
pub struct DnsConfigurator<R> {
    runner: R,
    servers: Vec<String>,
    resolv_conf: PathBuf,
}

impl<R: CommandRunner> DnsConfigurator<R> {
    pub fn new(runner: R, servers: Vec<String>, resolv_conf: PathBuf) -> Self {
        Self {
            runner,
            servers,
            resolv_conf,
        }
    }

    pub fn resolv_conf(&self) -> &Path {
        &self.resolv_conf
    }

    pub async fn configure_dns(&self) -> DnsOutcome {
        let path = self.resolv_conf.display();

        if self.servers.is_empty() {
            tracing::error!("No DNS servers configured; refusing to empty {}", path);
            return DnsOutcome::Failed;
        }

        if self.resolv_conf.exists() {
            match tokio::fs::read_to_string(&self.resolv_conf).await {
                Ok(current) => {
                    tracing::info!("Current content of {}:\n{}", path, current.trim_end());
                    if !current.trim().is_empty() && lists_all_servers(&self.servers, &current) {
                        return DnsOutcome::Unchanged;
                    }
                }
                Err(e) => tracing::warn!("Failed to read {}: {}", path, e),
            }
        }

        self.set_immutable(false).await;
        if !self.remove_existing().await {
            tracing::error!("Failed to remove {}", path);
            return DnsOutcome::Failed;
        }

        tracing::info!("Setting up {}", path);
        if !self.replace().await {
            tracing::error!("Failed to save {}", path);
            return DnsOutcome::Failed;
        }

        tracing::info!("Successfully configured {}", path);
        self.set_immutable(true).await;
        if let Ok(written) = tokio::fs::read_to_string(&self.resolv_conf).await {
            tracing::info!("New content of {}:\n{}", path, written.trim_end());
        }

        DnsOutcome::Updated
    }

    /// `chattr +i` / `chattr -i`, only when the file exists
    async fn set_immutable(&self, immutable: bool) -> bool {
        if !self.resolv_conf.exists() {
            return false;
        }

        let flag = if immutable { "+i" } else { "-i" };
        let command = ShellCommand::new("chattr")
            .args([flag.to_string(), path_arg(&self.resolv_conf)])
            .privileged();
        let done = self.runner.run(&command).await;
        if done {
            tracing::info!(
                "File {} has been {}",
                self.resolv_conf.display(),
                if immutable { "locked" } else { "unlocked" }
            );
        }
        done
    }

    /// Delete the current file; a second attempt follows an unlock
    async fn remove_existing(&self) -> bool {
        if !self.resolv_conf.exists() {
            return true;
        }

        let remove = ShellCommand::new("rm")
            .args(["-f".to_string(), path_arg(&self.resolv_conf)])
            .privileged();
        if self.runner.run(&remove).await {
            return true;
        }

        self.set_immutable(false).await && self.runner.run(&remove).await
    }

    /// Stage the new content in a temp file and move it over the target.
    /// The staged file is deleted on drop unless the move happened.
    async fn replace(&self) -> bool {
        let staged = match stage(&resolver_content(&self.servers)) {
            Ok(staged) => staged,
            Err(e) => {
                tracing::error!("Failed to stage resolver content: {}", e);
                return false;
            }
        };

        let command = ShellCommand::new("mv")
            .args([path_arg(&staged), path_arg(&self.resolv_conf)])
            .privileged();
        if !self.runner.run(&command).await {
            return false;
        }

        // Already moved away; nothing left for the drop guard to delete
        let _ = staged.keep();
        true
    }
}

fn stage(content: &str) -> Result<TempPath, HostprovError> {
    let mut file = tempfile::Builder::new()
        .prefix("hostprov-resolv")
        .suffix(".conf")
        .tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    // resolv.conf must stay world-readable
    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o644))?;
    Ok(file.into_temp_path())
}
