// External command execution

use crate::error::HostprovError;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[cfg(test)]
pub mod testing;

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
    privileged: bool,
    timeout: Option<Duration>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            privileged: false,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run through sudo (when the runner is configured to use it)
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Kill the child if it has not finished after `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Paths travel as plain arguments
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the provisioning logic and the host it runs on
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run the command to completion. `Err` means it could not be run at all
    /// (spawn failure or timeout); a non-zero exit is reported through
    /// `CommandOutput::success`.
    async fn execute(&self, command: &ShellCommand) -> Result<CommandOutput, HostprovError>;

    /// Run for the exit status only; failures are logged.
    async fn run(&self, command: &ShellCommand) -> bool {
        match self.execute(command).await {
            Ok(output) if output.success => true,
            Ok(output) => {
                let error = HostprovError::CommandFailed {
                    command: command.to_string(),
                    status: output.status,
                    stderr: output.stderr.trim().to_string(),
                };
                tracing::error!("{}", error);
                false
            }
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }

    /// Run for the output, whatever the exit status.
    async fn capture(&self, command: &ShellCommand) -> Option<CommandOutput> {
        match self.execute(command).await {
            Ok(output) => Some(output),
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        }
    }
}

/// Runs commands on the local host
#[derive(Debug, Clone)]
pub struct SystemShell {
    use_sudo: bool,
}

impl SystemShell {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    fn build(&self, command: &ShellCommand) -> Command {
        let mut cmd = if command.is_privileged() && self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(command.program());
            cmd
        } else {
            Command::new(command.program())
        };
        cmd.args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl CommandRunner for SystemShell {
    async fn execute(&self, command: &ShellCommand) -> Result<CommandOutput, HostprovError> {
        tracing::debug!(
            "Running{}: {}",
            if command.is_privileged() && self.use_sudo { " (sudo)" } else { "" },
            command
        );

        let mut child = self.build(command);
        let output = child.output();
        let output = match command.timeout_duration() {
            Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
                HostprovError::CommandTimeout {
                    command: command.to_string(),
                    limit,
                }
            })?,
            None => output.await,
        }
        .map_err(|e| HostprovError::CommandSpawn {
            command: command.to_string(),
            message: e.to_string(),
        })?;

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
