// Recording command runner for unit tests

use super::{CommandOutput, CommandRunner, ShellCommand};
use crate::error::HostprovError;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    failures: Vec<String>,
    spawn_errors: Vec<String>,
    responses: Vec<(String, CommandOutput)>,
}

/// Records every command and applies `cp`, `mv` and `rm` to the real
/// (temporary) file system so callers observe consistent state.
#[derive(Clone, Default)]
pub struct FakeShell {
    state: Arc<Mutex<FakeState>>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands starting with `prefix` exit non-zero
    pub fn fail_on(&self, prefix: &str) {
        self.state.lock().unwrap().failures.push(prefix.to_string());
    }

    /// Commands starting with `prefix` cannot be spawned
    pub fn missing(&self, prefix: &str) {
        self.state.lock().unwrap().spawn_errors.push(prefix.to_string());
    }

    /// Commands starting with `prefix` succeed and print `stdout`
    pub fn respond(&self, prefix: &str, stdout: &str) {
        self.respond_with(prefix, true, stdout);
    }

    pub fn respond_with(&self, prefix: &str, success: bool, stdout: &str) {
        let output = CommandOutput {
            success,
            status: if success { "exit status: 0" } else { "exit status: 1" }.to_string(),
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        self.state
            .lock()
            .unwrap()
            .responses
            .push((prefix.to_string(), output));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|line| line.split_whitespace().next() == Some(program))
            .collect()
    }
}

fn failed(message: &str) -> CommandOutput {
    CommandOutput {
        success: false,
        status: "exit status: 1".to_string(),
        stdout: String::new(),
        stderr: message.to_string(),
    }
}

fn apply_to_fs(command: &ShellCommand) -> std::io::Result<()> {
    let paths: Vec<&String> = command
        .arguments()
        .iter()
        .filter(|arg| !arg.starts_with('-'))
        .collect();

    match (command.program(), paths.as_slice()) {
        ("cp", [from, to]) => std::fs::copy(from, to).map(|_| ()),
        ("mv", [from, to]) => std::fs::rename(from, to).or_else(|_| {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }),
        ("rm", [path]) => {
            let force = command
                .arguments()
                .iter()
                .any(|arg| arg.starts_with('-') && arg.contains('f'));
            if Path::new(path).exists() || !force {
                std::fs::remove_file(path)
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

impl CommandRunner for FakeShell {
    async fn execute(&self, command: &ShellCommand) -> Result<CommandOutput, HostprovError> {
        let line = command.to_string();
        let mut state = self.state.lock().unwrap();
        state.calls.push(line.clone());

        if state.spawn_errors.iter().any(|prefix| line.starts_with(prefix)) {
            return Err(HostprovError::CommandSpawn {
                command: line,
                message: "No such file or directory".to_string(),
            });
        }
        if state.failures.iter().any(|prefix| line.starts_with(prefix)) {
            return Ok(failed("simulated failure"));
        }
        if let Some((_, output)) = state
            .responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
        {
            return Ok(output.clone());
        }

        Ok(match apply_to_fs(command) {
            Ok(()) => CommandOutput {
                success: true,
                status: "exit status: 0".to_string(),
                ..CommandOutput::default()
            },
            Err(e) => failed(&e.to_string()),
        })
    }
}
