use std::{fmt, process::Stdio};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

/// A program and its arguments. No shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `invocation` to completion. `Err` means the process could not
    /// be started at all; a non-zero exit is reported through
    /// [`CommandOutput::success`].
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Spawns real subprocesses. Children are killed if the future is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
        log::debug!("running: {invocation}");
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to execute {}", invocation.program))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs one step. Returns trimmed stdout on success; any failure becomes an
/// error carrying the captured stderr, which callers either propagate
/// (fatal) or log and continue.
pub async fn run_command<R>(runner: &R, invocation: &Invocation, description: &str) -> Result<String>
where
    R: CommandRunner + ?Sized,
{
    log::info!("{description}...");
    let output = match runner.execute(invocation).await {
        Ok(output) => output,
        Err(e) => {
            log::error!("{description} failed: {e:#}");
            return Err(e.context(format!("{description} failed")));
        }
    };

    if !output.success {
        let stderr = output.stderr.trim();
        log::error!("{description} failed: {stderr}");
        return Err(anyhow!("{description} failed\ncommand: {invocation}\nstderr: {stderr}"));
    }

    log::info!("{description} completed successfully");
    let stdout = output.stdout.trim();
    if !stdout.is_empty() {
        log::debug!("output: {stdout}");
    }
    Ok(stdout.to_string())
}

/// Result of asking the outside world whether something exists.
#[derive(Debug)]
pub enum Probe<T> {
    Found(T),
    NotFound,
    Failed(anyhow::Error),
}

impl<T> Probe<T> {
    /// Collapses `NotFound` and `Failed` into `None`, logging the failure.
    pub fn found(self, what: &str) -> Option<T> {
        match self {
            Probe::Found(value) => Some(value),
            Probe::NotFound => None,
            Probe::Failed(e) => {
                log::warn!("could not determine {what}: {e:#}");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Answers each invocation with the first rule whose pattern is a
    /// substring of the command line. Unmatched commands fail.
    #[derive(Default)]
    pub struct ScriptedRunner {
        rules: Vec<(String, Option<CommandOutput>)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(mut self, pattern: &str, stdout: &str) -> Self {
            self.rules.push((
                pattern.to_string(),
                Some(CommandOutput {
                    success: true,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
            ));
            self
        }

        pub fn fail(mut self, pattern: &str, stderr: &str) -> Self {
            self.rules.push((
                pattern.to_string(),
                Some(CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                }),
            ));
            self
        }

        /// The program cannot be spawned.
        pub fn missing(mut self, pattern: &str) -> Self {
            self.rules.push((pattern.to_string(), None));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn called(&self, pattern: &str) -> bool {
            self.calls().iter().any(|c| c.contains(pattern))
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
            let line = invocation.to_string();
            self.calls.lock().unwrap().push(line.clone());
            match self.rules.iter().find(|(pattern, _)| line.contains(pattern.as_str())) {
                Some((_, Some(output))) => Ok(output.clone()),
                Some((_, None)) => Err(anyhow!("No such file or directory (os error 2)")),
                None => Ok(CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: format!("unscripted command: {line}"),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::ScriptedRunner, *};

    #[test]
    fn invocation_displays_as_command_line() {
        let inv = Invocation::new("aptos", ["move", "compile", "--package-dir", "."]);
        assert_eq!(inv.to_string(), "aptos move compile --package-dir .");
    }

    #[tokio::test]
    async fn run_command_trims_stdout() {
        let runner = ScriptedRunner::new().ok("aptos --version", "  aptos 4.2.0\n");
        let out = run_command(&runner, &Invocation::new("aptos", ["--version"]), "Checking CLI")
            .await
            .unwrap();
        assert_eq!(out, "aptos 4.2.0");
    }

    #[tokio::test]
    async fn run_command_failure_carries_stderr() {
        let runner = ScriptedRunner::new().fail("compile", "error[E01001]: unbound module");
        let err = run_command(
            &runner,
            &Invocation::new("aptos", ["move", "compile"]),
            "Compiling Move contracts",
        )
        .await
        .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Compiling Move contracts failed"));
        assert!(message.contains("unbound module"));
    }

    #[tokio::test]
    async fn run_command_spawn_failure_is_an_error() {
        let runner = ScriptedRunner::new().missing("aptos");
        assert!(run_command(&runner, &Invocation::new("aptos", ["--version"]), "Checking CLI")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn system_runner_reports_exit_status() {
        let ok = SystemRunner
            .execute(&Invocation::new("sh", ["-c", "echo hello; echo oops >&2"]))
            .await
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.stdout.trim(), "hello");
        assert_eq!(ok.stderr.trim(), "oops");

        let failed = SystemRunner
            .execute(&Invocation::new("sh", ["-c", "exit 3"]))
            .await
            .unwrap();
        assert!(!failed.success);
    }

    #[test]
    fn probe_found_collapses_failures() {
        assert_eq!(Probe::Found(1).found("x"), Some(1));
        assert_eq!(Probe::<i32>::NotFound.found("x"), None);
        assert_eq!(Probe::<i32>::Failed(anyhow!("boom")).found("x"), None);
    }
}
