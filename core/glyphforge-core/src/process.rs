//! Running external tools with captured output and a wall-clock timeout

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use log::debug;

/// A fully resolved external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Build a command from a `[program, args...]` prefix plus extra args.
    ///
    /// Returns `None` when the prefix is empty.
    pub fn from_prefix<I, S>(prefix: &[String], extra: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (program, head) = prefix.split_first()?;
        let mut args = head.to_vec();
        args.extend(extra.into_iter().map(Into::into));
        Some(Self {
            program: program.clone(),
            args,
            current_dir: None,
        })
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Shell-ish rendering for logs and messages.
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// What happened when a command was run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRun {
    Completed {
        code: Option<i32>,
        success: bool,
        stdout: String,
        stderr: String,
    },
    TimedOut,
    SpawnFailed(String),
}

/// Executes external commands. Swapped out for recording stubs in tests.
pub trait ToolRunner {
    fn run(&self, command: &ToolCommand, timeout: Duration) -> ToolRun;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, command: &ToolCommand, timeout: Duration) -> ToolRun {
        (**self).run(command, timeout)
    }
}

/// Runs commands as child processes on a current-thread tokio runtime.
///
/// The child is killed when the timeout elapses; anything it already wrote
/// stays on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand, timeout: Duration) -> ToolRun {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(err) => return ToolRun::SpawnFailed(format!("starting runtime: {err}")),
        };

        debug!("running: {}", command.display_line());
        runtime.block_on(run_child(command, timeout))
    }
}

async fn run_child(command: &ToolCommand, timeout: Duration) -> ToolRun {
    let mut cmd = tokio::process::Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &command.current_dir {
        cmd.current_dir(dir);
    }

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return ToolRun::SpawnFailed(format!("{}: {err}", command.program)),
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => ToolRun::Completed {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Ok(Err(err)) => ToolRun::SpawnFailed(format!("waiting for {}: {err}", command.program)),
        Err(_) => ToolRun::TimedOut,
    }
}
