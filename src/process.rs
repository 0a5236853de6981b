//! Device process lifecycle: launch, wait, terminate.

use crate::command::CommandLine;
use crate::traits::{ChildProcess, DeviceError, ProcessExit, ProcessLauncher, Result, StdoutMode};

/// Observable lifecycle state of a [`DeviceProcess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Nothing has been launched yet.
    Idle,
    /// A command was launched and has not been waited on or terminated.
    Running,
    /// The last command completed or was terminated.
    Finished(ProcessExit),
}

enum Slot<C> {
    Idle,
    Running(C),
    Finished(ProcessExit),
}

/// Owns at most one in-flight external process for a device.
///
/// ```text
/// Idle/Finished --launch--> Running --wait_for_completion--> Finished
///                           Running --force_terminate-----> Finished
/// ```
///
/// Launching while a command is still running fails with
/// [`DeviceError::Busy`]; the previous process is never orphaned.
///
/// Dropping a `DeviceProcess` with a command still running kills and reaps
/// that command.
pub struct DeviceProcess<L: ProcessLauncher> {
    launcher: L,
    slot: Slot<L::Child>,
    verbose: bool,
}

impl<L: ProcessLauncher> DeviceProcess<L> {
    /// Create an idle process slot backed by `launcher`.
    pub const fn new(launcher: L, verbose: bool) -> Self {
        Self {
            launcher,
            slot: Slot::Idle,
            verbose,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ProcessState {
        match &self.slot {
            Slot::Idle => ProcessState::Idle,
            Slot::Running(_) => ProcessState::Running,
            Slot::Finished(exit) => ProcessState::Finished(*exit),
        }
    }

    /// Whether a launched command is still running, reaping it if it exited.
    pub fn is_running(&mut self) -> Result<bool> {
        let exit = match &mut self.slot {
            Slot::Running(child) => child.try_wait()?,
            Slot::Idle | Slot::Finished(_) => return Ok(false),
        };

        match exit {
            Some(exit) => {
                self.slot = Slot::Finished(exit);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Start `command` without blocking the caller.
    pub fn launch(&mut self, command: &CommandLine) -> Result<()> {
        self.start(command, StdoutMode::Inherit)
    }

    /// Block until the running command exits.
    ///
    /// Returns `None` when nothing is running. A non-zero exit is logged, not
    /// returned as an error: callers inspect the command's side effects.
    pub fn wait_for_completion(&mut self) -> Result<Option<ProcessExit>> {
        let Slot::Running(child) = &mut self.slot else {
            return Ok(None);
        };

        let exit = child.wait()?;
        self.slot = Slot::Finished(exit);

        if exit.success() {
            tracing::debug!(code = ?exit.code, "command completed");
        } else {
            tracing::warn!(code = ?exit.code, "command exited unsuccessfully");
        }
        Ok(Some(exit))
    }

    /// Kill the running command and reap it. No-op when nothing is running.
    pub fn force_terminate(&mut self) -> Result<()> {
        let Slot::Running(child) = &mut self.slot else {
            tracing::debug!("terminate requested with no running command");
            return Ok(());
        };

        let pid = child.id();
        child.kill()?;
        let exit = child.wait()?;
        self.slot = Slot::Finished(exit);
        tracing::info!(pid = ?pid, "command terminated");
        Ok(())
    }

    /// Launch `command` and wait for it to exit.
    pub fn run_to_completion(&mut self, command: &CommandLine) -> Result<ProcessExit> {
        self.start(command, StdoutMode::Inherit)?;
        self.wait_for_completion()?
            .ok_or(DeviceError::Busy { pid: None })
    }

    /// Launch `command`, collect its standard output lines and wait for exit.
    pub fn query_lines(&mut self, command: &CommandLine) -> Result<Vec<String>> {
        self.start(command, StdoutMode::Capture)?;

        let lines = match &mut self.slot {
            Slot::Running(child) => child.read_stdout_lines(),
            Slot::Idle | Slot::Finished(_) => Ok(Vec::new()),
        };
        // Reap even when reading failed so the slot never stays Running.
        self.wait_for_completion()?;
        lines
    }

    fn start(&mut self, command: &CommandLine, stdout: StdoutMode) -> Result<()> {
        if self.is_running()? {
            let pid = match &self.slot {
                Slot::Running(child) => child.id(),
                Slot::Idle | Slot::Finished(_) => None,
            };
            tracing::warn!(pid = ?pid, command = %command, "refusing launch while busy");
            return Err(DeviceError::Busy { pid });
        }

        if self.verbose {
            tracing::info!(command = %command, "launching");
        } else {
            tracing::debug!(command = %command, "launching");
        }

        let child = self.launcher.launch(command, stdout)?;
        self.slot = Slot::Running(child);
        Ok(())
    }
}

impl<L: ProcessLauncher> Drop for DeviceProcess<L> {
    fn drop(&mut self) {
        if let Slot::Running(child) = &mut self.slot {
            tracing::debug!(pid = ?child.id(), "terminating command on drop");
            if let Err(err) = child.kill().and_then(|()| child.wait()) {
                tracing::warn!(error = %err, "failed to reap command on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBuilder;
    use crate::mock::MockLauncher;
    use std::path::Path;

    fn command(token: &str) -> CommandLine {
        CommandBuilder::new(Path::new("/usr/bin/tool")).arg(token).build()
    }

    #[test]
    fn test_launch_wait_lifecycle() {
        let launcher = MockLauncher::new();
        let mut process = DeviceProcess::new(launcher.clone(), false);
        assert_eq!(process.state(), ProcessState::Idle);

        process.launch(&command("one")).expect("launch failed");
        assert_eq!(process.state(), ProcessState::Running);

        let exit = process.wait_for_completion().expect("wait failed");
        assert_eq!(exit, Some(ProcessExit::with_code(0)));
        assert_eq!(process.state(), ProcessState::Finished(ProcessExit::with_code(0)));
        assert_eq!(launcher.commands().len(), 1);
    }

    #[test]
    fn test_second_launch_while_running_is_busy() {
        let launcher = MockLauncher::new();
        let mut process = DeviceProcess::new(launcher.clone(), false);

        process.launch(&command("long")).expect("launch failed");
        let err = process
            .launch(&command("second"))
            .expect_err("second launch must be refused");
        assert!(matches!(err, DeviceError::Busy { .. }));
        assert!(!err.is_fatal());

        // The first process is still owned and can be waited on.
        assert_eq!(process.state(), ProcessState::Running);
        assert_eq!(launcher.commands().len(), 1);
        process.wait_for_completion().expect("wait failed");
        process.launch(&command("second")).expect("launch after wait failed");
        assert_eq!(launcher.commands().len(), 2);
    }

    #[test]
    fn test_force_terminate() {
        let launcher = MockLauncher::new();
        let mut process = DeviceProcess::new(launcher.clone(), false);

        process.launch(&command("long")).expect("launch failed");
        process.force_terminate().expect("terminate failed");
        assert_eq!(process.state(), ProcessState::Finished(ProcessExit::signalled()));
        assert_eq!(launcher.kills(), 1);
    }

    #[test]
    fn test_terminate_and_wait_when_idle_are_noops() {
        let mut process = DeviceProcess::new(MockLauncher::new(), false);
        process.force_terminate().expect("terminate on idle failed");
        assert_eq!(process.wait_for_completion().expect("wait failed"), None);
        assert_eq!(process.state(), ProcessState::Idle);
    }

    #[test]
    fn test_spawn_failure_is_recoverable() {
        let launcher = MockLauncher::new().failing_spawn();
        let mut process = DeviceProcess::new(launcher, false);

        let err = process.launch(&command("x")).expect_err("spawn should fail");
        assert!(matches!(err, DeviceError::Spawn { .. }));
        assert!(!err.is_fatal());
        assert_eq!(process.state(), ProcessState::Idle);
    }

    #[test]
    fn test_query_lines_reads_and_reaps() {
        let launcher =
            MockLauncher::new().with_stdout(&["Label: Auto Exposure Mode", "Current: AV"]);
        let mut process = DeviceProcess::new(launcher, true);

        let lines = process.query_lines(&command("--get-config")).expect("query failed");
        assert_eq!(lines, vec!["Label: Auto Exposure Mode", "Current: AV"]);
        assert!(matches!(process.state(), ProcessState::Finished(_)));
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let launcher = MockLauncher::new().with_exit_code(2);
        let mut process = DeviceProcess::new(launcher, false);
        let exit = process.run_to_completion(&command("x")).expect("run failed");
        assert_eq!(exit.code, Some(2));
    }

    #[test]
    fn test_drop_kills_running_command() {
        let launcher = MockLauncher::new();
        let mut process = DeviceProcess::new(launcher.clone(), false);
        process.launch(&command("long")).expect("launch failed");

        drop(process);
        assert_eq!(launcher.kills(), 1);
    }

    #[test]
    fn test_drop_after_wait_does_not_kill() {
        let launcher = MockLauncher::new();
        let mut process = DeviceProcess::new(launcher.clone(), false);
        process.launch(&command("short")).expect("launch failed");
        process.wait_for_completion().expect("wait failed");

        drop(process);
        assert_eq!(launcher.kills(), 0);
    }

    #[test]
    fn test_finished_child_does_not_block_next_launch() {
        let launcher = MockLauncher::new().exiting_immediately();
        let mut process = DeviceProcess::new(launcher.clone(), false);

        process.launch(&command("fast")).expect("launch failed");
        process.launch(&command("next")).expect("reaped child should not block");
        assert_eq!(launcher.commands().len(), 2);
    }
}
