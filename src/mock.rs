//! Mock process launcher for testing without vendor tools.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::command::CommandLine;
use crate::traits::{ChildProcess, DeviceError, ProcessExit, ProcessLauncher, Result, StdoutMode};

#[derive(Debug, Default)]
struct MockLog {
    commands: Vec<CommandLine>,
    kills: usize,
}

/// Mock launcher that records every command instead of running it.
///
/// Clones share the same log, so a test can keep one handle while a device
/// owns another.
#[derive(Debug, Clone)]
pub struct MockLauncher {
    log: Arc<Mutex<MockLog>>,
    stdout: Vec<String>,
    exit_code: i32,
    missing: bool,
    fail_spawn: bool,
    exit_immediately: bool,
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLauncher {
    /// Create a launcher whose programs all exist and exit with status 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(MockLog::default())),
            stdout: Vec::new(),
            exit_code: 0,
            missing: false,
            fail_spawn: false,
            exit_immediately: false,
        }
    }

    /// Every launched child prints these lines when its output is captured.
    #[must_use]
    pub fn with_stdout(mut self, lines: &[&str]) -> Self {
        self.stdout = lines.iter().map(|line| (*line).to_owned()).collect();
        self
    }

    /// Children exit with `code`.
    #[must_use]
    pub const fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Preflight reports every program as missing.
    #[must_use]
    pub const fn missing(mut self) -> Self {
        self.missing = true;
        self
    }

    /// Every launch fails as if the OS refused to spawn.
    #[must_use]
    pub const fn failing_spawn(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    /// Children report exit on the first poll instead of staying Running.
    #[must_use]
    pub const fn exiting_immediately(mut self) -> Self {
        self.exit_immediately = true;
        self
    }

    /// Commands launched so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<CommandLine> {
        self.lock().commands.clone()
    }

    /// Commands launched so far, rendered as strings.
    #[must_use]
    pub fn command_strings(&self) -> Vec<String> {
        self.lock().commands.iter().map(ToString::to_string).collect()
    }

    /// Number of children killed.
    #[must_use]
    pub fn kills(&self) -> usize {
        self.lock().kills
    }

    fn lock(&self) -> MutexGuard<'_, MockLog> {
        self.log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ProcessLauncher for MockLauncher {
    type Child = MockChild;

    fn preflight(&self, program: &Path) -> Result<PathBuf> {
        if self.missing {
            return Err(DeviceError::DeviceMissing {
                program: program.display().to_string(),
            });
        }
        Ok(program.to_path_buf())
    }

    fn launch(&self, command: &CommandLine, stdout: StdoutMode) -> Result<Self::Child> {
        if self.fail_spawn {
            return Err(DeviceError::Spawn {
                command: command.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }

        self.lock().commands.push(command.clone());

        let stdout = match stdout {
            StdoutMode::Capture => Some(self.stdout.clone()),
            StdoutMode::Inherit => None,
        };

        Ok(MockChild {
            log: Arc::clone(&self.log),
            pid: 4242,
            stdout,
            exit: ProcessExit::with_code(self.exit_code),
            running: !self.exit_immediately,
        })
    }
}

/// Mock child that stays running until waited on or killed.
#[derive(Debug)]
pub struct MockChild {
    log: Arc<Mutex<MockLog>>,
    pid: u32,
    stdout: Option<Vec<String>>,
    exit: ProcessExit,
    running: bool,
}

impl ChildProcess for MockChild {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn try_wait(&mut self) -> Result<Option<ProcessExit>> {
        Ok((!self.running).then_some(self.exit))
    }

    fn wait(&mut self) -> Result<ProcessExit> {
        self.running = false;
        Ok(self.exit)
    }

    fn kill(&mut self) -> Result<()> {
        if self.running {
            self.running = false;
            self.exit = ProcessExit::signalled();
            self.log
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .kills += 1;
        }
        Ok(())
    }

    fn read_stdout_lines(&mut self) -> Result<Vec<String>> {
        Ok(self.stdout.take().unwrap_or_default())
    }
}
