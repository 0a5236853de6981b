//! Process launcher implementation using `std::process`.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};

use crate::command::CommandLine;
use crate::traits::{ChildProcess, DeviceError, ProcessExit, ProcessLauncher, Result, StdoutMode};

/// Launches real operating-system processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    type Child = SystemChild;

    fn launch(&self, command: &CommandLine, stdout: StdoutMode) -> Result<Self::Child> {
        let stdout_cfg = match stdout {
            StdoutMode::Inherit => Stdio::inherit(),
            StdoutMode::Capture => Stdio::piped(),
        };

        let child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(stdout_cfg)
            .spawn()
            .map_err(|source| DeviceError::Spawn {
                command: command.to_string(),
                source,
            })?;

        Ok(SystemChild { child })
    }
}

/// A running OS process.
#[derive(Debug)]
pub struct SystemChild {
    child: Child,
}

impl ChildProcess for SystemChild {
    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn try_wait(&mut self) -> Result<Option<ProcessExit>> {
        Ok(self.child.try_wait()?.map(ProcessExit::from))
    }

    fn wait(&mut self) -> Result<ProcessExit> {
        Ok(self.child.wait()?.into())
    }

    fn kill(&mut self) -> Result<()> {
        match self.child.kill() {
            // Already exited and reaped: nothing to terminate.
            Err(err) if err.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            other => other.map_err(DeviceError::from),
        }
    }

    fn read_stdout_lines(&mut self) -> Result<Vec<String>> {
        let Some(stdout) = self.child.stdout.take() else {
            return Ok(Vec::new());
        };

        // Vendor tools may print Latin-1 labels.
        let mut lines = Vec::new();
        for line in BufReader::new(stdout).split(b'\n') {
            let mut line = line?;
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        Ok(lines)
    }
}
