//! Core traits and types for the external-process device abstraction.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::command::CommandLine;
use crate::preflight::Preflight;

/// Exit information for a finished external process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, or `None` when the process was ended by a signal.
    pub code: Option<i32>,
}

impl ProcessExit {
    /// Exit with the given status code.
    #[must_use]
    pub const fn with_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Exit caused by a signal (no status code).
    #[must_use]
    pub const fn signalled() -> Self {
        Self { code: None }
    }

    /// Whether the process exited with status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

impl From<std::process::ExitStatus> for ProcessExit {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// What happens to a launched process's standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutMode {
    /// Share the caller's standard output.
    Inherit,
    /// Pipe standard output so it can be read back line by line.
    Capture,
}

/// Error type for device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Backing executable could not be resolved or is not executable.
    #[error("the program {program} does not exist or is not executable")]
    DeviceMissing {
        /// Program path or name as requested.
        program: String,
    },

    /// Value is not a member of the parameter's closed option set.
    #[error(
        "for the parameter \"{parameter}\" the value \"{value}\" does not match the options available: {}",
        quote_all(.allowed)
    )]
    InvalidOption {
        /// Parameter name.
        parameter: String,
        /// Rejected value.
        value: String,
        /// Every allowed value, in declaration order.
        allowed: Vec<String>,
    },

    /// Parameter cannot be set under the device's current mode.
    #[error("cannot set {parameter} in the \"{mode}\" auto exposure mode")]
    IllegalUnderMode {
        /// Parameter name.
        parameter: String,
        /// Current device mode.
        mode: String,
    },

    /// Numeric parameter outside its permitted range.
    #[error("{parameter} value {value} is out of range (expected {expected})")]
    OutOfRange {
        /// Parameter name.
        parameter: String,
        /// Rejected value.
        value: String,
        /// Human readable description of the permitted values.
        expected: String,
    },

    /// Device state query produced no usable answer.
    #[error("device state unavailable: {0}")]
    DeviceStateUnavailable(String),

    /// Device reported a mode this crate does not support.
    #[error("unsupported device mode: {0}")]
    UnsupportedMode(String),

    /// Image sequence output name lacks a `%0Xd` sequence placeholder.
    #[error("output name \"{target}\" must contain a sequence placeholder such as %04d")]
    MissingSequencePlaceholder {
        /// Offending output name.
        target: String,
    },

    /// A previous command is still running.
    #[error("device busy: process {} is still running", describe_pid(.pid))]
    Busy {
        /// Process id of the running command, when known.
        pid: Option<u32>,
    },

    /// The operating system refused to start the process.
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        /// Command line that failed to start.
        command: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error while talking to a running process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DeviceError {
    /// Whether this error means the run must stop.
    ///
    /// Missing programs, invalid or illegal parameters, out-of-range values,
    /// failed state queries and malformed sequence names describe commands that
    /// must never reach the hardware. Spawn failures, busy devices and I/O
    /// errors can be retried by the caller.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DeviceMissing { .. }
                | Self::InvalidOption { .. }
                | Self::IllegalUnderMode { .. }
                | Self::OutOfRange { .. }
                | Self::DeviceStateUnavailable(_)
                | Self::UnsupportedMode(_)
                | Self::MissingSequencePlaceholder { .. }
                | Self::Config(_)
        )
    }
}

fn quote_all(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_pid(pid: &Option<u32>) -> String {
    pid.map_or_else(|| "?".to_owned(), |p| p.to_string())
}

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Abstraction over starting external programs.
pub trait ProcessLauncher {
    /// The child handle returned by `launch`.
    type Child: ChildProcess;

    /// Resolve `program` to an executable path, failing with
    /// [`DeviceError::DeviceMissing`] when it cannot be found.
    fn preflight(&self, program: &Path) -> Result<PathBuf> {
        Preflight::new(program).require()
    }

    /// Start `command` without waiting for it.
    fn launch(&self, command: &CommandLine, stdout: StdoutMode) -> Result<Self::Child>;
}

/// Abstraction over a launched external process.
pub trait ChildProcess {
    /// OS process id, if known.
    fn id(&self) -> Option<u32>;

    /// Poll for exit without blocking.
    fn try_wait(&mut self) -> Result<Option<ProcessExit>>;

    /// Block until the process exits.
    fn wait(&mut self) -> Result<ProcessExit>;

    /// Send a termination signal.
    fn kill(&mut self) -> Result<()>;

    /// Read captured standard output until end of stream.
    ///
    /// Returns an empty list when output was not captured.
    fn read_stdout_lines(&mut self) -> Result<Vec<String>>;
}
