//! Pi-Shell-Devices: command-line driven camera and speech devices for Raspberry Pi
//!
//! This library wraps vendor command-line tools (`gphoto2`, `raspistill`,
//! `espeak`) behind typed device objects. Every operation follows the same
//! lifecycle: validate parameters, build a command, launch it as an external
//! process, then wait for it or terminate it. The process launcher is a trait,
//! so devices can be driven by mocks in tests.

pub mod camera;
pub mod command;
pub mod config;
pub mod preflight;
pub mod process;
pub mod speech;
pub mod system;
pub mod traits;
pub mod validation;

#[cfg(test)]
pub mod mock;

pub use camera::{ExposureMode, GphotoCamera, RaspistillCamera};
pub use command::{CommandBuilder, CommandLine};
pub use config::DevicesConfig;
pub use preflight::Preflight;
pub use process::{DeviceProcess, ProcessState};
pub use speech::Speaker;
pub use system::SystemLauncher;
pub use traits::{ChildProcess, DeviceError, ProcessExit, ProcessLauncher, Result, StdoutMode};
