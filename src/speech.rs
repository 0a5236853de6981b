//! Speech through `espeak`: words, the time, and today's date.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::command::CommandBuilder;
use crate::config::DevicesConfig;
use crate::process::{DeviceProcess, ProcessState};
use crate::system::SystemLauncher;
use crate::traits::{ProcessExit, ProcessLauncher, Result};

/// Phrase spoken by [`Speaker::time`], e.g. `Time 09 05`.
#[must_use]
pub fn time_phrase(now: &NaiveDateTime) -> String {
    now.format("Time %H %M").to_string()
}

/// Phrase spoken by [`Speaker::date`], e.g. `Todays date Tuesday March 04`.
#[must_use]
pub fn date_phrase(now: &NaiveDateTime) -> String {
    now.format("Todays date %A %B %d").to_string()
}

/// Speech synthesizer backed by `espeak`.
///
/// Each utterance is launched in the background; call
/// [`wait_for`](Speaker::wait_for) before speaking again.
pub struct Speaker<L: ProcessLauncher = SystemLauncher> {
    program: PathBuf,
    process: DeviceProcess<L>,
}

impl Speaker<SystemLauncher> {
    /// Open the synthesizer using the configured `espeak` path.
    pub fn open(config: &DevicesConfig) -> Result<Self> {
        Self::with_launcher(SystemLauncher, &config.espeak, config.verbose)
    }
}

impl<L: ProcessLauncher> Speaker<L> {
    /// Preflight `program`.
    pub fn with_launcher(launcher: L, program: &Path, verbose: bool) -> Result<Self> {
        let program = launcher.preflight(program)?;
        Ok(Self {
            program,
            process: DeviceProcess::new(launcher, verbose),
        })
    }

    /// Resolved `espeak` path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Lifecycle state of the current utterance.
    pub const fn state(&self) -> ProcessState {
        self.process.state()
    }

    /// Speak `words`. The text is passed as a single argument.
    pub fn words(&mut self, words: &str) -> Result<()> {
        let command = CommandBuilder::new(&self.program).arg(words).build();
        self.process.launch(&command)
    }

    /// Speak the current local time.
    pub fn time(&mut self) -> Result<()> {
        self.words(&time_phrase(&Local::now().naive_local()))
    }

    /// Speak today's date.
    pub fn date(&mut self) -> Result<()> {
        self.words(&date_phrase(&Local::now().naive_local()))
    }

    /// Wait for the speaking to finish.
    pub fn wait_for(&mut self) -> Result<Option<ProcessExit>> {
        self.process.wait_for_completion()
    }

    /// End the utterance if it is still running.
    pub fn destroy(&mut self) -> Result<()> {
        self.process.force_terminate()
    }
}
