//! Canon camera control through `gphoto2`.
//!
//! The camera's auto exposure mode is queried once when the controller is
//! opened and decides which settings may be changed. Every setter runs its
//! `--set-config` command to completion before returning; captures are
//! launched in the background and the caller decides when to
//! [`wait_for`](GphotoCamera::wait_for) them.
//!
//! Images are always stored on the camera's card (`capturetarget=1`).

use std::fmt;
use std::path::{Path, PathBuf};

use crate::command::{CommandBuilder, CommandLine};
use crate::config::DevicesConfig;
use crate::process::{DeviceProcess, ProcessState};
use crate::system::SystemLauncher;
use crate::traits::{DeviceError, ProcessExit, ProcessLauncher, Result};
use crate::validation::{check_at_least, check_options};

/// Marker preceding the current value in `--get-config` output.
const CURRENT_MARKER: &str = "Current:";

/// gphoto2's rendering of the Canon "CA" (creative auto) mode.
const CREATIVE_AUTO: &str = "Unknown value 0013";

/// Canon auto exposure modes this controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    /// Program AE.
    Program,
    /// Shutter priority.
    Tv,
    /// Aperture priority.
    Av,
    /// Full manual.
    Manual,
    /// Bulb exposure.
    Bulb,
}

impl ExposureMode {
    /// Every supported mode, in the order gphoto2 documents them.
    pub const ALL: [Self; 5] = [Self::Tv, Self::Av, Self::Program, Self::Manual, Self::Bulb];

    /// The literal gphoto2 reports for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Program => "P",
            Self::Tv => "TV",
            Self::Av => "AV",
            Self::Manual => "Manual",
            Self::Bulb => "Bulb",
        }
    }

    /// Parse a reported mode value.
    pub fn parse(value: &str) -> Result<Self> {
        if value.contains(CREATIVE_AUTO) {
            return Err(DeviceError::UnsupportedMode(format!(
                "auto exposure mode \"CA\" ({value}) is not supported"
            )));
        }

        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| {
                DeviceError::UnsupportedMode(format!(
                    "auto exposure mode \"{value}\" must be P, TV, AV, Manual, or Bulb"
                ))
            })
    }
}

impl fmt::Display for ExposureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract the auto exposure mode from `--get-config` output.
///
/// The last line carrying the `Current:` marker wins; the value is the text
/// after the first space following the marker.
pub fn parse_exposure_mode(lines: &[String]) -> Result<ExposureMode> {
    let value = lines
        .iter()
        .rev()
        .find_map(|line| {
            let at = line.find(CURRENT_MARKER)?;
            let rest = line.get(at..)?;
            rest.split_once(' ').map(|(_, value)| value.trim())
        })
        .ok_or_else(|| {
            DeviceError::DeviceStateUnavailable(
                "no auto exposure mode reported; the camera may be off or not connected \
                 (try `sudo killall gvfs-gphoto2-volume-monitor`)"
                    .to_owned(),
            )
        })?;

    ExposureMode::parse(value)
}

/// When a setting may be changed.
#[derive(Debug, Clone, Copy)]
enum Legality {
    Always,
    NotUnder(ExposureMode),
    OnlyUnder(&'static [ExposureMode]),
}

impl Legality {
    fn allows(self, mode: ExposureMode) -> bool {
        match self {
            Self::Always => true,
            Self::NotUnder(forbidden) => mode != forbidden,
            Self::OnlyUnder(modes) => modes.contains(&mode),
        }
    }
}

/// One configurable camera setting.
#[derive(Debug, Clone, Copy)]
struct Setting {
    name: &'static str,
    config: &'static str,
    options: &'static [&'static str],
    legality: Legality,
}

const SHUTTER_SPEED: Setting = Setting {
    name: "ShutterSpeed",
    config: "shutterspeed",
    options: &[
        "0", "25", "20", "15", "13", "10", "8", "6", "5", "4", "3.2", "2.5", "2", "1.6", "1.3",
        "1", "0.8", "0.6", "0.5", "0.4", "0.3", "1/4", "1/5", "1/6", "1/8", "1/10", "1/13",
        "1/15", "1/20", "1/25", "1/30", "1/40", "1/50", "1/60", "1/80", "1/100", "1/125",
        "1/160", "1/200", "1/250", "1/320", "1/400", "1/500", "1/640", "1/800", "1/1000",
        "1/1250", "1/1600", "1/2000", "1/2500", "1/3200", "1/4000", "1/5000", "1/6400",
        "1/8000",
    ],
    legality: Legality::NotUnder(ExposureMode::Av),
};

const APERTURE: Setting = Setting {
    name: "Aperture",
    config: "aperture",
    options: &[
        "1.8", "2", "2.2", "2.5", "2.8", "3.2", "3.5", "4", "4.5", "5", "5.6", "6.3", "7.1", "8",
        "9", "10", "11", "13", "14", "16", "18", "20", "22",
    ],
    legality: Legality::NotUnder(ExposureMode::Tv),
};

const EXPOSURE_COMPENSATION: Setting = Setting {
    name: "ExposureCompensation",
    config: "exposurecompensation",
    options: &[
        "-5", "-4.6", "-4.3", "-4", "-3.6", "-3.3", "-3", "-2.6", "-2.3", "-2", "-1.6", "-1.3",
        "-1.0", "-0.6", "-0.3", "0", "0.3", "0.6", "1.0", "1.3", "1.6", "2", "2.3", "2.6", "3",
        "3.3", "3.6", "4", "4.3", "4.6", "5",
    ],
    legality: Legality::OnlyUnder(&[ExposureMode::Tv, ExposureMode::Av]),
};

const ISO: Setting = Setting {
    name: "ISO",
    config: "iso",
    options: &["100", "200", "400", "800", "1600", "3200", "6400"],
    legality: Legality::Always,
};

const METERING_MODE: Setting = Setting {
    name: "MeteringMode",
    config: "meteringmode",
    options: &["Evaluative", "Partial", "Spot"],
    legality: Legality::Always,
};

const WHITE_BALANCE: Setting = Setting {
    name: "WhiteBalance",
    config: "whitebalance",
    options: &[
        "Auto",
        "Daylight",
        "Shadow",
        "Cloudy",
        "Tungsten",
        "Fluorescent",
        "Flash",
        "Manual",
    ],
    legality: Legality::Always,
};

/// A Canon camera attached over USB and driven by `gphoto2`.
pub struct GphotoCamera<L: ProcessLauncher = SystemLauncher> {
    program: PathBuf,
    mode: ExposureMode,
    process: DeviceProcess<L>,
}

impl GphotoCamera<SystemLauncher> {
    /// Open the camera using the configured `gphoto2` path.
    pub fn open(config: &DevicesConfig) -> Result<Self> {
        Self::with_launcher(SystemLauncher, &config.gphoto2, config.verbose)
    }
}

impl<L: ProcessLauncher> GphotoCamera<L> {
    /// Preflight `program` and query the camera's auto exposure mode.
    pub fn with_launcher(launcher: L, program: &Path, verbose: bool) -> Result<Self> {
        let program = launcher.preflight(program)?;
        let mut process = DeviceProcess::new(launcher, verbose);
        let mode = query_exposure_mode(&mut process, &program)?;
        tracing::info!(mode = %mode, "Canon auto exposure mode");

        Ok(Self {
            program,
            mode,
            process,
        })
    }

    /// Resolved `gphoto2` path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Auto exposure mode cached at open or at the last refresh.
    pub const fn exposure_mode(&self) -> ExposureMode {
        self.mode
    }

    /// Re-query the camera's auto exposure mode.
    pub fn refresh_exposure_mode(&mut self) -> Result<ExposureMode> {
        self.mode = query_exposure_mode(&mut self.process, &self.program)?;
        Ok(self.mode)
    }

    /// Lifecycle state of the current command.
    pub const fn state(&self) -> ProcessState {
        self.process.state()
    }

    /// Take one image. Call [`wait_for`](Self::wait_for) before the next command.
    pub fn image(&mut self) -> Result<()> {
        let command = self.capture_command().build();
        self.process.launch(&command)
    }

    /// Take `frames` images separated by `interval` seconds.
    ///
    /// Leave enough interval for long exposures.
    pub fn image_sequence(&mut self, frames: u32, interval: u32) -> Result<()> {
        check_at_least("frames", frames, 1)?;
        let command = self
            .capture_command()
            .assignment("--frames", frames)
            .assignment("--interval", interval)
            .build();
        self.process.launch(&command)
    }

    /// Block until the image or image sequence completes.
    pub fn wait_for(&mut self) -> Result<Option<ProcessExit>> {
        self.process.wait_for_completion()
    }

    /// Kill the running capture.
    pub fn destroy(&mut self) -> Result<()> {
        self.process.force_terminate()
    }

    /// Set the shutter speed. Not available in AV mode.
    pub fn set_shutter_speed(&mut self, shutter_speed: &str) -> Result<()> {
        self.apply(&SHUTTER_SPEED, shutter_speed)
    }

    /// Set the aperture. Not available in TV mode.
    pub fn set_aperture(&mut self, aperture: &str) -> Result<()> {
        self.apply(&APERTURE, aperture)
    }

    /// Set exposure compensation. Only available in TV and AV modes.
    pub fn set_exposure_compensation(&mut self, compensation: &str) -> Result<()> {
        self.apply(&EXPOSURE_COMPENSATION, compensation)
    }

    /// Set ISO.
    pub fn set_iso(&mut self, iso: &str) -> Result<()> {
        self.apply(&ISO, iso)
    }

    /// Set the metering mode.
    pub fn set_metering_mode(&mut self, metering_mode: &str) -> Result<()> {
        self.apply(&METERING_MODE, metering_mode)
    }

    /// Set the white balance.
    pub fn set_white_balance(&mut self, white_balance: &str) -> Result<()> {
        self.apply(&WHITE_BALANCE, white_balance)
    }

    fn apply(&mut self, setting: &Setting, value: &str) -> Result<()> {
        if !setting.legality.allows(self.mode) {
            return Err(DeviceError::IllegalUnderMode {
                parameter: setting.name.to_owned(),
                mode: self.mode.to_string(),
            });
        }
        check_options(setting.name, value, setting.options)?;

        let command = CommandBuilder::new(&self.program)
            .set_config(setting.config, value)
            .build();
        self.process.run_to_completion(&command)?;
        Ok(())
    }

    fn capture_command(&self) -> CommandBuilder {
        CommandBuilder::new(&self.program)
            .set_config("capturetarget", "1")
            .arg("--capture-image")
    }
}

fn query_exposure_mode<L: ProcessLauncher>(
    process: &mut DeviceProcess<L>,
    program: &Path,
) -> Result<ExposureMode> {
    let command: CommandLine = CommandBuilder::new(program)
        .arg("--get-config")
        .arg("autoexposuremode")
        .build();
    let lines = process.query_lines(&command)?;
    parse_exposure_mode(&lines)
}
