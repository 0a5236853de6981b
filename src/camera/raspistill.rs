//! Raspberry Pi camera capture through `raspistill`.
//!
//! Setters only record parameters. Nothing runs until
//! [`capture`](RaspistillCamera::capture), which turns the recorded set into
//! one `raspistill` command and launches it without waiting. Call
//! [`wait_for`](RaspistillCamera::wait_for) before the next capture; a still
//! image takes about five seconds.
//!
//! For an image sequence (timeout and time-lapse both set) the output name
//! must contain a sequence field such as `my_pics%04d.jpg`.
//!
//! See <https://www.raspberrypi.org/documentation/raspbian/applications/camera.md>.

use std::path::{Path, PathBuf};

use crate::command::{CommandBuilder, CommandLine};
use crate::config::DevicesConfig;
use crate::process::{DeviceProcess, ProcessState};
use crate::system::SystemLauncher;
use crate::traits::{DeviceError, ProcessExit, ProcessLauncher, Result};
use crate::validation::{
    check_at_least, check_one_of, check_options, check_range, check_sequence_placeholder,
};

const EXPOSURE_MODES: [&str; 12] = [
    "auto",
    "night",
    "nightpreview",
    "backlight",
    "spotlight",
    "sports",
    "snow",
    "beach",
    "verylong",
    "fixedfps",
    "antishake",
    "fireworks",
];

const AWB_MODES: [&str; 9] = [
    "off",
    "auto",
    "sun",
    "shade",
    "tungsten",
    "fluorescent",
    "incandescent",
    "flash",
    "horizon",
];

const METERING_MODES: [&str; 4] = ["average", "spot", "backlit", "matrix"];

const DRC_MODES: [&str; 4] = ["off", "low", "medium", "high"];

const ROTATIONS: [u32; 4] = [0, 90, 180, 270];

const DEFAULT_IMAGE: &str = "image.jpg";
const DEFAULT_SEQUENCE: &str = "image%06d.jpg";

/// Recorded `raspistill` parameters. `None` means the flag is not emitted.
///
/// Field order is emission order.
#[derive(Debug, Clone, Default, PartialEq)]
struct Settings {
    width: Option<u32>,
    height: Option<u32>,
    quality: Option<u32>,
    sharpness: Option<i32>,
    contrast: Option<i32>,
    brightness: Option<u32>,
    saturation: Option<i32>,
    iso: Option<u32>,
    ev: Option<i32>,
    exposure: Option<String>,
    awb: Option<String>,
    metering: Option<String>,
    rotation: Option<u32>,
    hflip: bool,
    vflip: bool,
    roi: Option<[f32; 4]>,
    shutter: Option<u32>,
    drc: Option<String>,
    timeout: Option<u32>,
    timelapse: Option<u32>,
}

impl Settings {
    const fn is_sequence(&self) -> bool {
        self.timeout.is_some() && self.timelapse.is_some()
    }

    fn append_to(&self, builder: CommandBuilder) -> CommandBuilder {
        let roi = self
            .roi
            .map(|[x, y, w, h]| format!("{x},{y},{w},{h}"));

        builder
            .option("--width", self.width)
            .option("--height", self.height)
            .option("--quality", self.quality)
            .option("--sharpness", self.sharpness)
            .option("--contrast", self.contrast)
            .option("--brightness", self.brightness)
            .option("--saturation", self.saturation)
            .option("--ISO", self.iso)
            .option("--ev", self.ev)
            .option("--exposure", self.exposure.as_deref())
            .option("--awb", self.awb.as_deref())
            .option("--metering", self.metering.as_deref())
            .option("--rotation", self.rotation)
            .flag("--hflip", self.hflip)
            .flag("--vflip", self.vflip)
            .option("--roi", roi)
            .option("--shutter", self.shutter)
            .option("--drc", self.drc.as_deref())
            .option("--timeout", self.timeout)
            .option("--timelapse", self.timelapse)
    }
}

/// The Raspberry Pi camera module driven by `raspistill`.
pub struct RaspistillCamera<L: ProcessLauncher = SystemLauncher> {
    program: PathBuf,
    settings: Settings,
    directory: Option<PathBuf>,
    last_output: Option<String>,
    process: DeviceProcess<L>,
}

impl RaspistillCamera<SystemLauncher> {
    /// Open the camera using the configured `raspistill` path.
    pub fn open(config: &DevicesConfig) -> Result<Self> {
        Self::with_launcher(SystemLauncher, &config.raspistill, config.verbose)
    }
}

impl<L: ProcessLauncher> RaspistillCamera<L> {
    /// Preflight `program` and start with every parameter unset.
    pub fn with_launcher(launcher: L, program: &Path, verbose: bool) -> Result<Self> {
        let program = launcher.preflight(program)?;
        Ok(Self {
            program,
            settings: Settings::default(),
            directory: None,
            last_output: None,
            process: DeviceProcess::new(launcher, verbose),
        })
    }

    /// Resolved `raspistill` path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Lifecycle state of the current capture.
    pub const fn state(&self) -> ProcessState {
        self.process.state()
    }

    /// Output target used by the most recent capture.
    pub fn last_output(&self) -> Option<&str> {
        self.last_output.as_deref()
    }

    /// Clear every parameter and the last output target.
    ///
    /// The storage directory is kept.
    pub fn reset_defaults(&mut self) {
        self.settings = Settings::default();
        self.last_output = None;
    }

    /// Store images under `directory`, creating it if needed.
    ///
    /// Applies to output names without a `/`.
    pub fn directory(&mut self, directory: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(directory)?;
        let canonical = directory.canonicalize()?;
        tracing::debug!(directory = %canonical.display(), "image directory set");
        self.directory = Some(canonical.clone());
        Ok(canonical)
    }

    /// Build the command the next capture would launch.
    pub fn command(&self, output: Option<&str>) -> Result<CommandLine> {
        self.build(output).map(|(command, _)| command)
    }

    /// Acquire an image or image sequence.
    ///
    /// With no output name, `image.jpg` is used, or `image%06d.jpg` for a
    /// sequence.
    pub fn capture(&mut self, output: Option<&str>) -> Result<()> {
        let (command, target) = self.build(output)?;
        self.process.launch(&command)?;
        self.last_output = Some(target);
        Ok(())
    }

    /// Block until the capture completes.
    pub fn wait_for(&mut self) -> Result<Option<ProcessExit>> {
        self.process.wait_for_completion()
    }

    /// Kill the running capture.
    pub fn destroy(&mut self) -> Result<()> {
        self.process.force_terminate()
    }

    /// Set image width (1 - 2592) and height (1 - 1944) in pixels.
    ///
    /// Keep the ratio of the sensor's 2592x1944 to capture the whole scene.
    pub fn set_width_height(&mut self, width: u32, height: u32) -> Result<()> {
        let width = check_range("width", width, 1, 2592)?;
        let height = check_range("height", height, 1, 1944)?;
        self.settings.width = Some(width);
        self.settings.height = Some(height);
        Ok(())
    }

    /// JPEG quality (0 - 100).
    pub fn set_quality(&mut self, quality: u32) -> Result<()> {
        self.settings.quality = Some(check_range("quality", quality, 0, 100)?);
        Ok(())
    }

    /// Sharpness (-100 - 100).
    pub fn set_sharpness(&mut self, sharpness: i32) -> Result<()> {
        self.settings.sharpness = Some(check_range("sharpness", sharpness, -100, 100)?);
        Ok(())
    }

    /// Contrast (-100 - 100).
    pub fn set_contrast(&mut self, contrast: i32) -> Result<()> {
        self.settings.contrast = Some(check_range("contrast", contrast, -100, 100)?);
        Ok(())
    }

    /// Brightness (0 - 100).
    pub fn set_brightness(&mut self, brightness: u32) -> Result<()> {
        self.settings.brightness = Some(check_range("brightness", brightness, 0, 100)?);
        Ok(())
    }

    /// Saturation (-100 - 100).
    pub fn set_saturation(&mut self, saturation: i32) -> Result<()> {
        self.settings.saturation = Some(check_range("saturation", saturation, -100, 100)?);
        Ok(())
    }

    /// ISO (100 - 800).
    pub fn set_iso(&mut self, iso: u32) -> Result<()> {
        self.settings.iso = Some(check_range("ISO", iso, 100, 800)?);
        Ok(())
    }

    /// Exposure compensation (-10 - 10).
    pub fn set_ev(&mut self, ev: i32) -> Result<()> {
        self.settings.ev = Some(check_range("EV", ev, -10, 10)?);
        Ok(())
    }

    /// Exposure mode, e.g. `auto`, `night`, `sports`.
    pub fn set_exposure_mode(&mut self, exposure: &str) -> Result<()> {
        check_options("exposure", exposure, &EXPOSURE_MODES)?;
        self.settings.exposure = Some(exposure.to_owned());
        Ok(())
    }

    /// Automatic white balance, e.g. `auto`, `sun`, `tungsten`.
    pub fn set_awb(&mut self, awb: &str) -> Result<()> {
        check_options("awb", awb, &AWB_MODES)?;
        self.settings.awb = Some(awb.to_owned());
        Ok(())
    }

    /// Metering mode: `average`, `spot`, `backlit` or `matrix`.
    pub fn set_metering(&mut self, metering: &str) -> Result<()> {
        check_options("metering", metering, &METERING_MODES)?;
        self.settings.metering = Some(metering.to_owned());
        Ok(())
    }

    /// Rotation in degrees: 0, 90, 180 or 270.
    pub fn set_rotation(&mut self, rotation: u32) -> Result<()> {
        self.settings.rotation = Some(check_one_of("rotation", rotation, &ROTATIONS)?);
        Ok(())
    }

    /// Flip horizontally.
    pub fn set_hflip(&mut self) {
        self.settings.hflip = true;
    }

    /// Flip vertically.
    pub fn set_vflip(&mut self) {
        self.settings.vflip = true;
    }

    /// Region of interest: start x, start y, width, height, each 0.0 - 1.0.
    pub fn set_roi(&mut self, roi: &[f32]) -> Result<()> {
        let roi: [f32; 4] = roi.try_into().map_err(|_| DeviceError::OutOfRange {
            parameter: "roi".to_owned(),
            value: format!("{} values", roi.len()),
            expected: "exactly 4 values".to_owned(),
        })?;
        for value in roi {
            check_range("roi", value, 0.0, 1.0)?;
        }
        self.settings.roi = Some(roi);
        Ok(())
    }

    /// Exposure time in microseconds (1 - 6000000).
    pub fn set_shutter(&mut self, shutter: u32) -> Result<()> {
        self.settings.shutter = Some(check_range("shutter", shutter, 1, 6_000_000)?);
        Ok(())
    }

    /// Dynamic range compression: `off`, `low`, `medium` or `high`.
    pub fn set_drc(&mut self, drc: &str) -> Result<()> {
        check_options("drc", drc, &DRC_MODES)?;
        self.settings.drc = Some(drc.to_owned());
        Ok(())
    }

    /// Total duration of an image sequence in milliseconds (at least 1).
    pub fn set_timeout(&mut self, timeout: u32) -> Result<()> {
        self.settings.timeout = Some(check_at_least("timeout", timeout, 1)?);
        Ok(())
    }

    /// Milliseconds between images of a sequence; 0 takes the next image
    /// immediately.
    pub fn set_timelapse(&mut self, timelapse: u32) {
        self.settings.timelapse = Some(timelapse);
    }

    fn build(&self, output: Option<&str>) -> Result<(CommandLine, String)> {
        let sequence = self.settings.is_sequence();
        let name = output.unwrap_or(if sequence {
            DEFAULT_SEQUENCE
        } else {
            DEFAULT_IMAGE
        });

        if sequence {
            check_sequence_placeholder(name)?;
        }

        let target = match &self.directory {
            Some(directory) if !name.contains('/') => directory.join(name).display().to_string(),
            _ => name.to_owned(),
        };

        let command = self
            .settings
            .append_to(CommandBuilder::new(&self.program))
            .target("--output", &target)
            .build();
        Ok((command, target))
    }
}
