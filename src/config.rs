//! TOML configuration for program locations.
//!
//! Every field is optional in the file; missing fields keep their defaults.
//!
//! ```toml
//! gphoto2 = "/usr/local/bin/gphoto2"
//! verbose = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::traits::{DeviceError, Result};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "PI_DEVICES_CONFIG";

/// Program paths and logging verbosity for every device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevicesConfig {
    /// Canon camera control utility.
    pub gphoto2: PathBuf,
    /// Raspberry Pi still-image utility.
    pub raspistill: PathBuf,
    /// Speech synthesizer.
    pub espeak: PathBuf,
    /// Log every command line at `info` level.
    pub verbose: bool,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            gphoto2: PathBuf::from("/usr/bin/gphoto2"),
            raspistill: PathBuf::from("/usr/bin/raspistill"),
            espeak: PathBuf::from("/usr/bin/espeak"),
            verbose: false,
        }
    }
}

impl DevicesConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| DeviceError::Config(err.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            DeviceError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load the file named by `PI_DEVICES_CONFIG`, or fall back to defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = DevicesConfig::from_toml_str("").expect("parse failed");
        assert_eq!(config, DevicesConfig::default());
    }

    #[test]
    fn test_partial_overlay() {
        let config = DevicesConfig::from_toml_str(
            r#"
            espeak = "/opt/espeak/bin/espeak"
            verbose = true
            "#,
        )
        .expect("parse failed");

        assert_eq!(config.espeak, PathBuf::from("/opt/espeak/bin/espeak"));
        assert!(config.verbose);
        assert_eq!(config.gphoto2, PathBuf::from("/usr/bin/gphoto2"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = DevicesConfig::from_toml_str("camera = \"canon\"").expect_err("unknown field");
        assert!(matches!(err, DeviceError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile failed");
        writeln!(file, "raspistill = \"/usr/local/bin/raspistill\"").expect("write failed");

        let config = DevicesConfig::load(file.path()).expect("load failed");
        assert_eq!(config.raspistill, PathBuf::from("/usr/local/bin/raspistill"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = DevicesConfig::load(Path::new("/nonexistent/devices.toml"))
            .expect_err("missing file");
        assert!(err.is_fatal());
    }
}
