//! Executable preflight: confirm a backing program exists before use.

use std::path::{Path, PathBuf};

use crate::traits::{DeviceError, Result};

/// Outcome of resolving one program name or path.
///
/// Resolution happens once, in [`Preflight::new`]. Bare names are looked up on
/// `PATH`; names containing a path separator are checked in place.
#[derive(Debug, Clone)]
pub struct Preflight {
    program: PathBuf,
    resolved: Option<PathBuf>,
}

impl Preflight {
    /// Resolve `program` now.
    #[must_use]
    pub fn new(program: &Path) -> Self {
        let resolved = match which::which(program) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::debug!(
                    program = %program.display(),
                    error = %err,
                    "program lookup failed"
                );
                None
            }
        };

        Self {
            program: program.to_path_buf(),
            resolved,
        }
    }

    /// Does the program exist and is it executable?
    #[must_use]
    pub const fn is_executable(&self) -> bool {
        self.resolved.is_some()
    }

    /// The resolved absolute path, if found.
    #[must_use]
    pub fn resolved(&self) -> Option<&Path> {
        self.resolved.as_deref()
    }

    /// Return the resolved path or [`DeviceError::DeviceMissing`].
    pub fn require(self) -> Result<PathBuf> {
        self.resolved.ok_or_else(|| {
            tracing::error!(program = %self.program.display(), "program does not exist");
            DeviceError::DeviceMissing {
                program: self.program.display().to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program() {
        let check = Preflight::new(Path::new("/nonexistent/definitely-not-here"));
        assert!(!check.is_executable());
        assert!(check.resolved().is_none());

        let err = check.require().expect_err("missing program must fail");
        assert!(matches!(err, DeviceError::DeviceMissing { .. }));
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[test]
    fn test_bare_name_resolves_to_absolute_path() {
        let check = Preflight::new(Path::new("sh"));
        assert!(check.is_executable());
        let path = check.require().expect("sh should be on PATH");
        assert!(path.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().expect("tempfile failed");
        let check = Preflight::new(file.path());
        assert!(!check.is_executable());
    }
}
