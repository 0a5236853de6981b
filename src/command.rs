//! Command line construction from sparse optional parameters.

use std::fmt;
use std::path::{Path, PathBuf};

/// A program path plus its argument vector.
///
/// Arguments are kept as separate tokens and handed to the OS as-is, so a
/// value containing spaces (a phrase to speak) stays a single argument. The
/// `Display` form joins every token with one space and is meant for logs and
/// assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandLine {
    /// Executable path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Argument tokens, in order.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of times `token` appears as an argument.
    #[must_use]
    pub fn count(&self, token: &str) -> usize {
        self.args.iter().filter(|arg| *arg == token).count()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Builds a [`CommandLine`] one token at a time.
///
/// Optional parameters that are `None` are skipped, so an unset parameter never
/// reaches the command. Callers append parameters in their fixed declaration
/// order; the builder preserves insertion order.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandBuilder {
    /// Start a command for `program`.
    #[must_use]
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Append one raw token.
    #[must_use]
    pub fn arg(mut self, token: &str) -> Self {
        self.args.push(token.to_owned());
        self
    }

    /// Append `flag value` as two tokens when `value` is set.
    #[must_use]
    pub fn option<T: fmt::Display>(mut self, flag: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.args.push(flag.to_owned());
            self.args.push(value.to_string());
        }
        self
    }

    /// Append `flag=value` as one token.
    #[must_use]
    pub fn assignment<T: fmt::Display>(mut self, flag: &str, value: T) -> Self {
        self.args.push(format!("{flag}={value}"));
        self
    }

    /// Append a bare boolean `flag` when `enabled`.
    #[must_use]
    pub fn flag(mut self, flag: &str, enabled: bool) -> Self {
        if enabled {
            self.args.push(flag.to_owned());
        }
        self
    }

    /// Append gphoto2's `--set-config name=value` pair.
    #[must_use]
    pub fn set_config(mut self, name: &str, value: &str) -> Self {
        self.args.push("--set-config".to_owned());
        self.args.push(format!("{name}={value}"));
        self
    }

    /// Append the positional target as `flag target`.
    #[must_use]
    pub fn target(self, flag: &str, target: &str) -> Self {
        self.option(flag, Some(target))
    }

    /// Finish the command.
    #[must_use]
    pub fn build(self) -> CommandLine {
        CommandLine {
            program: self.program,
            args: self.args,
        }
    }
}
