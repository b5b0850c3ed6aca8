//! Structured subprocess invocation.
//!
//! Every external tool (preprocessor, compiler, linker, formatter, report
//! generator, test executables) goes through [`CommandRunner`], so the
//! pipeline never builds shell strings and tests can record argument
//! vectors instead of spawning a toolchain.

use crate::error::{MacrogenError, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// A program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds `-I <dir>` for each directory.
    pub fn includes<'a>(mut self, dirs: impl IntoIterator<Item = &'a Path>) -> Self {
        for dir in dirs {
            self.args.push("-I".into());
            self.args.push(dir.as_os_str().to_os_string());
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Arguments as lossy strings, for assertions and display.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Status and merged stdout/stderr of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub code: Option<i32>,
    pub output: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub trait CommandRunner {
    /// Runs to completion with inherited stdio. A non-zero exit is an error.
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Runs to completion collecting stdout followed by stderr. The exit
    /// status is reported, not checked.
    fn capture(&self, invocation: &Invocation) -> Result<Captured>;
}

/// Spawns real processes and echoes each command line, the way an operator
/// would see it typed.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    pub echo: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self { echo: true }
    }

    pub fn quiet() -> Self {
        Self { echo: false }
    }

    fn spawn_error(invocation: &Invocation, source: std::io::Error) -> MacrogenError {
        if source.kind() == std::io::ErrorKind::NotFound {
            return MacrogenError::missing_executable(invocation.program.to_string_lossy());
        }
        MacrogenError::Spawn {
            program: invocation.program.to_string_lossy().into_owned(),
            source,
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        if self.echo {
            println!("{invocation}");
        }
        debug!("Running {}", invocation);

        let status = invocation
            .to_command()
            .status()
            .map_err(|e| Self::spawn_error(invocation, e))?;

        if status.success() {
            Ok(())
        } else {
            warn!("{} exited with {:?}", invocation, status.code());
            Err(MacrogenError::Subprocess {
                command: invocation.to_string(),
                code: status.code(),
                output: String::new(),
            })
        }
    }

    fn capture(&self, invocation: &Invocation) -> Result<Captured> {
        if self.echo {
            println!("{invocation}");
        }
        debug!("Capturing {}", invocation);

        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::spawn_error(invocation, e))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(Captured {
            code: output.status.code(),
            output: text,
        })
    }
}

/// Records invocations instead of spawning them.
///
/// Captures replay queued outputs in order; once the queue is empty they
/// report an empty successful run.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingRunner {
    pub calls: std::cell::RefCell<Vec<Invocation>>,
    pub captures: std::cell::RefCell<std::collections::VecDeque<Captured>>,
    pub fail_on: Option<(String, i32)>,
}

#[cfg(test)]
impl RecordingRunner {
    pub fn failing_on(program_suffix: &str, code: i32) -> Self {
        Self {
            fail_on: Some((program_suffix.to_string(), code)),
            ..Self::default()
        }
    }

    pub fn queue_output(&self, output: &str) {
        self.captures.borrow_mut().push_back(Captured {
            code: Some(0),
            output: output.to_string(),
        });
    }

    pub fn recorded(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }
}

#[cfg(test)]
impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        self.calls.borrow_mut().push(invocation.clone());
        if let Some((suffix, code)) = &self.fail_on
            && invocation.to_string().ends_with(suffix.as_str())
        {
            return Err(MacrogenError::Subprocess {
                command: invocation.to_string(),
                code: Some(*code),
                output: String::new(),
            });
        }
        Ok(())
    }

    fn capture(&self, invocation: &Invocation) -> Result<Captured> {
        self.calls.borrow_mut().push(invocation.clone());
        Ok(self.captures.borrow_mut().pop_front().unwrap_or(Captured {
            code: Some(0),
            output: String::new(),
        }))
    }
}
