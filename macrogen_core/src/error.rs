use crate::registry::FileKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MacrogenError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The required executable {name} was not found in your path")]
    MissingExecutable { name: String },

    #[error("The required file {path} was not found")]
    MissingFile { path: PathBuf },

    #[error(
        "Failed to expand {kind} for instantiation '{instance}': {hint}. \
         Probably because compilation failed."
    )]
    Expansion {
        instance: String,
        kind: FileKind,
        hint: String,
        output: String,
    },

    #[error("Command `{command}` failed with {}", describe_status(.code))]
    Subprocess {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid registry: {0}")]
    Registry(String),

    #[error("Invalid pattern: {0}")]
    Pattern(String),
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl From<regex::Error> for MacrogenError {
    fn from(err: regex::Error) -> Self {
        MacrogenError::Pattern(err.to_string())
    }
}

impl From<globwalk::GlobError> for MacrogenError {
    fn from(err: globwalk::GlobError) -> Self {
        MacrogenError::Pattern(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MacrogenError>;

impl MacrogenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MacrogenError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing_executable(name: impl Into<String>) -> Self {
        MacrogenError::MissingExecutable { name: name.into() }
    }

    pub fn missing_file(path: impl Into<PathBuf>) -> Self {
        MacrogenError::MissingFile { path: path.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        MacrogenError::Config(message.into())
    }

    pub fn registry(message: impl Into<String>) -> Self {
        MacrogenError::Registry(message.into())
    }

    /// Process exit code for this error.
    ///
    /// Configuration and expansion problems exit with 1. A failed subprocess
    /// passes its own exit code through, falling back to 1 when it was killed
    /// by a signal or reported 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            MacrogenError::Subprocess {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    /// Raw tool output attached to the error, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            MacrogenError::Expansion { output, .. } | MacrogenError::Subprocess { output, .. }
                if !output.trim().is_empty() =>
            {
                Some(output.as_str())
            }
            _ => None,
        }
    }
}
