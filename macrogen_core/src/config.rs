use crate::error::{MacrogenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::{debug, info, trace};

/// Name of the optional configuration file.
pub const CONFIG_FILE_NAME: &str = "macrogen.toml";

/// Where inputs are read from and outputs are written to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Root of the test tree. Drivers live here; generated code goes below it.
    pub output_dir: PathBuf,
    /// Hand-written unit test headers included by the drivers.
    pub unit_test_dir: PathBuf,
    /// Include root of the macro library itself.
    pub library_include_dir: PathBuf,
    /// Shared scratch file holding the unit being expanded.
    pub unit_file: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./tests"),
            unit_test_dir: PathBuf::from("./tests/unt"),
            library_include_dir: PathBuf::from("./src"),
            unit_file: PathBuf::from("./tests/build/unit.c"),
        }
    }
}

/// Compiler and flags used for compiling and linking.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CompilerConfig {
    pub cc: String,
    pub cflags: Vec<String>,
    pub lflags: Vec<String>,
    /// Added to every compile and link step of a coverage build.
    pub coverage_flags: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cc: "gcc".to_string(),
            cflags: vec!["-Wall".into(), "-Werror".into(), "-O3".into()],
            lflags: Vec::new(),
            coverage_flags: vec!["--coverage".into(), "-O0".into()],
        }
    }
}

/// How generation units are built and expanded.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ExpansionConfig {
    /// `-E` preprocess only, `-P` no linemarkers, `-C` keep comments.
    pub flags: Vec<String>,
    /// Delimits the expanded code. Must be a valid C comment.
    pub sentinel: String,
    /// Header declaring every macro family. When unset, each unit includes
    /// its instantiation's template header instead.
    pub umbrella_header: Option<String>,
    /// Invocations are `<prefix>_HEADER(...)` and `<prefix>_SOURCE(...)`.
    pub macro_prefix: String,
    /// Function modifier passed to the macro family.
    pub visibility: String,
    /// Whether the macro family accepts a shorter parameter tuple, letting
    /// trailing empty parameters be dropped.
    pub variadic: bool,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            flags: vec!["-E".into(), "-P".into(), "-C".into()],
            sentinel: "// C_MACRO_COLLECTIONS_CODE".to_string(),
            umbrella_header: Some("macro_collections.h".to_string()),
            macro_prefix: "C_MACRO_COLLECTIONS_ALL".to_string(),
            visibility: "PUBLIC".to_string(),
            variadic: false,
        }
    }
}

/// Coverage report generation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CoverageConfig {
    pub tool: String,
    pub flags: Vec<String>,
    /// Report files relocated into the coverage directory.
    pub report_glob: String,
    /// Report files deleted before relocation (library headers).
    pub discard_glob: String,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            tool: "gcov".to_string(),
            flags: Vec::new(),
            report_glob: "*.gcov".to_string(),
            discard_glob: "*.h.gcov".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FormatterConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            program: "clang-format".to_string(),
            args: vec!["--style=file".into(), "-i".into()],
        }
    }
}

/// File stems of the hand-written drivers inside the output directory.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    pub main: String,
    pub coverage: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            main: "main".to_string(),
            coverage: "codecov".to_string(),
        }
    }
}

/// Root configuration. Every section is optional and falls back to the
/// defaults of the conventional `tests/` tree layout.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MacrogenConfig {
    pub directories: DirectoryConfig,
    pub compiler: CompilerConfig,
    pub expansion: ExpansionConfig,
    pub coverage: CoverageConfig,
    pub formatter: FormatterConfig,
    pub drivers: DriverConfig,
}

impl MacrogenConfig {
    /// Loads configuration from an explicit file, or from `macrogen.toml`
    /// found in the current directory or one of its ancestors, or falls back
    /// to the defaults when neither exists.
    pub fn load(explicit: Option<&Path>) -> Result<MacrogenConfig> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(MacrogenError::missing_file(path));
                }
                Some(path.to_path_buf())
            }
            None => Self::find_config_file()?,
        };

        match path {
            Some(path) => Self::from_path(&path),
            None => {
                info!("No {} found, using built-in defaults", CONFIG_FILE_NAME);
                Ok(MacrogenConfig::default())
            }
        }
    }

    /// Parses a configuration file.
    pub fn from_path(path: &Path) -> Result<MacrogenConfig> {
        info!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path).map_err(|e| MacrogenError::io(path, e))?;
        debug!("Configuration file size: {} bytes", contents.len());

        let config: MacrogenConfig = toml::from_str(&contents).map_err(|e| MacrogenError::Toml {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn find_config_file() -> Result<Option<PathBuf>> {
        let current_dir = env::current_dir().map_err(|e| MacrogenError::io(".", e))?;
        debug!("Starting config file search from: {:?}", current_dir);

        for path in current_dir.ancestors() {
            let config_path = path.join(CONFIG_FILE_NAME);
            trace!("Checking for config at: {:?}", config_path);
            if config_path.is_file() {
                return Ok(Some(config_path));
            }
        }
        Ok(None)
    }

    /// Rejects settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.expansion.sentinel.trim().is_empty() {
            return Err(MacrogenError::config("expansion.sentinel must not be empty"));
        }
        if !(self.expansion.sentinel.starts_with("//") || self.expansion.sentinel.starts_with("/*"))
        {
            return Err(MacrogenError::config(format!(
                "expansion.sentinel must be a C comment, got {:?}",
                self.expansion.sentinel
            )));
        }
        if self.compiler.cc.is_empty() {
            return Err(MacrogenError::config("compiler.cc must not be empty"));
        }
        if self.drivers.main.is_empty() || self.drivers.coverage.is_empty() {
            return Err(MacrogenError::config("driver names must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for MacrogenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.directories;
        let c = &self.compiler;
        let e = &self.expansion;
        let cov = &self.coverage;
        writeln!(f, "Directory Settings")?;
        writeln!(f, "    OUTPUT_DIR = {}", d.output_dir.display())?;
        writeln!(f, "    UNIT_TEST_DIR = {}", d.unit_test_dir.display())?;
        writeln!(f, "    LIBRARY_INCLUDE_DIR = {}", d.library_include_dir.display())?;
        writeln!(f, "    UNIT_FILE = {}", d.unit_file.display())?;
        writeln!(f, "File Settings")?;
        writeln!(f, "    MAIN = {}", self.drivers.main)?;
        writeln!(f, "    CODECOV = {}", self.drivers.coverage)?;
        writeln!(f, "Compiler Settings")?;
        writeln!(f, "    CC = {}", c.cc)?;
        writeln!(f, "    CFLAGS = {:?}", c.cflags)?;
        writeln!(f, "    LFLAGS = {:?}", c.lflags)?;
        writeln!(f, "    CVFLAGS = {:?}", c.coverage_flags)?;
        writeln!(f, "Coverage Settings")?;
        writeln!(f, "    TOOL = {}", cov.tool)?;
        writeln!(f, "    FLAGS = {:?}", cov.flags)?;
        writeln!(f, "    REPORT_GLOB = {}", cov.report_glob)?;
        writeln!(f, "    DISCARD_GLOB = {}", cov.discard_glob)?;
        writeln!(f, "Formatter Settings")?;
        writeln!(f, "    PROGRAM = {}", self.formatter.program)?;
        writeln!(f, "    ARGS = {:?}", self.formatter.args)?;
        writeln!(f, "Macro Expansion")?;
        writeln!(f, "    EXPAND_FLAGS = {:?}", e.flags)?;
        writeln!(f, "    SENTINEL = {}", e.sentinel)?;
        writeln!(
            f,
            "    UMBRELLA_HEADER = {}",
            e.umbrella_header.as_deref().unwrap_or("(template header)")
        )?;
        writeln!(f, "    MACRO_PREFIX = {}", e.macro_prefix)?;
        writeln!(f, "    VISIBILITY = {}", e.visibility)?;
        write!(f, "    VARIADIC = {}", e.variadic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_test_tree_layout() {
        let config = MacrogenConfig::default();
        assert_eq!(config.directories.output_dir, PathBuf::from("./tests"));
        assert_eq!(config.compiler.cc, "gcc");
        assert_eq!(config.compiler.cflags, vec!["-Wall", "-Werror", "-O3"]);
        assert_eq!(config.compiler.coverage_flags, vec!["--coverage", "-O0"]);
        assert_eq!(config.expansion.flags, vec!["-E", "-P", "-C"]);
        assert_eq!(config.expansion.sentinel, "// C_MACRO_COLLECTIONS_CODE");
        assert_eq!(config.drivers.coverage, "codecov");
        config.validate().unwrap();
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: MacrogenConfig = toml::from_str("").unwrap();
        assert_eq!(config, MacrogenConfig::default());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let toml_str = r#"
            [compiler]
            cc = "clang"
            cflags = ["-Wall"]

            [expansion]
            variadic = true
        "#;

        let config: MacrogenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.compiler.cc, "clang");
        assert_eq!(config.compiler.cflags, vec!["-Wall"]);
        // untouched fields in a present section keep their defaults
        assert_eq!(config.compiler.coverage_flags, vec!["--coverage", "-O0"]);
        assert!(config.expansion.variadic);
        assert_eq!(config.expansion.macro_prefix, "C_MACRO_COLLECTIONS_ALL");
        assert_eq!(config.coverage, CoverageConfig::default());
    }

    #[test]
    fn test_from_path_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
            [directories]
            output_dir = "./check"

            [drivers]
            main = "suite"
            "#,
        )
        .unwrap();

        let config = MacrogenConfig::from_path(&path).unwrap();
        assert_eq!(config.directories.output_dir, PathBuf::from("./check"));
        assert_eq!(config.drivers.main, "suite");
        assert_eq!(config.drivers.coverage, "codecov");
    }

    #[test]
    fn test_from_path_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "invalid toml content {{{").unwrap();

        let err = MacrogenConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, MacrogenError::Toml { .. }));
    }

    #[test]
    fn test_explicit_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        let err = MacrogenConfig::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, MacrogenError::MissingFile { .. }));
    }

    #[test]
    fn test_sentinel_must_be_comment() {
        let mut config = MacrogenConfig::default();
        config.expansion.sentinel = "MARKER".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_lists_settings() {
        let shown = MacrogenConfig::default().to_string();
        assert!(shown.contains("OUTPUT_DIR = ./tests"));
        assert!(shown.contains("CC = gcc"));
        assert!(shown.contains("SENTINEL = // C_MACRO_COLLECTIONS_CODE"));
    }
}
