//! Runs the preprocessor over a synthesized unit and pulls the expanded
//! code out of its output.

use crate::config::ExpansionConfig;
use crate::error::{MacrogenError, Result};
use crate::registry::{FileKind, InstantiationSpec};
use crate::runner::{CommandRunner, Invocation};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Why the sentinel region could not be isolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    /// Fewer than two sentinels in the output.
    SentinelNotFound,
    /// Two sentinels, nothing but whitespace between them.
    EmptyRegion,
}

impl ExtractError {
    fn hint(&self) -> &'static str {
        match self {
            ExtractError::SentinelNotFound => {
                "the sentinel pair was not found in the preprocessor output"
            }
            ExtractError::EmptyRegion => "the macro invocation expanded to nothing",
        }
    }
}

/// Finds the first sentinel and the next one after it.
///
/// Matching is non-greedy: with more than two sentinels in the output only
/// the first pair counts, so duplicated include chains cannot swallow the
/// content in between.
#[derive(Debug, Clone)]
pub struct SentinelMatcher {
    pattern: Regex,
}

impl SentinelMatcher {
    pub fn new(sentinel: &str) -> Result<Self> {
        // (?s) makes '.' match anything, even '\n'
        let escaped = regex::escape(sentinel);
        let pattern = Regex::new(&format!("(?s){escaped}(?P<code>.*?){escaped}"))?;
        Ok(Self { pattern })
    }

    /// Returns the text strictly between the first two sentinels.
    pub fn extract<'a>(&self, output: &'a str) -> std::result::Result<&'a str, ExtractError> {
        let code = self
            .pattern
            .captures(output)
            .and_then(|caps| caps.name("code"))
            .ok_or(ExtractError::SentinelNotFound)?
            .as_str();

        if code.trim().is_empty() {
            return Err(ExtractError::EmptyRegion);
        }
        Ok(code)
    }
}

/// Deletes the shared unit file when dropped, on success and on failure.
struct UnitFile<'a> {
    path: &'a Path,
}

impl<'a> UnitFile<'a> {
    fn write(path: &'a Path, text: &str) -> Result<Self> {
        fs::write(path, text).map_err(|e| MacrogenError::io(path, e))?;
        Ok(Self { path })
    }
}

impl Drop for UnitFile<'_> {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(self.path) {
            debug!("Could not remove unit file {:?}: {}", self.path, e);
        }
    }
}

pub struct MacroExpander<'r, R: CommandRunner> {
    runner: &'r R,
    cc: String,
    flags: Vec<String>,
    library_include_dir: PathBuf,
    unit_file: PathBuf,
    matcher: SentinelMatcher,
}

impl<'r, R: CommandRunner> MacroExpander<'r, R> {
    pub fn new(
        runner: &'r R,
        cc: impl Into<String>,
        expansion: &ExpansionConfig,
        library_include_dir: impl Into<PathBuf>,
        unit_file: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            runner,
            cc: cc.into(),
            flags: expansion.flags.clone(),
            library_include_dir: library_include_dir.into(),
            unit_file: unit_file.into(),
            matcher: SentinelMatcher::new(&expansion.sentinel)?,
        })
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(&self.cc)
            .args(&self.flags)
            .includes([self.library_include_dir.as_path()])
            .arg(self.unit_file.as_os_str())
    }

    /// Expands `unit_text` and returns the code between the sentinels.
    ///
    /// The unit is written to the shared unit file, which is removed again
    /// before this returns.
    pub fn expand(
        &self,
        spec: &InstantiationSpec,
        kind: FileKind,
        unit_text: &str,
    ) -> Result<String> {
        trace!("Unit for {} {}:\n{}", spec.instance_name, kind, unit_text);

        let captured = {
            let _unit = UnitFile::write(&self.unit_file, unit_text)?;
            self.runner.capture(&self.invocation())?
        };

        if !captured.success() {
            warn!(
                "Preprocessor exited with {:?} while expanding {} {}",
                captured.code, spec.instance_name, kind
            );
        }

        match self.matcher.extract(&captured.output) {
            Ok(code) => {
                debug!(
                    "Expanded {} {}: {} bytes",
                    spec.instance_name,
                    kind,
                    code.len()
                );
                Ok(code.to_string())
            }
            Err(e) => Err(MacrogenError::Expansion {
                instance: spec.instance_name.to_string(),
                kind,
                hint: e.hint().to_string(),
                output: captured.output,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::runner::{Captured, RecordingRunner};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    const SENTINEL: &str = "// C_MACRO_COLLECTIONS_CODE";

    fn matcher() -> SentinelMatcher {
        SentinelMatcher::new(SENTINEL).unwrap()
    }

    #[test]
    fn test_extract_between_sentinels() {
        let output = format!(
            "warning: something\n{SENTINEL}\nint hm_new(void);\n{SENTINEL}\ntrailing note\n"
        );
        assert_eq!(matcher().extract(&output), Ok("\nint hm_new(void);\n"));
    }

    #[test]
    fn test_extract_uses_first_pair_only() {
        let output = format!("{SENTINEL}\nfirst\n{SENTINEL}\nmiddle\n{SENTINEL}\nlast\n{SENTINEL}");
        assert_eq!(matcher().extract(&output), Ok("\nfirst\n"));
    }

    #[test]
    fn test_extract_no_sentinel() {
        assert_eq!(
            matcher().extract("main.c:3:10: fatal error: macro_collections.h: No such file"),
            Err(ExtractError::SentinelNotFound)
        );
    }

    #[test]
    fn test_extract_single_sentinel() {
        let output = format!("{SENTINEL}\nint x;\n");
        assert_eq!(
            matcher().extract(&output),
            Err(ExtractError::SentinelNotFound)
        );
    }

    #[test]
    fn test_extract_blank_region() {
        let output = format!("{SENTINEL}\n\n   \n{SENTINEL}");
        assert_eq!(matcher().extract(&output), Err(ExtractError::EmptyRegion));
    }

    #[test]
    fn test_sentinel_is_matched_literally() {
        let matcher = SentinelMatcher::new("/* a.b*c */").unwrap();
        assert_eq!(
            matcher.extract("/* a.b*c */ code /* a.b*c */"),
            Ok(" code ")
        );
        assert_eq!(
            matcher.extract("/* aXbbc */ code /* aXbbc */"),
            Err(ExtractError::SentinelNotFound)
        );
    }

    /// Preprocessor-like text with line and block comments. Comment bodies
    /// are lowercase, so the uppercase sentinel can never appear inside.
    const NOISE: &str = r"([a-z_(){};# \n]|//[a-z ]{0,12}\n|/\*[a-z \n]{0,12}\*/)";

    proptest! {
        #[test]
        fn prop_isolates_between_content(
            before in proptest::string::string_regex(&format!("{NOISE}{{0,16}}")).unwrap(),
            between in proptest::string::string_regex(&format!("{NOISE}{{0,16}}[a-z]")).unwrap(),
            after in proptest::string::string_regex(&format!("{NOISE}{{0,16}}")).unwrap(),
        ) {
            let output = format!("{before}{SENTINEL}{between}{SENTINEL}{after}");
            prop_assert_eq!(matcher().extract(&output), Ok(between.as_str()));
        }

        #[test]
        fn prop_fewer_than_two_sentinels_fail(
            text in proptest::string::string_regex(&format!("{NOISE}{{0,32}}")).unwrap(),
            with_one in any::<bool>(),
            split in 0usize..128,
        ) {
            let output = if with_one {
                let at = text.char_indices().nth(split).map(|(i, _)| i).unwrap_or(text.len());
                format!("{}{SENTINEL}{}", &text[..at], &text[at..])
            } else {
                text
            };
            prop_assert_eq!(matcher().extract(&output), Err(ExtractError::SentinelNotFound));
        }
    }

    #[test]
    fn test_extract_amid_comments() {
        let output = format!(
            "/* licence */\n// note\n{SENTINEL}\n/* doc */\nint hm_new(void); // ctor\n{SENTINEL}\n// tail\n"
        );
        assert_eq!(
            matcher().extract(&output),
            Ok("\n/* doc */\nint hm_new(void); // ctor\n")
        );
    }

    fn expander<'r>(runner: &'r RecordingRunner, dir: &Path) -> MacroExpander<'r, RecordingRunner> {
        MacroExpander::new(
            runner,
            "gcc",
            &ExpansionConfig::default(),
            "./src",
            dir.join("unit.c"),
        )
        .unwrap()
    }

    #[test]
    fn test_expand_invokes_preprocessor_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let runner = RecordingRunner::default();
        runner.queue_output(&format!("{SENTINEL}\nvoid hm_free(void);\n{SENTINEL}\n"));

        let spec = *Registry::builtin().find("hashmap").unwrap();
        let exp = expander(&runner, temp_dir.path());
        let code = exp.expand(&spec, FileKind::Header, "unit").unwrap();

        assert_eq!(code, "\nvoid hm_free(void);\n");
        let calls = runner.recorded();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "gcc");
        let unit = temp_dir.path().join("unit.c");
        assert_eq!(
            calls[0].arg_strings(),
            vec![
                "-E".to_string(),
                "-P".to_string(),
                "-C".to_string(),
                "-I".to_string(),
                "./src".to_string(),
                unit.to_string_lossy().into_owned(),
            ]
        );
        assert!(!unit.exists(), "unit file must be removed");
    }

    #[test]
    fn test_expand_failure_removes_unit_and_keeps_output() {
        let temp_dir = TempDir::new().unwrap();
        let runner = RecordingRunner::default();
        runner.captures.borrow_mut().push_back(Captured {
            code: Some(1),
            output: "unit.c:1:10: fatal error: macro_collections.h: No such file".to_string(),
        });

        let spec = *Registry::builtin().find("deque").unwrap();
        let exp = expander(&runner, temp_dir.path());
        let err = exp.expand(&spec, FileKind::Source, "unit").unwrap_err();

        match &err {
            MacrogenError::Expansion {
                instance,
                kind,
                output,
                ..
            } => {
                assert_eq!(instance, "deque");
                assert_eq!(*kind, FileKind::Source);
                assert!(output.contains("fatal error"));
            }
            other => panic!("expected expansion failure, got {other:?}"),
        }
        assert_eq!(err.exit_code(), 1);
        assert!(!temp_dir.path().join("unit.c").exists());
    }
}
