//! Wraps expanded code in boilerplate and writes it into the generated tree.

use crate::error::{MacrogenError, Result};
use crate::layout::DirectoryLayout;
use crate::registry::{FileKind, InstantiationSpec};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Information about a written artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub bytes_written: usize,
    pub kind: FileKind,
}

pub struct ArtifactWriter<'a> {
    layout: &'a DirectoryLayout,
    umbrella_header: Option<&'a str>,
}

impl<'a> ArtifactWriter<'a> {
    pub fn new(layout: &'a DirectoryLayout, umbrella_header: Option<&'a str>) -> Self {
        Self {
            layout,
            umbrella_header,
        }
    }

    /// Final file text for one artifact.
    pub fn render(&self, spec: &InstantiationSpec, kind: FileKind, code: &str) -> String {
        let code = code.trim_matches('\n');
        match kind {
            FileKind::Header => {
                let guard = spec.guard_token();
                let include = self.umbrella_header.unwrap_or(spec.template_header);
                format!(
                    "#ifndef {guard}\n#define {guard}\n\n#include \"{include}\"\n\n{code}\n\n#endif /* {guard} */\n"
                )
            }
            FileKind::Source => format!(
                "#include \"{}\"\n\n{code}\n",
                DirectoryLayout::header_include(spec)
            ),
        }
    }

    /// Writes the artifact, overwriting whatever is at its path.
    pub fn write(
        &self,
        spec: &InstantiationSpec,
        kind: FileKind,
        code: &str,
    ) -> Result<GeneratedFile> {
        let path = self.layout.artifact_path(spec, kind);
        let content = self.render(spec, kind, code);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MacrogenError::io(parent, e))?;
        }
        fs::write(&path, &content).map_err(|e| MacrogenError::io(&path, e))?;

        println!(
            "Generated {: >24} -> {}",
            format!("\"{}\"", spec.template_header),
            path.display()
        );
        info!("{} {} written to {:?}", spec.instance_name, kind, path);

        Ok(GeneratedFile {
            path,
            bytes_written: content.len(),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MacrogenConfig;
    use crate::registry::Registry;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn layout_in(root: &std::path::Path) -> DirectoryLayout {
        let mut config = MacrogenConfig::default();
        config.directories.output_dir = root.join("tests");
        DirectoryLayout::new(&config.directories, &config.drivers, &Registry::builtin())
    }

    #[test]
    fn test_header_guard_well_formed() {
        let temp_dir = TempDir::new().unwrap();
        let layout = layout_in(temp_dir.path());
        let writer = ArtifactWriter::new(&layout, Some("macro_collections.h"));
        let registry = Registry::builtin();

        for spec in &registry {
            let text = writer.render(spec, FileKind::Header, "\nstruct x;\n");
            let lines: Vec<&str> = text.lines().collect();
            let open = lines[0].strip_prefix("#ifndef ").unwrap();
            let define = lines[1].strip_prefix("#define ").unwrap();
            let close = lines
                .last()
                .unwrap()
                .strip_prefix("#endif /* ")
                .and_then(|l| l.strip_suffix(" */"))
                .unwrap();
            assert_eq!(open, define);
            assert_eq!(open, close);
            assert_eq!(open, spec.guard_token());
        }
    }

    #[test]
    fn test_render_header() {
        let temp_dir = TempDir::new().unwrap();
        let layout = layout_in(temp_dir.path());
        let writer = ArtifactWriter::new(&layout, Some("macro_collections.h"));
        let spec = *Registry::builtin().find("stack").unwrap();

        assert_eq!(
            writer.render(&spec, FileKind::Header, "\nstruct stack;\n"),
            "#ifndef CMC_CMC_STACK_TEST_H\n\
             #define CMC_CMC_STACK_TEST_H\n\
             \n\
             #include \"macro_collections.h\"\n\
             \n\
             struct stack;\n\
             \n\
             #endif /* CMC_CMC_STACK_TEST_H */\n"
        );
    }

    #[test]
    fn test_write_source_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let layout = layout_in(temp_dir.path());
        let writer = ArtifactWriter::new(&layout, Some("macro_collections.h"));
        let spec = *Registry::builtin().find("hashmap").unwrap();

        let path = layout.artifact_path(&spec, FileKind::Source);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale").unwrap();

        let written = writer
            .write(&spec, FileKind::Source, "\nsize_t hm_count(void) { return 0; }\n")
            .unwrap();

        assert_eq!(written.path, temp_dir.path().join("tests/src/cmc/hashmap.c"));
        let text = fs::read_to_string(&written.path).unwrap();
        assert_eq!(
            text,
            "#include \"cmc/hashmap.h\"\n\nsize_t hm_count(void) { return 0; }\n"
        );
        assert_eq!(written.bytes_written, text.len());
    }
}
