//! Builds the preprocessing unit for one (instantiation, file kind) pair.
//!
//! Macros cannot be inspected directly, so each unit holds exactly one macro
//! invocation between two copies of the sentinel comment. The expander then
//! keeps only what lies between the sentinels and drops the expanded system
//! headers around it.

use crate::config::ExpansionConfig;
use crate::registry::{FileKind, InstantiationSpec};

#[derive(Debug, Clone)]
pub struct UnitSynthesizer {
    config: ExpansionConfig,
}

impl UnitSynthesizer {
    pub fn new(config: ExpansionConfig) -> Self {
        Self { config }
    }

    pub fn sentinel(&self) -> &str {
        &self.config.sentinel
    }

    /// Returns the unit text. Nothing is written anywhere.
    pub fn synthesize(&self, spec: &InstantiationSpec, kind: FileKind) -> String {
        let include = self
            .config
            .umbrella_header
            .as_deref()
            .unwrap_or(spec.template_header);

        format!(
            "#include \"{include}\"\n\n{sentinel}\n\n{invocation}\n\n{sentinel}\n",
            sentinel = self.config.sentinel,
            invocation = self.invocation(spec, kind),
        )
    }

    /// `<PREFIX>_<KIND>(LIB, COLLECTION, VISIBILITY, (pfx, name, size, k, v))`
    pub fn invocation(&self, spec: &InstantiationSpec, kind: FileKind) -> String {
        format!(
            "{}_{}({}, {}, {}, ({}))",
            self.config.macro_prefix,
            kind,
            spec.library,
            spec.collection_kind,
            self.config.visibility,
            self.params(spec).join(", ")
        )
    }

    fn params(&self, spec: &InstantiationSpec) -> Vec<&'static str> {
        let mut params = spec.macro_params().to_vec();
        if self.config.variadic {
            while params.last().is_some_and(|p| p.is_empty()) {
                params.pop();
            }
        }
        params
    }
}
