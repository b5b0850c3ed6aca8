//! The fixed catalog of collection instantiations that get expanded, compiled
//! and linked into the test binaries.

use crate::error::{MacrogenError, Result};
use std::collections::HashSet;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Macro family an instantiation is generated from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CollectionKind {
    Bitset,
    Deque,
    Hashbidimap,
    Hashmap,
    Hashmultimap,
    Hashmultiset,
    Hashset,
    Heap,
    Intervalheap,
    Linkedlist,
    List,
    Queue,
    Sortedlist,
    Stack,
    Treemap,
    Treeset,
}

/// Which half of an instantiation is being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum FileKind {
    Header,
    Source,
}

impl FileKind {
    /// Extension of the generated file.
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Header => "h",
            FileKind::Source => "c",
        }
    }

    /// Generation order: every header first, then every source.
    pub const ORDER: [FileKind; 2] = [FileKind::Header, FileKind::Source];
}

/// One concrete collection to generate.
///
/// Empty type parameters mean the parameter is omitted by the macro family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantiationSpec {
    pub library: &'static str,
    pub collection_kind: CollectionKind,
    pub prefix: &'static str,
    pub instance_name: &'static str,
    pub size_param: &'static str,
    pub key_type: &'static str,
    pub val_type: &'static str,
    pub template_header: &'static str,
}

impl InstantiationSpec {
    /// Lowercase library tag, used as a directory name.
    pub fn library_dir(&self) -> String {
        self.library.to_lowercase()
    }

    /// Include guard token of the generated header.
    pub fn guard_token(&self) -> String {
        format!("CMC_{}_{}_TEST_H", self.library, self.collection_kind)
    }

    /// Type parameters in macro order: prefix, name, size, key, value.
    pub fn macro_params(&self) -> [&'static str; 5] {
        [
            self.prefix,
            self.instance_name,
            self.size_param,
            self.key_type,
            self.val_type,
        ]
    }
}

const fn cmc(
    collection_kind: CollectionKind,
    prefix: &'static str,
    instance_name: &'static str,
    key_type: &'static str,
    val_type: &'static str,
    template_header: &'static str,
) -> InstantiationSpec {
    InstantiationSpec {
        library: "CMC",
        collection_kind,
        prefix,
        instance_name,
        size_param: "",
        key_type,
        val_type,
        template_header,
    }
}

/// Every instantiation exercised by the test drivers, in generation order.
pub const BUILTIN_SPECS: &[InstantiationSpec] = &[
    cmc(CollectionKind::Bitset, "bs", "bitset", "", "", "cmc/bitset.h"),
    cmc(CollectionKind::Deque, "d", "deque", "", "size_t", "cmc/deque.h"),
    cmc(CollectionKind::Hashbidimap, "hbm", "hashbidimap", "size_t", "size_t", "cmc/hashbidimap.h"),
    cmc(CollectionKind::Hashmap, "hm", "hashmap", "size_t", "size_t", "cmc/hashmap.h"),
    cmc(CollectionKind::Hashmultimap, "hmm", "hashmultimap", "size_t", "size_t", "cmc/hashmultimap.h"),
    cmc(CollectionKind::Hashmultiset, "hms", "hashmultiset", "", "size_t", "cmc/hashmultiset.h"),
    cmc(CollectionKind::Hashset, "hs", "hashset", "", "size_t", "cmc/hashset.h"),
    cmc(CollectionKind::Heap, "h", "heap", "", "size_t", "cmc/heap.h"),
    cmc(CollectionKind::Intervalheap, "ih", "intervalheap", "", "size_t", "cmc/intervalheap.h"),
    cmc(CollectionKind::Linkedlist, "ll", "linkedlist", "", "size_t", "cmc/linkedlist.h"),
    cmc(CollectionKind::List, "l", "list", "", "size_t", "cmc/list.h"),
    cmc(CollectionKind::Queue, "q", "queue", "", "size_t", "cmc/queue.h"),
    cmc(CollectionKind::Sortedlist, "sl", "sortedlist", "", "size_t", "cmc/sortedlist.h"),
    cmc(CollectionKind::Stack, "s", "stack", "", "size_t", "cmc/stack.h"),
    cmc(CollectionKind::Treemap, "tm", "treemap", "size_t", "size_t", "cmc/treemap.h"),
    cmc(CollectionKind::Treeset, "ts", "treeset", "", "size_t", "cmc/treeset.h"),
];

/// Ordered, read-only sequence of instantiations.
///
/// Built once and handed by reference to every stage that needs it.
#[derive(Debug, Clone)]
pub struct Registry {
    specs: Vec<InstantiationSpec>,
}

impl Registry {
    /// The built-in catalog.
    pub fn builtin() -> Self {
        Self {
            specs: BUILTIN_SPECS.to_vec(),
        }
    }

    /// Builds a registry from custom specs, rejecting duplicate keys.
    pub fn from_specs(specs: Vec<InstantiationSpec>) -> Result<Self> {
        let registry = Self { specs };
        registry.validate()?;
        Ok(registry)
    }

    /// Checks that prefixes, instance names and include guards are unique.
    pub fn validate(&self) -> Result<()> {
        let mut prefixes = HashSet::new();
        let mut names = HashSet::new();
        let mut guards = HashSet::new();

        for spec in &self.specs {
            if spec.prefix.is_empty() || spec.instance_name.is_empty() {
                return Err(MacrogenError::registry(format!(
                    "{} instantiation has an empty prefix or instance name",
                    spec.collection_kind
                )));
            }
            if !prefixes.insert(spec.prefix) {
                return Err(MacrogenError::registry(format!(
                    "duplicate prefix '{}'",
                    spec.prefix
                )));
            }
            if !names.insert((spec.library, spec.instance_name)) {
                return Err(MacrogenError::registry(format!(
                    "duplicate instance name '{}'",
                    spec.instance_name
                )));
            }
            if !guards.insert(spec.guard_token()) {
                return Err(MacrogenError::registry(format!(
                    "include guard {} would be shared by more than one header",
                    spec.guard_token()
                )));
            }
        }

        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstantiationSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Looks up an instantiation by its instance name.
    pub fn find(&self, instance_name: &str) -> Option<&InstantiationSpec> {
        self.specs.iter().find(|s| s.instance_name == instance_name)
    }

    /// Distinct lowercase library directories, in first-seen order.
    pub fn library_dirs(&self) -> Vec<String> {
        let mut dirs: Vec<String> = Vec::new();
        for spec in &self.specs {
            let dir = spec.library_dir();
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a InstantiationSpec;
    type IntoIter = std::slice::Iter<'a, InstantiationSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}
