use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::classify::{classify_detailed, MatchMode, RoleKeywordTable, TextureRole};

/// A candidate file handed over by the file enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFile {
    pub name: String,
    pub path: PathBuf,
}

impl RawFile {
    /// Build from a path, taking the file name as the display name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }
}

/// File selected for one slot, with the role it was classified as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    pub file: RawFile,
    /// Classified role. May be a sub-role (`Gloss`, `Bump`) of the slot.
    pub role: TextureRole,
}

/// Resolved slot → file mapping for one material.
///
/// A slot holds at most one file. When several files land in the same slot
/// the later one replaces the earlier one; replaced entries are kept in
/// [`TextureSet::superseded`] for reporting.
#[derive(Debug, Clone, Default)]
pub struct TextureSet {
    entries: BTreeMap<TextureRole, TextureEntry>,
    superseded: Vec<TextureEntry>,
    unrecognized: Vec<RawFile>,
    ambiguous: Vec<String>,
}

impl TextureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `files` in the given order and collect them into a set.
    pub fn classify_files(
        files: impl IntoIterator<Item = RawFile>,
        table: &RoleKeywordTable,
        mode: MatchMode,
    ) -> Self {
        let mut set = Self::new();
        for file in files {
            let classification = classify_detailed(&file.name, table, mode);
            if classification.is_ambiguous() {
                set.ambiguous.push(file.name.clone());
            }
            match classification.role {
                Some(role) => {
                    log::debug!("{} -> {}", file.name, role);
                    set.insert(role, file);
                }
                None => {
                    log::debug!("{} -> unrecognized", file.name);
                    set.unrecognized.push(file);
                }
            }
        }
        set
    }

    /// Put `file` into the slot of `role`, returning the entry it replaced.
    pub fn insert(&mut self, role: TextureRole, file: RawFile) -> Option<TextureEntry> {
        let name = file.name.clone();
        let previous = self.entries.insert(role.slot(), TextureEntry { file, role });
        if let Some(ref old) = previous {
            log::debug!("{} replaces {} in slot {}", name, old.file.name, role.slot());
            self.superseded.push(old.clone());
        }
        previous
    }

    /// Entry for a slot role. Sub-roles are looked up by their slot.
    pub fn get(&self, role: TextureRole) -> Option<&TextureEntry> {
        self.entries.get(&role.slot())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureRole, &TextureEntry)> {
        self.entries.iter().map(|(slot, entry)| (*slot, entry))
    }

    pub fn superseded(&self) -> &[TextureEntry] {
        &self.superseded
    }

    pub fn unrecognized(&self) -> &[RawFile] {
        &self.unrecognized
    }

    /// Names whose keywords pointed at more than one slot.
    pub fn ambiguous(&self) -> &[String] {
        &self.ambiguous
    }
}
