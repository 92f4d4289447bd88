use std::collections::BTreeMap;

use crate::classify::{MatchMode, TextureRole};
use crate::graph::TextureMapping;

/// User-chosen options for building and importing materials.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// Skip subdirectories whose material name already exists in the store.
    pub skip_existing: bool,
    /// Drop files whose name contains this string. Empty disables the filter.
    pub ignore_filter: String,
    pub texture_mapping: TextureMapping,
    /// Add a scale value node and a roughness color ramp.
    pub add_utility_nodes: bool,
    pub use_fake_user: bool,
    pub use_real_displacement: bool,
    pub displacement_scale: f32,
    pub match_mode: MatchMode,
    /// Per-slot import switches. Slots not listed are imported.
    pub import_flags: BTreeMap<TextureRole, bool>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_existing: true,
            ignore_filter: String::new(),
            texture_mapping: TextureMapping::Uv,
            add_utility_nodes: false,
            use_fake_user: true,
            use_real_displacement: false,
            displacement_scale: 1.0,
            match_mode: MatchMode::Substring,
            import_flags: BTreeMap::new(),
        }
    }
}

impl ImportOptions {
    pub fn imports(&self, role: TextureRole) -> bool {
        self.import_flags.get(&role.slot()).copied().unwrap_or(true)
    }

    pub fn set_import(&mut self, role: TextureRole, enabled: bool) {
        self.import_flags.insert(role.slot(), enabled);
    }

    /// Whether a file name passes the ignore filter.
    pub fn keeps_file(&self, name: &str) -> bool {
        self.ignore_filter.is_empty() || !name.contains(&self.ignore_filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_flags_default_to_enabled() {
        let mut opts = ImportOptions::default();
        assert!(opts.imports(TextureRole::Normal));
        opts.set_import(TextureRole::Bump, false);
        assert!(!opts.imports(TextureRole::Normal));
        assert!(!opts.imports(TextureRole::Bump));
        assert!(opts.imports(TextureRole::Roughness));
    }

    #[test]
    fn ignore_filter_matches_substrings() {
        let mut opts = ImportOptions::default();
        assert!(opts.keeps_file("rock_normal_DX.png"));
        opts.ignore_filter = "DX".into();
        assert!(!opts.keeps_file("rock_normal_DX.png"));
        assert!(opts.keeps_file("rock_normal_GL.png"));
    }
}
