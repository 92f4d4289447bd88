use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pbrforge::classify::{MatchMode, RoleKeywordTable, TextureRole};
use pbrforge::graph::TextureMapping;
use pbrforge::options::ImportOptions;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub import: ImportConfig,
    /// Per-role keyword overrides, keyed by role name.
    #[serde(default)]
    pub keywords: BTreeMap<String, KeywordList>,
}

#[derive(Debug, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_true")]
    pub skip_existing: bool,
    #[serde(default)]
    pub ignore_filter: String,
    #[serde(default)]
    pub texture_mapping: TextureMapping,
    #[serde(default)]
    pub add_utility_nodes: bool,
    #[serde(default = "default_true")]
    pub use_fake_user: bool,
    #[serde(default)]
    pub use_real_displacement: bool,
    #[serde(default = "default_displacement_scale")]
    pub displacement_scale: f32,
    #[serde(default)]
    pub match_mode: MatchMode,
    /// Per-role import switches, keyed by role name.
    #[serde(default)]
    pub roles: BTreeMap<String, bool>,
}

/// Keywords as a TOML array or as one space-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeywordList {
    List(Vec<String>),
    Spaced(String),
}

impl KeywordList {
    pub fn words(&self) -> Vec<String> {
        match self {
            KeywordList::List(words) => words.clone(),
            KeywordList::Spaced(line) => line.split_whitespace().map(str::to_string).collect(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            skip_existing: default_true(),
            ignore_filter: String::new(),
            texture_mapping: TextureMapping::default(),
            add_utility_nodes: false,
            use_fake_user: default_true(),
            use_real_displacement: false,
            displacement_scale: default_displacement_scale(),
            match_mode: MatchMode::default(),
            roles: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool { true }
fn default_displacement_scale() -> f32 { 1.0 }

fn role(name: &str) -> Result<TextureRole> {
    TextureRole::from_name(name.trim()).with_context(|| format!("Unknown texture role '{}'", name))
}

impl Config {
    pub fn import_options(&self) -> Result<ImportOptions> {
        let import = &self.import;
        let mut options = ImportOptions {
            skip_existing: import.skip_existing,
            ignore_filter: import.ignore_filter.clone(),
            texture_mapping: import.texture_mapping,
            add_utility_nodes: import.add_utility_nodes,
            use_fake_user: import.use_fake_user,
            use_real_displacement: import.use_real_displacement,
            displacement_scale: import.displacement_scale,
            match_mode: import.match_mode,
            ..ImportOptions::default()
        };
        for (name, enabled) in &import.roles {
            options.set_import(role(name)?, *enabled);
        }
        Ok(options)
    }

    pub fn keyword_table(&self) -> Result<RoleKeywordTable> {
        let overrides = self
            .keywords
            .iter()
            .map(|(name, list)| Ok((role(name)?, list.words())))
            .collect::<Result<Vec<_>>>()?;
        Ok(RoleKeywordTable::with_overrides(overrides))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Explicit path, else `pbrforge.toml` in the working directory, else the
/// user config directories.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("pbrforge.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("pbrforge").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("pbrforge").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_matches_option_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.import_options().unwrap(), ImportOptions::default());
        assert_eq!(cfg.keyword_table().unwrap(), RoleKeywordTable::default());
    }

    #[test]
    fn parses_import_section_and_roles() {
        let cfg: Config = toml::from_str(
            r#"
            [import]
            skip_existing = false
            ignore_filter = "DX"
            texture_mapping = "object"
            match_mode = "token"
            displacement_scale = 0.2

            [import.roles]
            ambient_occlusion = false
            bump = false
            "#,
        )
        .unwrap();
        let opts = cfg.import_options().unwrap();

        assert!(!opts.skip_existing);
        assert_eq!(opts.ignore_filter, "DX");
        assert_eq!(opts.texture_mapping, TextureMapping::Object);
        assert_eq!(opts.match_mode, MatchMode::Token);
        assert_eq!(opts.displacement_scale, 0.2);
        assert!(!opts.imports(TextureRole::AmbientOcclusion));
        assert!(!opts.imports(TextureRole::Normal));
        assert!(opts.imports(TextureRole::BaseColor));
    }

    #[test]
    fn keywords_accept_arrays_and_spaced_strings() {
        let cfg: Config = toml::from_str(
            r#"
            [keywords]
            base_color = "diffuse albedo  col"
            ambient_occlusion = ["ao", "occlusion"]
            "#,
        )
        .unwrap();
        let table = cfg.keyword_table().unwrap();

        assert_eq!(table.keywords(TextureRole::BaseColor), ["diffuse", "albedo", "col"]);
        assert_eq!(table.keywords(TextureRole::AmbientOcclusion), ["ao", "occlusion"]);
        assert_eq!(table.keywords(TextureRole::Roughness), ["roughness", "rough", "rgh"]);
    }

    #[test]
    fn unknown_role_names_are_errors() {
        let cfg: Config = toml::from_str("[import.roles]\nsheen = false\n").unwrap();
        assert!(cfg.import_options().is_err());
    }
}
