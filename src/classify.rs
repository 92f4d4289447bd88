//! Filename → texture role classification.
//!
//! A filename is normalized (digits stripped, camelCase split, separators
//! turned into spaces, lower-cased) and then matched against a
//! [`RoleKeywordTable`]. Matching walks the whole table and keeps the last
//! hit, so a name carrying keywords of several roles resolves to the role
//! that comes latest in table order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separators replaced by a single space during normalization.
const SEPARATORS: [&str; 6] = ["_", ".", "-", "__", "--", "#"];

/// Semantic function of a texture file.
///
/// `Gloss` and `Bump` are sub-classifications: they occupy the roughness and
/// normal slots respectively and only change the intermediate processing in
/// the shader graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureRole {
    BaseColor,
    Subsurface,
    Metallic,
    Specular,
    Roughness,
    Gloss,
    Normal,
    Bump,
    Displacement,
    Alpha,
    Emission,
    AmbientOcclusion,
}

impl TextureRole {
    /// Every role, in default table iteration order.
    pub const ALL: [TextureRole; 12] = [
        TextureRole::BaseColor,
        TextureRole::Subsurface,
        TextureRole::Metallic,
        TextureRole::Specular,
        TextureRole::Roughness,
        TextureRole::Gloss,
        TextureRole::Normal,
        TextureRole::Bump,
        TextureRole::Displacement,
        TextureRole::Alpha,
        TextureRole::Emission,
        TextureRole::AmbientOcclusion,
    ];

    /// The graph slot this role ends up in.
    pub fn slot(self) -> TextureRole {
        match self {
            TextureRole::Gloss => TextureRole::Roughness,
            TextureRole::Bump => TextureRole::Normal,
            other => other,
        }
    }

    pub fn is_slot(self) -> bool {
        self.slot() == self
    }

    /// Whether images for this role keep the managed (color) color space.
    pub fn is_color(self) -> bool {
        matches!(self.slot(), TextureRole::BaseColor | TextureRole::Emission)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextureRole::BaseColor => "base_color",
            TextureRole::Subsurface => "subsurface",
            TextureRole::Metallic => "metallic",
            TextureRole::Specular => "specular",
            TextureRole::Roughness => "roughness",
            TextureRole::Gloss => "gloss",
            TextureRole::Normal => "normal",
            TextureRole::Bump => "bump",
            TextureRole::Displacement => "displacement",
            TextureRole::Alpha => "alpha",
            TextureRole::Emission => "emission",
            TextureRole::AmbientOcclusion => "ambient_occlusion",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == name)
    }
}

impl fmt::Display for TextureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How keywords are compared against a normalized filename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Keyword may appear anywhere in the normalized name.
    #[default]
    Substring,
    /// Keyword must equal one whitespace-separated component.
    Token,
}

/// Ordered role → keywords mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleKeywordTable {
    entries: Vec<(TextureRole, Vec<String>)>,
}

impl Default for RoleKeywordTable {
    fn default() -> Self {
        let defaults: [(TextureRole, &[&str]); 12] = [
            (TextureRole::BaseColor, &["diffuse", "diff", "albedo", "base", "col", "color", "basecolor"]),
            (TextureRole::Subsurface, &["sss", "subsurface"]),
            (TextureRole::Metallic, &["metallic", "metalness", "metal", "mtl", "met"]),
            (TextureRole::Specular, &["specularity", "specular", "spec", "spc"]),
            (TextureRole::Roughness, &["roughness", "rough", "rgh"]),
            (TextureRole::Gloss, &["gloss", "glossy", "glossiness"]),
            (TextureRole::Normal, &["normal", "nor", "nrm", "nrml", "norm"]),
            (TextureRole::Bump, &["bump", "bmp"]),
            (TextureRole::Displacement, &["displacement", "displace", "disp", "dsp", "height", "heightmap"]),
            (TextureRole::Alpha, &["alpha", "opacity"]),
            (TextureRole::Emission, &["emissive", "emission", "emit"]),
            (TextureRole::AmbientOcclusion, &["ambient", "occlusion"]),
        ];
        Self::new(
            defaults
                .into_iter()
                .map(|(role, words)| (role, words.iter().map(|w| w.to_string()).collect())),
        )
    }
}

impl RoleKeywordTable {
    /// Build a table from entries in iteration order. Blank keywords are
    /// dropped since they would match every name.
    pub fn new(entries: impl IntoIterator<Item = (TextureRole, Vec<String>)>) -> Self {
        let mut table = Self { entries: Vec::new() };
        for (role, keywords) in entries {
            table.set(role, keywords);
        }
        table
    }

    /// Default table with some roles' keyword lists replaced.
    pub fn with_overrides(overrides: impl IntoIterator<Item = (TextureRole, Vec<String>)>) -> Self {
        let mut table = Self::default();
        for (role, keywords) in overrides {
            table.set(role, keywords);
        }
        table
    }

    /// Replace a role's keywords in place, or append the role at the end of
    /// the iteration order if it is not in the table yet.
    pub fn set(&mut self, role: TextureRole, keywords: Vec<String>) {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        match self.entries.iter_mut().find(|(r, _)| *r == role) {
            Some((_, existing)) => *existing = keywords,
            None => self.entries.push((role, keywords)),
        }
    }

    pub fn keywords(&self, role: TextureRole) -> &[String] {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, k)| k.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureRole, &[String])> {
        self.entries.iter().map(|(role, k)| (*role, k.as_slice()))
    }

    /// True when one of `role`'s keywords is a whole component of `filename`.
    pub fn token_match(&self, role: TextureRole, filename: &str) -> bool {
        let components = components(filename);
        self.keywords(role)
            .iter()
            .any(|k| components.iter().any(|c| c == k))
    }
}

/// One keyword that matched during classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordHit {
    pub role: TextureRole,
    pub keyword: String,
}

/// Full classification result, including every keyword hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub role: Option<TextureRole>,
    pub hits: Vec<KeywordHit>,
}

impl Classification {
    /// Keywords from more than one slot matched. The last one won.
    pub fn is_ambiguous(&self) -> bool {
        let mut slots = self.hits.iter().map(|h| h.role.slot());
        match slots.next() {
            Some(first) => slots.any(|s| s != first),
            None => false,
        }
    }

    /// Distinct roles that matched, in hit order.
    pub fn candidates(&self) -> Vec<TextureRole> {
        let mut roles: Vec<TextureRole> = Vec::new();
        for hit in &self.hits {
            if !roles.contains(&hit.role) {
                roles.push(hit.role);
            }
        }
        roles
    }
}

/// Normalize a filename for keyword matching.
///
/// `"WallTexture_diff_2k.002.jpg"` becomes `"wall texture diff k  jpg"`.
pub fn normalize(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len() + 4);
    let mut prev: Option<char> = None;
    for c in filename.chars().filter(|c| !c.is_ascii_digit()) {
        if let Some(p) = prev {
            if p.is_ascii_lowercase() && c.is_ascii_uppercase() {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }
    for sep in SEPARATORS {
        out = out.replace(sep, " ");
    }
    out.to_lowercase()
}

/// Whitespace-separated components of the normalized filename.
pub fn components(filename: &str) -> Vec<String> {
    normalize(filename)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Classify with the default substring strategy.
pub fn classify(filename: &str, table: &RoleKeywordTable) -> Option<TextureRole> {
    classify_detailed(filename, table, MatchMode::Substring).role
}

pub fn classify_with(filename: &str, table: &RoleKeywordTable, mode: MatchMode) -> Option<TextureRole> {
    classify_detailed(filename, table, mode).role
}

pub fn classify_detailed(filename: &str, table: &RoleKeywordTable, mode: MatchMode) -> Classification {
    let mut result = Classification {
        role: None,
        hits: Vec::new(),
    };
    if filename.is_empty() {
        return result;
    }

    let normalized = normalize(filename);
    let parts: Vec<&str> = normalized.split_whitespace().collect();

    for (role, keywords) in table.iter() {
        for keyword in keywords {
            let hit = match mode {
                MatchMode::Substring => normalized.contains(keyword.as_str()),
                MatchMode::Token => parts.iter().any(|p| *p == keyword.as_str()),
            };
            if hit {
                result.role = Some(role);
                result.hits.push(KeywordHit {
                    role,
                    keyword: keyword.clone(),
                });
            }
        }
    }

    if result.is_ambiguous() {
        log::debug!(
            "'{}' matched {:?}, resolved to {:?}",
            filename,
            result.candidates(),
            result.role
        );
    }
    result
}
