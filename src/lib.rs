//! Batch creation of PBR materials from folders of texture files.
//!
//! Filenames are classified into texture roles by keyword, each folder's
//! files are collected into a [`TextureSet`], and a [`ShaderGraphBuilder`]
//! turns the set into a principled material graph that is committed to a
//! [`HostGraphStore`]. [`BatchMaterialImporter`] drives this for every
//! subdirectory of an import root.

pub mod classify;
pub mod error;
pub mod graph;
pub mod host;
pub mod import;
pub mod library;
pub mod options;
pub mod texture_set;

pub use classify::{classify, classify_with, MatchMode, RoleKeywordTable, TextureRole};
pub use graph::{MaterialGraphSpec, ShaderGraphBuilder};
pub use host::{FileEnumerator, HostGraphStore, ImageLoader};
pub use import::{BatchMaterialImporter, ImportReport, ItemOutcome};
pub use library::MaterialLibrary;
pub use options::ImportOptions;
pub use texture_set::{RawFile, TextureSet};
