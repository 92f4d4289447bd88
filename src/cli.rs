use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use pbrforge::graph::TextureMapping;

#[derive(Parser, Debug)]
#[command(name = "pbrforge", version, about = "Batch-create PBR materials from folders of texture images")]
pub struct Cli {
    /// Config file (default: ./pbrforge.toml, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Material library file
    #[arg(long, global = true, default_value = "library.json")]
    pub library: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create one material per subdirectory of ROOT
    Import {
        root: PathBuf,

        #[command(flatten)]
        options: ImportArgs,

        /// Write every material in the library as JSON into this directory
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },

    /// Create a single material from the given texture files
    Material {
        name: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: ImportArgs,
    },

    /// Print the texture role detected for each file name
    Classify {
        #[arg(required = true)]
        files: Vec<String>,

        /// Match keywords against whole words only
        #[arg(long)]
        tokens: bool,
    },

    /// Change displacement settings of every material in the library
    Displacement {
        /// Switch materials to true displacement
        #[arg(long)]
        real: bool,

        /// New scale for every displacement node
        #[arg(long)]
        scale: Option<f32>,
    },
}

/// Overrides for the `[import]` config section.
#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Import folders even if a material of that name exists
    #[arg(long)]
    pub no_skip_existing: bool,

    /// Ignore files whose name contains this text
    #[arg(long)]
    pub ignore: Option<String>,

    /// Texture coordinates driving the mapping node
    #[arg(long, value_enum)]
    pub mapping: Option<MappingArg>,

    /// Add a scale value node and a roughness color ramp
    #[arg(long)]
    pub utility_nodes: bool,

    /// Do not mark new materials with a fake user
    #[arg(long)]
    pub no_fake_user: bool,

    /// Use true displacement instead of bump-only
    #[arg(long)]
    pub real_displacement: bool,

    /// Scale of the displacement node
    #[arg(long)]
    pub displacement_scale: Option<f32>,

    /// Match keywords against whole words only
    #[arg(long)]
    pub tokens: bool,

    /// Roles not to import (comma-separated, e.g. ambient_occlusion,displacement)
    #[arg(long, value_delimiter = ',')]
    pub skip_roles: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum MappingArg {
    Uv,
    Object,
}

impl From<MappingArg> for TextureMapping {
    fn from(arg: MappingArg) -> Self {
        match arg {
            MappingArg::Uv => TextureMapping::Uv,
            MappingArg::Object => TextureMapping::Object,
        }
    }
}
