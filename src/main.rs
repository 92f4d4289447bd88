mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use cli::{Cli, Command, ImportArgs};
use config::Config;
use pbrforge::classify::{classify_detailed, MatchMode, RoleKeywordTable, TextureRole};
use pbrforge::host::{FsEnumerator, FsImageLoader};
use pbrforge::import::{raw_files, BatchMaterialImporter, ItemOutcome};
use pbrforge::{ImportOptions, MaterialLibrary};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = load_settings(&cli)?;
    let keywords = config.keyword_table()?;

    match &cli.command {
        Command::Import { root, options, dump_dir } => {
            let options = merge_options(config.import_options()?, options)?;
            run_import(&cli.library, root, &options, &keywords, dump_dir.as_deref())
        }
        Command::Material { name, files, options } => {
            let options = merge_options(config.import_options()?, options)?;
            run_material(&cli.library, name, files, &options, &keywords)
        }
        Command::Classify { files, tokens } => {
            let mode = if *tokens {
                MatchMode::Token
            } else {
                config.import.match_mode
            };
            run_classify(files, &keywords, mode);
            Ok(())
        }
        Command::Displacement { real, scale } => run_displacement(&cli.library, *real, *scale),
    }
}

/// Config from `--config` or the first discovered file. A broken discovered
/// file is reported and ignored; a broken explicit one is an error.
fn load_settings(cli: &Cli) -> Result<Config> {
    let Some(path) = config::find_config(cli.config.as_deref()) else {
        return Ok(Config::default());
    };
    match config::load_config(&path) {
        Ok(cfg) => {
            log::info!("Loaded config from {}", path.display());
            Ok(cfg)
        }
        Err(err) if cli.config.is_none() => {
            log::warn!("{:#}", err);
            Ok(Config::default())
        }
        Err(err) => Err(err),
    }
}

/// Apply command-line flags on top of the configured options.
fn merge_options(mut options: ImportOptions, args: &ImportArgs) -> Result<ImportOptions> {
    if args.no_skip_existing {
        options.skip_existing = false;
    }
    if let Some(ignore) = &args.ignore {
        options.ignore_filter = ignore.clone();
    }
    if let Some(mapping) = args.mapping {
        options.texture_mapping = mapping.into();
    }
    if args.utility_nodes {
        options.add_utility_nodes = true;
    }
    if args.no_fake_user {
        options.use_fake_user = false;
    }
    if args.real_displacement {
        options.use_real_displacement = true;
    }
    if let Some(scale) = args.displacement_scale {
        options.displacement_scale = scale;
    }
    if args.tokens {
        options.match_mode = MatchMode::Token;
    }
    for name in &args.skip_roles {
        let role = TextureRole::from_name(name.trim()).with_context(|| format!("Unknown texture role '{}'", name))?;
        options.set_import(role, false);
    }
    Ok(options)
}

fn load_library(path: &Path) -> Result<MaterialLibrary> {
    if !path.exists() {
        log::info!("Starting a new library at {}", path.display());
        return Ok(MaterialLibrary::new());
    }
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read library {}", path.display()))?;
    MaterialLibrary::from_json(&json).with_context(|| format!("Failed to parse library {}", path.display()))
}

fn save_library(path: &Path, library: &MaterialLibrary) -> Result<()> {
    let json = library.to_json().context("Failed to serialize library")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write library {}", path.display()))?;
    log::info!("Saved {} materials to {}", library.len(), path.display());
    Ok(())
}

fn run_import(
    library_path: &Path,
    root: &Path,
    options: &ImportOptions,
    keywords: &RoleKeywordTable,
    dump_dir: Option<&Path>,
) -> Result<()> {
    let mut library = load_library(library_path)?;
    let importer = BatchMaterialImporter::new(&FsEnumerator, &FsImageLoader, keywords);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} folders {msg}")?
            .progress_chars("=>-"),
    );
    let report = importer
        .import_all_with_progress(&mut library, root, options, |done, total, name| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
            pb.set_message(name.to_string());
        })
        .with_context(|| format!("Import from {} failed", root.display()))?;
    pb.finish_and_clear();

    save_library(library_path, &library)?;
    if let Some(dir) = dump_dir {
        dump_materials(&library, dir)?;
    }
    println!("{}", report);
    Ok(())
}

fn run_material(
    library_path: &Path,
    name: &str,
    files: &[PathBuf],
    options: &ImportOptions,
    keywords: &RoleKeywordTable,
) -> Result<()> {
    let mut library = load_library(library_path)?;
    let importer = BatchMaterialImporter::new(&FsEnumerator, &FsImageLoader, keywords);
    let outcome = importer.import_files(&mut library, name, raw_files(files.iter().cloned()), options)?;

    match outcome {
        ItemOutcome::Imported { notices, ambiguous, .. } => {
            save_library(library_path, &library)?;
            println!("Created material '{}'", name);
            for notice in notices {
                println!("  {}", notice);
            }
            for file in ambiguous {
                println!("  {} matched more than one role", file);
            }
        }
        ItemOutcome::Deleted { .. } => {
            anyhow::bail!("None of the selected files is a recognised texture, '{}' was not created", name)
        }
        ItemOutcome::Skipped { .. } => println!("'{}' already exists", name),
    }
    Ok(())
}

fn run_classify(files: &[String], keywords: &RoleKeywordTable, mode: MatchMode) {
    for file in files {
        let name = Path::new(file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.clone());
        let classification = classify_detailed(&name, keywords, mode);
        let role = classification.role.map(|r| r.as_str()).unwrap_or("-");
        if classification.is_ambiguous() {
            let candidates: Vec<&str> = classification.candidates().iter().map(|r| r.as_str()).collect();
            println!("{:<40} {} (matched: {})", name, role, candidates.join(", "));
        } else {
            println!("{:<40} {}", name, role);
        }
    }
}

fn run_displacement(library_path: &Path, real: bool, scale: Option<f32>) -> Result<()> {
    if !real && scale.is_none() {
        anyhow::bail!("Nothing to do, pass --real and/or --scale");
    }
    let mut library = load_library(library_path)?;
    if real {
        let changed = library.enable_real_displacement();
        println!("Enabled true displacement on {} materials", changed);
    }
    if let Some(scale) = scale {
        let changed = library.set_displacement_scale(scale);
        println!("Set displacement scale {} on {} nodes", scale, changed);
    }
    save_library(library_path, &library)
}

fn dump_materials(library: &MaterialLibrary, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    for material in library.materials() {
        let path = dir.join(format!("{}.json", material.name));
        let json = serde_json::to_string_pretty(material)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    log::info!("Dumped {} materials to {}", library.len(), dir.display());
    Ok(())
}
