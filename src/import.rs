//! Batch import: one material per subdirectory of an import root.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::classify::RoleKeywordTable;
use crate::error::{ImportError, ItemFailure};
use crate::graph::{BuildNotice, MaterialGraphSpec, ShaderGraphBuilder};
use crate::host::{self, FileEnumerator, HostGraphStore, ImageLoader};
use crate::options::ImportOptions;
use crate::texture_set::{RawFile, TextureSet};

/// What happened to a single material.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Committed and kept.
    Imported {
        name: String,
        notices: Vec<BuildNotice>,
        /// Files that matched more than one role.
        ambiguous: Vec<String>,
    },
    /// Committed, then removed because no texture node survived.
    Deleted { name: String },
    /// A material of that name already existed.
    Skipped { name: String },
}

/// Counters and failures of a finished batch.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
    /// Build notices of imported materials, keyed by material name.
    pub notices: Vec<(String, BuildNotice)>,
    /// Files of imported materials that matched more than one role.
    pub ambiguous: Vec<(String, String)>,
}

impl ImportReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Folders that produced an outcome of any kind.
    pub fn processed(&self) -> usize {
        self.imported + self.deleted + self.skipped + self.failed()
    }

    fn record(&mut self, outcome: Result<ItemOutcome, ItemFailure>) {
        match outcome {
            Ok(ItemOutcome::Imported {
                name,
                notices,
                ambiguous,
            }) => {
                self.imported += 1;
                self.notices.extend(notices.into_iter().map(|n| (name.clone(), n)));
                self.ambiguous.extend(ambiguous.into_iter().map(|file| (name.clone(), file)));
            }
            Ok(ItemOutcome::Deleted { .. }) => self.deleted += 1,
            Ok(ItemOutcome::Skipped { .. }) => self.skipped += 1,
            Err(failure) => {
                log::warn!("{}", failure);
                self.failures.push(failure);
            }
        }
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Complete, {} materials imported", self.imported)?;
        if self.deleted > 0 {
            write!(
                f,
                ", {} were deleted after import because they contained no textures",
                self.deleted
            )?;
        }
        if self.skipped > 0 {
            write!(f, ", {} skipped because they already exist", self.skipped)?;
        }
        if !self.failures.is_empty() {
            write!(f, ", {} failed", self.failures.len())?;
        }
        for failure in &self.failures {
            write!(f, "\n  {}", failure)?;
        }
        for (name, notice) in &self.notices {
            write!(f, "\n  {}: {}", name, notice)?;
        }
        for (name, file) in &self.ambiguous {
            write!(f, "\n  {}: {} matched more than one role", name, file)?;
        }
        Ok(())
    }
}

/// Turns folders of texture files into materials in a host store.
///
/// Runs strictly sequentially. Every folder is looked up against the store's
/// current name list, so materials created earlier in the same batch count
/// as existing.
pub struct BatchMaterialImporter<'a> {
    enumerator: &'a dyn FileEnumerator,
    loader: &'a dyn ImageLoader,
    keywords: &'a RoleKeywordTable,
}

impl<'a> BatchMaterialImporter<'a> {
    pub fn new(enumerator: &'a dyn FileEnumerator, loader: &'a dyn ImageLoader, keywords: &'a RoleKeywordTable) -> Self {
        Self {
            enumerator,
            loader,
            keywords,
        }
    }

    pub fn import_all<S>(&self, store: &mut S, root: &Path, options: &ImportOptions) -> Result<ImportReport, ImportError>
    where
        S: HostGraphStore + ?Sized,
    {
        self.import_all_with_progress(store, root, options, |_, _, _| {})
    }

    /// Like [`import_all`](Self::import_all), calling `progress(done, total, name)`
    /// after each folder.
    pub fn import_all_with_progress<S, F>(
        &self,
        store: &mut S,
        root: &Path,
        options: &ImportOptions,
        mut progress: F,
    ) -> Result<ImportReport, ImportError>
    where
        S: HostGraphStore + ?Sized,
        F: FnMut(usize, usize, &str),
    {
        let dirs = self
            .enumerator
            .subdirectories(root)
            .map_err(|source| ImportError::ListRoot {
                path: root.to_path_buf(),
                source,
            })?;
        log::info!("Importing {} material folders from {}", dirs.len(), root.display());

        let mut report = ImportReport::default();
        for (index, dir) in dirs.iter().enumerate() {
            let name = folder_name(dir);
            report.record(self.import_folder(store, dir, &name, options));
            progress(index + 1, dirs.len(), &name);
        }

        log::info!(
            "Imported {}, deleted {}, skipped {}, failed {}",
            report.imported,
            report.deleted,
            report.skipped,
            report.failed()
        );
        Ok(report)
    }

    fn import_folder<S>(
        &self,
        store: &mut S,
        dir: &Path,
        name: &str,
        options: &ImportOptions,
    ) -> Result<ItemOutcome, ItemFailure>
    where
        S: HostGraphStore + ?Sized,
    {
        if options.skip_existing && store.material_names().iter().any(|n| n == name) {
            log::info!("Skipping '{}', material already exists", name);
            return Ok(ItemOutcome::Skipped { name: name.to_string() });
        }

        let files = self.enumerator.files(dir).map_err(|source| ItemFailure::Listing {
            path: dir.to_path_buf(),
            source,
        })?;

        self.import_files(store, name, files, options)
    }

    /// Build and commit one material from an explicit file selection.
    ///
    /// The material is removed again if it ends up without texture nodes.
    pub fn import_files<S>(
        &self,
        store: &mut S,
        name: &str,
        files: Vec<RawFile>,
        options: &ImportOptions,
    ) -> Result<ItemOutcome, ItemFailure>
    where
        S: HostGraphStore + ?Sized,
    {
        let set = TextureSet::classify_files(
            files.into_iter().filter(|f| options.keeps_file(&f.name)),
            self.keywords,
            options.match_mode,
        );
        let spec = self.build(name, &set, options)?;

        let material = host::commit(store, &spec).map_err(|source| ItemFailure::Host {
            name: name.to_string(),
            source,
        })?;

        if spec.texture_sample_count() == 0 {
            log::info!("'{}' has no textures, removing it", name);
            store.remove_material(material).map_err(|source| ItemFailure::Host {
                name: name.to_string(),
                source,
            })?;
            return Ok(ItemOutcome::Deleted { name: name.to_string() });
        }

        log::info!("Imported '{}' with {} textures", name, spec.texture_sample_count());
        Ok(ItemOutcome::Imported {
            name: name.to_string(),
            notices: spec.notices().to_vec(),
            ambiguous: set.ambiguous().to_vec(),
        })
    }

    fn build(&self, name: &str, set: &TextureSet, options: &ImportOptions) -> Result<MaterialGraphSpec, ItemFailure> {
        ShaderGraphBuilder::new(self.loader, self.keywords)
            .build(name, set, options)
            .map_err(|source| ItemFailure::Build {
                name: name.to_string(),
                source,
            })
    }
}

fn folder_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned())
}

/// Files of a selection, paired with their names.
pub fn raw_files<I, P>(paths: I) -> Vec<RawFile>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    paths.into_iter().map(RawFile::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HostError, LoadError};
    use crate::graph::{MaterialSettings, NodeKind, Position};
    use crate::host::{HostNode, ImageHandle, MaterialId};
    use crate::library::MaterialLibrary;
    use std::io;

    /// Directory tree held in memory, listed in insertion order.
    struct ScriptedFs {
        dirs: Vec<(&'static str, Option<Vec<&'static str>>)>,
    }

    impl ScriptedFs {
        fn new(dirs: &[(&'static str, &[&'static str])]) -> Self {
            Self {
                dirs: dirs.iter().map(|(d, f)| (*d, Some(f.to_vec()))).collect(),
            }
        }
    }

    impl FileEnumerator for ScriptedFs {
        fn subdirectories(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
            if dir == Path::new("/missing") {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
            }
            Ok(self.dirs.iter().map(|(d, _)| dir.join(d)).collect())
        }

        fn files(&self, dir: &Path) -> io::Result<Vec<RawFile>> {
            let name = folder_name(dir);
            let entry = self.dirs.iter().find(|(d, _)| *d == name);
            match entry {
                Some((_, Some(files))) => Ok(files.iter().map(|f| RawFile::new(dir.join(f))).collect()),
                _ => Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
            }
        }
    }

    struct StubLoader;

    impl ImageLoader for StubLoader {
        fn load(&self, path: &Path) -> Result<ImageHandle, LoadError> {
            Ok(ImageHandle {
                name: path.file_name().unwrap().to_string_lossy().into_owned(),
                path: path.to_path_buf(),
                width: 4,
                height: 4,
            })
        }
    }

    /// Library that refuses every link into one socket.
    struct PickyStore {
        inner: MaterialLibrary,
        refuse: &'static str,
    }

    impl HostGraphStore for PickyStore {
        fn material_names(&self) -> Vec<String> {
            self.inner.material_names()
        }
        fn create_material(&mut self, name: &str) -> Result<MaterialId, HostError> {
            self.inner.create_material(name)
        }
        fn configure_material(&mut self, material: MaterialId, settings: &MaterialSettings) -> Result<(), HostError> {
            self.inner.configure_material(material, settings)
        }
        fn create_node(&mut self, material: MaterialId, name: &str, kind: &NodeKind) -> Result<HostNode, HostError> {
            self.inner.create_node(material, name, kind)
        }
        fn link(
            &mut self,
            material: MaterialId,
            from: HostNode,
            from_socket: &str,
            to: HostNode,
            to_socket: &str,
        ) -> Result<(), HostError> {
            if to_socket == self.refuse {
                return Err(HostError::Rejected(format!("{} is read-only", to_socket)));
            }
            self.inner.link(material, from, from_socket, to, to_socket)
        }
        fn set_position(&mut self, material: MaterialId, node: HostNode, position: Position) -> Result<(), HostError> {
            self.inner.set_position(material, node, position)
        }
        fn set_parent(&mut self, material: MaterialId, node: HostNode, frame: HostNode) -> Result<(), HostError> {
            self.inner.set_parent(material, node, frame)
        }
        fn remove_material(&mut self, material: MaterialId) -> Result<(), HostError> {
            self.inner.remove_material(material)
        }
    }

    fn run(fs: &ScriptedFs, store: &mut dyn HostGraphStore, options: &ImportOptions) -> ImportReport {
        let table = RoleKeywordTable::default();
        BatchMaterialImporter::new(fs, &StubLoader, &table)
            .import_all(store, Path::new("/textures"), options)
            .unwrap()
    }

    fn counts(report: &ImportReport) -> (usize, usize, usize, usize) {
        (report.imported, report.deleted, report.skipped, report.failed())
    }

    #[test]
    fn folder_without_textures_is_deleted() {
        let fs = ScriptedFs::new(&[("notes", &["readme.txt"])]);
        let mut lib = MaterialLibrary::new();
        let report = run(&fs, &mut lib, &ImportOptions::default());
        assert_eq!(counts(&report), (0, 1, 0, 0));
        assert!(lib.is_empty());
    }

    #[test]
    fn imports_one_material_per_folder() {
        let fs = ScriptedFs::new(&[
            ("brick", &["brick_diff.png", "brick_rough.png", "brick_nrm.png"]),
            ("wood", &["wood_albedo.jpg"]),
        ]);
        let mut lib = MaterialLibrary::new();
        let report = run(&fs, &mut lib, &ImportOptions::default());

        assert_eq!(counts(&report), (2, 0, 0, 0));
        assert_eq!(lib.get("brick").unwrap().texture_count(), 3);
        assert_eq!(lib.get("wood").unwrap().texture_count(), 1);
    }

    #[test]
    fn second_run_skips_everything_imported_before() {
        let fs = ScriptedFs::new(&[
            ("brick", &["brick_diff.png"]),
            ("wood", &["wood_albedo.jpg"]),
            ("notes", &["readme.txt"]),
        ]);
        let mut lib = MaterialLibrary::new();
        let first = run(&fs, &mut lib, &ImportOptions::default());
        let second = run(&fs, &mut lib, &ImportOptions::default());

        assert_eq!(counts(&first), (2, 1, 0, 0));
        assert_eq!(second.skipped, first.imported);
        assert_eq!(second.imported, 0);
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn existing_names_include_materials_from_the_same_batch() {
        let fs = ScriptedFs::new(&[("brick", &["brick_diff.png"]), ("brick", &["brick_diff.png"])]);
        let mut lib = MaterialLibrary::new();
        let report = run(&fs, &mut lib, &ImportOptions::default());
        assert_eq!(counts(&report), (1, 0, 1, 0));
    }

    #[test]
    fn without_skipping_duplicates_get_suffixed() {
        let fs = ScriptedFs::new(&[("brick", &["brick_diff.png"])]);
        let mut lib = MaterialLibrary::new();
        let options = ImportOptions {
            skip_existing: false,
            ..ImportOptions::default()
        };
        run(&fs, &mut lib, &options);
        run(&fs, &mut lib, &options);
        assert_eq!(lib.material_names(), ["brick", "brick.001"]);
    }

    #[test]
    fn rejected_material_does_not_stop_the_batch() {
        let fs = ScriptedFs::new(&[
            ("tiles", &["tiles_diff.png", "tiles_normal.png"]),
            ("clay", &["clay_diff.png"]),
        ]);
        let mut store = PickyStore {
            inner: MaterialLibrary::new(),
            refuse: "Normal",
        };
        let report = run(&fs, &mut store, &ImportOptions::default());

        assert_eq!(counts(&report), (1, 0, 0, 1));
        assert!(matches!(&report.failures[0], ItemFailure::Host { name, .. } if name == "tiles"));
        assert_eq!(store.inner.material_names(), ["clay"]);
    }

    #[test]
    fn unlistable_folder_is_reported_and_skipped() {
        let mut fs = ScriptedFs::new(&[("locked", &[]), ("wood", &["wood_albedo.jpg"])]);
        fs.dirs[0].1 = None;
        let mut lib = MaterialLibrary::new();
        let report = run(&fs, &mut lib, &ImportOptions::default());

        assert_eq!(counts(&report), (1, 0, 0, 1));
        assert!(matches!(report.failures[0], ItemFailure::Listing { .. }));
    }

    #[test]
    fn existing_material_is_skipped_before_its_folder_is_listed() {
        let mut fs = ScriptedFs::new(&[("brick", &[])]);
        fs.dirs[0].1 = None;
        let mut lib = MaterialLibrary::new();
        lib.create_material("brick").unwrap();
        let report = run(&fs, &mut lib, &ImportOptions::default());
        assert_eq!(counts(&report), (0, 0, 1, 0));
    }

    #[test]
    fn ambiguous_files_are_reported_per_material() {
        let fs = ScriptedFs::new(&[("floor", &["floor_basecolor_roughness.png", "floor_nrm.png"])]);
        let mut lib = MaterialLibrary::new();
        let report = run(&fs, &mut lib, &ImportOptions::default());

        assert_eq!(
            report.ambiguous,
            [("floor".to_string(), "floor_basecolor_roughness.png".to_string())]
        );
        assert!(report
            .to_string()
            .ends_with("\n  floor: floor_basecolor_roughness.png matched more than one role"));
    }

    #[test]
    fn unreadable_root_fails_the_batch() {
        let fs = ScriptedFs::new(&[]);
        let table = RoleKeywordTable::default();
        let mut lib = MaterialLibrary::new();
        let err = BatchMaterialImporter::new(&fs, &StubLoader, &table)
            .import_all(&mut lib, Path::new("/missing"), &ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::ListRoot { .. }));
    }

    #[test]
    fn ignore_filter_drops_matching_files() {
        let fs = ScriptedFs::new(&[("rock", &["rock_normal_GL.png", "rock_normal_DX.png"])]);
        let normal_image = |lib: &MaterialLibrary| {
            lib.get("rock")
                .unwrap()
                .nodes
                .iter()
                .find_map(|n| match &n.kind {
                    NodeKind::TextureSample(s) => Some(s.image.name.clone()),
                    _ => None,
                })
                .unwrap()
        };

        let mut lib = MaterialLibrary::new();
        run(&fs, &mut lib, &ImportOptions::default());
        assert_eq!(normal_image(&lib), "rock_normal_DX.png");

        let mut lib = MaterialLibrary::new();
        let options = ImportOptions {
            ignore_filter: "DX".into(),
            ..ImportOptions::default()
        };
        run(&fs, &mut lib, &options);
        assert_eq!(normal_image(&lib), "rock_normal_GL.png");
    }

    #[test]
    fn progress_reports_every_folder() {
        let fs = ScriptedFs::new(&[("a", &["a_diff.png"]), ("b", &["readme.txt"])]);
        let table = RoleKeywordTable::default();
        let mut lib = MaterialLibrary::new();
        let mut seen = Vec::new();
        BatchMaterialImporter::new(&fs, &StubLoader, &table)
            .import_all_with_progress(&mut lib, Path::new("/textures"), &ImportOptions::default(), |done, total, name| {
                seen.push((done, total, name.to_string()))
            })
            .unwrap();
        assert_eq!(seen, [(1, 2, "a".to_string()), (2, 2, "b".to_string())]);
    }

    #[test]
    fn import_files_builds_a_single_material() {
        let fs = ScriptedFs::new(&[]);
        let table = RoleKeywordTable::default();
        let mut lib = MaterialLibrary::new();
        let files = raw_files(["/tmp/steel_basecolor.png", "/tmp/steel_metallic.png"]);
        let outcome = BatchMaterialImporter::new(&fs, &StubLoader, &table)
            .import_files(&mut lib, "steel", files, &ImportOptions::default())
            .unwrap();

        assert!(matches!(outcome, ItemOutcome::Imported { ref name, .. } if name == "steel"));
        assert_eq!(lib.get("steel").unwrap().texture_count(), 2);
    }

    #[test]
    fn summary_mentions_only_nonzero_counters() {
        let report = ImportReport {
            imported: 3,
            ..ImportReport::default()
        };
        assert_eq!(report.to_string(), "Complete, 3 materials imported");

        let report = ImportReport {
            imported: 2,
            deleted: 1,
            skipped: 4,
            ..ImportReport::default()
        };
        assert_eq!(
            report.to_string(),
            "Complete, 2 materials imported, 1 were deleted after import because they contained no textures, \
             4 skipped because they already exist"
        );
    }
}
