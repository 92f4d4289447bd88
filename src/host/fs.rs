use std::io;
use std::path::{Path, PathBuf};

use super::{FileEnumerator, ImageHandle, ImageLoader};
use crate::error::LoadError;
use crate::texture_set::RawFile;

/// Enumerates the real filesystem. Entries come back sorted by name.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsEnumerator;

impl FileEnumerator for FsEnumerator {
    fn subdirectories(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn files(&self, dir: &Path) -> io::Result<Vec<RawFile>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    files.push(RawFile {
                        name: name.to_string(),
                        path: entry.path(),
                    });
                } else {
                    log::warn!("Skipping non UTF-8 file name: {}", entry.path().display());
                }
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

/// Loads images from disk, reading only the header to validate the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, path: &Path) -> Result<ImageHandle, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        let (width, height) = image::image_dimensions(path).map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::debug!("Loaded image {} ({}x{})", path.display(), width, height);
        Ok(ImageHandle {
            name,
            path: path.to_path_buf(),
            width,
            height,
        })
    }
}
