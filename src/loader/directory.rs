use std::{
    collections::HashSet,
    fs::File,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use memmap2::Mmap;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::{
    loader::{LoadCandidate, ModuleReader, ModuleSource},
    metadata::module::Module,
    Result,
};

/// A [`ModuleSource`] that scans a directory for files matching glob masks.
///
/// Files are memory-mapped and handed to the configured [`ModuleReader`]. Parsing runs on
/// the rayon thread pool unless disabled; candidates are always returned in the order the
/// directory walk produced them (sorted by file name), so loading stays deterministic.
pub struct DirectorySource<R> {
    reader: R,
    recursive: bool,
    parallel: bool,
}

impl<R: ModuleReader> DirectorySource<R> {
    /// Create a recursive, parallel source reading files with `reader`
    pub fn new(reader: R) -> Self {
        DirectorySource {
            reader,
            recursive: true,
            parallel: true,
        }
    }

    /// Descend into sub-directories
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Parse files on the rayon thread pool
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn read_file(&self, path: &Path) -> Result<Module> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(malformed_error!("{} is empty", path.display()));
        }

        let data = unsafe { Mmap::map(&file) }?;
        let module = self.reader.read(path, &data)?;

        Ok(match module.path {
            Some(_) => module,
            None => module.with_path(path),
        })
    }

    fn candidate(&self, path: &Path) -> LoadCandidate {
        LoadCandidate {
            path: path.to_path_buf(),
            module: self.read_file(path),
        }
    }
}

impl<R: ModuleReader> ModuleSource for DirectorySource<R> {
    fn candidates(&self, path: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
        let masks = compile_masks(patterns)?;
        if !path.is_dir() {
            debug!("{} is not a directory, nothing to scan", path.display());
            return Ok(Vec::new());
        }

        let mut walker = WalkDir::new(path).follow_links(true).sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for entry in walker.into_iter().filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!("skipping directory entry: {error}");
                None
            }
        }) {
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if (masks.is_empty() || masks.iter().any(|mask| mask.matches(&name)))
                && seen.insert(entry.path().to_path_buf())
            {
                files.push(entry.path().to_path_buf());
            }
        }

        Ok(files)
    }

    fn load(&self, paths: &[PathBuf]) -> Vec<LoadCandidate> {
        if self.parallel {
            paths.par_iter().map(|path| self.candidate(path)).collect()
        } else {
            paths.iter().map(|path| self.candidate(path)).collect()
        }
    }
}

/// Compile file name masks, splitting `;` separated lists
fn compile_masks(patterns: &[String]) -> Result<Vec<glob::Pattern>> {
    patterns
        .iter()
        .flat_map(|pattern| pattern.split(';'))
        .map(str::trim)
        .filter(|mask| !mask.is_empty())
        .map(|mask| Ok(glob::Pattern::new(mask)?))
        .collect()
}
