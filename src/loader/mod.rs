//! Discovery and parsing of module files.
//!
//! Turning bytes into a [`Module`] is the job of a [`ModuleReader`]; finding the files to
//! read is the job of a [`ModuleSource`]. The registry drives both through
//! [`crate::project::ModuleRegistry::load_modules`], which tolerates files that fail to
//! parse: every candidate is reported as a [`LoadCandidate`] carrying either the module or
//! the reason it could not be read.
//!
//! # Key Components
//!
//! - [`ModuleReader`] - Parses one file into a module
//! - [`ModuleSource`] - Enumerates candidate files and reads them
//! - [`DirectorySource`] - Directory scanner with glob file masks and parallel parsing
//! - [`ImageReader`] - Reader for JSON module images
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dotmetrics::loader::{DirectorySource, ImageReader, ModuleSource};
//!
//! let source = DirectorySource::new(ImageReader::new()).recursive(false);
//! for candidate in source.scan(Path::new("build/images"), &["*.json".to_string()])? {
//!     match candidate.module {
//!         Ok(module) => println!("{}: {} types", module.name, module.type_count()),
//!         Err(error) => println!("{}: {}", candidate.path.display(), error),
//!     }
//! }
//! # Ok::<(), dotmetrics::Error>(())
//! ```

mod directory;
mod image;

use std::path::{Path, PathBuf};

pub use directory::DirectorySource;
pub use image::{
    FieldImage, GenericParamImage, ImageReader, InstructionImage, MethodImage, ModuleImage,
    OperandImage, ParamImage, SemanticsImage, TypeImage, TypeKindImage, TypeRefImage,
    TypeSpecImage,
};

use crate::{metadata::module::Module, Result};

/// Parses the content of one file into a [`Module`]
pub trait ModuleReader: Send + Sync {
    /// Parse a module
    ///
    /// ## Arguments
    /// * 'path' - The file the data was read from
    /// * 'data' - The file content
    ///
    /// # Errors
    /// Returns an error if the data is not a valid module
    fn read(&self, path: &Path, data: &[u8]) -> Result<Module>;
}

impl<F> ModuleReader for F
where
    F: Fn(&Path, &[u8]) -> Result<Module> + Send + Sync,
{
    fn read(&self, path: &Path, data: &[u8]) -> Result<Module> {
        self(path, data)
    }
}

/// One file offered by a [`ModuleSource`] and the outcome of reading it
#[derive(Debug)]
pub struct LoadCandidate {
    /// Path of the file
    pub path: PathBuf,
    /// The parsed module, or why parsing failed
    pub module: Result<Module>,
}

/// Enumerates and reads candidate module files
pub trait ModuleSource {
    /// List the files under `path` whose names match one of the masks.
    ///
    /// A missing directory yields no candidates.
    ///
    /// ## Arguments
    /// * 'path'     - Directory to search
    /// * 'patterns' - File name masks, each may hold several masks separated by `;`
    ///
    /// # Errors
    /// Returns [`crate::Error::GlobPattern`] for a malformed mask
    fn candidates(&self, path: &Path, patterns: &[String]) -> Result<Vec<PathBuf>>;

    /// Read the given files, preserving their order
    fn load(&self, paths: &[PathBuf]) -> Vec<LoadCandidate>;

    /// List and read all candidates in one go
    ///
    /// # Errors
    /// Returns [`crate::Error::GlobPattern`] for a malformed mask
    fn scan(&self, path: &Path, patterns: &[String]) -> Result<Vec<LoadCandidate>> {
        let paths = self.candidates(path, patterns)?;
        Ok(self.load(&paths))
    }
}
