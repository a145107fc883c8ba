//! A single resource space built from many resource files

use std::{
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use indexmap::IndexSet;
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::{
    directory::ResourceDirectory,
    error::Result,
    parser::{Object, ParserRegistry},
    resource::Resource,
    types::TypeCode,
};

static SHARED: OnceLock<ResourceFork> = OnceLock::new();

/// An ordered stack of resource files queried as one.
///
/// Files added later take precedence: point lookups search from the most recently added file
/// backwards and return the first match. Enumerations still collect from every file.
///
/// ```no_run
/// use rk_fork::{ResourceFork, TypeCode};
///
/// fn load(paths: &[&str]) -> rk_fork::error::Result<()> {
///     let fork = ResourceFork::empty();
///     for path in paths {
///         fork.add_file(path)?;
///     }
///
///     let ship = TypeCode::new(*b"ship");
///     for resource in fork.resources_of_type(ship) {
///         println!("{} {:?}", resource.id(), resource.name());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct ResourceFork {
    directories: RwLock<Vec<Arc<ResourceDirectory>>>,
    registry: Arc<ParserRegistry>,
}

impl ResourceFork {
    /// An empty fork decoding resources with `registry`
    pub fn new(registry: Arc<ParserRegistry>) -> Self {
        Self {
            directories: RwLock::new(Vec::new()),
            registry,
        }
    }

    /// An empty fork that only knows the raw data parser
    pub fn empty() -> Self {
        Self::default()
    }

    /// The fork shared by the whole process.
    ///
    /// It is created empty on first use unless [`ResourceFork::install_shared`] ran before.
    pub fn shared() -> &'static ResourceFork {
        SHARED.get_or_init(ResourceFork::empty)
    }

    /// Set the fork returned by [`ResourceFork::shared`].
    ///
    /// Returns the fork back if the shared fork already exists.
    pub fn install_shared(fork: ResourceFork) -> core::result::Result<(), ResourceFork> {
        SHARED.set(fork)
    }

    /// The parsers used by [`ResourceFork::object`]
    pub fn registry(&self) -> &Arc<ParserRegistry> {
        &self.registry
    }

    /// Open a resource file and place it on top of the fork.
    ///
    /// Nothing is added if the file fails to decode.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()), err)]
    pub fn add_file(&self, path: impl AsRef<Path>) -> Result<Arc<ResourceDirectory>> {
        let directory = ResourceDirectory::open(path)?;
        Ok(self.add_directory(directory))
    }

    /// Open several resource files in parallel and add them in the given order.
    ///
    /// Each file succeeds or fails on its own; only the files that decoded are added.
    pub fn add_files<P>(&self, paths: &[P]) -> Vec<Result<Arc<ResourceDirectory>>>
    where
        P: AsRef<Path> + Sync,
    {
        let opened: Vec<Result<ResourceDirectory>> = paths
            .par_iter()
            .map(ResourceDirectory::open)
            .collect();

        let mut directories = self.directories.write();
        opened
            .into_iter()
            .zip(paths)
            .map(|(result, path)| {
                let directory = Arc::new(result.inspect_err(|e| {
                    warn!(path = %path.as_ref().display(), "failed to load resource file: {e}")
                })?);
                directories.push(directory.clone());
                Ok(directory)
            })
            .collect()
    }

    /// Place an already decoded directory on top of the fork
    pub fn add_directory(&self, directory: impl Into<Arc<ResourceDirectory>>) -> Arc<ResourceDirectory> {
        let directory = directory.into();
        info!(path = ?directory.path(), "adding resource file to fork");
        self.directories.write().push(directory.clone());
        directory
    }

    /// Remove one directory, leaving the others and their order untouched.
    ///
    /// Returns whether the directory was part of the fork.
    pub fn remove(&self, directory: &Arc<ResourceDirectory>) -> bool {
        let mut directories = self.directories.write();
        let Some(index) = directories.iter().position(|d| Arc::ptr_eq(d, directory)) else {
            return false;
        };

        info!(path = ?directory.path(), "removing resource file from fork");
        directories.remove(index);
        true
    }

    /// Snapshot of the directories, in the order they were added
    pub fn directories(&self) -> Vec<Arc<ResourceDirectory>> {
        self.directories.read().clone()
    }

    /// Paths of every file contributing to the fork, in the order they were added
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.directories
            .read()
            .iter()
            .filter_map(|d| d.path().map(Path::to_path_buf))
            .collect()
    }

    /// Number of directories in the fork
    pub fn len(&self) -> usize {
        self.directories.read().len()
    }

    /// Whether the fork holds no directories
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct type codes across every directory
    pub fn all_types(&self) -> Vec<TypeCode> {
        let directories = self.directories.read();
        let codes: IndexSet<TypeCode> = directories
            .iter()
            .rev()
            .flat_map(|d| d.type_codes())
            .collect();
        codes.into_iter().collect()
    }

    /// Every resource of `code` from every directory, most recently added directory first.
    ///
    /// Resources that share an id across files are all returned.
    pub fn resources_of_type(&self, code: TypeCode) -> Vec<Resource> {
        self.directories
            .read()
            .iter()
            .rev()
            .flat_map(|d| d.resources_of_type(code))
            .collect()
    }

    /// The resource of `code` with `id` from the most recently added directory that has it
    pub fn resource(&self, code: TypeCode, id: i16) -> Option<Resource> {
        self.directories
            .read()
            .iter()
            .rev()
            .find_map(|d| d.resource_handle(code, id))
    }

    /// Read the data of the resource of `code` with `id`, if any directory has it
    pub fn data(&self, code: TypeCode, id: i16) -> Result<Option<Vec<u8>>> {
        self.resource(code, id).map(|r| r.data()).transpose()
    }

    /// The decoded form of the resource of `code` with `id`, if any directory has it
    pub fn object(&self, code: TypeCode, id: i16) -> Result<Option<Object>> {
        self.resource(code, id)
            .map(|r| r.object(&self.registry))
            .transpose()
    }
}
