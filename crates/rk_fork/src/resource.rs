//! Handles to individual resources

use std::{
    any::Any,
    borrow::Cow,
    fmt::{self, Debug},
    sync::Arc,
};

use tracing::trace;

use crate::{
    directory::ResourceDirectory,
    error::Result,
    parser::{Object, ParserRegistry},
    types::{ResourceHeader, TypeCode},
};

/// A resource together with the directory that owns it.
///
/// Holding a handle keeps the directory, and therefore its file, alive even after the
/// directory has been removed from a [`crate::ResourceFork`].
#[derive(Clone)]
pub struct Resource {
    directory: Arc<ResourceDirectory>,
    type_index: usize,
    index: usize,
}

impl Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Resource({:#?})", self.header())
    }
}

impl Resource {
    pub(crate) fn new(directory: Arc<ResourceDirectory>, type_index: usize, index: usize) -> Self {
        Self {
            directory,
            type_index,
            index,
        }
    }

    /// The header describing this resource
    pub fn header(&self) -> &ResourceHeader {
        &self.directory.types()[self.type_index].resources()[self.index]
    }

    /// The directory this resource was read from
    pub fn directory(&self) -> &Arc<ResourceDirectory> {
        &self.directory
    }

    /// Type code of the resource
    pub fn code(&self) -> TypeCode {
        self.header().code()
    }

    /// Id of the resource
    pub fn id(&self) -> i16 {
        self.header().id()
    }

    /// Get the name of the resource, if it has one
    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.header().name()
    }

    /// Get the name of the resource, in the raw (internal) byte representation.
    pub fn name_raw(&self) -> Option<&[u8]> {
        self.header().name_raw()
    }

    /// Size of the data, in bytes
    pub fn size(&self) -> u64 {
        self.header().size()
    }

    /// Offset of the data in the owning file
    pub fn offset(&self) -> u64 {
        self.header().offset()
    }

    /// Read the raw data of the resource
    pub fn data(&self) -> Result<Vec<u8>> {
        self.directory.read(self.header())
    }

    /// The decoded form of the resource.
    ///
    /// The first call reads the data and decodes it with the parser registered for the type, or
    /// keeps the raw `Vec<u8>` when there is none. Later calls with the same registry return the
    /// same object until [`Resource::flush_cache`] is called. A different registry, or one that
    /// changed since, decodes again and replaces the cached object.
    ///
    /// No lock is held while the parser runs, so a parser may look up other resources, including
    /// this one. When two decodes race, the first one stored is returned to both.
    pub fn object(&self, registry: &ParserRegistry) -> Result<Object> {
        let header = self.header();
        let generation = registry.generation();

        if let Some((_, object)) = header.object.lock().as_ref().filter(|(g, _)| *g == generation) {
            return Ok(object.clone());
        }

        trace!(code = %header.code, id = header.id, "decoding resource");
        let object = registry.decode(header.code, self.data()?)?;

        let mut cached = header.object.lock();
        if let Some((g, stored)) = cached.as_ref() {
            if *g == generation {
                return Ok(stored.clone());
            }
        }
        *cached = Some((generation, object.clone()));
        Ok(object)
    }

    /// The decoded form of the resource, if it decodes to a `T`
    pub fn object_as<T: Any + Send + Sync>(&self, registry: &ParserRegistry) -> Result<Option<Arc<T>>> {
        Ok(self.object(registry)?.downcast::<T>().ok())
    }

    /// Remove the cached decoded object. The header and the file are left untouched.
    pub fn flush_cache(&self) {
        self.header().flush_cache();
    }
}
