//! Per-file view over the resources of an Ndat or Rez file

use std::{
    ffi::OsStr,
    fmt::{self, Debug},
    fs::File,
    io::{BufReader, Read, Seek},
    path::{Path, PathBuf},
    sync::Arc,
};

use binrw::Endian;
use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use crate::{
    cursor::ByteCursor,
    error::{Error, ResourceNotFoundError, Result},
    ndat,
    resource::Resource,
    rez,
    types::{DataRange, NdatHeader, ResourceHeader, ResourceType, TypeCode},
};

/// Any seekable byte source a directory can read resource data from
pub trait Source: Read + Seek + Send {}

impl<T: Read + Seek + Send> Source for T {}

/// The on-disk formats a resource file can be stored in
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Big-endian flattened resource fork
    Ndat,

    /// Mixed-endian resource file with a table of data ranges
    Rez,
}

impl ContainerFormat {
    /// The file extension used for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Ndat => "ndat",
            ContainerFormat::Rez => "rez",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension().and_then(OsStr::to_str)?;
        [ContainerFormat::Ndat, ContainerFormat::Rez]
            .into_iter()
            .find(|f| extension.eq_ignore_ascii_case(f.extension()))
    }

    /// Guess the format from the first bytes of a source.
    ///
    /// Ndat files carry no magic number, so anything without the Rez magic is assumed to be Ndat.
    pub fn sniff<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        if cursor.length() < 4 {
            return Ok(ContainerFormat::Ndat);
        }

        cursor.set_endian(Endian::Little);
        let magic = cursor.peek_at(0, |c| c.read_u32())?;
        Ok(if magic == rez::REZ_MAGIC {
            ContainerFormat::Rez
        } else {
            ContainerFormat::Ndat
        })
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContainerFormat::Ndat => f.write_str("Ndat"),
            ContainerFormat::Rez => f.write_str("Rez"),
        }
    }
}

/// Format specific details kept after decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Details of an Ndat file
    Ndat {
        /// The file header
        header: NdatHeader,
        /// The resource map attributes
        attributes: u16,
    },

    /// Details of a Rez file
    Rez {
        /// Every data range, including the one holding the resource map
        data_ranges: Vec<DataRange>,
        /// Offset of the first byte after the `resource.map` tag
        resource_offset: u64,
        /// Offset of the resource map
        map_offset: u64,
        /// Position of each resource header as (type index, index within type), in file order
        order: Vec<(usize, usize)>,
    },
}

/// Everything a decoder produces for one file
#[derive(Debug)]
pub(crate) struct Contents {
    pub types: Vec<ResourceType>,
    pub layout: Layout,
}

/// The resources of a single file.
///
/// Only the resource map is read when the directory is created. Resource data is read from
/// the underlying source on request, one bounded read at a time.
///
/// ```no_run
/// use rk_fork::ResourceDirectory;
///
/// fn list_resources(path: &str) -> rk_fork::error::Result<()> {
///     let directory = ResourceDirectory::open(path)?;
///
///     for kind in directory.types() {
///         for resource in kind.resources() {
///             println!("{} {} {:?}", kind.code(), resource.id(), resource.name());
///         }
///     }
///
///     Ok(())
/// }
/// ```
pub struct ResourceDirectory {
    path: Option<PathBuf>,
    format: ContainerFormat,
    types: Vec<ResourceType>,
    layout: Layout,
    length: u64,
    source: Mutex<ByteCursor<Box<dyn Source>>>,
}

impl Debug for ResourceDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDirectory")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("types", &self.type_codes().collect::<Vec<_>>())
            .finish()
    }
}

impl ResourceDirectory {
    /// Open a resource file, picking the format from its extension or its contents.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::open_file(path, ContainerFormat::from_path(path))
    }

    /// Open a resource file that is known to be in `format`
    pub fn open_as(path: impl AsRef<Path>, format: ContainerFormat) -> Result<Self> {
        Self::open_file(path.as_ref(), Some(format))
    }

    #[instrument(err)]
    fn open_file(path: &Path, format: Option<ContainerFormat>) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        let mut directory = Self::new(file, format)?;
        directory.path = Some(path.to_owned());
        info!(format = ?directory.format, types = directory.len(), "opened resource file");
        Ok(directory)
    }

    /// Read the resource map from any seekable source.
    ///
    /// When `format` is `None` it is detected from the leading magic number.
    pub fn new<R: Read + Seek + Send + 'static>(
        reader: R,
        format: Option<ContainerFormat>,
    ) -> Result<Self> {
        let mut cursor = ByteCursor::new(Box::new(reader) as Box<dyn Source>)?;
        let format = match format {
            Some(format) => format,
            None => ContainerFormat::sniff(&mut cursor)?,
        };
        debug!(?format, length = cursor.length(), "decoding resource map");

        let contents = match format {
            ContainerFormat::Ndat => ndat::decode(&mut cursor)?,
            ContainerFormat::Rez => rez::decode(&mut cursor)?,
        };

        Ok(Self {
            path: None,
            format,
            types: contents.types,
            layout: contents.layout,
            length: cursor.length(),
            source: Mutex::new(cursor),
        })
    }

    /// Path of the file, if the directory was opened from one
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Format the file is stored in
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Format specific details
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Whether the Ndat map is flagged read only. Always false for Rez files.
    pub fn is_read_only(&self) -> bool {
        matches!(self.layout, Layout::Ndat { attributes, .. } if attributes & ndat::ATTRIBUTE_READ_ONLY != 0)
    }

    /// Data ranges of a Rez file, empty for Ndat files
    pub fn data_ranges(&self) -> &[DataRange] {
        match &self.layout {
            Layout::Rez { data_ranges, .. } => data_ranges,
            Layout::Ndat { .. } => &[],
        }
    }

    /// Get a Rez data range by index
    pub fn data_range(&self, index: usize) -> Option<&DataRange> {
        self.data_ranges().get(index)
    }

    /// The span of the file resource data may be read from, as `start..end`.
    ///
    /// For Ndat files this is the data region declared in the header. Rez files declare each
    /// resource's range individually, so the whole file is allowed.
    pub fn data_region(&self) -> (u64, u64) {
        match &self.layout {
            Layout::Ndat { header, .. } => {
                let start = header.data_offset as u64;
                (start, start + header.data_size as u64)
            }
            Layout::Rez { .. } => (0, self.length),
        }
    }

    /// Number of resource types in the file
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the file holds no resource types
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Total number of resources across all types
    pub fn resource_count(&self) -> usize {
        self.types.iter().map(ResourceType::len).sum()
    }

    /// Resource types in the order they appear in the file
    pub fn types(&self) -> &[ResourceType] {
        &self.types
    }

    /// Returns an iterator over all the type codes in this file.
    pub fn type_codes(&self) -> impl Iterator<Item = TypeCode> + '_ {
        self.types.iter().map(ResourceType::code)
    }

    /// Get a resource type by its position
    pub fn type_at(&self, index: usize) -> Option<&ResourceType> {
        self.types.get(index)
    }

    /// Search for a resource type by code
    pub fn type_for_code(&self, code: TypeCode) -> Option<&ResourceType> {
        self.types.iter().find(|t| t.code == code)
    }

    pub(crate) fn type_index(&self, code: TypeCode) -> Option<usize> {
        self.types.iter().position(|t| t.code == code)
    }

    /// Get a resource by its position within its type
    pub fn resource_at(&self, code: TypeCode, index: usize) -> Option<&ResourceHeader> {
        self.type_for_code(code)?.by_index(index)
    }

    /// Search for a resource by type and id.
    ///
    /// The search is linear in the number of resources of that type.
    pub fn resource(&self, code: TypeCode, id: i16) -> Option<&ResourceHeader> {
        self.type_for_code(code)?.by_id(id)
    }

    /// Get a resource by its position in the file's flat header list. Only Rez files keep one.
    pub fn header_at(&self, index: usize) -> Option<&ResourceHeader> {
        match &self.layout {
            Layout::Rez { order, .. } => {
                let &(t, r) = order.get(index)?;
                self.types.get(t)?.by_index(r)
            }
            Layout::Ndat { .. } => None,
        }
    }

    /// Handles for every resource of `code`, each keeping this directory alive
    pub fn resources_of_type(self: &Arc<Self>, code: TypeCode) -> Vec<Resource> {
        let Some(type_index) = self.type_index(code) else {
            return Vec::new();
        };

        (0..self.types[type_index].len())
            .map(|index| Resource::new(self.clone(), type_index, index))
            .collect()
    }

    /// Handle for the resource of `code` with `id`
    pub fn resource_handle(self: &Arc<Self>, code: TypeCode, id: i16) -> Option<Resource> {
        let type_index = self.type_index(code)?;
        let index = self.types[type_index].position_of(id)?;
        Some(Resource::new(self.clone(), type_index, index))
    }

    /// Read the data of the resource of `code` with `id`.
    ///
    /// Asking for a resource that does not exist is an error; enumerate the directory first.
    pub fn data(&self, code: TypeCode, id: i16) -> Result<Vec<u8>> {
        let header = self
            .resource(code, id)
            .ok_or(ResourceNotFoundError::Id { code, id })?;
        self.read(header)
    }

    /// Read the data described by `header`, which must belong to this directory.
    #[instrument(skip(self), fields(code = %header.code, id = header.id), err)]
    pub fn read(&self, header: &ResourceHeader) -> Result<Vec<u8>> {
        let (start, end) = self.data_region();
        let out_of_bounds = Error::OutOfBounds {
            offset: header.offset,
            requested: header.size,
            length: end.min(self.length),
        };

        // the offset is checked even for empty resources
        let fits = header.offset >= start
            && header.offset <= self.length
            && header
                .offset
                .checked_add(header.size)
                .is_some_and(|e| e <= end);
        if !fits {
            return Err(out_of_bounds);
        }

        let size = usize::try_from(header.size).map_err(|_| out_of_bounds)?;
        if size == 0 {
            return Ok(Vec::new());
        }

        self.source.lock().read_at(header.offset, size)
    }
}
