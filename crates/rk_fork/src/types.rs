//! Base types shared by both resource file formats, plus the fixed-size records read from disk.

use std::{
    borrow::Cow,
    fmt::{self, Debug, Display},
    str::FromStr,
};

use binrw::{BinRead, BinResult};
use parking_lot::Mutex;

use crate::{error::InvalidTypeCode, parser::Object};

/// A four byte resource type code, such as `shïp` or `PICT`.
///
/// The bytes are kept as they appear on disk. They are usually Mac Roman text, but nothing
/// requires them to be printable, so the code is never decoded as a string.
#[derive(BinRead, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeCode(pub [u8; 4]);

impl TypeCode {
    /// Create a type code from its raw bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// The raw bytes of the code
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for TypeCode {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl From<&[u8; 4]> for TypeCode {
    fn from(value: &[u8; 4]) -> Self {
        Self(*value)
    }
}

impl FromStr for TypeCode {
    type Err = InvalidTypeCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| InvalidTypeCode(s.len()))?;
        Ok(Self(bytes))
    }
}

impl Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl Debug for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeCode('{self}')")
    }
}

/// On-disk records with a fixed length, so a read can be bounds checked before it starts.
pub(crate) trait Record {
    /// Number of bytes the record occupies on disk
    const SIZE: u64;
}

/// Ndat file header
///
/// The same four values are repeated at the start of the resource map.
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct NdatHeader {
    /// Offset from the start of the file to the resource data
    pub data_offset: u32,

    /// Offset from the start of the file to the resource map
    pub map_offset: u32,

    /// Length of the resource data
    pub data_size: u32,

    /// Length of the resource map
    pub map_size: u32,
}

impl Record for NdatHeader {
    const SIZE: u64 = 16;
}

/// An entry of the Ndat type list
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct NdatTypeRecord {
    pub code: TypeCode,

    /// Number of resources of this type, minus one
    pub count: u16,

    /// Offset of the first resource record, from the start of the type list
    pub resource_list_offset: u16,
}

impl Record for NdatTypeRecord {
    const SIZE: u64 = 8;
}

#[binrw::parser(reader, endian)]
fn read_data_offset() -> BinResult<u32> {
    let high = u16::read_options(reader, endian, ())?;
    let low = u8::read_options(reader, endian, ())?;
    Ok(((high as u32) << 8) & 0x00FF_FF00 | low as u32)
}

/// An entry of an Ndat resource list
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct NdatResourceRecord {
    pub id: i16,

    /// Offset of the name from the start of the name list, negative when unnamed
    pub name_offset: i16,

    pub attributes: u8,

    /// Offset of the length-prefixed data from the start of the resource data
    #[br(parse_with = read_data_offset)]
    pub data_offset: u32,

    /// Handle slot, always zero on disk
    pub handle: u32,
}

impl Record for NdatResourceRecord {
    const SIZE: u64 = 12;
}

/// A contiguous run of bytes in a Rez file
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DataRange {
    /// Offset from the start of the file
    pub offset: u32,

    /// Length of the run
    pub size: u32,

    reserved: u32,
}

impl DataRange {
    /// Create a data range without the reserved field
    pub fn new(offset: u32, size: u32) -> Self {
        Self {
            offset,
            size,
            reserved: 0,
        }
    }
}

impl Record for DataRange {
    const SIZE: u64 = 12;
}

/// An entry of the Rez type table
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct RezTypeRecord {
    pub code: TypeCode,

    /// Offset of the first resource header of this type
    #[allow(dead_code)]
    pub first_resource_offset: u32,

    pub resource_count: u32,
}

impl Record for RezTypeRecord {
    const SIZE: u64 = 12;
}

/// An entry of the Rez resource header list
#[derive(BinRead, Debug, Clone, PartialEq, Eq)]
pub(crate) struct RezResourceRecord {
    /// One-based index into the data ranges
    pub data_range: u32,

    pub code: TypeCode,

    pub id: i16,

    /// NUL padded name
    pub name: [u8; 256],
}

impl Record for RezResourceRecord {
    const SIZE: u64 = 266;
}

/// Structure representing a single resource inside a resource file.
///
/// Headers only describe where the data lives; the bytes are read on demand through the
/// owning [`crate::ResourceDirectory`].
pub struct ResourceHeader {
    pub(crate) code: TypeCode,
    pub(crate) id: i16,
    pub(crate) name: Option<Box<[u8]>>,
    pub(crate) attributes: u8,
    pub(crate) offset: u64,
    pub(crate) size: u64,
    /// Decoded object and the generation of the registry that produced it
    pub(crate) object: Mutex<Option<(u64, Object)>>,
}

impl ResourceHeader {
    pub(crate) fn new(
        code: TypeCode,
        id: i16,
        name: Option<Box<[u8]>>,
        attributes: u8,
        offset: u64,
        size: u64,
    ) -> Self {
        Self {
            code,
            id,
            name,
            attributes,
            offset,
            size,
            object: Mutex::new(None),
        }
    }

    /// Type code of the resource
    pub fn code(&self) -> TypeCode {
        self.code
    }

    /// Id of the resource
    ///
    /// Negative ids conventionally mark a resource as owned by another one.
    pub fn id(&self) -> i16 {
        self.id
    }

    /// Get the name of the resource, if it has one
    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.name.as_deref().map(String::from_utf8_lossy)
    }

    /// Get the name of the resource, in the raw (internal) byte representation.
    ///
    /// The encoding of this data is currently undefined.
    pub fn name_raw(&self) -> Option<&[u8]> {
        self.name.as_deref()
    }

    /// Attribute byte of the resource, zero for Rez files
    pub fn attributes(&self) -> u8 {
        self.attributes
    }

    /// Offset of the data from the start of the file
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Size of the data, in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether a decoded object is currently cached
    pub fn is_cached(&self) -> bool {
        self.object.lock().is_some()
    }

    /// Remove the cached decoded object
    pub fn flush_cache(&self) {
        self.object.lock().take();
    }
}

impl Debug for ResourceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHeader")
            .field("code", &self.code)
            .field("id", &self.id)
            .field("name", &self.name())
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

/// All resources of a single type inside a resource file
#[derive(Debug)]
pub struct ResourceType {
    pub(crate) code: TypeCode,
    pub(crate) resources: Vec<ResourceHeader>,
}

impl ResourceType {
    /// Type code shared by all the resources
    pub fn code(&self) -> TypeCode {
        self.code
    }

    /// Number of resources of this type
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether there are no resources of this type
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resources in the order they appear in the file
    pub fn resources(&self) -> &[ResourceHeader] {
        &self.resources
    }

    /// Get a resource by its position in the type
    pub fn by_index(&self, index: usize) -> Option<&ResourceHeader> {
        self.resources.get(index)
    }

    /// Search for a resource by id. This is a linear scan.
    pub fn by_id(&self, id: i16) -> Option<&ResourceHeader> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub(crate) fn position_of(&self, id: i16) -> Option<usize> {
        self.resources.iter().position(|r| r.id == id)
    }
}
