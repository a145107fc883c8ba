//! This library reads the **Ndat** and **Rez** resource files used by the *Escape Velocity* series
//! and merges them into a single resource fork.
//!
//! # Resource Files
//!
//! Both formats flatten a classic resource fork into an ordinary file: a set of typed, numbered and
//! optionally named blobs. A resource is identified by a four byte [`TypeCode`] and a signed 16-bit
//! id. What the bytes mean depends on the type and is left to a [`ResourceParser`].
//!
//! Only the resource map is decoded when a file is opened. Resource data is read lazily through
//! the [`ResourceDirectory`] that owns it.
//!
//! ## Ndat
//!
//! Every multi-byte integer is big-endian.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Data Offset            | 4 bytes: Offset to the resource data                       |
//! | 0x0004         | Map Offset             | 4 bytes: Offset to the resource map                        |
//! | 0x0008         | Data Size              | 4 bytes: Length of the resource data                       |
//! | 0x000C         | Map Size               | 4 bytes: Length of the resource map                        |
//!
//! ### Resource Map
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Header Copy            | 16 bytes: Must match the file header exactly               |
//! | 0x0010         | Reserved               | 6 bytes: Handle and file reference, unused                 |
//! | 0x0016         | Attributes             | 2 bytes: `0x0080` read only, `0x0040` compressed           |
//! | 0x0018         | Type List Offset       | 2 bytes: Offset to the type list, from the map             |
//! | 0x001A         | Name List Offset       | 2 bytes: Offset to the name list, from the map             |
//!
//! The type list starts with the number of types minus one, followed by an 8 byte entry per type:
//! the type code, the number of resources minus one, and the offset of the type's resource list
//! from the start of the type list. Each resource entry is 12 bytes:
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | ID                     | 2 bytes: Signed resource id                                |
//! | 0x0002         | Name Offset            | 2 bytes: Offset into the name list, negative when unnamed  |
//! | 0x0004         | Attributes             | 1 byte                                                     |
//! | 0x0005         | Data Offset            | 3 bytes: Offset from the start of the resource data        |
//! | 0x0008         | Reserved               | 4 bytes: Handle, unused                                    |
//!
//! Names are Pascal strings. The data of every resource is preceded by its 4 byte length.
//!
//! Compressed files are detected and rejected.
//!
//! ## Rez
//!
//! The file starts little-endian and switches to big-endian at the resource map.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "BRGR"                                            |
//! | 0x0004         | Reserved               | 16 bytes                                                   |
//! | 0x0014         | Range Count            | 4 bytes: Number of data ranges                             |
//! | 0x0018         | Data Ranges            | 12 bytes each: offset, size, reserved                      |
//! | ...            | Tag                    | 12 bytes: "resource.map"                                   |
//!
//! The last data range holds the resource map. The map starts with a reserved double word and
//! the number of types, followed by a 12 byte entry per type (code, offset of its first header,
//! resource count) and one 266 byte header per resource:
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Data Range             | 4 bytes: One-based index into the data ranges              |
//! | 0x0004         | Type Code              | 4 bytes                                                    |
//! | 0x0008         | ID                     | 2 bytes: Signed resource id                                |
//! | 0x000A         | Name                   | 256 bytes: NUL padded                                      |
//!
//! ## Resource Fork
//!
//! A [`ResourceFork`] stacks any number of directories. Point lookups return the resource from
//! the most recently added file, so plug-ins override the base data files, while
//! [`ResourceFork::resources_of_type`] lists the resources of every file.
//!

pub mod cursor;
pub mod directory;
pub mod error;
pub mod fork;
pub mod ndat;
pub mod parser;
pub mod resource;
pub mod rez;
pub mod types;

pub use directory::{ContainerFormat, ResourceDirectory};
pub use fork::ResourceFork;
pub use parser::{Object, ParserRegistry, ResourceParser};
pub use resource::Resource;
pub use types::TypeCode;
