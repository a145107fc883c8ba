//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::types::TypeCode;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// a read or seek went past the end of the file
    #[error("cannot read {requested} bytes at offset {offset}, file is {length} bytes long")]
    #[diagnostic(
        code(rk_fork::out_of_bounds),
        help("the resource file is most likely truncated or corrupt")
    )]
    OutOfBounds {
        /// Position the access started at
        offset: u64,
        /// Number of bytes requested
        requested: u64,
        /// Total length of the source
        length: u64,
    },

    /// file is an invalid resource file
    #[error("file is an invalid resource file")]
    InvalidFormat(#[from] FormatError),

    /// the file uses a feature that is not supported
    #[error("unsupported feature: {0}")]
    Unsupported(&'static str),

    /// unable to find requested resource
    #[error("unable to find requested resource")]
    ResourceNotFound(#[from] ResourceNotFoundError),

    /// {0}
    #[error("{0}")]
    CustomError(String),
}

/// Structural problems found while decoding a resource file
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A field of the Ndat header does not match its copy at the start of the resource map
    #[error("{field} does not match the copy in the resource map")]
    HeaderMismatch {
        /// Name of the mismatching field
        field: &'static str,
    },

    /// The Rez magic number is missing
    #[error("expected magic number, found {0:#010x}")]
    BadMagic(u32),

    /// The `resource.map` tag of a Rez file is missing
    #[error("expected to find the resource.map section")]
    MissingResourceMap,

    /// A Rez file declares no data ranges, so it has no resource map
    #[error("no data ranges, unable to locate the resource map")]
    EmptyDataRanges,

    /// A Rez resource refers to a data range that does not exist
    #[error("data range {0} does not exist")]
    DataRangeIndex(u32),
}

/// Error type to provide further information when a resource has not been found
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ResourceNotFoundError {
    /// of type {0}
    #[error("of type {0}")]
    Type(TypeCode),

    /// of type {code} with id {id}
    #[error("of type {code} with id {id}")]
    Id {
        /// Type code that was searched
        code: TypeCode,
        /// Resource id that was searched
        id: i16,
    },
}

/// A type code could not be built from the given text
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("type code must be exactly four bytes, got {0}")]
pub struct InvalidTypeCode(pub usize);

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
