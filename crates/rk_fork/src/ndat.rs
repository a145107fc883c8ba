//! Decoder for Ndat resource files
//!
//! Ndat files are flattened classic resource forks. Everything is big-endian. A sixteen byte
//! header points at the resource data and the resource map, and the map starts with a copy of
//! that header which must match the original.

use std::io::{Read, Seek};

use binrw::Endian;
use tracing::{debug, instrument, warn};

use crate::{
    cursor::ByteCursor,
    directory::{Contents, Layout},
    error::{Error, FormatError, Result},
    types::{NdatHeader, NdatResourceRecord, NdatTypeRecord, ResourceHeader, ResourceType},
};

/// Map attribute marking the file as read only
pub const ATTRIBUTE_READ_ONLY: u16 = 0x0080;

/// Map attribute marking the file as compressed
pub const ATTRIBUTE_COMPRESSED: u16 = 0x0040;

/// Reserved handle and file reference fields at the start of the map, after the header copy
const MAP_RESERVED: u64 = 4 + 2;

/// Each resource's data is preceded by its length
const DATA_LENGTH_PREFIX: u64 = 4;

impl NdatHeader {
    fn verify(&self, copy: &NdatHeader) -> core::result::Result<(), FormatError> {
        let fields = [
            ("resource data offset", self.data_offset, copy.data_offset),
            ("resource map offset", self.map_offset, copy.map_offset),
            ("resource data size", self.data_size, copy.data_size),
            ("resource map size", self.map_size, copy.map_size),
        ];

        match fields.into_iter().find(|(_, a, b)| a != b) {
            Some((field, _, _)) => Err(FormatError::HeaderMismatch { field }),
            None => Ok(()),
        }
    }
}

struct NdatMap {
    header: NdatHeader,
    type_list: u64,
    name_list: u64,
}

#[instrument(skip(cursor), err)]
pub(crate) fn decode<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Contents> {
    cursor.set_endian(Endian::Big);
    cursor.seek(0)?;

    let header: NdatHeader = cursor.read_record()?;
    debug!(?header, "read ndat header");

    let map_offset = header.map_offset as u64;
    cursor.seek(map_offset)?;
    let copy: NdatHeader = cursor.read_record()?;
    header.verify(&copy).inspect_err(|e| warn!("{e}"))?;

    cursor.advance(MAP_RESERVED)?;

    let attributes = cursor.read_u16()?;
    if attributes & ATTRIBUTE_COMPRESSED != 0 {
        warn!(attributes, "ndat file is compressed");
        return Err(Error::Unsupported("compressed ndat resource map"));
    }

    let type_list_offset = cursor.read_u16()? as u64;
    let name_list_offset = cursor.read_u16()? as u64;

    let map = NdatMap {
        header,
        type_list: map_offset + type_list_offset,
        name_list: map_offset + name_list_offset,
    };

    cursor.seek(map.type_list)?;
    let type_count = cursor.read_u16()?.wrapping_add(1);

    let mut types = Vec::new();
    for _ in 0..type_count {
        types.push(read_type(cursor, &map)?);
    }
    debug!(types = types.len(), "read ndat resource map");

    Ok(Contents {
        types,
        layout: Layout::Ndat { header, attributes },
    })
}

fn read_type<R: Read + Seek>(cursor: &mut ByteCursor<R>, map: &NdatMap) -> Result<ResourceType> {
    let record: NdatTypeRecord = cursor.read_record()?;
    let count = record.count.wrapping_add(1);

    let list = map.type_list + record.resource_list_offset as u64;
    let resources = cursor.peek_at(list, |c| {
        let mut resources = Vec::new();
        for _ in 0..count {
            resources.push(read_resource(c, map, &record)?);
        }
        Ok(resources)
    })?;

    Ok(ResourceType {
        code: record.code,
        resources,
    })
}

fn read_resource<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    map: &NdatMap,
    kind: &NdatTypeRecord,
) -> Result<ResourceHeader> {
    let record: NdatResourceRecord = cursor.read_record()?;

    let name = if record.name_offset >= 0 {
        let at = map.name_list + record.name_offset as u64;
        let name = cursor.peek_at(at, |c| {
            let length = c.read_u8()?;
            c.read_bytes(length as usize)
        })?;
        Some(name.into_boxed_slice())
    } else {
        None
    };

    let start = map.header.data_offset as u64 + record.data_offset as u64;
    let size = cursor.peek_at(start, |c| c.read_u32())?;

    Ok(ResourceHeader::new(
        kind.code,
        record.id,
        name,
        record.attributes,
        start + DATA_LENGTH_PREFIX,
        size as u64,
    ))
}

#[cfg(test)]
pub(crate) mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::{
        cursor::ByteCursor,
        directory::Layout,
        error::{Error, FormatError, Result},
        ndat::decode,
        types::{NdatHeader, TypeCode},
    };

    /// One `TEST` resource, id 128, named "Hi", holding `AA BB CC`
    #[rustfmt::skip]
    pub(crate) const SINGLE_RESOURCE: [u8; 76] = [
        // Header (16)
        0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x17,
        0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x35,
        // Data (7)
        0x00, 0x00, 0x00, 0x03, 0xAA, 0xBB, 0xCC,
        // Map header copy (16)
        0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x17,
        0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x35,
        // Reserved, attributes, type list offset, name list offset (12)
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
        0x00, 0x1C,
        0x00, 0x32,
        // Type list (10)
        0x00, 0x00,
        b'T', b'E', b'S', b'T', 0x00, 0x00, 0x00, 0x0A,
        // Resource list (12)
        0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
        // Name list (3)
        0x02, b'H', b'i',
    ];

    fn decode_bytes(bytes: &[u8]) -> Result<crate::directory::Contents> {
        let mut cursor = ByteCursor::new(Cursor::new(bytes.to_vec()))?;
        decode(&mut cursor)
    }

    #[traced_test]
    #[test]
    fn read_single_resource() -> Result<()> {
        let contents = decode_bytes(&SINGLE_RESOURCE)?;

        assert_eq!(contents.types.len(), 1);
        let kind = &contents.types[0];
        assert_eq!(kind.code(), TypeCode::new(*b"TEST"));
        assert_eq!(kind.len(), 1);

        let resource = kind.by_id(128).expect("resource 128");
        assert_eq!(resource.name().as_deref(), Some("Hi"));
        assert_eq!(resource.offset(), 20);
        assert_eq!(resource.size(), 3);

        match contents.layout {
            Layout::Ndat { header, attributes } => {
                assert_eq!(attributes, 0);
                assert_eq!(
                    header,
                    NdatHeader {
                        data_offset: 0x10,
                        map_offset: 0x17,
                        data_size: 0x07,
                        map_size: 0x35,
                    }
                );
            }
            Layout::Rez { .. } => panic!("expected an ndat layout"),
        }

        Ok(())
    }

    #[test]
    fn unnamed_resource() -> Result<()> {
        let mut input = SINGLE_RESOURCE;
        input[63] = 0xFF;
        input[64] = 0xFF;

        let contents = decode_bytes(&input)?;
        assert_eq!(contents.types[0].resources()[0].name_raw(), None);

        Ok(())
    }

    #[test]
    fn header_mismatch_is_detected_for_every_field() {
        let fields = [
            "resource data offset",
            "resource map offset",
            "resource data size",
            "resource map size",
        ];

        for (i, field) in fields.into_iter().enumerate() {
            let mut input = SINGLE_RESOURCE;
            input[23 + i * 4 + 3] ^= 0x01;

            match decode_bytes(&input) {
                Err(Error::InvalidFormat(e)) => {
                    assert_eq!(e, FormatError::HeaderMismatch { field })
                }
                other => panic!("expected a header mismatch, got {other:?}"),
            }
        }
    }

    #[test]
    fn compressed_map_is_rejected() {
        let mut input = SINGLE_RESOURCE;
        input[46] = 0x40;

        assert!(matches!(
            decode_bytes(&input),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn read_only_map_is_accepted() -> Result<()> {
        let mut input = SINGLE_RESOURCE;
        input[46] = 0x80;

        let contents = decode_bytes(&input)?;
        assert!(matches!(contents.layout, Layout::Ndat { attributes: 0x80, .. }));

        Ok(())
    }

    #[test]
    fn truncated_file_is_out_of_bounds() {
        assert!(matches!(
            decode_bytes(&SINGLE_RESOURCE[..74]),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn empty_type_list() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x10,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1E,
            0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x10,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1E,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
            0x00, 0x1C,
            0x00, 0x1E,
            0xFF, 0xFF,
        ];

        let contents = decode_bytes(&input)?;
        assert!(contents.types.is_empty());

        Ok(())
    }
}
