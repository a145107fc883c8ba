//! Decoder for Rez resource files
//!
//! Rez files start out little-endian: a magic number, a table of data ranges and a
//! `resource.map` tag. The last data range holds the resource map itself, which is big-endian.

use std::io::{Read, Seek};

use binrw::Endian;
use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::{
    cursor::ByteCursor,
    directory::{Contents, Layout},
    error::{FormatError, Result},
    types::{
        DataRange, Record, ResourceHeader, ResourceType, RezResourceRecord, RezTypeRecord,
        TypeCode,
    },
};

/// "BRGR" on disk, read as a little-endian double word
pub const REZ_MAGIC: u32 = 0x5247_5242;

/// Tag separating the data range table from the resource data
pub const RESOURCE_MAP_TAG: &[u8; 12] = b"resource.map";

/// Reserved fields between the magic number and the resource count
const HEADER_RESERVED: u64 = 4 * 4;

/// Reserved field at the start of the resource map
const MAP_RESERVED: u64 = 4;

fn capacity<T: Record, R: Read + Seek>(cursor: &ByteCursor<R>, count: u32) -> usize {
    (count as u64).min(cursor.remaining() / T::SIZE) as usize
}

#[instrument(skip(cursor), err)]
pub(crate) fn decode<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Contents> {
    cursor.set_endian(Endian::Little);
    cursor.seek(0)?;

    let magic = cursor.read_u32()?;
    if magic != REZ_MAGIC {
        warn!(magic, "failed to find the expected magic number");
        return Err(FormatError::BadMagic(magic).into());
    }

    cursor.advance(HEADER_RESERVED)?;
    let count = cursor.read_u32()?;

    let mut data_ranges = Vec::with_capacity(capacity::<DataRange, R>(cursor, count));
    for _ in 0..count {
        data_ranges.push(cursor.read_record::<DataRange>()?);
    }

    let tag = cursor.read_bytes(RESOURCE_MAP_TAG.len())?;
    if tag != RESOURCE_MAP_TAG {
        warn!("expected to find the resource.map section");
        return Err(FormatError::MissingResourceMap.into());
    }

    let resource_offset = cursor.position();
    let map = *data_ranges.last().ok_or(FormatError::EmptyDataRanges)?;
    debug!(count, ?map, "read rez data ranges");

    // Everything from the resource map onwards is big-endian
    cursor.set_endian(Endian::Big);
    cursor.seek(map.offset as u64)?;
    cursor.advance(MAP_RESERVED)?;

    let type_count = cursor.read_u32()?;
    let mut type_records = Vec::with_capacity(capacity::<RezTypeRecord, R>(cursor, type_count));
    for _ in 0..type_count {
        type_records.push(cursor.read_record::<RezTypeRecord>()?);
    }

    let mut types: IndexMap<TypeCode, Vec<ResourceHeader>> = type_records
        .iter()
        .map(|t| (t.code, Vec::with_capacity(t.resource_count.min(count) as usize)))
        .collect();

    // The last data range is the map, so there is one resource fewer than there are ranges
    let mut order = Vec::with_capacity(data_ranges.len() - 1);
    for _ in 1..count {
        let record: RezResourceRecord = cursor.read_record()?;
        let range = record
            .data_range
            .checked_sub(1)
            .and_then(|i| data_ranges.get(i as usize))
            .ok_or(FormatError::DataRangeIndex(record.data_range))?;

        let entry = types.entry(record.code);
        let type_index = entry.index();
        let resources = entry.or_default();
        order.push((type_index, resources.len()));
        resources.push(ResourceHeader::new(
            record.code,
            record.id,
            name(&record.name),
            0,
            range.offset as u64,
            range.size as u64,
        ));
    }
    debug!(types = types.len(), resources = order.len(), "read rez resource map");

    Ok(Contents {
        types: types
            .into_iter()
            .map(|(code, resources)| ResourceType { code, resources })
            .collect(),
        layout: Layout::Rez {
            data_ranges,
            resource_offset,
            map_offset: map.offset as u64,
            order,
        },
    })
}

fn name(raw: &[u8; 256]) -> Option<Box<[u8]>> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    (end > 0).then(|| raw[..end].into())
}
