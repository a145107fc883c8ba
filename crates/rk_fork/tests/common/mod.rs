#![allow(dead_code)]

use std::{io::Write, path::PathBuf};

use tempfile::TempDir;

pub struct Entry {
    pub id: i16,
    pub name: Option<&'static str>,
    pub data: Vec<u8>,
}

pub fn entry(id: i16, name: Option<&'static str>, data: &[u8]) -> Entry {
    Entry {
        id,
        name,
        data: data.to_vec(),
    }
}

pub type Types = Vec<([u8; 4], Vec<Entry>)>;

/// Build an Ndat image holding `types`
pub fn ndat(types: &Types, attributes: u16) -> Vec<u8> {
    const DATA_OFFSET: u32 = 16;

    let mut data: Vec<u8> = Vec::new();
    let mut data_offsets = Vec::new();
    for (_, entries) in types {
        for e in entries {
            data_offsets.push(data.len() as u32);
            data.extend((e.data.len() as u32).to_be_bytes());
            data.extend(&e.data);
        }
    }

    let resource_count: usize = types.iter().map(|(_, e)| e.len()).sum();
    let type_list_offset: u16 = 28;
    let type_list_len = 2 + 8 * types.len() + 12 * resource_count;
    let name_list_offset = type_list_offset + type_list_len as u16;

    let mut names: Vec<u8> = Vec::new();
    let mut type_list: Vec<u8> = Vec::new();
    let mut resource_list: Vec<u8> = Vec::new();
    type_list.extend((types.len() as u16).wrapping_sub(1).to_be_bytes());

    let mut resource_index = 0;
    for (code, entries) in types {
        let list_offset = 2 + 8 * types.len() + 12 * resource_index;
        type_list.extend(code);
        type_list.extend((entries.len() as u16).wrapping_sub(1).to_be_bytes());
        type_list.extend((list_offset as u16).to_be_bytes());

        for e in entries {
            let name_offset: i16 = match e.name {
                Some(name) => {
                    let offset = names.len() as i16;
                    names.push(name.len() as u8);
                    names.extend(name.as_bytes());
                    offset
                }
                None => -1,
            };

            let offset = data_offsets[resource_index];
            resource_list.extend(e.id.to_be_bytes());
            resource_list.extend(name_offset.to_be_bytes());
            resource_list.push(0);
            resource_list.extend(&offset.to_be_bytes()[1..]);
            resource_list.extend([0; 4]);
            resource_index += 1;
        }
    }

    let map_size = name_list_offset as u32 + names.len() as u32;
    let map_offset = DATA_OFFSET + data.len() as u32;

    let mut header: Vec<u8> = Vec::new();
    header.extend(DATA_OFFSET.to_be_bytes());
    header.extend(map_offset.to_be_bytes());
    header.extend((data.len() as u32).to_be_bytes());
    header.extend(map_size.to_be_bytes());

    let mut out = header.clone();
    out.extend(&data);
    out.extend(&header);
    out.extend([0; 6]);
    out.extend(attributes.to_be_bytes());
    out.extend(type_list_offset.to_be_bytes());
    out.extend(name_list_offset.to_be_bytes());
    out.extend(type_list);
    out.extend(resource_list);
    out.extend(names);
    out
}

/// Build a Rez image holding `types`
pub fn rez(types: &Types) -> Vec<u8> {
    let resources: Vec<(&[u8; 4], &Entry)> = types
        .iter()
        .flat_map(|(code, entries)| entries.iter().map(move |e| (code, e)))
        .collect();

    let range_count = resources.len() + 1;
    let data_start = 24 + 12 * range_count + 12;

    let mut ranges = Vec::new();
    let mut data: Vec<u8> = Vec::new();
    for (_, e) in &resources {
        ranges.push(((data_start + data.len()) as u32, e.data.len() as u32));
        data.extend(&e.data);
    }

    let mut map: Vec<u8> = Vec::new();
    map.extend([0; 4]);
    map.extend((types.len() as u32).to_be_bytes());
    let mut first = 0u32;
    for (code, entries) in types {
        map.extend(code);
        map.extend(first.to_be_bytes());
        map.extend((entries.len() as u32).to_be_bytes());
        first += entries.len() as u32;
    }
    for (i, (code, e)) in resources.iter().enumerate() {
        map.extend((i as u32 + 1).to_be_bytes());
        map.extend(*code);
        map.extend(e.id.to_be_bytes());
        let mut name = [0u8; 256];
        if let Some(n) = e.name {
            name[..n.len()].copy_from_slice(n.as_bytes());
        }
        map.extend(name);
    }
    ranges.push(((data_start + data.len()) as u32, map.len() as u32));

    let mut out: Vec<u8> = Vec::new();
    out.extend(b"BRGR");
    out.extend([0; 16]);
    out.extend((range_count as u32).to_le_bytes());
    for (offset, size) in ranges {
        out.extend(offset.to_le_bytes());
        out.extend(size.to_le_bytes());
        out.extend([0; 4]);
    }
    out.extend(b"resource.map");
    out.extend(data);
    out.extend(map);
    out
}

/// Write `bytes` to `name` inside `dir`
pub fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create fixture");
    file.write_all(bytes).expect("write fixture");
    path
}
