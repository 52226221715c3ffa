//! Minimal in-memory PE images carrying a resource section, for tests.
//!
//! The produced image has one `.rsrc` section and nothing else: no code, no
//! imports, no relocations. It is enough for a data-file load and a
//! resource walk.

use std::collections::BTreeMap;

use object::pe;

/// RVA of the `.rsrc` section.
const SECTION_RVA: u32 = 0x1000;
const SECTION_ALIGNMENT: usize = 0x1000;
const FILE_ALIGNMENT: usize = 0x200;
const DIRECTORY_COUNT: usize = 16;
/// Index of the resource table among the data directories.
const RESOURCE_DIRECTORY: usize = 2;

/// High bit of a directory entry: the offset points to a subdirectory.
const SUBDIRECTORY: u32 = 0x8000_0000;
/// High bit of a directory entry name: the name is a string offset.
const NAME_IS_STRING: u32 = 0x8000_0000;

/// PE32 or PE32+.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bitness {
    /// 32-bit image (`IMAGE_NT_OPTIONAL_HDR32_MAGIC`).
    Pe32,
    /// 64-bit image (`IMAGE_NT_OPTIONAL_HDR64_MAGIC`).
    Pe64,
}

/// Second-level name of a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeafName {
    /// Numeric id.
    Id(u16),
    /// String name.
    Name(String),
}

/// One resource: type, name, language and raw data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceLeaf {
    /// Resource type id (`pe::RT_STRING`, ...).
    pub type_id: u16,
    /// Name or id.
    pub name: LeafName,
    /// Language id.
    pub language: u16,
    /// Raw bytes.
    pub data: Vec<u8>,
}

/// Encode `entries` as one string-table block, padded with empty entries to
/// sixteen.
///
/// # Panics
/// Panics if more than sixteen entries are given or an entry is longer than
/// 65535 units.
#[must_use]
pub fn string_block(entries: &[&[u16]]) -> Vec<u16> {
    assert!(entries.len() <= 16, "un bloc RT_STRING contient 16 entrées");
    let mut block = Vec::new();
    for entry in entries {
        let len = u16::try_from(entry.len()).unwrap_or_else(|_| panic!("entrée trop longue"));
        block.push(len);
        block.extend_from_slice(entry);
    }
    block.resize(block.len() + 16 - entries.len(), 0);
    block
}

/// `RT_STRING` leaf for block `block_id`, language en-US.
#[must_use]
pub fn string_table(block_id: u16, entries: &[&[u16]]) -> ResourceLeaf {
    ResourceLeaf {
        type_id: pe::RT_STRING,
        name: LeafName::Id(block_id),
        language: 0x0409,
        data: string_block(entries)
            .iter()
            .flat_map(|unit| unit.to_le_bytes())
            .collect(),
    }
}

/// Build a complete PE image whose `.rsrc` section holds `leaves`.
///
/// With no leaves the resource data directory is left empty, as in an image
/// linked without resources.
#[must_use]
pub fn build_image(bitness: Bitness, leaves: &[ResourceLeaf]) -> Vec<u8> {
    let rsrc = resource_section(leaves);
    let raw_size = align(rsrc.len(), FILE_ALIGNMENT);
    let optional_size = match bitness {
        Bitness::Pe32 => 96,
        Bitness::Pe64 => 112,
    } + DIRECTORY_COUNT * 8;

    let mut image = Vec::with_capacity(FILE_ALIGNMENT + raw_size);

    // DOS header, e_lfanew juste après.
    image.extend_from_slice(b"MZ");
    image.resize(0x3C, 0);
    put_u32(&mut image, 0x40);

    // Signature + IMAGE_FILE_HEADER
    image.extend_from_slice(b"PE\0\0");
    let (machine, characteristics) = match bitness {
        Bitness::Pe32 => (pe::IMAGE_FILE_MACHINE_I386, 0x2102),
        Bitness::Pe64 => (pe::IMAGE_FILE_MACHINE_AMD64, 0x2022),
    };
    put_u16(&mut image, machine);
    put_u16(&mut image, 1);
    put_u32(&mut image, 0);
    put_u32(&mut image, 0);
    put_u32(&mut image, 0);
    put_u16(&mut image, optional_size as u16);
    put_u16(&mut image, characteristics);

    // Optional header
    let optional_start = image.len();
    match bitness {
        Bitness::Pe32 => put_u16(&mut image, pe::IMAGE_NT_OPTIONAL_HDR32_MAGIC),
        Bitness::Pe64 => put_u16(&mut image, pe::IMAGE_NT_OPTIONAL_HDR64_MAGIC),
    }
    put_u16(&mut image, 0); // linker version
    put_u32(&mut image, 0); // size of code
    put_u32(&mut image, raw_size as u32); // size of initialized data
    put_u32(&mut image, 0); // size of uninitialized data
    put_u32(&mut image, 0); // entry point
    put_u32(&mut image, 0); // base of code
    match bitness {
        Bitness::Pe32 => {
            put_u32(&mut image, SECTION_RVA); // base of data
            put_u32(&mut image, 0x1000_0000);
        }
        Bitness::Pe64 => put_u64(&mut image, 0x1_8000_0000),
    }
    put_u32(&mut image, SECTION_ALIGNMENT as u32);
    put_u32(&mut image, FILE_ALIGNMENT as u32);
    for version in [6, 0, 0, 0, 6, 0] {
        put_u16(&mut image, version);
    }
    put_u32(&mut image, 0); // win32 version
    put_u32(
        &mut image,
        SECTION_RVA + align(rsrc.len().max(1), SECTION_ALIGNMENT) as u32,
    );
    put_u32(&mut image, FILE_ALIGNMENT as u32); // size of headers
    put_u32(&mut image, 0); // checksum
    put_u16(&mut image, pe::IMAGE_SUBSYSTEM_WINDOWS_GUI);
    put_u16(&mut image, 0);
    for reserve in [0x10_0000, 0x1000, 0x10_0000, 0x1000] {
        match bitness {
            Bitness::Pe32 => put_u32(&mut image, reserve),
            Bitness::Pe64 => put_u64(&mut image, u64::from(reserve)),
        }
    }
    put_u32(&mut image, 0); // loader flags
    put_u32(&mut image, DIRECTORY_COUNT as u32);
    for index in 0..DIRECTORY_COUNT {
        if index == RESOURCE_DIRECTORY && !leaves.is_empty() {
            put_u32(&mut image, SECTION_RVA);
            put_u32(&mut image, rsrc.len() as u32);
        } else {
            put_u32(&mut image, 0);
            put_u32(&mut image, 0);
        }
    }
    debug_assert_eq!(image.len() - optional_start, optional_size);

    // Section header
    image.extend_from_slice(b".rsrc\0\0\0");
    put_u32(&mut image, rsrc.len() as u32);
    put_u32(&mut image, SECTION_RVA);
    put_u32(&mut image, raw_size as u32);
    put_u32(&mut image, FILE_ALIGNMENT as u32);
    put_u32(&mut image, 0);
    put_u32(&mut image, 0);
    put_u16(&mut image, 0);
    put_u16(&mut image, 0);
    put_u32(
        &mut image,
        pe::IMAGE_SCN_CNT_INITIALIZED_DATA | pe::IMAGE_SCN_MEM_READ,
    );

    image.resize(FILE_ALIGNMENT, 0);
    image.extend_from_slice(&rsrc);
    image.resize(FILE_ALIGNMENT + raw_size, 0);
    image
}

/// Lay out the three-level resource tree (type, name, language), then the
/// name strings, the data entries and finally the raw data.
fn resource_section(leaves: &[ResourceLeaf]) -> Vec<u8> {
    let mut by_type: BTreeMap<u16, Vec<&ResourceLeaf>> = BTreeMap::new();
    for leaf in leaves {
        by_type.entry(leaf.type_id).or_default().push(leaf);
    }

    let mut out = Vec::new();
    let mut pending_names: Vec<(usize, &str)> = Vec::new();
    let mut pending_data: Vec<(usize, &ResourceLeaf)> = Vec::new();

    let root_entries = push_directory(&mut out, 0, by_type.len());
    for (t, (type_id, group)) in by_type.iter_mut().enumerate() {
        let directory = out.len() as u32;
        put_entry(&mut out, root_entries + 8 * t, u32::from(*type_id), SUBDIRECTORY | directory);

        // Les entrées nommées précèdent les entrées numériques.
        group.sort_by_key(|leaf| matches!(leaf.name, LeafName::Id(_)));
        let named = group
            .iter()
            .filter(|leaf| matches!(leaf.name, LeafName::Name(_)))
            .count();
        let name_entries = push_directory(&mut out, named, group.len() - named);
        for (n, &leaf) in group.iter().enumerate() {
            let at = name_entries + 8 * n;
            let directory = out.len() as u32;
            match &leaf.name {
                LeafName::Id(id) => put_entry(&mut out, at, u32::from(*id), SUBDIRECTORY | directory),
                LeafName::Name(name) => {
                    put_entry(&mut out, at, 0, SUBDIRECTORY | directory);
                    pending_names.push((at, name.as_str()));
                }
            }
            let language_entry = push_directory(&mut out, 0, 1);
            put_entry(&mut out, language_entry, u32::from(leaf.language), 0);
            pending_data.push((language_entry, leaf));
        }
    }

    for (at, name) in pending_names {
        let offset = out.len() as u32;
        put_u32_at(&mut out, at, NAME_IS_STRING | offset);
        let units: Vec<u16> = name.encode_utf16().collect();
        put_u16(&mut out, units.len() as u16);
        for unit in units {
            put_u16(&mut out, unit);
        }
        out.resize(align(out.len(), 4), 0);
    }

    let mut data_entries = Vec::with_capacity(pending_data.len());
    for (language_entry, leaf) in pending_data {
        let entry = out.len();
        put_u32_at(&mut out, language_entry + 4, entry as u32);
        out.resize(entry + 16, 0);
        data_entries.push((entry, leaf));
    }

    for (entry, leaf) in data_entries {
        let offset = out.len() as u32;
        out.extend_from_slice(&leaf.data);
        out.resize(align(out.len(), 4), 0);
        put_u32_at(&mut out, entry, SECTION_RVA + offset);
        put_u32_at(&mut out, entry + 4, leaf.data.len() as u32);
    }

    out
}

/// Append an `IMAGE_RESOURCE_DIRECTORY` and room for its entries; returns the
/// offset of the first entry.
fn push_directory(out: &mut Vec<u8>, named: usize, ids: usize) -> usize {
    out.extend_from_slice(&[0; 12]);
    put_u16(out, named as u16);
    put_u16(out, ids as u16);
    let entries = out.len();
    out.resize(entries + 8 * (named + ids), 0);
    entries
}

fn put_entry(out: &mut [u8], at: usize, name: u32, offset: u32) {
    put_u32_at(out, at, name);
    put_u32_at(out, at + 4, offset);
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32_at(out: &mut [u8], at: usize, value: u32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn align(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}
