use std::fmt;
use std::path::Path;

use object::read::pe::{ImageNtHeaders, PeFile, ResourceDirectory, ResourceNameOrId};
use object::{FileKind, LittleEndian as LE, pe};

use crate::error::{PeError, Result};

/// Nom d'un bloc de ressource : identifiant numérique ou chaîne UTF-16.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceName {
    /// Numeric id. For `RT_STRING` this is the block number.
    Id(u16),
    /// Named resource.
    Name(String),
}

impl ResourceName {
    fn resolve(raw: ResourceNameOrId, directory: ResourceDirectory<'_>) -> Result<Self> {
        Ok(match raw {
            ResourceNameOrId::Id(id) => Self::Id(id),
            ResourceNameOrId::Name(name) => Self::Name(name.to_string_lossy(directory)?),
        })
    }

    /// Id of the first string held by a numbered `RT_STRING` block.
    ///
    /// Block `n` holds string ids `(n - 1) * 16 ..= (n - 1) * 16 + 15`.
    ///
    /// # Example
    /// ```
    /// use vrs_pe::ResourceName;
    /// assert_eq!(ResourceName::Id(1).first_string_id(), Some(0));
    /// assert_eq!(ResourceName::Id(7).first_string_id(), Some(96));
    /// assert_eq!(ResourceName::Id(0).first_string_id(), None);
    /// ```
    #[must_use]
    pub fn first_string_id(&self) -> Option<u32> {
        match self {
            Self::Id(id) if *id > 0 => Some((u32::from(*id) - 1) * 16),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Un bloc `RT_STRING` extrait d'une image, prêt à être validé.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringTableResource {
    /// Block name or number.
    pub name: ResourceName,
    /// Language id (`0x0409` = en-US, 0 = neutral).
    pub language: u16,
    /// Raw contents as little-endian UTF-16 code units.
    pub units: Vec<u16>,
}

/// Read `path` and extract every `RT_STRING` block.
///
/// # Errors
/// Returns [`PeError::Io`] if the file cannot be read, otherwise the errors of
/// [`read_string_tables`].
pub fn load_string_tables(path: &Path) -> Result<Vec<StringTableResource>> {
    let data = std::fs::read(path).map_err(|source| PeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tables = read_string_tables(&data)?;
    log::debug!(
        "{} : {} bloc(s) RT_STRING",
        path.display(),
        tables.len()
    );
    Ok(tables)
}

/// Extract every `RT_STRING` block from a PE32 or PE32+ image held in memory.
///
/// Walks the resource tree type -> name -> language, the same order the
/// Windows loader enumerates it. An image without resources, or without
/// string tables, yields an empty list.
///
/// # Errors
/// Returns [`PeError::NotPe`] for anything but a PE image,
/// [`PeError::Malformed`] for broken headers or resource directories, and
/// [`PeError::DataOutOfBounds`] when a block's data lies outside the image.
pub fn read_string_tables(data: &[u8]) -> Result<Vec<StringTableResource>> {
    match FileKind::parse(data) {
        Ok(FileKind::Pe32) => walk_string_tables::<pe::ImageNtHeaders32>(data),
        Ok(FileKind::Pe64) => walk_string_tables::<pe::ImageNtHeaders64>(data),
        Ok(kind) => Err(PeError::NotPe {
            kind: format!("{kind:?}"),
        }),
        Err(e) => Err(PeError::NotPe {
            kind: e.to_string(),
        }),
    }
}

fn walk_string_tables<Pe: ImageNtHeaders>(data: &[u8]) -> Result<Vec<StringTableResource>> {
    let file = PeFile::<Pe>::parse(data)?;
    let sections = file.section_table();
    let Some(directory) = file
        .data_directories()
        .resource_directory(data, &sections)?
    else {
        return Ok(Vec::new());
    };

    let mut tables = Vec::new();
    for type_entry in directory.root()?.entries {
        if type_entry.name_or_id().id() != Some(pe::RT_STRING) {
            continue;
        }
        let Some(names) = type_entry.data(directory)?.table() else {
            continue;
        };
        for name_entry in names.entries {
            let name = ResourceName::resolve(name_entry.name_or_id(), directory)?;
            let Some(languages) = name_entry.data(directory)?.table() else {
                log::warn!("Bloc RT_STRING {name} sans niveau de langue, ignoré");
                continue;
            };
            for language_entry in languages.entries {
                let Some(entry) = language_entry.data(directory)?.data() else {
                    continue;
                };
                let rva = entry.offset_to_data.get(LE);
                let size = entry.size.get(LE);
                let bytes = sections
                    .pe_data_at(data, rva)
                    .and_then(|bytes| bytes.get(..size as usize))
                    .ok_or_else(|| PeError::DataOutOfBounds {
                        name: name.clone(),
                        rva,
                        size,
                    })?;
                let language = language_entry.name_or_id().id().unwrap_or(0);
                log::trace!("Bloc RT_STRING {name} (langue {language:#06x}, {size} octets)");
                tables.push(StringTableResource {
                    name: name.clone(),
                    language,
                    units: decode_units(bytes),
                });
            }
        }
    }
    Ok(tables)
}

/// Little-endian UTF-16 code units; a trailing odd byte is dropped.
fn decode_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
