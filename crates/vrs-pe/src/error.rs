use std::path::PathBuf;

use thiserror::Error;

use crate::resource::ResourceName;

/// Errors originating from PE resource extraction.
#[derive(Error, Debug)]
pub enum PeError {
    /// The file could not be read.
    #[error("Impossible de lire {path} : {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The data is not a PE32 or PE32+ image.
    #[error("Pas une image PE ({kind})")]
    NotPe {
        /// Detected file kind, or the reason detection failed.
        kind: String,
    },

    /// Headers or resource directory are malformed.
    #[error("Image PE invalide : {0}")]
    Malformed(#[from] object::read::Error),

    /// A resource data entry points outside the image.
    #[error("Ressource {name} hors de l'image (RVA {rva:#x}, {size} octets)")]
    DataOutOfBounds {
        /// Name or id of the string table block.
        name: ResourceName,
        /// Relative virtual address of the data.
        rva: u32,
        /// Declared size in bytes.
        size: u32,
    },
}

/// A convenience `Result` alias using [`PeError`].
pub type Result<T> = std::result::Result<T, PeError>;
