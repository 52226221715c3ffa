use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The code page label is unknown or not a single-byte encoding.
    #[error("Code page non supportée : {label} (une page mono-octet est requise)")]
    UnsupportedCodePage {
        /// Label as written in the configuration or on the command line.
        label: String,
    },
}
