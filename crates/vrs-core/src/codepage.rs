use std::collections::HashMap;

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::error::CoreError;

/// Première valeur de la plage de contrôle haute (C1).
pub const UPPER_CONTROL_FIRST: u8 = 0x80;

/// Dernière valeur de la plage de contrôle haute (C1).
pub const UPPER_CONTROL_LAST: u8 = 0x9F;

/// Resolve a code page label (`"windows-1252"`, `"cp1250"`, ...) to a
/// single-byte `encoding_rs` encoding.
///
/// # Errors
/// Returns [`CoreError::UnsupportedCodePage`] if the label is unknown or names
/// a multi-byte encoding.
///
/// # Example
/// ```
/// use vrs_core::codepage::resolve_code_page;
/// assert_eq!(resolve_code_page("cp1252").unwrap().name(), "windows-1252");
/// assert!(resolve_code_page("shift_jis").is_err());
/// ```
pub fn resolve_code_page(label: &str) -> Result<&'static Encoding, CoreError> {
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(encoding) if encoding.is_single_byte() => Ok(encoding),
        _ => Err(CoreError::UnsupportedCodePage {
            label: label.to_string(),
        }),
    }
}

/// Table inverse code point -> octet pour la plage 0x80..=0x9F d'une code page.
///
/// Construite une seule fois, en lecture seule ensuite. Les lectures
/// concurrentes ne demandent aucune synchronisation.
///
/// # Example
/// ```
/// use vrs_core::codepage::ReverseCodePage;
/// let table = ReverseCodePage::windows_1252();
/// assert_eq!(table.to_legacy_byte(u16::from(b'A')), b'A');
/// assert_eq!(table.to_legacy_byte(0x20AC), 0x80); // '€'
/// assert_eq!(table.to_legacy_byte(0x4E2D), 0);
/// ```
#[derive(Clone, Debug)]
pub struct ReverseCodePage {
    encoding: &'static Encoding,
    upper: HashMap<u16, u8>,
}

impl ReverseCodePage {
    /// Build the table by decoding bytes 0x80..=0x9F through `encoding`.
    ///
    /// Bytes without an assigned character are skipped. For the WHATWG
    /// single-byte tables used by `encoding_rs` this covers both a decode
    /// failure and the C1 pass-through (byte 0x81 decoding to U+0081).
    /// Enumeration is ascending, so a later byte wins on a duplicate.
    #[must_use]
    pub fn new(encoding: &'static Encoding) -> Self {
        let mut upper = HashMap::with_capacity(32);
        for byte in UPPER_CONTROL_FIRST..=UPPER_CONTROL_LAST {
            let Some(decoded) = encoding
                .decode_without_bom_handling_and_without_replacement(std::slice::from_ref(&byte))
            else {
                continue;
            };
            let mut chars = decoded.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                continue;
            };
            let Ok(unit) = u16::try_from(u32::from(ch)) else {
                continue;
            };
            if unit == u16::from(byte) {
                continue;
            }
            upper.insert(unit, byte);
        }
        log::debug!(
            "Table inverse {} : {} entrées sur 0x80..=0x9F",
            encoding.name(),
            upper.len()
        );
        Self { encoding, upper }
    }

    /// Table for Windows-1252, the default legacy code page.
    #[must_use]
    pub fn windows_1252() -> Self {
        Self::new(WINDOWS_1252)
    }

    /// The code page this table was built from.
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Number of code points mapped back into 0x80..=0x9F.
    #[must_use]
    pub fn len(&self) -> usize {
        self.upper.len()
    }

    /// `true` if the code page assigns nothing to 0x80..=0x9F.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }

    /// Octet qu'aurait occupé `unit` dans la code page, ou 0 si aucun.
    ///
    /// 0 ne satisfait jamais les motifs de tête UTF-8 : une unité sans
    /// représentation mono-octet ne peut pas participer à un mojibake.
    #[inline]
    #[must_use]
    pub fn to_legacy_byte(&self, unit: u16) -> u8 {
        if unit < 0x100 {
            return unit as u8;
        }
        self.upper.get(&unit).copied().unwrap_or(0)
    }
}

impl Default for ReverseCodePage {
    fn default() -> Self {
        Self::windows_1252()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_range_projects_to_itself() {
        let table = ReverseCodePage::windows_1252();
        for unit in 0..=0xFFu16 {
            assert_eq!(u16::from(table.to_legacy_byte(unit)), unit);
        }
    }

    #[test]
    fn upper_control_range_round_trips() {
        let table = ReverseCodePage::windows_1252();
        for byte in UPPER_CONTROL_FIRST..=UPPER_CONTROL_LAST {
            let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(std::slice::from_ref(&byte));
            let unit = decoded.encode_utf16().next().unwrap();
            assert_eq!(table.to_legacy_byte(unit), byte, "octet {byte:#04X}");
        }
    }

    #[test]
    fn windows_1252_has_27_assigned_upper_bytes() {
        // 0x81, 0x8D, 0x8F, 0x90 et 0x9D ne sont pas assignés.
        let table = ReverseCodePage::windows_1252();
        assert_eq!(table.len(), 27);
        assert!(!table.is_empty());

        let projected: Vec<u8> = (0x100..=u16::MAX)
            .map(|unit| table.to_legacy_byte(unit))
            .filter(|&byte| byte != 0)
            .collect();
        assert_eq!(projected.len(), 27);
        assert!(projected.iter().all(|byte| (0x80..=0x9F).contains(byte)));
    }

    #[test]
    fn c1_pass_through_code_page_is_empty() {
        // ISO-8859-2 laisse 0x80..=0x9F aux contrôles C1.
        let table = ReverseCodePage::new(resolve_code_page("iso-8859-2").unwrap());
        assert!(table.is_empty());
        assert_eq!(table.to_legacy_byte(0x0085), 0x85);
        assert_eq!(table.to_legacy_byte(0x20AC), 0);
    }

    #[test]
    fn well_known_entries() {
        let table = ReverseCodePage::windows_1252();
        assert_eq!(table.to_legacy_byte(0x20AC), 0x80); // €
        assert_eq!(table.to_legacy_byte(0x201A), 0x82); // ‚
        assert_eq!(table.to_legacy_byte(0x2122), 0x99); // ™
        assert_eq!(table.to_legacy_byte(0x0178), 0x9F); // Ÿ
    }

    #[test]
    fn unmappable_code_points_project_to_zero() {
        let table = ReverseCodePage::windows_1252();
        for unit in [0x0100u16, 0x4E2D, 0x20AD, 0xFFFD, 0xD800, 0xFFFF] {
            assert_eq!(table.to_legacy_byte(unit), 0, "unité {unit:#06X}");
        }
    }

    #[test]
    fn other_single_byte_code_pages_build() {
        let table = ReverseCodePage::new(resolve_code_page("windows-1250").unwrap());
        assert_eq!(table.to_legacy_byte(0x015A), 0x8C); // Ś
        assert_eq!(table.encoding().name(), "windows-1250");
    }

    #[test]
    fn resolve_rejects_multi_byte_and_unknown_labels() {
        assert!(matches!(
            resolve_code_page("utf-8"),
            Err(CoreError::UnsupportedCodePage { .. })
        ));
        assert!(resolve_code_page("gbk").is_err());
        assert!(resolve_code_page("pas-une-page").is_err());
        assert!(resolve_code_page(" Windows-1252 ").is_ok());
    }
}
