//! Per-string mojibake heuristic.
//!
//! UTF-8 text decoded one byte at a time through a single-byte code page
//! turns every UTF-8 byte into its own code unit. Projecting the units back
//! through the code page recovers the original bytes, and a run of them
//! matching UTF-8's lead/continuation bit patterns is the signature looked
//! for here. Genuine legacy text almost never produces such a run.

use crate::codepage::ReverseCodePage;

/// U+FFFD REPLACEMENT CHARACTER.
pub const REPLACEMENT_CHARACTER: u16 = 0xFFFD;

/// Number of continuation bytes announced by a UTF-8 lead byte, or `None`
/// if `lead` is ASCII, a continuation byte, or an invalid lead (0xF8..).
///
/// # Example
/// ```
/// use vrs_core::scan::continuation_len;
/// assert_eq!(continuation_len(0xC3), Some(1));
/// assert_eq!(continuation_len(0xE2), Some(2));
/// assert_eq!(continuation_len(0xF0), Some(3));
/// assert_eq!(continuation_len(0xA9), None);
/// assert_eq!(continuation_len(b'A'), None);
/// ```
#[inline]
#[must_use]
pub fn continuation_len(lead: u8) -> Option<usize> {
    if lead & 0xE0 == 0xC0 {
        Some(1)
    } else if lead & 0xF0 == 0xE0 {
        Some(2)
    } else if lead & 0xF8 == 0xF0 {
        Some(3)
    } else {
        None
    }
}

/// `true` for `10xxxxxx`.
#[inline]
#[must_use]
pub fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// `true` if `window[0]` starts a structurally valid UTF-8 sequence once
/// every unit of the window is projected through `table`.
///
/// Continuation units past the end of `window` fail the match.
#[must_use]
pub fn starts_utf8_sequence(table: &ReverseCodePage, window: &[u16]) -> bool {
    let Some((&first, rest)) = window.split_first() else {
        return false;
    };
    let lead = table.to_legacy_byte(first);
    if lead <= 0x7F {
        return false;
    }
    let Some(needed) = continuation_len(lead) else {
        return false;
    };
    rest.len() >= needed
        && rest[..needed]
            .iter()
            .all(|&unit| is_continuation(table.to_legacy_byte(unit)))
}

/// Index of the first unit where `units` looks corrupted, or `None` if the
/// string is clean.
///
/// A unit is corrupted if it is U+FFFD (the text was already unrepresentable
/// upstream) or if it starts a projected UTF-8 sequence.
///
/// # Example
/// ```
/// use vrs_core::codepage::ReverseCodePage;
/// use vrs_core::scan::find_corruption;
///
/// let table = ReverseCodePage::windows_1252();
/// // "é" en UTF-8 (C3 A9) relu comme deux caractères Windows-1252 : "Ã©".
/// let units: Vec<u16> = "Caf\u{00C3}\u{00A9}".encode_utf16().collect();
/// assert_eq!(find_corruption(&table, &units), Some(3));
/// let clean: Vec<u16> = "Café".encode_utf16().collect();
/// assert_eq!(find_corruption(&table, &clean), None);
/// ```
#[must_use]
pub fn find_corruption(table: &ReverseCodePage, units: &[u16]) -> Option<usize> {
    (0..units.len()).find(|&j| {
        units[j] == REPLACEMENT_CHARACTER || starts_utf8_sequence(table, &units[j..])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// UTF-8 bytes of `text`, each widened to its own code unit after a
    /// Windows-1252 round trip, which is what a mis-compiled `.rc` produces.
    fn mis_decoded(text: &str) -> Vec<u16> {
        let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(text.as_bytes());
        decoded.encode_utf16().collect()
    }

    fn units(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    #[test]
    fn ascii_is_never_corrupt() {
        let table = ReverseCodePage::windows_1252();
        let printable: String = (0x20u8..0x7F).map(char::from).collect();
        assert_eq!(find_corruption(&table, &units(&printable)), None);
        assert_eq!(find_corruption(&table, &units("Tab\tand\r\nnewline")), None);
    }

    #[test]
    fn lone_replacement_character_is_corrupt_at_zero() {
        let table = ReverseCodePage::windows_1252();
        assert_eq!(find_corruption(&table, &[REPLACEMENT_CHARACTER]), Some(0));
    }

    #[test]
    fn replacement_character_is_reported_where_it_sits() {
        let table = ReverseCodePage::windows_1252();
        let mut text = units("abc");
        text.push(REPLACEMENT_CHARACTER);
        text.extend(units("def"));
        assert_eq!(find_corruption(&table, &text), Some(3));
    }

    #[test]
    fn two_byte_sequence_is_detected() {
        let table = ReverseCodePage::windows_1252();
        assert_eq!(find_corruption(&table, &[0xC3, 0xA9]), Some(0));
    }

    #[test]
    fn two_byte_lead_without_continuation_is_clean() {
        let table = ReverseCodePage::windows_1252();
        assert_eq!(find_corruption(&table, &[0xC3, 0x41]), None);
    }

    #[test]
    fn truncated_sequences_are_clean() {
        let table = ReverseCodePage::windows_1252();
        assert_eq!(find_corruption(&table, &[0xC3]), None);
        assert_eq!(find_corruption(&table, &[0xE2, 0x82]), None);
        assert_eq!(find_corruption(&table, &[0xF0, 0x9F, 0x98]), None);
    }

    #[test]
    fn three_byte_sequence_through_reverse_table() {
        // "€" = E2 82 AC ; 0x82 est relu comme U+201A.
        let table = ReverseCodePage::windows_1252();
        let text = mis_decoded("Prix : 5€");
        assert_eq!(text[8], 0x00E2);
        assert_eq!(text[9], 0x201A);
        assert_eq!(find_corruption(&table, &text), Some(8));
    }

    #[test]
    fn four_byte_sequence_is_detected() {
        // U+1F600 = F0 9F 98 80 ; 0x9F -> U+0178, 0x98 -> U+02DC, 0x80 -> U+20AC.
        let table = ReverseCodePage::windows_1252();
        let text = mis_decoded("ok \u{1F600}");
        assert_eq!(text, vec![0x6F, 0x6B, 0x20, 0xF0, 0x0178, 0x02DC, 0x20AC]);
        assert_eq!(find_corruption(&table, &text), Some(3));
    }

    #[test]
    fn genuine_latin1_text_is_clean() {
        let table = ReverseCodePage::windows_1252();
        for text in ["Café crème", "Ärger über Öl", "naïve façade", "¿Qué?", "Œuvre – “citée”"] {
            assert_eq!(find_corruption(&table, &units(text)), None, "{text}");
        }
    }

    #[test]
    fn real_mojibake_is_detected() {
        let table = ReverseCodePage::windows_1252();
        for text in ["Café", "Ärger", "“quoted”", "日本語"] {
            assert!(find_corruption(&table, &mis_decoded(text)).is_some(), "{text}");
        }
    }

    #[test]
    fn unmappable_units_break_the_pattern() {
        // U+4E2D n'a pas de projection : il vaut 0 et n'est pas une continuation.
        let table = ReverseCodePage::windows_1252();
        assert_eq!(find_corruption(&table, &[0xC3, 0x4E2D]), None);
        assert_eq!(find_corruption(&table, &[0x4E2D, 0xA9]), None);
    }

    #[test]
    fn invalid_lead_bytes_never_match() {
        let table = ReverseCodePage::windows_1252();
        for lead in [0xF8u16, 0xFC, 0xFE, 0xFF, 0x80, 0xBF] {
            assert_eq!(find_corruption(&table, &[lead, 0x80, 0x80, 0x80]), None, "{lead:#04X}");
        }
    }

    #[test]
    fn continuation_len_boundaries() {
        assert_eq!(continuation_len(0xBF), None);
        assert_eq!(continuation_len(0xC0), Some(1));
        assert_eq!(continuation_len(0xDF), Some(1));
        assert_eq!(continuation_len(0xE0), Some(2));
        assert_eq!(continuation_len(0xEF), Some(2));
        assert_eq!(continuation_len(0xF0), Some(3));
        assert_eq!(continuation_len(0xF7), Some(3));
        assert_eq!(continuation_len(0xF8), None);
    }
}
