use std::fmt::Write as _;

/// Marqueur d'ouverture autour du texte brut.
pub const OPEN_MARKER: &str = ">>>";

/// Marqueur de fermeture autour du texte brut.
pub const CLOSE_MARKER: &str = "<<<";

/// Render one diagnostic line: `"<identifier> offset <j>: >>><text><<<"`.
///
/// Units in 0x20..=0x7E are emitted literally, every other unit as `\u`
/// followed by four uppercase hex digits.
///
/// # Example
/// ```
/// use vrs_core::render::render_diagnostic;
/// let line = render_diagnostic("app.dll", 1, &[0x41, 0xC3, 0xA9, 0x09]);
/// assert_eq!(line, r"app.dll offset 1: >>>A\u00C3\u00A9\u0009<<<");
/// ```
#[must_use]
pub fn render_diagnostic(identifier: &str, offset: usize, units: &[u16]) -> String {
    let mut line = String::with_capacity(identifier.len() + 6 * units.len() + 32);
    let _ = write!(line, "{identifier} offset {offset}: {OPEN_MARKER}");
    push_escaped(&mut line, units);
    line.push_str(CLOSE_MARKER);
    line
}

/// Append `units` to `out`, escaping everything outside printable ASCII.
pub fn push_escaped(out: &mut String, units: &[u16]) {
    for &unit in units {
        if (0x20..0x7F).contains(&unit) {
            out.push(char::from(unit as u8));
        } else {
            let _ = write!(out, "\\u{unit:04X}");
        }
    }
}
