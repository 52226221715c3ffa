use std::sync::atomic::{AtomicUsize, Ordering};

use crate::codepage::{ReverseCodePage, resolve_code_page};
use crate::config::DetectorConfig;
use crate::error::CoreError;
use crate::render::render_diagnostic;
use crate::scan::find_corruption;
use crate::traits::{DiagnosticSink, StdoutSink};

/// Nombre d'entrées d'un bloc `RT_STRING` (constante du format binaire).
pub const STRINGS_PER_BLOCK: usize = 16;

/// Détecteur de mojibake partagé entre tous les workers.
///
/// La table inverse est construite une fois dans le constructeur puis lue
/// sans verrou. Le compteur est le seul état mutable, incrémenté de façon
/// atomique : `Send + Sync`, utilisable via `&` depuis n'importe quel thread.
///
/// # Example
/// ```
/// use std::sync::Mutex;
/// use vrs_core::MojibakeDetector;
///
/// let detector = MojibakeDetector::with_sink(Default::default(), Mutex::new(Vec::<String>::new()));
/// // Une seule entrée "Ã©" puis 15 entrées vides.
/// let mut block = vec![2u16, 0xC3, 0xA9];
/// block.extend([0u16; 15]);
/// detector.scan_resource_block("app.dll", &block);
/// assert_eq!(detector.corruption_count(), 1);
/// ```
pub struct MojibakeDetector<S: DiagnosticSink = StdoutSink> {
    table: ReverseCodePage,
    sink: S,
    /// Incrémenté une fois par chaîne corrompue, pas par fichier.
    corrupt_strings: AtomicUsize,
}

impl MojibakeDetector<StdoutSink> {
    /// Detector writing diagnostics to stdout.
    #[must_use]
    pub fn new(table: ReverseCodePage) -> Self {
        Self::with_sink(table, StdoutSink)
    }

    /// Build a stdout detector for the code page named in `config`.
    ///
    /// # Errors
    /// Returns [`CoreError::UnsupportedCodePage`] if the label does not name a
    /// single-byte encoding.
    pub fn from_config(config: &DetectorConfig) -> Result<Self, CoreError> {
        let encoding = resolve_code_page(&config.code_page)?;
        let table = ReverseCodePage::new(encoding);
        if table.is_empty() {
            log::warn!(
                "{} n'assigne aucun caractère à 0x80..=0x9F : seules les unités < 0x100 seront projetées",
                encoding.name()
            );
        }
        Ok(Self::new(table))
    }
}

impl<S: DiagnosticSink> MojibakeDetector<S> {
    /// Detector writing diagnostics to `sink`.
    #[must_use]
    pub fn with_sink(table: ReverseCodePage, sink: S) -> Self {
        Self {
            table,
            sink,
            corrupt_strings: AtomicUsize::new(0),
        }
    }

    /// Validate every string of one `RT_STRING` block.
    ///
    /// The block holds [`STRINGS_PER_BLOCK`] entries, each a length unit
    /// followed by that many units. A buffer too short for all entries ends
    /// the walk early, without scanning the entry that runs past the end.
    pub fn scan_resource_block(&self, identifier: &str, buffer: &[u16]) {
        let mut rest = buffer;
        for index in 0..STRINGS_PER_BLOCK {
            let Some((&len, tail)) = rest.split_first() else {
                break;
            };
            let len = usize::from(len);
            if len > tail.len() {
                log::debug!(
                    "{identifier} : entrée {index} tronquée ({len} unités annoncées, {} disponibles)",
                    tail.len()
                );
                break;
            }
            let (string, next) = tail.split_at(len);
            if len > 0 {
                self.scan_string(identifier, string);
            }
            rest = next;
        }
    }

    /// Validate one string; returns `true` if it was reported as corrupt.
    ///
    /// A corrupt string produces one diagnostic line on the sink, then one
    /// increment of the counter.
    pub fn scan_string(&self, identifier: &str, units: &[u16]) -> bool {
        let Some(offset) = find_corruption(&self.table, units) else {
            return false;
        };
        self.sink.emit(&render_diagnostic(identifier, offset, units));
        self.corrupt_strings.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Number of corrupt strings reported so far, across all threads.
    ///
    /// Meant to be read once every scan has completed. Zero means success.
    #[inline]
    #[must_use]
    pub fn corruption_count(&self) -> usize {
        self.corrupt_strings.load(Ordering::Relaxed)
    }

    /// The reverse code-page table used for projection.
    #[must_use]
    pub fn table(&self) -> &ReverseCodePage {
        &self.table
    }

    /// The diagnostic sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }
}
