/// Mojibake detection core for validate-resource-strings.
///
/// This crate holds the reverse code-page table, the per-string heuristic,
/// the diagnostic rendering and the shared detector used by every worker.

pub mod codepage;
pub mod config;
pub mod detector;
pub mod error;
pub mod render;
pub mod scan;
pub mod traits;

pub use codepage::ReverseCodePage;
pub use config::ValidatorConfig;
pub use detector::MojibakeDetector;
pub use error::CoreError;
pub use traits::{DiagnosticSink, StdoutSink};
