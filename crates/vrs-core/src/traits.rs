use std::io::{self, Write};
use std::sync::Mutex;

/// Reçoit les lignes de diagnostic produites par le détecteur.
///
/// Implémenté par : `StdoutSink` (production), `Mutex<Vec<String>>` (capture).
///
/// Appelé en parallèle depuis les workers : chaque appel doit écrire sa
/// ligne en un seul bloc, sans qu'une autre ligne puisse s'y intercaler.
///
/// # Example
/// ```
/// use vrs_core::traits::DiagnosticSink;
///
/// struct CountingSink(std::sync::atomic::AtomicUsize);
/// impl DiagnosticSink for CountingSink {
///     fn emit(&self, _line: &str) {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///     }
/// }
/// ```
pub trait DiagnosticSink: Send + Sync {
    /// Emit one complete diagnostic line (without trailing newline).
    fn emit(&self, line: &str);
}

/// Writes each line to standard output.
///
/// The stdout lock is held for the whole line, so lines coming from
/// different threads never tear. A closed pipe (`| head`) is ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn emit(&self, line: &str) {
        write_line(&mut io::stdout().lock(), line);
    }
}

/// Write `line` and a newline; never panics.
fn write_line(out: &mut impl Write, line: &str) {
    match writeln!(out, "{line}") {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
        Err(e) => log::warn!("Écriture du diagnostic impossible : {e}"),
    }
}

impl DiagnosticSink for Mutex<Vec<String>> {
    fn emit(&self, line: &str) {
        let mut lines = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(line.to_string());
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn emit(&self, line: &str) {
        (**self).emit(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingWriter(io::ErrorKind);

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(self.0.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_line_appends_newline() {
        let mut out = Vec::new();
        write_line(&mut out, r"a.dll offset 0: >>>\uFFFD<<<");
        write_line(&mut out, "b");
        assert_eq!(out, b"a.dll offset 0: >>>\\uFFFD<<<\nb\n");
    }

    #[test]
    fn closed_pipe_does_not_panic() {
        write_line(&mut FailingWriter(io::ErrorKind::BrokenPipe), "ligne");
        write_line(&mut FailingWriter(io::ErrorKind::Other), "ligne");
    }

    #[test]
    fn capture_sink_keeps_order() {
        let sink = Mutex::new(Vec::<String>::new());
        sink.emit("un");
        (&sink).emit("deux");
        assert_eq!(*sink.lock().unwrap(), vec!["un".to_string(), "deux".to_string()]);
    }
}
