use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use rayon::prelude::*;

use vrs_core::config::RunConfig;
use vrs_core::{DiagnosticSink, MojibakeDetector};

/// Bilan d'une exécution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Fichiers soumis.
    pub files: usize,
    /// Blocs `RT_STRING` scannés.
    pub resources: usize,
    /// Chaînes signalées comme corrompues.
    pub corrupt_strings: usize,
    /// Fichiers ignorés après une erreur de chargement (`keep_going`).
    pub failed_files: usize,
}

impl RunSummary {
    /// Nothing corrupt and nothing skipped.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.corrupt_strings == 0 && self.failed_files == 0
    }
}

/// Valide `files` en parallèle sur un pool rayon dédié.
///
/// Le détecteur est partagé par référence entre tous les workers. Sans
/// `keep_going`, la première erreur de chargement interrompt le lot.
///
/// # Errors
/// Retourne une erreur si le pool ne peut pas être créé, ou si un fichier ne
/// peut pas être chargé et que `keep_going` est désactivé.
pub fn validate_files<S: DiagnosticSink>(
    detector: &MojibakeDetector<S>,
    files: &[PathBuf],
    run: &RunConfig,
) -> Result<RunSummary> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(run.threads)
        .build()
        .context("Impossible de créer le pool de workers")?;
    log::debug!(
        "{} fichier(s) sur {} worker(s)",
        files.len(),
        pool.current_num_threads()
    );

    let resources = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    pool.install(|| {
        files
            .par_iter()
            .try_for_each(|path| match validate_file(detector, path) {
                Ok(count) => {
                    resources.fetch_add(count, Ordering::Relaxed);
                    Ok(())
                }
                Err(e) if run.keep_going => {
                    log::error!("{e:#}");
                    failed.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
                Err(e) => Err(e),
            })
    })?;

    Ok(RunSummary {
        files: files.len(),
        resources: resources.into_inner(),
        corrupt_strings: detector.corruption_count(),
        failed_files: failed.into_inner(),
    })
}

/// Scan every string table of one file; returns the number of blocks.
fn validate_file<S: DiagnosticSink>(detector: &MojibakeDetector<S>, path: &Path) -> Result<usize> {
    let tables = vrs_pe::load_string_tables(path)
        .with_context(|| format!("Validation impossible : {}", path.display()))?;
    let identifier = path.display().to_string();
    for table in &tables {
        match table.name.first_string_id() {
            Some(first) => log::trace!(
                "{identifier} : bloc {} (chaînes {first}..={}, langue {:#06x})",
                table.name,
                first + 15,
                table.language
            ),
            None => log::trace!(
                "{identifier} : bloc {} (langue {:#06x})",
                table.name,
                table.language
            ),
        }
        detector.scan_resource_block(&identifier, &table.units);
    }
    Ok(tables.len())
}
