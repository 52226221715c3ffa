use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use vrs_core::MojibakeDetector;
use vrs_core::config::{ValidatorConfig, load_config};

pub mod batch;
pub mod cli;
pub mod files;

fn main() -> Result<ExitCode> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config, puis appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);

    // 4. Construire le détecteur (table inverse prête avant tout worker)
    let detector = MojibakeDetector::from_config(&config.detector)?;
    log::debug!(
        "Code page {} : {} octet(s) haut(s) inversé(s)",
        detector.table().encoding().name(),
        detector.table().len()
    );

    // 5. Résoudre les motifs depuis le répertoire courant
    let cwd = std::env::current_dir().context("Répertoire courant inaccessible")?;
    let files = files::resolve_patterns(&cwd, &cli.patterns)?;
    log::info!("{} fichier(s) à valider", files.len());

    // 6. Valider en parallèle
    let summary = batch::validate_files(&detector, &files, &config.run)?;
    log::info!(
        "{} fichier(s), {} bloc(s) RT_STRING, {} chaîne(s) corrompue(s), {} échec(s)",
        summary.files,
        summary.resources,
        summary.corrupt_strings,
        summary.failed_files
    );

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn resolve_config(cli: &cli::Cli) -> Result<ValidatorConfig> {
    if cli.config.exists() {
        load_config(&cli.config)
    } else {
        log::debug!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(ValidatorConfig::default())
    }
}
