use std::path::PathBuf;

use clap::Parser;

use vrs_core::config::{DEFAULT_CONFIG_FILE, ValidatorConfig};

/// validate-resource-strings — détecte l'UTF-8 mal relu dans les tables RT_STRING.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Motifs de fichiers à valider, relatifs au répertoire courant (ex: "**/*.dll").
    #[arg(required = true, num_args = 1..)]
    pub patterns: Vec<String>,

    /// Fichier de configuration TOML. Ignoré s'il n'existe pas.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Code page mono-octet à travers laquelle l'UTF-8 a été relu.
    #[arg(long)]
    pub code_page: Option<String>,

    /// Nombre de workers (0 = un par CPU).
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Continuer après un fichier illisible (le code de sortie reste non nul).
    #[arg(long, default_value_t = false)]
    pub keep_going: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut ValidatorConfig) {
        if let Some(ref code_page) = self.code_page {
            config.detector.code_page.clone_from(code_page);
        }
        if let Some(threads) = self.threads {
            config.run.threads = threads;
        }
        if self.keep_going {
            config.run.keep_going = true;
        }
    }
}
