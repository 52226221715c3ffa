use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::codepage::resolve_code_page;

/// Nom du fichier de configuration cherché dans le répertoire courant.
pub const DEFAULT_CONFIG_FILE: &str = "validate-resource-strings.toml";

/// Configuration complète du validateur.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use vrs_core::config::ValidatorConfig;
/// let config = ValidatorConfig::default();
/// assert_eq!(config.detector.code_page, "windows-1252");
/// assert_eq!(config.run.threads, 0);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Réglages du détecteur.
    pub detector: DetectorConfig,
    /// Réglages de l'exécution parallèle.
    pub run: RunConfig,
}

/// Detector settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Code page mono-octet à travers laquelle l'UTF-8 a été mal relu.
    pub code_page: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            code_page: "windows-1252".to_string(),
        }
    }
}

/// Parallel run settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RunConfig {
    /// Nombre de workers. 0 = un par CPU.
    pub threads: usize,
    /// Continuer après un fichier illisible au lieu d'abandonner.
    pub keep_going: bool,
}

/// TOML file layout, all fields optional.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    detector: Option<DetectorSection>,
    run: Option<RunSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetectorSection {
    code_page: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RunSection {
    threads: Option<usize>,
    keep_going: Option<bool>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if it names an
/// unsupported code page.
///
/// # Example
/// ```no_run
/// use vrs_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("validate-resource-strings.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<ValidatorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Configuration invalide dans {}", path.display()))
}

/// Parse TOML `content` and merge it onto the defaults.
///
/// # Errors
/// Returns an error on TOML syntax errors, unknown keys, or an unsupported
/// code page.
pub fn parse_config(content: &str) -> Result<ValidatorConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = ValidatorConfig::default();

    if let Some(v) = file.detector.and_then(|d| d.code_page) {
        config.detector.code_page = v;
    }
    if let Some(r) = file.run {
        if let Some(v) = r.threads {
            config.run.threads = v;
        }
        if let Some(v) = r.keep_going {
            config.run.keep_going = v;
        }
    }

    resolve_code_page(&config.detector.code_page)?;
    Ok(config)
}
