use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};

/// `*` ne traverse pas les séparateurs, `**` oui ; casse ignorée.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Expand include `patterns` relative to `base` into a list of files.
///
/// Paths under `base` come back relative to it. Duplicates across patterns
/// are dropped (exact path comparison), keeping first-seen order. Directories
/// never match.
///
/// # Errors
/// Returns an error if a pattern is syntactically invalid.
pub fn resolve_patterns(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let escaped_base = Pattern::escape(&base.to_string_lossy());
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        let full = if Path::new(pattern).is_absolute() {
            pattern.clone()
        } else {
            format!("{escaped_base}/{pattern}")
        };

        let mut matched = 0usize;
        for entry in glob::glob_with(&full, MATCH_OPTIONS)
            .with_context(|| format!("Motif invalide : {pattern}"))?
        {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("Entrée ignorée pendant l'expansion de {pattern} : {e}");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            matched += 1;
            let relative = path
                .strip_prefix(base)
                .map(Path::to_path_buf)
                .unwrap_or(path);
            if seen.insert(relative.clone()) {
                files.push(relative);
            }
        }

        if matched == 0 {
            log::warn!("Aucun fichier ne correspond à {pattern}");
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::create_dir_all(dir.path().join("folder.dll")).unwrap();
        for file in ["a.dll", "b.EXE", "sub/c.dll", "sub/deeper/d.dll", "sub/e.txt"] {
            fs::write(dir.path().join(file), b"").unwrap();
        }
        dir
    }

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn single_star_stays_in_directory() {
        let dir = tree();
        let files = resolve_patterns(dir.path(), &patterns(&["*.dll"])).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.dll")]);
    }

    #[test]
    fn double_star_recurses() {
        let dir = tree();
        let mut files = resolve_patterns(dir.path(), &patterns(&["**/*.dll"])).unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.dll"),
                PathBuf::from("sub/c.dll"),
                PathBuf::from("sub/deeper/d.dll"),
            ]
        );
    }

    #[test]
    fn case_is_ignored() {
        let dir = tree();
        let files = resolve_patterns(dir.path(), &patterns(&["*.exe"])).unwrap();
        assert_eq!(files, vec![PathBuf::from("b.EXE")]);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let dir = tree();
        let files =
            resolve_patterns(dir.path(), &patterns(&["sub/*.dll", "*.dll", "sub/c.dll"])).unwrap();
        assert_eq!(files, vec![PathBuf::from("sub/c.dll"), PathBuf::from("a.dll")]);

        let files = resolve_patterns(dir.path(), &patterns(&["**/*.dll", "**/*.dll"])).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn unmatched_pattern_is_not_an_error() {
        let dir = tree();
        assert!(resolve_patterns(dir.path(), &patterns(&["*.sys"])).unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let dir = tree();
        assert!(resolve_patterns(dir.path(), &patterns(&["a**b/*.dll"])).is_err());
    }

    #[test]
    fn absolute_patterns_stay_absolute_outside_base() {
        let dir = tree();
        let other = tempfile::tempdir().unwrap();
        let absolute = dir.path().join("a.dll");
        let files =
            resolve_patterns(other.path(), &[absolute.to_string_lossy().into_owned()]).unwrap();
        assert_eq!(files, vec![absolute]);
    }
}
