use crate::{AppConfig, ClassifierConfig, ModSnapError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "modsnap.toml";
const SNAPSHOT_FILE_NAME: &str = "snapshot.json";
const REPORT_DIR_NAME: &str = "reports";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig, ModSnapError> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    load_config_from(path, portable)
}

/// Load the config at an explicit path; a missing file yields the defaults
pub fn load_config_from(path: PathBuf, portable: bool) -> Result<LoadedConfig, ModSnapError> {
    let exists = path.exists();

    let mut config = if exists {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data).map_err(|e| ModSnapError::Config(format!("{}: {}", path.display(), e)))?
    } else {
        AppConfig::default()
    };

    config.portable_mode = portable;

    Ok(LoadedConfig {
        config,
        path,
        exists,
        portable,
    })
}

pub fn ensure_config(prefer_portable: bool) -> Result<LoadedConfig, ModSnapError> {
    let loaded = load_config(prefer_portable)?;
    if !loaded.exists {
        save_config(&loaded.path, &loaded.config)?;
    }
    Ok(loaded)
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ModSnapError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| ModSnapError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

/// Directory holding the persisted snapshot and reports
pub fn default_data_dir(portable: bool, config_path: &Path) -> Result<PathBuf, ModSnapError> {
    if portable {
        let base = config_path
            .parent()
            .map(|path| path.to_path_buf())
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        return Ok(base.join("modsnap_data"));
    }

    let dirs = ProjectDirs::from("", "modsnap", "modsnap")
        .ok_or_else(|| ModSnapError::Config("Unable to determine data directory".to_string()))?;
    Ok(dirs.data_dir().to_path_buf())
}

pub fn snapshot_path(loaded: &LoadedConfig) -> Result<PathBuf, ModSnapError> {
    match &loaded.config.snapshot_path {
        Some(path) => Ok(path.clone()),
        None => Ok(default_data_dir(loaded.portable, &loaded.path)?.join(SNAPSHOT_FILE_NAME)),
    }
}

pub fn report_dir(loaded: &LoadedConfig) -> Result<PathBuf, ModSnapError> {
    match &loaded.config.report_dir {
        Some(path) => Ok(path.clone()),
        None => Ok(default_data_dir(loaded.portable, &loaded.path)?.join(REPORT_DIR_NAME)),
    }
}

/// Read a known platform-version catalog.
///
/// Accepts either a JSON array of strings or one version per line (`#` starts a comment).
pub fn load_known_versions(path: &Path) -> Result<Vec<String>, ModSnapError> {
    let data = fs::read_to_string(path)?;
    let trimmed = data.trim_start();

    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(trimmed)
            .map_err(|e| ModSnapError::Serialization(format!("{}: {}", path.display(), e)));
    }

    Ok(data
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect())
}

/// Inline versions plus the optional catalog file, deduplicated, in first-seen order
pub fn resolve_known_versions(classifier: &ClassifierConfig) -> Result<Vec<String>, ModSnapError> {
    let mut versions = classifier.known_platform_versions.clone();
    if let Some(path) = &classifier.known_versions_file {
        versions.extend(load_known_versions(path)?);
    }

    let mut seen = std::collections::HashSet::new();
    versions.retain(|v| seen.insert(v.clone()));
    Ok(versions)
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool), ModSnapError> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "modsnap", "modsnap")
        .ok_or_else(|| ModSnapError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let loaded = load_config_from(temp.path().join("modsnap.toml"), false).unwrap();
        assert!(!loaded.exists);
        assert_eq!(loaded.config.mods_dir_name, "mods");
    }

    #[test]
    fn test_save_then_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("modsnap.toml");

        let mut config = AppConfig::default();
        config.profiles.push(PathBuf::from("/profiles/Main"));
        config.classifier.default_loader = "fabric".to_string();
        save_config(&path, &config).unwrap();

        let loaded = load_config_from(path, true).unwrap();
        assert!(loaded.exists);
        assert!(loaded.config.portable_mode);
        assert_eq!(loaded.config.profiles, vec![PathBuf::from("/profiles/Main")]);
        assert_eq!(loaded.config.classifier.default_loader, "fabric");
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("modsnap.toml");
        fs::write(&path, "mods_dir_name = [").unwrap();
        assert!(matches!(
            load_config_from(path, false),
            Err(ModSnapError::Config(_))
        ));
    }

    #[test]
    fn test_known_versions_line_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("versions.txt");
        fs::write(&path, "1.20.1\n# legacy\n1.19.2  \n\n1.18.2 # lts\n").unwrap();
        assert_eq!(
            load_known_versions(&path).unwrap(),
            vec!["1.20.1", "1.19.2", "1.18.2"]
        );
    }

    #[test]
    fn test_known_versions_json_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("versions.json");
        fs::write(&path, r#"["1.21", "1.20.6"]"#).unwrap();
        assert_eq!(load_known_versions(&path).unwrap(), vec!["1.21", "1.20.6"]);
    }

    #[test]
    fn test_resolve_known_versions_merges_and_dedups() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("versions.txt");
        fs::write(&path, "1.20.1\n1.21\n").unwrap();

        let classifier = ClassifierConfig {
            known_platform_versions: vec!["1.20.1".to_string(), "1.19.2".to_string()],
            known_versions_file: Some(path),
            ..ClassifierConfig::default()
        };
        assert_eq!(
            resolve_known_versions(&classifier).unwrap(),
            vec!["1.20.1", "1.19.2", "1.21"]
        );
    }
}
