use crate::inventory::{ListedFile, ProfileListing};
use crate::tokenizer::TokenNormalizer;
use chrono::{DateTime, Utc};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;
use modsnap_common::{AppConfig, ModSnapError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lists mod archives inside profile directories
pub struct ModsScanner {
    mods_dir_name: String,
    normalizer: TokenNormalizer,
    custom_ignore: Option<Gitignore>,
}

impl ModsScanner {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            mods_dir_name: config.mods_dir_name.clone(),
            normalizer: TokenNormalizer::new(&config.classifier),
            custom_ignore: Self::build_custom_ignore(config),
        }
    }

    /// Build a Gitignore from custom ignore patterns in config
    fn build_custom_ignore(config: &AppConfig) -> Option<Gitignore> {
        if config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new("");
        for pattern in &config.ignore_patterns {
            if let Err(err) = builder.add_line(None, pattern) {
                debug!("Failed to add ignore pattern '{}': {}", pattern, err);
            } else {
                debug!("Added custom ignore pattern: {}", pattern);
            }
        }

        match builder.build() {
            Ok(ignore) => {
                debug!("Built custom ignore with {} patterns", config.ignore_patterns.len());
                Some(ignore)
            }
            Err(e) => {
                debug!("Failed to build custom ignore: {}", e);
                None
            }
        }
    }

    /// The directory holding a profile's mods; the profile itself when it has no mods sub-directory
    pub fn mods_dir(&self, profile_path: &Path) -> PathBuf {
        let candidate = profile_path.join(&self.mods_dir_name);
        if !self.mods_dir_name.is_empty() && candidate.is_dir() {
            candidate
        } else {
            profile_path.to_path_buf()
        }
    }

    /// List the archives directly inside a profile's mods directory, sorted by file name
    pub fn scan_profile(&self, profile_path: &Path) -> Result<ProfileListing, ModSnapError> {
        if !profile_path.is_dir() {
            return Err(ModSnapError::Path(format!(
                "Profile is not a directory: {}",
                profile_path.display()
            )));
        }

        let mods_path = self.mods_dir(profile_path);
        let mut files = Vec::new();

        let walker = WalkDir::new(&mods_path)
            .max_depth(1)
            .sort(true)
            .skip_hidden(false);

        for entry in walker {
            let entry = entry.map_err(|e| ModSnapError::Io(std::io::Error::other(
                format!("Walk error: {}", e)
            )))?;

            if entry.depth() == 0 || !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            if !self.normalizer.is_archive(&file_name) || self.is_ignored(&file_name) {
                continue;
            }

            let metadata = entry.metadata()
                .map_err(|e| ModSnapError::Io(std::io::Error::other(
                    format!("Metadata error: {}", e)
                )))?;
            let modified = metadata.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);

            files.push(ListedFile {
                file_name,
                path: entry.path(),
                modified_at: DateTime::<Utc>::from(modified),
            });
        }

        debug!("Listed {} mod archives in {:?}", files.len(), mods_path);
        Ok(ProfileListing {
            profile_path: profile_path.to_path_buf(),
            mods_path,
            files,
        })
    }

    fn is_ignored(&self, file_name: &str) -> bool {
        self.custom_ignore
            .as_ref()
            .is_some_and(|ignore| ignore.matched(Path::new(file_name), false).is_ignore())
    }
}

/// Profiles in scan order: the explicit list when configured, otherwise the
/// sub-directories of the profiles root sorted by name
pub fn discover_profiles(config: &AppConfig) -> Result<Vec<PathBuf>, ModSnapError> {
    if !config.profiles.is_empty() {
        return Ok(config.profiles.clone());
    }

    let root = config.profiles_root.as_ref().ok_or_else(|| {
        ModSnapError::Config("No profiles configured and no profiles_root set".to_string())
    })?;
    if !root.is_dir() {
        return Err(ModSnapError::Path(format!(
            "Profiles root is not a directory: {}",
            root.display()
        )));
    }

    let mut profiles = Vec::new();
    for entry in WalkDir::new(root).max_depth(1).sort(true).skip_hidden(true) {
        let entry = entry.map_err(|e| ModSnapError::Io(std::io::Error::other(
            format!("Walk error: {}", e)
        )))?;
        if entry.depth() == 1 && entry.file_type().is_dir() {
            profiles.push(entry.path());
        }
    }

    debug!("Discovered {} profiles under {:?}", profiles.len(), root);
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"PK").unwrap();
    }

    #[test]
    fn test_scan_profile_lists_archives_sorted() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("1. Library");
        touch(&profile.join("mods/zeta-1.0.jar"));
        touch(&profile.join("mods/alpha-2.0.JAR"));
        touch(&profile.join("mods/readme.txt"));
        touch(&profile.join("mods/nested/inner-1.0.jar"));

        let scanner = ModsScanner::new(&AppConfig::default());
        let listing = scanner.scan_profile(&profile).unwrap();

        assert_eq!(listing.mods_path, profile.join("mods"));
        let names: Vec<_> = listing.files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["alpha-2.0.JAR", "zeta-1.0.jar"]);
    }

    #[test]
    fn test_scan_profile_without_mods_dir_uses_profile() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("Flat");
        touch(&profile.join("flat-1.0.jar"));

        let scanner = ModsScanner::new(&AppConfig::default());
        let listing = scanner.scan_profile(&profile).unwrap();
        assert_eq!(listing.mods_path, profile);
        assert_eq!(listing.files.len(), 1);
    }

    #[test]
    fn test_scan_profile_reads_mtime() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("P");
        let file = profile.join("mods/m-1.0.jar");
        touch(&file);
        set_file_mtime(&file, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

        let scanner = ModsScanner::new(&AppConfig::default());
        let listing = scanner.scan_profile(&profile).unwrap();
        assert_eq!(listing.files[0].modified_at.timestamp(), 1_700_000_000);
        assert_eq!(listing.files[0].path, file);
    }

    #[test]
    fn test_scan_profile_respects_ignore_patterns() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("P");
        touch(&profile.join("mods/keep-1.0.jar"));
        touch(&profile.join("mods/keep-1.0-sources.jar"));

        let config = AppConfig {
            ignore_patterns: vec!["*-sources.jar".to_string()],
            ..AppConfig::default()
        };
        let listing = ModsScanner::new(&config).scan_profile(&profile).unwrap();
        let names: Vec<_> = listing.files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["keep-1.0.jar"]);
    }

    #[test]
    fn test_scan_missing_profile_is_error() {
        let temp = TempDir::new().unwrap();
        let scanner = ModsScanner::new(&AppConfig::default());
        assert!(matches!(
            scanner.scan_profile(&temp.path().join("missing")),
            Err(ModSnapError::Path(_))
        ));
    }

    #[test]
    fn test_discover_profiles_sorted_and_explicit() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("2. Extra")).unwrap();
        fs::create_dir_all(temp.path().join("1. Library")).unwrap();
        fs::create_dir_all(temp.path().join(".hidden")).unwrap();
        touch(&temp.path().join("stray.jar"));

        let config = AppConfig {
            profiles_root: Some(temp.path().to_path_buf()),
            ..AppConfig::default()
        };
        let found = discover_profiles(&config).unwrap();
        assert_eq!(
            found,
            vec![temp.path().join("1. Library"), temp.path().join("2. Extra")]
        );

        let explicit = AppConfig {
            profiles: vec![temp.path().join("2. Extra"), temp.path().join("1. Library")],
            ..config
        };
        assert_eq!(discover_profiles(&explicit).unwrap()[0], temp.path().join("2. Extra"));
    }

    #[test]
    fn test_discover_profiles_requires_source() {
        assert!(matches!(
            discover_profiles(&AppConfig::default()),
            Err(ModSnapError::Config(_))
        ));
    }
}
