use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Identity recovered from a mod archive's file name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModIdentity {
    pub name: String,
    pub version: Option<String>,
    pub platform_version: String,
    pub loader: String,
    pub valid_platform_version: bool,
}

/// A single mod file found in a profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModRecord {
    pub file_name: String,
    #[serde(default)]
    pub file_path: PathBuf,
    #[serde(default)]
    pub modified_at: DateTime<Utc>,
    /// Absent for records persisted before classification existed
    #[serde(default)]
    pub identity: Option<ModIdentity>,
}

impl ModRecord {
    pub fn name(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .map(|i| i.name.as_str())
            .filter(|n| !n.is_empty())
    }

    pub fn version(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|i| i.version.as_deref())
            .filter(|v| !v.is_empty())
    }

    pub fn platform_version(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .map(|i| i.platform_version.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn loader(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .map(|i| i.loader.as_str())
            .filter(|l| !l.is_empty())
    }
}

/// All mods of one named profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInventory {
    pub profile_path: PathBuf,
    #[serde(default)]
    pub mods_path: PathBuf,
    #[serde(default)]
    pub mods: Vec<ModRecord>,
}

impl ProfileInventory {
    pub fn new(profile_path: PathBuf, mods_path: PathBuf) -> Self {
        Self {
            profile_path,
            mods_path,
            mods: Vec::new(),
        }
    }

    /// Profile name used to match profiles across snapshots (base name of the profile path)
    pub fn name(&self) -> String {
        profile_name(&self.profile_path)
    }
}

/// Base name of a profile directory, falling back to the whole path
pub fn profile_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Point-in-time capture of every profile's mods, in profile scan order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profiles: Vec<ProfileInventory>,
}

impl Snapshot {
    pub fn new(profiles: Vec<ProfileInventory>) -> Self {
        Self {
            created_at: Some(Utc::now()),
            profiles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn mod_count(&self) -> usize {
        self.profiles.iter().map(|p| p.mods.len()).sum()
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileInventory> {
        self.profiles.iter().find(|p| p.name() == name)
    }
}

/// A mod file that lost ownership to an earlier occurrence and is scheduled for deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub profile: String,
    pub file_name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub existing_owner: Option<ModRecord>,
}

/// How a file stem is cut into tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Split on `-` only
    #[default]
    Hyphen,
    /// Split on `-` and `@`
    HyphenAndAt,
}

/// Replaces the recovered name of any file whose stem starts with `prefix`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameOverride {
    pub prefix: String,
    pub name: String,
}

/// Filename classifier settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub default_platform_version: String,
    pub default_loader: String,
    pub loaders: Vec<String>,
    pub filler_words: Vec<String>,
    pub archive_extensions: Vec<String>,
    pub split_policy: SplitPolicy,
    pub prerelease_markers: Vec<String>,
    pub known_platform_versions: Vec<String>,
    pub known_versions_file: Option<PathBuf>,
    /// Short code -> loader name (e.g. "nf" -> "neoforge")
    pub loader_aliases: BTreeMap<String, String>,
    pub name_overrides: Vec<NameOverride>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let loader_aliases = [
            ("nf", "neoforge"),
            ("neo", "neoforge"),
            ("fa", "fabric"),
            ("fg", "forge"),
            ("qu", "quilt"),
        ]
        .into_iter()
        .map(|(alias, loader)| (alias.to_string(), loader.to_string()))
        .collect();

        let name_overrides = [
            ("just-enough-items", "jei"),
            ("fabric-api", "fabric-api"),
            ("fabric-language-kotlin", "fabric-language-kotlin"),
            ("forge-config-api-port", "forge-config-api-port"),
        ]
        .into_iter()
        .map(|(prefix, name)| NameOverride {
            prefix: prefix.to_string(),
            name: name.to_string(),
        })
        .collect();

        Self {
            default_platform_version: "unknown".to_string(),
            default_loader: "unknown".to_string(),
            loaders: to_strings(&["fabric", "forge", "neoforge", "quilt", "liteloader", "rift"]),
            loader_aliases,
            filler_words: to_strings(&["for", "mc", "minecraft"]),
            archive_extensions: to_strings(&["jar", "zip", "litemod"]),
            split_policy: SplitPolicy::default(),
            prerelease_markers: to_strings(&["alpha", "beta", "pre", "rc", "snapshot"]),
            name_overrides,
            known_platform_versions: Vec::new(),
            known_versions_file: None,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory whose sub-directories are profiles
    #[serde(default)]
    pub profiles_root: Option<PathBuf>,

    /// Explicit profile directories; scan order decides duplicate ownership
    #[serde(default)]
    pub profiles: Vec<PathBuf>,

    /// Sub-directory of a profile holding its mods
    #[serde(default = "default_mods_dir_name")]
    pub mods_dir_name: String,

    /// Ignore patterns for mod listings (e.g., "*-sources.jar")
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Where the latest snapshot is persisted
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Where reports are written
    #[serde(default)]
    pub report_dir: Option<PathBuf>,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

fn default_mods_dir_name() -> String {
    "mods".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profiles_root: None,
            profiles: Vec::new(),
            mods_dir_name: default_mods_dir_name(),
            ignore_patterns: Vec::new(),
            snapshot_path: None,
            report_dir: None,
            portable_mode: false,
            classifier: ClassifierConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file_name: &str, identity: Option<ModIdentity>) -> ModRecord {
        ModRecord {
            file_name: file_name.to_string(),
            file_path: PathBuf::from(file_name),
            modified_at: DateTime::<Utc>::default(),
            identity,
        }
    }

    #[test]
    fn test_record_accessors_without_identity() {
        let rec = record("foo.jar", None);
        assert!(rec.name().is_none());
        assert!(rec.version().is_none());
        assert!(rec.platform_version().is_none());
        assert!(rec.loader().is_none());
    }

    #[test]
    fn test_record_accessors_filter_empty_fields() {
        let rec = record(
            "foo.jar",
            Some(ModIdentity {
                name: "foo".to_string(),
                version: Some(String::new()),
                platform_version: String::new(),
                loader: "fabric".to_string(),
                valid_platform_version: false,
            }),
        );
        assert_eq!(rec.name(), Some("foo"));
        assert!(rec.version().is_none());
        assert!(rec.platform_version().is_none());
        assert_eq!(rec.loader(), Some("fabric"));
    }

    #[test]
    fn test_profile_name_is_base_name() {
        let inv = ProfileInventory::new(
            PathBuf::from("/games/profiles/1. Library"),
            PathBuf::from("/games/profiles/1. Library/mods"),
        );
        assert_eq!(inv.name(), "1. Library");
    }

    #[test]
    fn test_snapshot_tolerates_missing_identity_fields() {
        let json = r#"{
            "profiles": [
                {
                    "profile_path": "/p/Main",
                    "mods": [
                        { "file_name": "a.jar", "identity": { "name": "a" } },
                        { "file_name": "b.jar" }
                    ]
                }
            ]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.mod_count(), 2);
        let main = snapshot.profile("Main").unwrap();
        assert_eq!(main.mods[0].name(), Some("a"));
        assert!(main.mods[0].version().is_none());
        assert!(main.mods[1].identity.is_none());
    }

    #[test]
    fn test_classifier_config_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            mods_dir_name = "addons"

            [classifier]
            default_loader = "forge"
            split_policy = "hyphen_and_at"
            "#,
        )
        .unwrap();
        assert_eq!(config.mods_dir_name, "addons");
        assert_eq!(config.classifier.default_loader, "forge");
        assert_eq!(config.classifier.split_policy, SplitPolicy::HyphenAndAt);
        assert_eq!(config.classifier.filler_words, vec!["for", "mc", "minecraft"]);
        assert_eq!(
            config.classifier.loader_aliases.get("nf").map(String::as_str),
            Some("neoforge")
        );
    }
}
