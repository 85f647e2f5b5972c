use modsnap_common::{ClassifierConfig, ModRecord};

const SEPARATORS: &[char] = &['-', '_', ' ', '.', '+'];

/// Derives the key used to match a mod across two snapshots
#[derive(Debug, Clone)]
pub struct KeyResolver {
    markers: Vec<String>,
}

impl KeyResolver {
    pub fn new(prerelease_markers: &[String]) -> Self {
        Self {
            markers: prerelease_markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(&config.prerelease_markers)
    }

    /// Normalized mod name, or the raw file name when no name was recovered
    pub fn key_of(&self, record: &ModRecord) -> String {
        match record.name() {
            Some(name) => self.normalize_name(name),
            None => record.file_name.clone(),
        }
    }

    /// Cut the name at its first pre-release marker token and lowercase it,
    /// so `Foo-beta3` and `Foo` share a key
    pub fn normalize_name(&self, name: &str) -> String {
        let name = name.trim();
        let cut = self.marker_position(name).unwrap_or(name.len());
        let head = name[..cut].trim_end_matches(SEPARATORS);
        let head = if head.is_empty() { name } else { head };
        head.to_lowercase()
    }

    /// Byte offset of the first token (after the first) that is a marker, optionally
    /// followed by a numeric counter: `beta`, `beta3`, `rc1`, `pre.2`
    fn marker_position(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for (i, token) in name.split(SEPARATORS).enumerate() {
            let start = offset;
            offset += token.len() + 1;
            if i == 0 || token.is_empty() {
                continue;
            }

            let lower = token.to_lowercase();
            let is_marker = self.markers.iter().any(|marker| {
                lower
                    .strip_prefix(marker.as_str())
                    .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
            });
            if is_marker {
                return Some(start);
            }
        }
        None
    }
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}
