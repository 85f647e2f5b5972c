use modsnap_common::{ClassifierConfig, SplitPolicy};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static VERSION_SHAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:v|mc)?(?:\d+\.)+.*$").expect("Invalid VERSION_SHAPED regex")
});

/// `1.2.3`, `v2.0`, `mc1.20.1`, `1.20.x`, `0.5.1+build.5` ...
pub fn is_version_shaped(token: &str) -> bool {
    VERSION_SHAPED.is_match(token)
}

/// Tokens left after extension, filler and loader removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    /// File name without its archive extension, untouched otherwise
    pub stem: String,
    pub tokens: Vec<String>,
    /// First loader token seen, or the configured default
    pub loader: String,
    pub loader_found: bool,
}

impl TokenStream {
    /// Indices of every version-shaped token
    pub fn version_indices(&self) -> Vec<usize> {
        version_indices(&self.tokens)
    }
}

pub fn version_indices(tokens: &[String]) -> Vec<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| is_version_shaped(t))
        .map(|(i, _)| i)
        .collect()
}

/// Splits mod file names into comparable tokens
#[derive(Debug, Clone)]
pub struct TokenNormalizer {
    extensions: Vec<String>,
    filler: HashSet<String>,
    /// lowercase token -> canonical loader name (names and aliases)
    loaders: HashMap<String, String>,
    default_loader: String,
    split_policy: SplitPolicy,
}

impl TokenNormalizer {
    pub fn new(config: &ClassifierConfig) -> Self {
        let mut loaders: HashMap<String, String> = config
            .loaders
            .iter()
            .map(|l| (l.to_lowercase(), l.to_lowercase()))
            .collect();
        for (alias, loader) in &config.loader_aliases {
            loaders.insert(alias.to_lowercase(), loader.to_lowercase());
        }

        Self {
            extensions: config
                .archive_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            filler: config.filler_words.iter().map(|w| w.to_lowercase()).collect(),
            loaders,
            default_loader: config.default_loader.clone(),
            split_policy: config.split_policy,
        }
    }

    /// Drop a known archive extension, matched case-insensitively
    pub fn strip_extension<'a>(&self, file_name: &'a str) -> &'a str {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && self.extensions.contains(&ext.to_lowercase()) => {
                stem
            }
            _ => file_name,
        }
    }

    /// Whether a file name carries one of the configured archive extensions
    pub fn is_archive(&self, file_name: &str) -> bool {
        self.strip_extension(file_name).len() != file_name.len()
    }

    pub fn loader_for(&self, token: &str) -> Option<&str> {
        self.loaders.get(&token.to_lowercase()).map(String::as_str)
    }

    pub fn normalize(&self, file_name: &str) -> TokenStream {
        let stem = self.strip_extension(file_name);
        let unified = stem.replace('_', "-");
        let split_on_at = self.split_policy == SplitPolicy::HyphenAndAt;

        let mut tokens = Vec::new();
        let mut loader: Option<String> = None;

        for raw in unified.split(|c: char| c == '-' || (split_on_at && c == '@')) {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }

            let lower = token.to_lowercase();
            if self.filler.contains(&lower) {
                continue;
            }

            if let Some(found) = self.loaders.get(&lower) {
                if loader.is_none() {
                    loader = Some(found.clone());
                }
                continue;
            }

            tokens.push(token.to_string());
        }

        TokenStream {
            stem: stem.to_string(),
            tokens,
            loader_found: loader.is_some(),
            loader: loader.unwrap_or_else(|| self.default_loader.clone()),
        }
    }
}
