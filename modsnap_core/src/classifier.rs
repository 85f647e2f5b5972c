//! Filename classifier.
//!
//! Mod archive names follow no schema, so identity is recovered by an ordered rule table:
//! the first *resolution* rule whose guard matches decides how name, mod version and
//! platform version are read from the token stream, then every *refinement* rule whose
//! guard matches is applied in order. Each rule is a plain function pair so it can be
//! tested on its own.

use crate::tokenizer::{is_version_shaped, version_indices, TokenNormalizer, TokenStream};
use modsnap_common::{ClassifierConfig, ModIdentity, NameOverride};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static LOOKS_LIKE_PLATFORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^1\.\d{1,2}(?:\.\d{1,2})?$").expect("Invalid LOOKS_LIKE_PLATFORM regex")
});

/// Strip a leading `mc` and a trailing `.x` wildcard
pub fn normalize_platform_token(token: &str) -> String {
    let token = token.trim();
    let token = match token.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mc") => &token[2..],
        _ => token,
    };
    strip_wildcard(token).to_string()
}

fn strip_wildcard(version: &str) -> &str {
    version
        .strip_suffix(".x")
        .or_else(|| version.strip_suffix(".X"))
        .unwrap_or(version)
}

/// Per-call classification inputs
#[derive(Debug, Clone, Default)]
pub struct ClassifierContext {
    pub default_platform_version: String,
    pub default_loader: String,
    /// Empty means "no catalog", which enables the `1.x` heuristic
    pub known_platform_versions: Vec<String>,
    pub name_overrides: Vec<NameOverride>,
}

impl ClassifierContext {
    pub fn from_config(config: &ClassifierConfig, known_platform_versions: Vec<String>) -> Self {
        Self {
            default_platform_version: config.default_platform_version.clone(),
            default_loader: config.default_loader.clone(),
            known_platform_versions,
            name_overrides: config.name_overrides.clone(),
        }
    }

    /// Whether a token names a platform version, by catalog (exact or prefix) or heuristic
    pub fn is_known_platform_version(&self, token: &str) -> bool {
        let candidate = normalize_platform_token(token);
        if candidate.is_empty() {
            return false;
        }

        if self.known_platform_versions.is_empty() {
            return LOOKS_LIKE_PLATFORM.is_match(&candidate);
        }

        let family = format!("{candidate}.");
        self.known_platform_versions
            .iter()
            .any(|known| *known == candidate || known.starts_with(&family))
    }
}

/// Working state threaded through the rule table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub stem: String,
    pub tokens: Vec<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
    /// Set when the platform slot came from a recognized platform version
    pub platform_recognized: bool,
}

impl Draft {
    pub fn from_stream(stream: &TokenStream) -> Self {
        Self {
            stem: stream.stem.clone(),
            tokens: stream.tokens.clone(),
            ..Self::default()
        }
    }
}

/// A named guard/transform pair. A transform returning `None` aborts classification.
pub struct Rule {
    pub name: &'static str,
    pub guard: fn(&Draft, &ClassifierContext) -> bool,
    pub apply: fn(&mut Draft, &ClassifierContext) -> Option<()>,
}

/// First matching rule wins
pub const RESOLUTION_RULES: &[Rule] = &[
    Rule {
        name: "compound-token",
        guard: has_compound_token,
        apply: resolve_compound_token,
    },
    Rule {
        name: "no-version-token",
        guard: has_no_version_token,
        apply: resolve_no_version_token,
    },
    Rule {
        name: "single-version-token",
        guard: has_single_version_token,
        apply: resolve_single_version_token,
    },
    Rule {
        name: "multiple-version-tokens",
        guard: has_multiple_version_tokens,
        apply: resolve_multiple_version_tokens,
    },
];

/// Every matching rule applies, in order
pub const REFINEMENT_RULES: &[Rule] = &[
    Rule {
        name: "name-override",
        guard: has_name_override,
        apply: apply_name_override,
    },
    Rule {
        name: "platform-wildcard",
        guard: has_platform_wildcard,
        apply: strip_platform_wildcard,
    },
    Rule {
        name: "platform-as-mod-version",
        guard: lacks_mod_version,
        apply: copy_platform_to_version,
    },
    Rule {
        name: "name-fallback",
        guard: lacks_name,
        apply: use_stem_as_name,
    },
];

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn join_name(tokens: &[String]) -> Option<String> {
    non_empty(&tokens.join("-"))
}

pub fn has_compound_token(draft: &Draft, _ctx: &ClassifierContext) -> bool {
    draft.tokens.iter().any(|t| t.contains('+'))
}

/// `modversion+platformversion`, possibly preceded by another version token
pub fn resolve_compound_token(draft: &mut Draft, ctx: &ClassifierContext) -> Option<()> {
    let idx = draft.tokens.iter().position(|t| t.contains('+'))?;
    let compound = draft.tokens.get(idx)?.clone();
    let (left, right) = compound.split_once('+')?;

    let preceding = idx
        .checked_sub(1)
        .and_then(|p| draft.tokens.get(p))
        .filter(|t| is_version_shaped(t))
        .cloned();

    let name_end = match preceding {
        Some(prev) if ctx.is_known_platform_version(&prev) => {
            draft.platform = non_empty(&normalize_platform_token(&prev));
            draft.platform_recognized = true;
            draft.version = non_empty(&compound);
            idx - 1
        }
        Some(prev) => {
            draft.version = match non_empty(left) {
                Some(left) => Some(format!("{prev}-{left}")),
                None => non_empty(&prev),
            };
            draft.platform = non_empty(right);
            draft.platform_recognized = ctx.is_known_platform_version(right);
            idx - 1
        }
        None => {
            draft.version = non_empty(left);
            draft.platform = non_empty(right);
            draft.platform_recognized = ctx.is_known_platform_version(right);
            idx
        }
    };

    draft.name = join_name(draft.tokens.get(..name_end)?);
    Some(())
}

pub fn has_no_version_token(draft: &Draft, _ctx: &ClassifierContext) -> bool {
    version_indices(&draft.tokens).is_empty()
}

pub fn resolve_no_version_token(draft: &mut Draft, _ctx: &ClassifierContext) -> Option<()> {
    draft.name = non_empty(&draft.stem);
    Some(())
}

pub fn has_single_version_token(draft: &Draft, _ctx: &ClassifierContext) -> bool {
    version_indices(&draft.tokens).len() == 1
}

pub fn resolve_single_version_token(draft: &mut Draft, ctx: &ClassifierContext) -> Option<()> {
    let idx = *version_indices(&draft.tokens).first()?;
    let token = draft.tokens.get(idx)?.clone();
    draft.name = join_name(draft.tokens.get(..idx)?);

    if ctx.is_known_platform_version(&token) {
        let platform = normalize_platform_token(&token);
        if draft.name.is_none() {
            draft.version = non_empty(&platform);
        }
        draft.platform = non_empty(&platform);
        draft.platform_recognized = true;
    } else {
        draft.version = non_empty(&token);
    }
    Some(())
}

pub fn has_multiple_version_tokens(draft: &Draft, _ctx: &ClassifierContext) -> bool {
    version_indices(&draft.tokens).len() >= 2
}

/// Only the first two version tokens count; ties go to the later one as platform
pub fn resolve_multiple_version_tokens(draft: &mut Draft, ctx: &ClassifierContext) -> Option<()> {
    let indices = version_indices(&draft.tokens);
    let (first, second) = (*indices.first()?, *indices.get(1)?);
    let a = draft.tokens.get(first)?.clone();
    let b = draft.tokens.get(second)?.clone();
    draft.name = join_name(draft.tokens.get(..first)?);

    let (platform, version, recognized) = match (
        ctx.is_known_platform_version(&a),
        ctx.is_known_platform_version(&b),
    ) {
        (true, false) => (a, b, true),
        (false, true) => (b, a, true),
        (both, _) => (b, a, both),
    };

    draft.platform = non_empty(&normalize_platform_token(&platform));
    draft.version = non_empty(&version);
    draft.platform_recognized = recognized;
    Some(())
}

fn override_key(stem: &str) -> String {
    stem.trim().to_lowercase().replace(['_', ' '], "-")
}

fn find_override<'a>(stem: &str, ctx: &'a ClassifierContext) -> Option<&'a NameOverride> {
    let key = override_key(stem);
    ctx.name_overrides.iter().find(|o| {
        let prefix = override_key(&o.prefix);
        !prefix.is_empty()
            && (key == prefix || key.starts_with(&format!("{prefix}-")))
    })
}

pub fn has_name_override(draft: &Draft, ctx: &ClassifierContext) -> bool {
    find_override(&draft.stem, ctx).is_some()
}

pub fn apply_name_override(draft: &mut Draft, ctx: &ClassifierContext) -> Option<()> {
    let found = find_override(&draft.stem, ctx)?;
    draft.name = non_empty(&found.name);
    Some(())
}

pub fn has_platform_wildcard(draft: &Draft, _ctx: &ClassifierContext) -> bool {
    draft
        .platform
        .as_deref()
        .is_some_and(|p| strip_wildcard(p).len() != p.len())
}

pub fn strip_platform_wildcard(draft: &mut Draft, _ctx: &ClassifierContext) -> Option<()> {
    let platform = draft.platform.take()?;
    draft.platform = non_empty(strip_wildcard(&platform));
    Some(())
}

pub fn lacks_mod_version(draft: &Draft, _ctx: &ClassifierContext) -> bool {
    draft.version.is_none() && draft.platform_recognized && draft.platform.is_some()
}

pub fn copy_platform_to_version(draft: &mut Draft, _ctx: &ClassifierContext) -> Option<()> {
    draft.version = draft.platform.clone();
    Some(())
}

pub fn lacks_name(draft: &Draft, _ctx: &ClassifierContext) -> bool {
    draft.name.is_none()
}

pub fn use_stem_as_name(draft: &mut Draft, _ctx: &ClassifierContext) -> Option<()> {
    draft.name = non_empty(&draft.stem);
    Some(())
}

/// Turns mod archive file names into [`ModIdentity`] records
#[derive(Debug, Clone)]
pub struct FilenameClassifier {
    normalizer: TokenNormalizer,
    context: ClassifierContext,
}

impl FilenameClassifier {
    pub fn new(config: &ClassifierConfig, known_platform_versions: Vec<String>) -> Self {
        Self {
            normalizer: TokenNormalizer::new(config),
            context: ClassifierContext::from_config(config, known_platform_versions),
        }
    }

    pub fn normalizer(&self) -> &TokenNormalizer {
        &self.normalizer
    }

    pub fn context(&self) -> &ClassifierContext {
        &self.context
    }

    pub fn classify(&self, file_name: &str) -> ModIdentity {
        self.classify_with(file_name, &self.context)
    }

    /// Classify against an explicit context. Never fails: an aborted rule degrades to
    /// "whole name, no version, defaults".
    pub fn classify_with(&self, file_name: &str, ctx: &ClassifierContext) -> ModIdentity {
        let stream = self.normalizer.normalize(file_name);
        match run_rules(&stream, ctx) {
            Some(draft) => self.finish(draft, &stream, ctx),
            None => {
                debug!("Classification of {:?} degraded to fallback identity", file_name);
                self.fallback(file_name, &stream, ctx)
            }
        }
    }

    fn finish(&self, draft: Draft, stream: &TokenStream, ctx: &ClassifierContext) -> ModIdentity {
        let platform_version = draft
            .platform
            .unwrap_or_else(|| ctx.default_platform_version.clone());
        ModIdentity {
            name: draft.name.unwrap_or_else(|| stream.stem.clone()),
            version: draft.version,
            valid_platform_version: ctx.is_known_platform_version(&platform_version),
            platform_version,
            loader: if stream.loader_found {
                stream.loader.clone()
            } else {
                ctx.default_loader.clone()
            },
        }
    }

    fn fallback(&self, file_name: &str, stream: &TokenStream, ctx: &ClassifierContext) -> ModIdentity {
        let name = if stream.stem.is_empty() {
            file_name.to_string()
        } else {
            stream.stem.clone()
        };
        ModIdentity {
            name,
            version: None,
            platform_version: ctx.default_platform_version.clone(),
            loader: ctx.default_loader.clone(),
            valid_platform_version: ctx.is_known_platform_version(&ctx.default_platform_version),
        }
    }
}

fn run_rules(stream: &TokenStream, ctx: &ClassifierContext) -> Option<Draft> {
    let mut draft = Draft::from_stream(stream);

    let rule = RESOLUTION_RULES.iter().find(|r| (r.guard)(&draft, ctx))?;
    debug!("{:?}: resolved by rule {}", stream.stem, rule.name);
    (rule.apply)(&mut draft, ctx)?;

    for rule in REFINEMENT_RULES {
        if (rule.guard)(&draft, ctx) {
            debug!("{:?}: refined by rule {}", stream.stem, rule.name);
            (rule.apply)(&mut draft, ctx)?;
        }
    }

    Some(draft)
}
