use crate::keys::KeyResolver;
use chrono::{DateTime, Utc};
use modsnap_common::{DuplicateEntry, ModRecord, ProfileInventory, Snapshot};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Timestamp format used wherever a modification time is shown as text
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// A compared attribute of a mod record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModField {
    FileName,
    ModifiedAt,
    Name,
    Version,
    PlatformVersion,
    Loader,
}

impl ModField {
    pub const ALL: [ModField; 6] = [
        ModField::FileName,
        ModField::ModifiedAt,
        ModField::Name,
        ModField::Version,
        ModField::PlatformVersion,
        ModField::Loader,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ModField::FileName => "File",
            ModField::ModifiedAt => "Modified",
            ModField::Name => "Mod",
            ModField::Version => "Version",
            ModField::PlatformVersion => "Platform",
            ModField::Loader => "Loader",
        }
    }

    /// The field's value as text; `None` when the record lacks it
    pub fn value_of(&self, record: &ModRecord) -> Option<String> {
        match self {
            ModField::FileName => Some(record.file_name.clone()),
            ModField::ModifiedAt => Some(format_timestamp(&record.modified_at)),
            ModField::Name => record.name().map(str::to_string),
            ModField::Version => record.version().map(str::to_string),
            ModField::PlatformVersion => record.platform_version().map(str::to_string),
            ModField::Loader => record.loader().map(str::to_string),
        }
    }

    fn differs(&self, old: &ModRecord, new: &ModRecord) -> bool {
        match self {
            ModField::ModifiedAt => old.modified_at != new.modified_at,
            _ => self.value_of(old) != self.value_of(new),
        }
    }
}

/// One changed field; `old` is what the report shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: ModField,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// A mod present in both snapshots whose record changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedMod {
    pub record: ModRecord,
    pub changed_fields: Vec<FieldChange>,
}

impl UpdatedMod {
    pub fn change(&self, field: ModField) -> Option<&FieldChange> {
        self.changed_fields.iter().find(|c| c.field == field)
    }
}

/// Per-profile change set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileChanges {
    pub profile: String,
    pub added: Vec<ModRecord>,
    pub removed: Vec<ModRecord>,
    pub updated: Vec<UpdatedMod>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Header counts. Profile counts are numbers of affected profiles, not of mods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DiffSummary {
    pub profiles_with_added: usize,
    pub profiles_with_removed: usize,
    pub profiles_with_updated: usize,
    pub duplicates_deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// Profiles only in the current snapshot
    pub added_profiles: Vec<ProfileInventory>,
    /// Profiles only in the previous snapshot
    pub removed_profiles: Vec<ProfileInventory>,
    /// Profiles in both snapshots with at least one change
    pub changed_profiles: Vec<ProfileChanges>,
    pub duplicates: Vec<DuplicateEntry>,
    pub summary: DiffSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    Changes(DiffReport),
    NoDifferences,
}

/// Compares two snapshots profile by profile
pub struct SnapshotDiffer {
    keys: KeyResolver,
}

impl SnapshotDiffer {
    pub fn new(keys: KeyResolver) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyResolver {
        &self.keys
    }

    pub fn diff(
        &self,
        previous: &Snapshot,
        current: &Snapshot,
        duplicates: &[DuplicateEntry],
    ) -> DiffOutcome {
        info!(
            "Diffing {} previous profiles against {} current profiles",
            previous.profiles.len(),
            current.profiles.len()
        );

        let old_profiles = index_profiles(previous);
        let new_names: HashSet<String> = current.profiles.iter().map(|p| p.name()).collect();

        let mut added_profiles = Vec::new();
        let mut changed_profiles = Vec::new();
        let mut seen = HashSet::new();

        for profile in &current.profiles {
            let name = profile.name();
            if !seen.insert(name.clone()) {
                debug!("Ignoring repeated profile {}", name);
                continue;
            }

            match old_profiles.get(name.as_str()) {
                None => added_profiles.push(profile.clone()),
                Some(old) => {
                    let changes = self.diff_profile(&name, old, profile);
                    if !changes.is_empty() {
                        changed_profiles.push(changes);
                    }
                }
            }
        }

        let mut removed_seen = HashSet::new();
        let removed_profiles: Vec<ProfileInventory> = previous
            .profiles
            .iter()
            .filter(|p| {
                let name = p.name();
                !new_names.contains(&name) && removed_seen.insert(name)
            })
            .cloned()
            .collect();

        if added_profiles.is_empty()
            && removed_profiles.is_empty()
            && changed_profiles.is_empty()
            && duplicates.is_empty()
        {
            info!("No differences between snapshots");
            return DiffOutcome::NoDifferences;
        }

        let summary = summarize(&added_profiles, &removed_profiles, &changed_profiles, duplicates);
        info!(
            "Profiles with added mods: {}, removed: {}, updated: {}, duplicates: {}",
            summary.profiles_with_added,
            summary.profiles_with_removed,
            summary.profiles_with_updated,
            summary.duplicates_deleted
        );

        DiffOutcome::Changes(DiffReport {
            added_profiles,
            removed_profiles,
            changed_profiles,
            duplicates: duplicates.to_vec(),
            summary,
        })
    }

    /// Added/removed/updated mods of one profile present in both snapshots
    pub fn diff_profile(
        &self,
        profile: &str,
        old: &ProfileInventory,
        new: &ProfileInventory,
    ) -> ProfileChanges {
        let old_by_key = self.index_mods(&old.mods);
        let new_by_key = self.index_mods(&new.mods);

        let mut added = Vec::new();
        let mut updated = Vec::new();
        let mut emitted = HashSet::new();

        for record in &new.mods {
            let key = self.keys.key_of(record);
            if !emitted.insert(key.clone()) {
                continue;
            }
            match old_by_key.get(key.as_str()) {
                None => {
                    debug!("{}: added {}", profile, key);
                    added.push(record.clone());
                }
                Some(previous) => {
                    let changed_fields = changed_fields(previous, record);
                    if !changed_fields.is_empty() {
                        debug!("{}: updated {} ({} fields)", profile, key, changed_fields.len());
                        updated.push(UpdatedMod {
                            record: record.clone(),
                            changed_fields,
                        });
                    }
                }
            }
        }

        let mut removed_keys = HashSet::new();
        let removed = old
            .mods
            .iter()
            .filter(|record| {
                let key = self.keys.key_of(record);
                !new_by_key.contains_key(key.as_str()) && removed_keys.insert(key)
            })
            .cloned()
            .collect();

        ProfileChanges {
            profile: profile.to_string(),
            added,
            removed,
            updated,
        }
    }

    /// Key -> first record with that key
    fn index_mods<'a>(&self, mods: &'a [ModRecord]) -> HashMap<String, &'a ModRecord> {
        let mut map = HashMap::with_capacity(mods.len());
        for record in mods {
            map.entry(self.keys.key_of(record)).or_insert(record);
        }
        map
    }
}

impl Default for SnapshotDiffer {
    fn default() -> Self {
        Self::new(KeyResolver::default())
    }
}

/// Fields that differ between two records, carrying both values
pub fn changed_fields(old: &ModRecord, new: &ModRecord) -> Vec<FieldChange> {
    ModField::ALL
        .iter()
        .filter(|field| field.differs(old, new))
        .map(|field| FieldChange {
            field: *field,
            old: field.value_of(old),
            new: field.value_of(new),
        })
        .collect()
}

fn index_profiles(snapshot: &Snapshot) -> HashMap<String, &ProfileInventory> {
    let mut map = HashMap::with_capacity(snapshot.profiles.len());
    for profile in &snapshot.profiles {
        map.entry(profile.name()).or_insert(profile);
    }
    map
}

fn summarize(
    added_profiles: &[ProfileInventory],
    removed_profiles: &[ProfileInventory],
    changed_profiles: &[ProfileChanges],
    duplicates: &[DuplicateEntry],
) -> DiffSummary {
    let new_with_mods = added_profiles.iter().filter(|p| !p.mods.is_empty()).count();
    let gone_with_mods = removed_profiles.iter().filter(|p| !p.mods.is_empty()).count();

    DiffSummary {
        profiles_with_added: new_with_mods
            + changed_profiles.iter().filter(|c| !c.added.is_empty()).count(),
        profiles_with_removed: gone_with_mods
            + changed_profiles.iter().filter(|c| !c.removed.is_empty()).count(),
        profiles_with_updated: changed_profiles.iter().filter(|c| !c.updated.is_empty()).count(),
        duplicates_deleted: duplicates.len(),
    }
}
