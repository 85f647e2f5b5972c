use crate::classifier::FilenameClassifier;
use crate::keys::KeyResolver;
use chrono::{DateTime, Utc};
use modsnap_common::{profile_name, DuplicateEntry, ModRecord, ProfileInventory, Snapshot};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, info_span};

/// One file as seen by the directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub file_name: String,
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
}

/// Raw listing of one profile, in directory order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileListing {
    pub profile_path: PathBuf,
    pub mods_path: PathBuf,
    pub files: Vec<ListedFile>,
}

/// Current snapshot plus the files that lost ownership while building it
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub snapshot: Snapshot,
    pub duplicates: Vec<DuplicateEntry>,
}

/// Classifies listings into a snapshot and detects duplicates.
///
/// Listings must arrive in a fixed profile order: a file name seen in an earlier
/// profile owns it, later occurrences become duplicates. Inside one profile, two
/// files resolving to the same identity key keep the most recently modified one.
pub struct InventoryBuilder<'a> {
    classifier: &'a FilenameClassifier,
    keys: &'a KeyResolver,
}

impl<'a> InventoryBuilder<'a> {
    pub fn new(classifier: &'a FilenameClassifier, keys: &'a KeyResolver) -> Self {
        Self { classifier, keys }
    }

    pub fn classify_file(&self, file: &ListedFile) -> ModRecord {
        ModRecord {
            file_name: file.file_name.clone(),
            file_path: file.path.clone(),
            modified_at: file.modified_at,
            identity: Some(self.classifier.classify(&file.file_name)),
        }
    }

    pub fn build(&self, listings: Vec<ProfileListing>) -> Inventory {
        let mut owners: HashMap<String, ModRecord> = HashMap::new();
        let mut profiles = Vec::with_capacity(listings.len());
        let mut duplicates = Vec::new();

        for listing in listings {
            let profile = profile_name(&listing.profile_path);
            let _span = info_span!("profile", name = %profile).entered();

            let mut inventory = ProfileInventory::new(listing.profile_path, listing.mods_path);
            let mut by_key: HashMap<String, usize> = HashMap::new();

            for file in &listing.files {
                let record = self.classify_file(file);

                if let Some(owner) = owners.get(&record.file_name) {
                    debug!("{} already owned by {:?}", record.file_name, owner.file_path);
                    duplicates.push(duplicate_of(&profile, &record, owner));
                    continue;
                }

                let key = self.keys.key_of(&record);
                match by_key.get(&key).copied() {
                    Some(idx) => {
                        let existing = &inventory.mods[idx];
                        if record.modified_at > existing.modified_at {
                            debug!("{} supersedes {} (key {})", record.file_name, existing.file_name, key);
                            let displaced = std::mem::replace(&mut inventory.mods[idx], record.clone());
                            owners.remove(&displaced.file_name);
                            owners.insert(record.file_name.clone(), record.clone());
                            duplicates.push(duplicate_of(&profile, &displaced, &record));
                        } else {
                            debug!("{} duplicates {} (key {})", record.file_name, existing.file_name, key);
                            duplicates.push(duplicate_of(&profile, &record, existing));
                        }
                    }
                    None => {
                        by_key.insert(key, inventory.mods.len());
                        owners.insert(record.file_name.clone(), record.clone());
                        inventory.mods.push(record);
                    }
                }
            }

            info!("Profile {}: {} mods", profile, inventory.mods.len());
            profiles.push(inventory);
        }

        info!(
            "Gathered {} profiles, {} duplicates",
            profiles.len(),
            duplicates.len()
        );

        Inventory {
            snapshot: Snapshot::new(profiles),
            duplicates,
        }
    }
}

fn duplicate_of(profile: &str, record: &ModRecord, owner: &ModRecord) -> DuplicateEntry {
    DuplicateEntry {
        profile: profile.to_string(),
        file_name: record.file_name.clone(),
        path: record.file_path.clone(),
        existing_owner: Some(owner.clone()),
    }
}
