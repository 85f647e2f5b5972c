use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use modsnap_common::{ClassifierConfig, Snapshot};
use modsnap_core::{
    FilenameClassifier, InventoryBuilder, KeyResolver, ListedFile, ProfileListing, SnapshotDiffer,
};
use std::path::PathBuf;

const SAMPLE_NAMES: &[&str] = &[
    "sodium-fabric-mc1.20.1-0.5.3.jar",
    "examplemod-2.0.1+1.20.1-fabric.jar",
    "jei-1.20.1-forge-15.2.0.27.jar",
    "create-1.20.1-0.5.1.f.jar",
    "appleskin-fabric-mc1.20-2.5.1.jar",
    "Xaeros_Minimap_23.9.7_Fabric_1.20.jar",
    "mymod.jar",
    "betterfoliage-1.x-beta3.jar",
];

fn known_versions() -> Vec<String> {
    ["1.19.2", "1.19.4", "1.20", "1.20.1", "1.20.2", "1.20.4"]
        .iter()
        .map(|v| v.to_string())
        .collect()
}

// Helper to create per-profile listings with a version bump every few files
fn create_listings(profiles: usize, files_per_profile: usize, bump: bool) -> Vec<ProfileListing> {
    (0..profiles)
        .map(|p| {
            let profile_path = PathBuf::from(format!("/profiles/{}. Profile", p));
            let mods_path = profile_path.join("mods");
            let files = (0..files_per_profile)
                .map(|i| {
                    let patch = if bump && i % 7 == 0 { 1 } else { 0 };
                    let file_name = format!("mod{}_{}-1.0.{}+1.20.1-fabric.jar", p, i, patch);
                    ListedFile {
                        path: mods_path.join(&file_name),
                        file_name,
                        modified_at: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                    }
                })
                .collect();
            ProfileListing {
                profile_path,
                mods_path,
                files,
            }
        })
        .collect()
}

fn build_snapshot(classifier: &FilenameClassifier, keys: &KeyResolver, bump: bool) -> Snapshot {
    InventoryBuilder::new(classifier, keys)
        .build(create_listings(5, 200, bump))
        .snapshot
}

fn bench_classify(c: &mut Criterion) {
    let config = ClassifierConfig::default();
    let mut group = c.benchmark_group("classify");

    for (label, known) in [("heuristic", Vec::new()), ("catalog", known_versions())] {
        let classifier = FilenameClassifier::new(&config, known);
        group.bench_with_input(BenchmarkId::from_parameter(label), &classifier, |b, classifier| {
            b.iter(|| {
                for name in SAMPLE_NAMES {
                    black_box(classifier.classify(black_box(name)));
                }
            });
        });
    }

    group.finish();
}

fn bench_inventory(c: &mut Criterion) {
    let classifier = FilenameClassifier::new(&ClassifierConfig::default(), known_versions());
    let keys = KeyResolver::default();

    c.bench_function("inventory_5_profiles_1000_files", |b| {
        b.iter(|| {
            let inventory = InventoryBuilder::new(&classifier, &keys)
                .build(black_box(create_listings(5, 200, false)));
            black_box(inventory);
        });
    });
}

fn bench_diff(c: &mut Criterion) {
    let classifier = FilenameClassifier::new(&ClassifierConfig::default(), known_versions());
    let keys = KeyResolver::default();
    let previous = build_snapshot(&classifier, &keys, false);
    let current = build_snapshot(&classifier, &keys, true);
    let differ = SnapshotDiffer::new(keys);

    c.bench_function("diff_1000_mods", |b| {
        b.iter(|| {
            let outcome = differ.diff(black_box(&previous), black_box(&current), &[]);
            black_box(outcome);
        });
    });
}

criterion_group!(benches, bench_classify, bench_inventory, bench_diff);
criterion_main!(benches);
