use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use modsnap_common::{
    ensure_config, load_config, load_config_from, report_dir, resolve_known_versions,
    save_config, snapshot_path, AppConfig, DuplicateEntry, LoadedConfig, ModIdentity,
};
use modsnap_core::{
    discover_profiles, read_snapshot, render, DeletionOutcome, DiffSummary, DuplicateDeleter,
    FilenameClassifier, InventoryBuilder, KeyResolver, ModsScanner, Report, ReportBuilder,
    ReportKind, SnapshotDiffer, SnapshotStore,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modsnap")]
#[command(author = "ModSnap Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Classify mod archives and report changes between profile snapshots", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep config and data next to the executable
    #[arg(long, global = true)]
    portable: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan profiles, write a report and save the new snapshot
    Scan(ScanArgs),

    /// Classify mod file names and print their identities
    Classify {
        /// File names to classify
        #[arg(required = true)]
        file_names: Vec<String>,

        /// Known platform versions (JSON array or one per line)
        #[arg(short = 'k', long)]
        known_versions: Option<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a report from two snapshot files
    Diff {
        /// Previous snapshot (missing or unreadable is treated as no snapshot)
        previous: PathBuf,

        /// Current snapshot
        current: PathBuf,

        /// Always render the full inventory
        #[arg(long)]
        full: bool,
    },

    /// Write the default config file if none exists and print its path
    InitConfig,
}

#[derive(Args, Debug, Default)]
struct ScanArgs {
    /// Directory whose sub-directories are profiles
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Profile directory, in scan order (can be specified multiple times)
    #[arg(short, long = "profile")]
    profiles: Vec<PathBuf>,

    /// Snapshot file to compare against and overwrite
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Directory receiving the report file
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Known platform versions (JSON array or one per line)
    #[arg(short = 'k', long)]
    known_versions: Option<PathBuf>,

    /// Ignore patterns for mod files (can be specified multiple times)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Delete duplicate files after the report is written
    #[arg(long)]
    delete_duplicates: bool,

    /// Delete permanently instead of moving to the trash
    #[arg(long, requires = "delete_duplicates")]
    permanent: bool,

    /// Log deletions without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Always write the full inventory report
    #[arg(long)]
    full: bool,

    /// Also print the report to stdout
    #[arg(long, conflicts_with = "json")]
    print: bool,

    /// Output a JSON summary on stdout
    #[arg(long)]
    json: bool,
}

fn main() {
    // Initialize tracing to stderr (so report and JSON output go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan(args) => {
            load(cli.config, cli.portable).and_then(|loaded| run_scan(args, loaded))
        }
        Commands::Classify {
            file_names,
            known_versions,
            json,
        } => load(cli.config, cli.portable)
            .and_then(|loaded| run_classify(&file_names, known_versions, json, loaded.config)),
        Commands::Diff {
            previous,
            current,
            full,
        } => load(cli.config, cli.portable)
            .and_then(|loaded| run_diff(&previous, &current, full, &loaded.config)),
        Commands::InitConfig => run_init_config(cli.config, cli.portable),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load(config: Option<PathBuf>, portable: bool) -> Result<LoadedConfig> {
    let loaded = match config {
        Some(path) => load_config_from(path, portable)?,
        None => load_config(portable)?,
    };
    info!("Using config {}", loaded.path.display());
    Ok(loaded)
}

/// Command-line flags take precedence over the config file
fn apply_scan_overrides(config: &mut AppConfig, args: &ScanArgs) {
    if let Some(root) = &args.root {
        config.profiles_root = Some(root.clone());
        config.profiles.clear();
    }
    if !args.profiles.is_empty() {
        config.profiles = args.profiles.clone();
    }
    if let Some(snapshot) = &args.snapshot {
        config.snapshot_path = Some(snapshot.clone());
    }
    if let Some(dir) = &args.report_dir {
        config.report_dir = Some(dir.clone());
    }
    if let Some(known) = &args.known_versions {
        config.classifier.known_versions_file = Some(known.clone());
    }
    config.ignore_patterns.extend(args.ignore.iter().cloned());
}

fn run_scan(args: ScanArgs, mut loaded: LoadedConfig) -> Result<()> {
    apply_scan_overrides(&mut loaded.config, &args);
    let config = &loaded.config;

    let known = resolve_known_versions(&config.classifier)
        .context("Failed to load known platform versions")?;
    info!("Loaded {} known platform versions", known.len());

    let classifier = FilenameClassifier::new(&config.classifier, known);
    let keys = KeyResolver::from_config(&config.classifier);
    let scanner = ModsScanner::new(config);

    let profiles = discover_profiles(config)?;
    info!("Scanning {} profiles", profiles.len());

    let mut listings = Vec::with_capacity(profiles.len());
    for profile in &profiles {
        let _span = info_span!("scan", profile = %profile.display()).entered();
        let listing = scanner
            .scan_profile(profile)
            .with_context(|| format!("Failed to scan profile {}", profile.display()))?;
        listings.push(listing);
    }

    let inventory = InventoryBuilder::new(&classifier, &keys).build(listings);

    let snapshot_file = snapshot_path(&loaded)?;
    let store = SnapshotStore::new(snapshot_file.clone());
    let previous = store.load_previous();

    let differ = SnapshotDiffer::new(keys);
    let report = ReportBuilder::new(&differ).force_full(args.full).build(
        previous.as_ref(),
        inventory.snapshot.clone(),
        inventory.duplicates.clone(),
        Utc::now(),
    );

    let reports = report_dir(&loaded)?;
    let text = render(&report);
    let report_path = write_report(&reports, &report, &text)?;
    info!("Wrote {} report to {}", report.kind().as_str(), report_path.display());

    store
        .save(&inventory.snapshot)
        .with_context(|| format!("Failed to save snapshot {}", snapshot_file.display()))?;
    info!(
        "Saved snapshot ({} profiles, {} mods) to {}",
        inventory.snapshot.profiles.len(),
        inventory.snapshot.mod_count(),
        snapshot_file.display()
    );

    let deletions = if args.delete_duplicates {
        DuplicateDeleter::new(args.dry_run, !args.permanent).delete_all(&inventory.duplicates)
    } else {
        if !inventory.duplicates.is_empty() {
            info!(
                "{} duplicates found; pass --delete-duplicates to remove them",
                inventory.duplicates.len()
            );
        }
        Vec::new()
    };

    if args.json {
        let output = ScanOutput {
            report_kind: report.kind(),
            report_path: report_path.to_string_lossy().to_string(),
            snapshot_path: snapshot_file.to_string_lossy().to_string(),
            profiles: inventory.snapshot.profiles.len(),
            mods: inventory.snapshot.mod_count(),
            summary: diff_summary(&report),
            duplicates: inventory.duplicates.iter().map(json_duplicate).collect(),
            deletions,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if args.print {
        print!("{text}");
    }

    Ok(())
}

fn write_report(dir: &Path, report: &Report, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
    let path = dir.join(report.file_name());
    fs::write(&path, text).with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(path)
}

fn run_classify(
    file_names: &[String],
    known_versions: Option<PathBuf>,
    json: bool,
    mut config: AppConfig,
) -> Result<()> {
    if known_versions.is_some() {
        config.classifier.known_versions_file = known_versions;
    }
    let known = resolve_known_versions(&config.classifier)
        .context("Failed to load known platform versions")?;
    let classifier = FilenameClassifier::new(&config.classifier, known);
    let rows = classify_rows(&classifier, file_names);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        println!("{}", format_row(row));
    }
    Ok(())
}

fn run_diff(previous: &Path, current: &Path, full: bool, config: &AppConfig) -> Result<()> {
    let previous = SnapshotStore::new(previous.to_path_buf()).load_previous();
    let current = read_snapshot(current)
        .with_context(|| format!("Failed to read current snapshot {}", current.display()))?;

    let differ = SnapshotDiffer::new(KeyResolver::from_config(&config.classifier));
    let report = ReportBuilder::new(&differ)
        .force_full(full)
        .build(previous.as_ref(), current, Vec::new(), Utc::now());

    print!("{}", render(&report));
    Ok(())
}

fn run_init_config(config: Option<PathBuf>, portable: bool) -> Result<()> {
    let loaded = match config {
        Some(path) => {
            let loaded = load_config_from(path, portable)?;
            if !loaded.exists {
                save_config(&loaded.path, &loaded.config)?;
            }
            loaded
        }
        None => ensure_config(portable)?,
    };

    if loaded.exists {
        info!("Config already exists");
    } else {
        info!("Wrote default config");
    }
    println!("{}", loaded.path.display());
    Ok(())
}

#[derive(Serialize)]
struct ScanOutput {
    report_kind: ReportKind,
    report_path: String,
    snapshot_path: String,
    profiles: usize,
    mods: usize,
    summary: Option<DiffSummary>,
    duplicates: Vec<JsonDuplicate>,
    deletions: Vec<DeletionOutcome>,
}

#[derive(Serialize)]
struct JsonDuplicate {
    profile: String,
    file_name: String,
    path: String,
    kept: Option<String>,
}

#[derive(Serialize)]
struct ClassifyRow {
    file_name: String,
    #[serde(flatten)]
    identity: ModIdentity,
}

fn diff_summary(report: &Report) -> Option<DiffSummary> {
    match report {
        Report::Diff { diff, .. } => Some(diff.summary),
        _ => None,
    }
}

fn json_duplicate(entry: &DuplicateEntry) -> JsonDuplicate {
    JsonDuplicate {
        profile: entry.profile.clone(),
        file_name: entry.file_name.clone(),
        path: entry.path.to_string_lossy().to_string(),
        kept: entry
            .existing_owner
            .as_ref()
            .map(|owner| owner.file_path.to_string_lossy().to_string()),
    }
}

fn classify_rows(classifier: &FilenameClassifier, file_names: &[String]) -> Vec<ClassifyRow> {
    file_names
        .iter()
        .map(|file_name| ClassifyRow {
            file_name: file_name.clone(),
            identity: classifier.classify(file_name),
        })
        .collect()
}

fn format_row(row: &ClassifyRow) -> String {
    let identity = &row.identity;
    let platform_mark = if identity.valid_platform_version { "" } else { "?" };
    format!(
        "{}\n  name={} version={} platform={}{} loader={}",
        row.file_name,
        identity.name,
        identity.version.as_deref().unwrap_or("-"),
        identity.platform_version,
        platform_mark,
        identity.loader
    )
}
