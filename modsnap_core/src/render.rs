use crate::differ::{format_timestamp, DiffReport, DiffSummary, ProfileChanges, UpdatedMod};
use crate::report::Report;
use chrono::{DateTime, Utc};
use modsnap_common::{DuplicateEntry, ModRecord, ProfileInventory, Snapshot};
use std::collections::BTreeMap;

const RULE_WIDTH: usize = 80;
const INDENT: &str = "  ";
const FIELD_SEPARATOR: &str = "--";

/// Indentation-aware line buffer
#[derive(Debug, Default)]
struct Outline {
    text: String,
}

impl Outline {
    fn line(&mut self, level: usize, content: impl AsRef<str>) {
        for _ in 0..level {
            self.text.push_str(INDENT);
        }
        self.text.push_str(content.as_ref());
        self.text.push('\n');
    }

    fn blank(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with("\n\n") {
            self.text.push('\n');
        }
    }

    fn rule(&mut self) {
        self.line(0, "=".repeat(RULE_WIDTH));
    }

    fn finish(self) -> String {
        self.text
    }
}

/// Render a report model as plain text
pub fn render(report: &Report) -> String {
    let mut out = Outline::default();

    match report {
        Report::FirstSnapshot {
            generated_at,
            current,
            duplicates,
        } => {
            header(&mut out, "ModSnap First Snapshot", generated_at);
            out.line(
                0,
                format!(
                    "First snapshot: {} profile(s), {} mod(s) recorded. Nothing to compare yet.",
                    current.profiles.len(),
                    current.mod_count()
                ),
            );
            out.rule();
            render_duplicates(&mut out, duplicates);
        }
        Report::Diff { generated_at, diff } => {
            header(&mut out, "ModSnap Diff Report", generated_at);
            out.line(0, summary_line(&diff.summary));
            out.rule();
            render_diff(&mut out, diff);
        }
        Report::Full {
            generated_at,
            current,
            duplicates,
        } => {
            header(&mut out, "ModSnap Full Report", generated_at);
            render_full(&mut out, current);
            render_duplicates(&mut out, duplicates);
        }
    }

    out.finish()
}

fn header(out: &mut Outline, title: &str, generated_at: &DateTime<Utc>) {
    out.line(0, title);
    out.line(0, format!("Generated: {}", format_timestamp(generated_at)));
}

fn summary_line(summary: &DiffSummary) -> String {
    format!(
        "Summary: {} profile(s) with additions, {} with removals, {} with updates, {} duplicate(s) deleted",
        summary.profiles_with_added,
        summary.profiles_with_removed,
        summary.profiles_with_updated,
        summary.duplicates_deleted
    )
}

fn render_full(out: &mut Outline, snapshot: &Snapshot) {
    out.line(
        0,
        format!(
            "Profiles: {}, Mods: {}",
            snapshot.profiles.len(),
            snapshot.mod_count()
        ),
    );
    out.rule();

    if snapshot.is_empty() {
        out.blank();
        out.line(0, "No snapshot data available.");
        return;
    }

    for profile in &snapshot.profiles {
        out.blank();
        out.line(0, format!("Profile: {}", profile.name()));
        mod_section(out, 1, "Mods", &profile.mods);
    }
}

fn render_diff(out: &mut Outline, diff: &DiffReport) {
    for profile in &diff.added_profiles {
        listed_profile(out, profile, "New Profile", "Discovered");
    }
    for changes in &diff.changed_profiles {
        changed_profile(out, changes);
    }
    for profile in &diff.removed_profiles {
        listed_profile(out, profile, "Removed Profile", "Removed");
    }
    render_duplicates(out, &diff.duplicates);
}

fn listed_profile(out: &mut Outline, profile: &ProfileInventory, marker: &str, section: &str) {
    out.blank();
    out.line(0, format!("Profile: {} ({})", profile.name(), marker));
    mod_section(out, 1, section, &profile.mods);
}

fn changed_profile(out: &mut Outline, changes: &ProfileChanges) {
    out.blank();
    out.line(0, format!("Profile: {}", changes.profile));
    if !changes.added.is_empty() {
        mod_section(out, 1, "Added", &changes.added);
    }
    if !changes.removed.is_empty() {
        mod_section(out, 1, "Removed", &changes.removed);
    }
    if !changes.updated.is_empty() {
        out.line(1, format!("Updated ({}):", changes.updated.len()));
        for update in &changes.updated {
            updated_mod(out, 2, update);
        }
    }
}

fn mod_section(out: &mut Outline, level: usize, title: &str, mods: &[ModRecord]) {
    out.line(level, format!("{} ({}):", title, mods.len()));
    for record in mods {
        mod_detail(out, level + 1, record);
    }
}

fn updated_mod(out: &mut Outline, level: usize, update: &UpdatedMod) {
    mod_detail(out, level, &update.record);
    out.line(level + 1, "Previously:");
    for change in &update.changed_fields {
        out.line(
            level + 2,
            format!(
                "{}: {}",
                change.field.label(),
                change.old.as_deref().unwrap_or("(none)")
            ),
        );
    }
}

/// File line, then modified time, mod fields, a separator, and platform fields.
/// Identity fields are only printed when present.
fn mod_detail(out: &mut Outline, level: usize, record: &ModRecord) {
    out.line(level, format!("- {}", record.file_name));
    out.line(level + 1, format!("Modified: {}", format_timestamp(&record.modified_at)));

    let mut mod_lines = Vec::new();
    if let Some(name) = record.name() {
        mod_lines.push(format!("Mod: {}", name));
    }
    if let Some(version) = record.version() {
        mod_lines.push(format!("Version: {}", version));
    }

    let mut platform_lines = Vec::new();
    if let Some(platform) = record.platform_version() {
        let recognized = record
            .identity
            .as_ref()
            .is_some_and(|identity| identity.valid_platform_version);
        if recognized {
            platform_lines.push(format!("Platform: {}", platform));
        } else {
            platform_lines.push(format!("Platform: {} (unrecognized)", platform));
        }
    }
    if let Some(loader) = record.loader() {
        platform_lines.push(format!("Loader: {}", loader));
    }

    for line in &mod_lines {
        out.line(level + 1, line);
    }
    if !mod_lines.is_empty() && !platform_lines.is_empty() {
        out.line(level + 1, FIELD_SEPARATOR);
    }
    for line in &platform_lines {
        out.line(level + 1, line);
    }
}

fn render_duplicates(out: &mut Outline, duplicates: &[DuplicateEntry]) {
    if duplicates.is_empty() {
        return;
    }

    // Group by profile, keeping first-appearance order of profiles
    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<&DuplicateEntry>> = BTreeMap::new();
    for entry in duplicates {
        let group = groups.entry(entry.profile.as_str()).or_default();
        if group.is_empty() {
            order.push(entry.profile.as_str());
        }
        group.push(entry);
    }

    out.blank();
    out.line(0, format!("Duplicates Deleted ({}):", duplicates.len()));
    for profile in order {
        out.line(1, format!("Profile: {}", profile));
        for entry in groups.get(profile).into_iter().flatten() {
            out.line(2, format!("- {}", entry.file_name));
            out.line(3, format!("Path: {}", entry.path.display()));
            if let Some(owner) = &entry.existing_owner {
                out.line(
                    3,
                    format!("Kept: {} ({})", owner.file_name, owner.file_path.display()),
                );
            }
        }
    }
}
