use crate::differ::{DiffOutcome, DiffReport, SnapshotDiffer};
use chrono::{DateTime, Utc};
use modsnap_common::{DuplicateEntry, Snapshot};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// No predecessor to compare against
    First,
    Diff,
    Full,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::First => "first",
            ReportKind::Diff => "diff",
            ReportKind::Full => "full",
        }
    }
}

/// Everything the renderer needs, with the generation time fixed up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    FirstSnapshot {
        generated_at: DateTime<Utc>,
        current: Snapshot,
        duplicates: Vec<DuplicateEntry>,
    },
    Diff {
        generated_at: DateTime<Utc>,
        diff: DiffReport,
    },
    Full {
        generated_at: DateTime<Utc>,
        current: Snapshot,
        duplicates: Vec<DuplicateEntry>,
    },
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::FirstSnapshot { .. } => ReportKind::First,
            Report::Diff { .. } => ReportKind::Diff,
            Report::Full { .. } => ReportKind::Full,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        match self {
            Report::FirstSnapshot { generated_at, .. }
            | Report::Diff { generated_at, .. }
            | Report::Full { generated_at, .. } => *generated_at,
        }
    }

    pub fn duplicates(&self) -> &[DuplicateEntry] {
        match self {
            Report::FirstSnapshot { duplicates, .. } | Report::Full { duplicates, .. } => duplicates,
            Report::Diff { diff, .. } => &diff.duplicates,
        }
    }

    pub fn file_name(&self) -> String {
        report_file_name(self.kind(), self.generated_at())
    }
}

/// Picks the report shape for one run
pub struct ReportBuilder<'a> {
    differ: &'a SnapshotDiffer,
    force_full: bool,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(differ: &'a SnapshotDiffer) -> Self {
        Self {
            differ,
            force_full: false,
        }
    }

    pub fn force_full(mut self, force_full: bool) -> Self {
        self.force_full = force_full;
        self
    }

    /// A missing or empty previous snapshot yields the first-snapshot shell; a diff
    /// without differences falls back to the full inventory.
    pub fn build(
        &self,
        previous: Option<&Snapshot>,
        current: Snapshot,
        duplicates: Vec<DuplicateEntry>,
        generated_at: DateTime<Utc>,
    ) -> Report {
        if self.force_full {
            info!("Full report requested");
            return Report::Full {
                generated_at,
                current,
                duplicates,
            };
        }

        let previous = match previous {
            Some(previous) if !previous.is_empty() => previous,
            _ => {
                info!("No previous snapshot, writing first-snapshot report");
                return Report::FirstSnapshot {
                    generated_at,
                    current,
                    duplicates,
                };
            }
        };

        match self.differ.diff(previous, &current, &duplicates) {
            DiffOutcome::Changes(diff) => Report::Diff { generated_at, diff },
            DiffOutcome::NoDifferences => Report::Full {
                generated_at,
                current,
                duplicates,
            },
        }
    }
}

/// `modsnap-<kind>-YYYYmmdd-HHMMSS.txt`
pub fn report_file_name(kind: ReportKind, now: DateTime<Utc>) -> String {
    format!("modsnap-{}-{}.txt", kind.as_str(), now.format("%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use modsnap_common::{ModRecord, ProfileInventory};
    use std::path::PathBuf;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn snapshot(files: &[&str]) -> Snapshot {
        let mut profile = ProfileInventory::new(PathBuf::from("/p/Main"), PathBuf::from("/p/Main/mods"));
        profile.mods = files
            .iter()
            .map(|f| ModRecord {
                file_name: f.to_string(),
                ..ModRecord::default()
            })
            .collect();
        Snapshot {
            created_at: None,
            profiles: vec![profile],
        }
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name(ReportKind::Diff, now()),
            "modsnap-diff-20240309-140507.txt"
        );
        assert_eq!(
            report_file_name(ReportKind::First, now()),
            "modsnap-first-20240309-140507.txt"
        );
    }

    #[test]
    fn test_missing_or_empty_previous_is_first_snapshot() {
        let differ = SnapshotDiffer::default();
        let builder = ReportBuilder::new(&differ);

        let report = builder.build(None, snapshot(&["a.jar"]), Vec::new(), now());
        assert_eq!(report.kind(), ReportKind::First);

        let empty = Snapshot::default();
        let report = builder.build(Some(&empty), snapshot(&["a.jar"]), Vec::new(), now());
        assert_eq!(report.kind(), ReportKind::First);
    }

    #[test]
    fn test_no_differences_falls_back_to_full() {
        let differ = SnapshotDiffer::default();
        let previous = snapshot(&["a.jar"]);
        let report = ReportBuilder::new(&differ).build(Some(&previous), snapshot(&["a.jar"]), Vec::new(), now());
        assert_eq!(report.kind(), ReportKind::Full);
        assert_eq!(report.file_name(), "modsnap-full-20240309-140507.txt");
    }

    #[test]
    fn test_changes_produce_diff_and_force_full_overrides() {
        let differ = SnapshotDiffer::default();
        let previous = snapshot(&["a.jar"]);

        let report = ReportBuilder::new(&differ).build(Some(&previous), snapshot(&["a.jar", "b.jar"]), Vec::new(), now());
        assert_eq!(report.kind(), ReportKind::Diff);
        assert_eq!(report.generated_at(), now());

        let report = ReportBuilder::new(&differ)
            .force_full(true)
            .build(Some(&previous), snapshot(&["a.jar", "b.jar"]), Vec::new(), now());
        assert_eq!(report.kind(), ReportKind::Full);
    }
}
