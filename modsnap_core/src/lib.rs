pub mod tokenizer;
pub mod classifier;
pub mod keys;
pub mod scanner;
pub mod inventory;
pub mod differ;
pub mod report;
pub mod render;
pub mod snapshot_store;
pub mod dedupe;

pub use tokenizer::{TokenNormalizer, TokenStream, is_version_shaped};
pub use classifier::{ClassifierContext, FilenameClassifier};
pub use keys::KeyResolver;
pub use scanner::{ModsScanner, discover_profiles};
pub use inventory::{Inventory, InventoryBuilder, ListedFile, ProfileListing};
pub use differ::{DiffOutcome, DiffReport, DiffSummary, ModField, SnapshotDiffer};
pub use report::{Report, ReportBuilder, ReportKind, report_file_name};
pub use render::render;
pub use snapshot_store::{SnapshotStore, read_snapshot};
pub use dedupe::{DeletionMethod, DeletionOutcome, DuplicateDeleter};
