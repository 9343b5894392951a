// Fleet Trip Import - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod normalize;
pub mod parser;
pub mod entities;
pub mod rules;
pub mod reference;
pub mod deduplication;
pub mod validation;
pub mod reconciliation;
pub mod commit;
pub mod db;
pub mod import;

// Re-export commonly used types
pub use config::ImportConfig;
pub use normalize::normalize_key;
pub use parser::{parse_rows, RawRow, RowParser, TabSeparatedParser};
pub use entities::{Driver, DriverRegistry, Vehicle, VehicleRegistry};
pub use rules::{CommissionRule, CommissionTable};
pub use reference::{load_records, ReferenceData};
pub use deduplication::{DeduplicationEngine, DuplicateGroup};
pub use validation::RowValidator;
pub use reconciliation::{
    ImportPreview, ImportPreviewReport, ImportStatus, ImportSummary, ReconciliationEngine,
};
pub use commit::{batch_fingerprint, parse_departure_date, project_commit_set, TripRecord};
pub use db::{
    Event, MemoryTripStore, SqliteTripStore, StoredTrip, TripStore,
    setup_database, insert_event, get_events_for_entity, get_all_trips,
};
pub use import::{commit_batch, CommitOutcome, ImportSession};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
