// 📚 Reference Data - Vehicles, drivers and commission rules snapshot
//
// Fetched once per import session and passed explicitly into the
// reconciler. Nothing refreshes it while a preview is computed.

use crate::entities::{Driver, DriverRegistry, Vehicle, VehicleRegistry};
use crate::rules::{CommissionRule, CommissionTable};
use anyhow::{bail, Context, Result};
use log::info;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub vehicles: VehicleRegistry,
    pub drivers: DriverRegistry,
    pub rules: CommissionTable,
}

impl ReferenceData {
    pub fn new(vehicles: Vec<Vehicle>, drivers: Vec<Driver>, rules: Vec<CommissionRule>) -> Self {
        ReferenceData {
            vehicles: VehicleRegistry::new(vehicles),
            drivers: DriverRegistry::new(drivers),
            rules: CommissionTable::from_rules(rules),
        }
    }

    /// Load all three snapshots from files (CSV with headers, or JSON arrays)
    pub fn load(vehicles_path: &Path, drivers_path: &Path, rules_path: &Path) -> Result<Self> {
        let vehicles: Vec<Vehicle> = load_records(vehicles_path)?;
        let drivers: Vec<Driver> = load_records(drivers_path)?;
        let rules: Vec<CommissionRule> = load_records(rules_path)?;

        // Tie-break comparison needs finite values
        if let Some(rule) = rules.iter().find(|r| !r.commission_value.is_finite()) {
            bail!(
                "Commission rule {} in {} has a non-finite commission_value",
                rule.id,
                rules_path.display()
            );
        }

        info!(
            "Reference snapshot loaded: {} vehicles, {} drivers, {} commission rules",
            vehicles.len(),
            drivers.len(),
            rules.len()
        );

        Ok(ReferenceData::new(vehicles, drivers, rules))
    }
}

/// Load a list of records from `.json` (array) or CSV (anything else)
///
/// CSV columns are matched by header name; extra columns are ignored.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON records in {}", path.display()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut records = Vec::new();
    for (line_num, result) in reader.deserialize().enumerate() {
        let record: T = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
        })?;
        records.push(record);
    }

    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================
