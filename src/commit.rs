// 📦 Commit Set - Preview rows → trip records ready for persistence

use crate::reconciliation::ImportPreview;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Status stamped on every imported trip
pub const IMPORTED_TRIP_STATUS: &str = "completed";

/// Trip as persisted by the fleet database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub vehicle_id: String,

    /// Registered driver id, or the typed name when the driver is unknown
    pub driver_id: String,

    pub origin: String,
    pub destination: String,

    /// YYYY-MM-DD, one date for the whole batch
    pub departure_date: String,

    pub freight_value: f64,

    /// None when the driver is registered but no rule covers the lane
    pub driver_commission: Option<f64>,

    pub status: String,

    // Documentation fields, filled in later by the operator
    pub cte_number: String,
    pub mdfe_number: String,
    pub invoice_number: String,
}

/// Parse the operator's batch date (YYYY-MM-DD)
pub fn parse_departure_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid departure date {:?}, expected YYYY-MM-DD", value))
}

/// Project committable rows (valid + warning) into trip records
///
/// Rows without a vehicle id never reach this point as committable, since
/// a missing vehicle is always an error.
pub fn project_commit_set(rows: &[ImportPreview], departure_date: NaiveDate) -> Vec<TripRecord> {
    let date = departure_date.format("%Y-%m-%d").to_string();

    rows.iter()
        .filter(|row| row.is_committable())
        .map(|row| {
            let (driver_id, driver_commission) = match &row.driver_id {
                Some(id) => (id.clone(), row.commission),
                None => (row.driver_name.clone(), Some(0.0)),
            };

            TripRecord {
                vehicle_id: row.vehicle_id.clone().unwrap_or_default(),
                driver_id,
                origin: row.origin.clone(),
                destination: row.destination.clone(),
                departure_date: date.clone(),
                freight_value: 0.0,
                driver_commission,
                status: IMPORTED_TRIP_STATUS.to_string(),
                cte_number: String::new(),
                mdfe_number: String::new(),
                invoice_number: String::new(),
            }
        })
        .collect()
}

/// SHA-256 over the batch contents, used as the audit id of a commit
pub fn batch_fingerprint(records: &[TripRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(format!(
            "{}|{}|{}|{}|{}|{:?}\n",
            record.vehicle_id,
            record.driver_id,
            record.origin,
            record.destination,
            record.departure_date,
            record.driver_commission
        ));
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
