// 🚚 Import Session - Preview, then commit a batch of pasted trips
//
// The session owns one reference snapshot for its whole life. Changing the
// text or the header flag recomputes the preview from scratch.

use crate::commit::{batch_fingerprint, parse_departure_date, project_commit_set, TripRecord};
use crate::db::{Event, TripStore};
use crate::reconciliation::{ImportPreviewReport, ReconciliationEngine};
use crate::reference::ReferenceData;
use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub imported: usize,
    pub skipped_errors: usize,
    pub skipped_duplicates: usize,
    pub trip_ids: Vec<String>,
    pub batch_fingerprint: String,
}

pub struct ImportSession {
    reference: ReferenceData,
    engine: ReconciliationEngine,
    text: String,
    has_header: bool,
    report: ImportPreviewReport,
}

impl ImportSession {
    pub fn new(reference: ReferenceData, text: &str, has_header: bool) -> Self {
        let engine = ReconciliationEngine::new();
        let report = engine.preview(text, has_header, &reference);

        ImportSession {
            reference,
            engine,
            text: text.to_string(),
            has_header,
            report,
        }
    }

    pub fn preview(&self) -> &ImportPreviewReport {
        &self.report
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn set_has_header(&mut self, has_header: bool) {
        self.has_header = has_header;
        self.refresh();
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.refresh();
    }

    fn refresh(&mut self) {
        self.report = self.engine.preview(&self.text, self.has_header, &self.reference);
    }

    /// Records that a commit with this date would write
    pub fn commit_set(&self, departure_date: &str) -> Result<Vec<TripRecord>> {
        let date = parse_departure_date(departure_date)?;
        Ok(project_commit_set(&self.report.rows, date))
    }

    /// Persist every valid/warning row with the batch date
    ///
    /// A store failure fails the whole batch. Trips written before the
    /// failure stay written. A failed batch audit event only warns.
    pub fn commit<S: TripStore + ?Sized>(
        &self,
        store: &mut S,
        departure_date: &str,
        actor: &str,
    ) -> Result<CommitOutcome> {
        if !self.report.summary.can_commit() {
            bail!("Nothing to import: no valid or warning rows in the preview");
        }

        let records = self.commit_set(departure_date)?;
        let fingerprint = batch_fingerprint(&records);
        let trip_ids = commit_batch(store, &records, actor)?;

        let outcome = CommitOutcome {
            imported: trip_ids.len(),
            skipped_errors: self.report.summary.errors,
            skipped_duplicates: self.report.summary.duplicates,
            trip_ids,
            batch_fingerprint: fingerprint,
        };

        let event = Event::new(
            "import_batch",
            "batch",
            &outcome.batch_fingerprint,
            serde_json::json!({
                "departure_date": departure_date.trim(),
                "imported": outcome.imported,
                "skipped_errors": outcome.skipped_errors,
                "skipped_duplicates": outcome.skipped_duplicates,
            }),
            actor,
        );
        // Trips are already stored; a lost batch event is logged, not returned
        if let Err(e) = store.record_event(&event) {
            warn!("Batch {} imported but audit event not recorded: {:#}", outcome.batch_fingerprint, e);
        }

        info!(
            "Imported {} trips ({} errors, {} duplicates skipped)",
            outcome.imported, outcome.skipped_errors, outcome.skipped_duplicates
        );

        Ok(outcome)
    }
}

/// Write records one by one; the first failure aborts the batch
pub fn commit_batch<S: TripStore + ?Sized>(
    store: &mut S,
    records: &[TripRecord],
    actor: &str,
) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(records.len());

    for record in records {
        match store.add_trip(record, actor) {
            Ok(id) => ids.push(id),
            Err(e) => {
                warn!("Trip write failed after {} of {} records: {:#}", ids.len(), records.len(), e);
                return Err(e).with_context(|| format!("Failed to import batch of {} trips", records.len()));
            }
        }
    }

    Ok(ids)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_events_for_entity, MemoryTripStore, SqliteTripStore};
    use crate::entities::{Driver, Vehicle};
    use crate::reconciliation::ImportStatus;
    use crate::rules::CommissionRule;

    const TEXT: &str = "PLACA\tMOTORISTA\tORIGEM\tDESTINO\n\
                        ABC1234\tJOHN DOE\tSP\tRJ\n\
                        ABC1234\tJOHN DOE\tSP\tBH\n\
                        DEF5678\tMaria Souza\tRJ\tSP\n\
                        ZZZ0000\tJOHN DOE\tSP\tRJ";

    fn create_test_reference() -> ReferenceData {
        ReferenceData::new(
            vec![Vehicle::new("v1", "ABC1234"), Vehicle::new("v2", "DEF5678")],
            vec![Driver::new("d1", "JOHN DOE")],
            vec![CommissionRule::new("r1", "SP", "RJ", 100.0)],
        )
    }

    #[test]
    fn test_toggle_header_recomputes() {
        let mut session = ImportSession::new(create_test_reference(), TEXT, false);
        assert_eq!(session.preview().summary.total, 5);
        assert_eq!(session.preview().rows[0].status, ImportStatus::Error);

        session.set_has_header(true);
        assert!(session.has_header());
        assert_eq!(session.preview().summary.total, 4);
        assert_eq!(session.preview().summary.importable(), 2);
    }

    #[test]
    fn test_commit_writes_valid_and_warning_rows() {
        let session = ImportSession::new(create_test_reference(), TEXT, true);
        let mut store = MemoryTripStore::new();

        let outcome = session.commit(&mut store, "2024-03-15", "tester").unwrap();

        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.skipped_errors, 1);
        assert_eq!(outcome.skipped_duplicates, 1);
        assert_eq!(outcome.trip_ids.len(), 2);

        let trips = store.list_trips().unwrap();
        assert_eq!(trips[0].trip.driver_id, "d1");
        assert_eq!(trips[0].trip.driver_commission, Some(100.0));
        assert_eq!(trips[1].trip.driver_id, "Maria Souza");
        assert_eq!(trips[1].trip.driver_commission, Some(0.0));
        assert!(trips.iter().all(|t| t.trip.departure_date == "2024-03-15"));

        assert_eq!(store.events.len(), 1);
        assert_eq!(store.events[0].event_type, "import_batch");
        assert_eq!(store.events[0].actor, "tester");
        assert_eq!(store.events[0].entity_id, outcome.batch_fingerprint);
    }

    #[test]
    fn test_commit_blocked_when_nothing_importable() {
        let session = ImportSession::new(create_test_reference(), "ZZZ0000\tJOHN\tSP\tRJ", false);
        let mut store = MemoryTripStore::new();

        let err = session.commit(&mut store, "2024-03-15", "tester").unwrap_err();

        assert!(err.to_string().contains("Nothing to import"));
        assert!(store.trips.is_empty());
    }

    #[test]
    fn test_commit_rejects_bad_date() {
        let session = ImportSession::new(create_test_reference(), TEXT, true);
        let mut store = MemoryTripStore::new();

        assert!(session.commit(&mut store, "15/03/2024", "tester").is_err());
        assert!(store.trips.is_empty());
    }

    #[test]
    fn test_store_failure_fails_whole_batch() {
        let session = ImportSession::new(create_test_reference(), TEXT, true);
        let mut store = MemoryTripStore::failing_after(1);

        let err = session.commit(&mut store, "2024-03-15", "tester").unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to import batch of 2 trips"));
        // No rollback: the first write stays, no batch event is logged
        assert_eq!(store.trips.len(), 1);
        assert!(store.events.is_empty());
    }

    #[test]
    fn test_audit_failure_keeps_batch_imported() {
        let session = ImportSession::new(create_test_reference(), TEXT, true);
        let mut store = MemoryTripStore::failing_events();

        let outcome = session.commit(&mut store, "2024-03-15", "tester").unwrap();

        assert_eq!(outcome.imported, 2);
        assert_eq!(store.trips.len(), 2);
        assert!(store.events.is_empty());
    }

    #[test]
    fn test_trip_events_carry_session_actor() {
        let session = ImportSession::new(create_test_reference(), TEXT, true);
        let mut store = SqliteTripStore::open_in_memory().unwrap();

        let outcome = session.commit(&mut store, "2024-03-15", "operator_maria").unwrap();

        for id in &outcome.trip_ids {
            let events = get_events_for_entity(store.connection(), "trip", id).unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].actor, "operator_maria");
        }
        let batch = get_events_for_entity(store.connection(), "batch", &outcome.batch_fingerprint).unwrap();
        assert_eq!(batch[0].actor, "operator_maria");
    }

    #[test]
    fn test_commit_into_sqlite() {
        let session = ImportSession::new(create_test_reference(), TEXT, true);
        let mut store = SqliteTripStore::open_in_memory().unwrap();

        let outcome = session.commit(&mut store, "2024-03-15", "tester").unwrap();

        assert_eq!(store.count_trips().unwrap(), 2);
        let events = get_events_for_entity(store.connection(), "batch", &outcome.batch_fingerprint).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["imported"], 2);
    }

    #[test]
    fn test_commit_set_preview() {
        let mut session = ImportSession::new(create_test_reference(), "", false);
        assert!(session.commit_set("2024-03-15").unwrap().is_empty());

        session.set_text("DEF5678\tMaria Souza\tRJ\tSP");
        let records = session.commit_set("2024-03-15").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vehicle_id, "v2");
    }
}
