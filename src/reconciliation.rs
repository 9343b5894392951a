// ⚖️ Reconciliation Engine - Pasted trips vs fleet snapshot
//
// Pipeline:
//   raw text → parse → group by (plate, driver, origin) → tie-break
//            → validate each row → preview list
//
// Everything here is pure: the same text, header flag and snapshot always
// produce the same preview, in the same order.

use crate::deduplication::DeduplicationEngine;
use crate::parser::{RawRow, RowParser, TabSeparatedParser};
use crate::reference::ReferenceData;
use crate::validation::RowValidator;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

// ============================================================================
// IMPORT STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// Vehicle and driver found, lane fields present
    Valid,

    /// Imported, but the driver isn't registered (commission zeroed)
    Warning,

    /// Not imported: vehicle missing or empty origin/destination
    Error,

    /// Not imported: lost the tie-break inside its group
    Duplicate,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Valid => "valid",
            ImportStatus::Warning => "warning",
            ImportStatus::Error => "error",
            ImportStatus::Duplicate => "duplicate",
        }
    }

    /// Valid and warning rows go to the commit set
    pub fn is_committable(&self) -> bool {
        matches!(self, ImportStatus::Valid | ImportStatus::Warning)
    }
}

// ============================================================================
// IMPORT PREVIEW (one per pasted row)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub plate: String,
    pub driver_name: String,
    pub origin: String,
    pub destination: String,
    pub row_index: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,

    /// None = no rule found, Some(0.0) = zeroed on purpose
    pub commission: Option<f64>,

    pub status: ImportStatus,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_group: Option<String>,
}

impl ImportPreview {
    /// Unclassified preview carrying the row's text
    pub fn from_row(row: &RawRow) -> Self {
        ImportPreview {
            plate: row.plate.clone(),
            driver_name: row.driver_name.clone(),
            origin: row.origin.clone(),
            destination: row.destination.clone(),
            row_index: row.row_index,
            vehicle_id: None,
            driver_id: None,
            commission: None,
            status: ImportStatus::Error,
            message: String::new(),
            duplicate_group: None,
        }
    }

    /// Override the row's own outcome after losing a tie-break
    pub fn mark_duplicate(&mut self, kept_row_index: usize) {
        self.status = ImportStatus::Duplicate;
        self.commission = Some(0.0);
        self.message = format!(
            "Duplicado (viagem mantida: linha {}). Comissão zerada.",
            kept_row_index
        );
    }

    pub fn is_committable(&self) -> bool {
        self.status.is_committable()
    }
}

// ============================================================================
// SUMMARY & REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub valid: usize,
    pub warnings: usize,
    pub duplicates: usize,
    pub errors: usize,
}

impl ImportSummary {
    pub fn from_rows(rows: &[ImportPreview]) -> Self {
        let mut summary = ImportSummary {
            total: rows.len(),
            ..Default::default()
        };

        for row in rows {
            match row.status {
                ImportStatus::Valid => summary.valid += 1,
                ImportStatus::Warning => summary.warnings += 1,
                ImportStatus::Duplicate => summary.duplicates += 1,
                ImportStatus::Error => summary.errors += 1,
            }
        }

        summary
    }

    /// Rows that will be imported (valid + warning)
    pub fn importable(&self) -> usize {
        self.valid + self.warnings
    }

    /// Rows that will be skipped (error + duplicate)
    pub fn skipped(&self) -> usize {
        self.errors + self.duplicates
    }

    /// Commit is blocked when nothing would be imported
    pub fn can_commit(&self) -> bool {
        self.importable() > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreviewReport {
    pub rows: Vec<ImportPreview>,
    pub summary: ImportSummary,
    pub generated_at: DateTime<Utc>,
}

impl ImportPreviewReport {
    pub fn new(rows: Vec<ImportPreview>) -> Self {
        let summary = ImportSummary::from_rows(&rows);
        ImportPreviewReport {
            rows,
            summary,
            generated_at: Utc::now(),
        }
    }

    pub fn committable_rows(&self) -> impl Iterator<Item = &ImportPreview> {
        self.rows.iter().filter(|row| row.is_committable())
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} rows: {} to import ({} with warnings), {} duplicates, {} errors",
            self.summary.total,
            self.summary.importable(),
            self.summary.warnings,
            self.summary.duplicates,
            self.summary.errors
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    pub deduplication: DeduplicationEngine,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            deduplication: DeduplicationEngine::new(),
        }
    }

    /// Parse pasted text and reconcile it
    ///
    /// Example:
    /// ```
    /// use fleet_trip_import::{
    ///     CommissionRule, Driver, ImportStatus, ReconciliationEngine, ReferenceData, Vehicle,
    /// };
    ///
    /// let reference = ReferenceData::new(
    ///     vec![Vehicle::new("v1", "ABC1234")],
    ///     vec![Driver::new("d1", "JOHN DOE")],
    ///     vec![CommissionRule::new("r1", "SP", "RJ", 100.0)],
    /// );
    ///
    /// let report = ReconciliationEngine::new().preview("ABC1234\tJOHN DOE\tSP\tRJ", false, &reference);
    /// assert_eq!(report.rows[0].status, ImportStatus::Valid);
    /// assert_eq!(report.rows[0].commission, Some(100.0));
    /// ```
    pub fn preview(&self, text: &str, has_header: bool, reference: &ReferenceData) -> ImportPreviewReport {
        let rows = TabSeparatedParser::new(has_header).parse(text);
        self.reconcile(rows, reference)
    }

    /// Classify already-parsed rows. Output follows group order: each
    /// group's members appear together, groups in order of first
    /// appearance.
    pub fn reconcile(&self, rows: Vec<RawRow>, reference: &ReferenceData) -> ImportPreviewReport {
        let validator = RowValidator::new(reference);
        let groups = self.deduplication.group_rows(rows);

        let mut previews = Vec::new();

        for group in groups {
            if !group.is_duplicate_set() {
                previews.extend(group.members.iter().map(|row| validator.validate(row)));
                continue;
            }

            let kept = self.deduplication.select_kept(&group, &reference.rules);
            let kept_row_index = group.members[kept].row_index;

            for (index, row) in group.members.iter().enumerate() {
                let mut preview = validator.validate(row);
                preview.duplicate_group = Some(group.key.clone());

                if index != kept {
                    preview.mark_duplicate(kept_row_index);
                }

                previews.push(preview);
            }
        }

        let report = ImportPreviewReport::new(previews);
        info!("Import preview: {}", report.summary_line());
        report
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Driver, Vehicle};
    use crate::rules::CommissionRule;

    fn create_test_reference() -> ReferenceData {
        ReferenceData::new(
            vec![
                Vehicle::new("v1", "ABC1234"),
                Vehicle::new("v2", "DEF5678"),
            ],
            vec![
                Driver::new("d1", "JOHN DOE"),
                Driver::new("d2", "JOHN"),
            ],
            vec![CommissionRule::new("r1", "SP", "RJ", 100.0)],
        )
    }

    fn preview(text: &str, has_header: bool) -> ImportPreviewReport {
        ReconciliationEngine::new().preview(text, has_header, &create_test_reference())
    }

    #[test]
    fn test_scenario_valid_row() {
        let report = preview("ABC1234\tJOHN DOE\tSP\tRJ", false);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, ImportStatus::Valid);
        assert_eq!(report.rows[0].commission, Some(100.0));
    }

    #[test]
    fn test_scenario_unregistered_driver() {
        let reference = ReferenceData::new(
            vec![Vehicle::new("v1", "ABC1234")],
            vec![],
            vec![CommissionRule::new("r1", "SP", "RJ", 100.0)],
        );
        let report = ReconciliationEngine::new().preview("ABC1234\tJOHN DOE\tSP\tRJ", false, &reference);

        assert_eq!(report.rows[0].status, ImportStatus::Warning);
        assert_eq!(report.rows[0].commission, Some(0.0));
        assert_eq!(report.rows[0].message, "Motorista não cadastrado (comissão zerada)");
    }

    #[test]
    fn test_scenario_duplicate_keeps_higher_commission() {
        let report = preview("ABC1234\tJOHN\tSP\tRJ\nABC1234\tJOHN\tSP\tBH", false);

        assert_eq!(report.rows.len(), 2);

        let kept = &report.rows[0];
        assert_eq!(kept.row_index, 1);
        assert_eq!(kept.status, ImportStatus::Valid);
        assert_eq!(kept.commission, Some(100.0));
        assert_eq!(kept.duplicate_group.as_deref(), Some("ABC1234|JOHN|SP"));

        let dropped = &report.rows[1];
        assert_eq!(dropped.row_index, 2);
        assert_eq!(dropped.status, ImportStatus::Duplicate);
        assert_eq!(dropped.commission, Some(0.0));
        assert_eq!(dropped.message, "Duplicado (viagem mantida: linha 1). Comissão zerada.");
        assert_eq!(dropped.duplicate_group, kept.duplicate_group);
    }

    #[test]
    fn test_later_row_can_win_tie_break() {
        let report = preview("ABC1234\tJOHN\tSP\tBH\nABC1234\tJOHN\tSP\tRJ", false);

        assert_eq!(report.rows[0].status, ImportStatus::Duplicate);
        assert_eq!(report.rows[0].message, "Duplicado (viagem mantida: linha 2). Comissão zerada.");
        assert_eq!(report.rows[1].status, ImportStatus::Valid);
        assert_eq!(report.rows[1].commission, Some(100.0));
    }

    #[test]
    fn test_scenario_unknown_plate() {
        let report = preview("ZZZ0000\tJOHN\tSP\tRJ", false);

        assert_eq!(report.rows[0].status, ImportStatus::Error);
        assert_eq!(report.rows[0].message, "Veículo não encontrado");
    }

    #[test]
    fn test_scenario_header_parsed_as_data() {
        let text = "PLACA\tMOTORISTA\tORIGEM\tDESTINO\nABC1234\tJOHN DOE\tSP\tRJ";

        let unflagged = preview(text, false);
        assert_eq!(unflagged.rows.len(), 2);
        assert_eq!(unflagged.rows[0].status, ImportStatus::Error);

        let flagged = preview(text, true);
        assert_eq!(flagged.rows.len(), 1);
        assert_eq!(flagged.rows[0].row_index, 2);
    }

    #[test]
    fn test_unregistered_driver_can_win_tie_break() {
        // Tie-break looks only at lane commission, not at the driver
        let report = preview("ABC1234\tSTRANGER\tSP\tBH\nABC1234\tstranger\tSP\tRJ", false);

        assert_eq!(report.rows[0].status, ImportStatus::Duplicate);
        assert_eq!(report.rows[1].status, ImportStatus::Warning);
        assert_eq!(report.rows[1].commission, Some(0.0));
    }

    #[test]
    fn test_kept_row_can_still_be_an_error() {
        let report = preview("ZZZ0000\tJOHN\tSP\tRJ\nZZZ0000\tJOHN\tSP\tBH", false);

        assert_eq!(report.rows[0].status, ImportStatus::Error);
        assert_eq!(report.rows[1].status, ImportStatus::Duplicate);
        assert!(!report.summary.can_commit());
    }

    #[test]
    fn test_exactly_one_survivor_per_group() {
        let text = [
            "ABC1234\tJOHN\tSP\tBH",
            "DEF5678\tJOHN DOE\tRJ\tSP",
            "abc1234\tjohn\tsp\tRJ",
            "ABC1234\tJOHN\tSP\tPOA",
            "DEF5678\tJOHN DOE\tRJ\tBH",
        ]
        .join("\n");

        let report = preview(&text, false);
        assert_eq!(report.rows.len(), 5);

        let mut groups: std::collections::HashMap<String, Vec<&ImportPreview>> =
            std::collections::HashMap::new();
        for row in &report.rows {
            let key = row.duplicate_group.clone().unwrap();
            groups.entry(key).or_default().push(row);
        }

        assert_eq!(groups.len(), 2);
        for members in groups.values() {
            let survivors = members
                .iter()
                .filter(|r| r.status != ImportStatus::Duplicate)
                .count();
            assert_eq!(survivors, 1);
            assert!(members
                .iter()
                .filter(|r| r.status == ImportStatus::Duplicate)
                .all(|r| r.commission == Some(0.0)));
        }
    }

    #[test]
    fn test_output_follows_group_order() {
        let text = "ABC1234\tJOHN\tSP\tBH\nDEF5678\tJOHN\tRJ\tSP\nABC1234\tJOHN\tSP\tRJ";
        let report = preview(text, false);

        let order: Vec<usize> = report.rows.iter().map(|r| r.row_index).collect();
        assert_eq!(order, vec![1, 3, 2]);
    }

    #[test]
    fn test_summary_counts() {
        let text = [
            "ABC1234\tJOHN DOE\tSP\tRJ",
            "ABC1234\tJOHN DOE\tSP\tBH",
            "DEF5678\tNOBODY\tRJ\tSP",
            "ZZZ0000\tJOHN\tSP\tRJ",
        ]
        .join("\n");

        let report = preview(&text, false);

        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.valid, 1);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.duplicates, 1);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.importable(), 2);
        assert_eq!(report.summary.skipped(), 2);
        assert!(report.summary.can_commit());
        assert_eq!(report.committable_rows().count(), 2);
    }

    #[test]
    fn test_preview_is_reproducible() {
        let text = "ABC1234\tJOHN\tSP\tBH\nDEF5678\tJOHN\tRJ\tSP\nABC1234\tJOHN\tSP\tRJ";

        assert_eq!(preview(text, false).rows, preview(text, false).rows);
    }

    #[test]
    fn test_empty_input() {
        let report = preview("  \n ", false);

        assert!(report.rows.is_empty());
        assert!(!report.summary.can_commit());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&ImportStatus::Duplicate).unwrap(), "\"duplicate\"");
        assert_eq!(ImportStatus::Warning.as_str(), "warning");
        assert!(ImportStatus::Warning.is_committable());
        assert!(!ImportStatus::Error.is_committable());
    }
}
