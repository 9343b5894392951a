// 🏗️ Tabular Parser - Pasted spreadsheet text → RawRow
// Expected columns: PLATE, DRIVER_NAME, ORIGIN, DESTINATION (tab separated)

use log::debug;
use serde::{Deserialize, Serialize};

/// Minimum number of tab-separated fields for a line to become a row
pub const REQUIRED_FIELDS: usize = 4;

// ============================================================================
// CORE TYPES
// ============================================================================

/// RawRow - One pasted line, fields trimmed but otherwise untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub plate: String,
    pub driver_name: String,
    pub origin: String,
    pub destination: String,

    /// 1-based line number in the pasted text (header line included)
    pub row_index: usize,
}

impl RawRow {
    pub fn new(
        plate: &str,
        driver_name: &str,
        origin: &str,
        destination: &str,
        row_index: usize,
    ) -> Self {
        RawRow {
            plate: plate.to_string(),
            driver_name: driver_name.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            row_index,
        }
    }
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// RowParser - turns raw text into rows
///
/// Lines that can't be turned into a row are dropped, never reported.
pub trait RowParser {
    fn parse(&self, text: &str) -> Vec<RawRow>;
}

// ============================================================================
// TAB SEPARATED PARSER
// ============================================================================

/// Parser for text copied out of a spreadsheet
pub struct TabSeparatedParser {
    /// Skip the first line (by position, the content is never inspected)
    pub has_header: bool,
}

impl TabSeparatedParser {
    pub fn new(has_header: bool) -> Self {
        TabSeparatedParser { has_header }
    }
}

impl Default for TabSeparatedParser {
    fn default() -> Self {
        Self::new(false)
    }
}

impl RowParser for TabSeparatedParser {
    fn parse(&self, text: &str) -> Vec<RawRow> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut rows = Vec::new();

        for (position, line) in text.split('\n').enumerate() {
            if self.has_header && position == 0 {
                continue;
            }

            // Trailing '\r' from CRLF input goes away with the trim
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();

            if fields.len() < REQUIRED_FIELDS {
                debug!(
                    "Dropping line {}: {} field(s), need {}",
                    position + 1,
                    fields.len(),
                    REQUIRED_FIELDS
                );
                continue;
            }

            rows.push(RawRow::new(
                fields[0],
                fields[1],
                fields[2],
                fields[3],
                position + 1,
            ));
        }

        rows
    }
}

/// Convenience wrapper around TabSeparatedParser
pub fn parse_rows(text: &str, has_header: bool) -> Vec<RawRow> {
    TabSeparatedParser::new(has_header).parse(text)
}

// ============================================================================
// TESTS
// ============================================================================
