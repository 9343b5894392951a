// ✅ Row Validation - Classify one pasted row against the snapshot
//
// Outcome precedence:
//   1. any error (vehicle, origin, destination) → Error
//   2. driver not registered                   → Warning, commission 0
//   3. otherwise                               → Valid

use crate::parser::RawRow;
use crate::reconciliation::{ImportPreview, ImportStatus};
use crate::reference::ReferenceData;

pub const MSG_VEHICLE_NOT_FOUND: &str = "Veículo não encontrado";
pub const MSG_EMPTY_ORIGIN: &str = "Origem vazia";
pub const MSG_EMPTY_DESTINATION: &str = "Destino vazio";
pub const MSG_UNREGISTERED_DRIVER: &str = "Motorista não cadastrado (comissão zerada)";

pub struct RowValidator<'a> {
    reference: &'a ReferenceData,
}

impl<'a> RowValidator<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        RowValidator { reference }
    }

    pub fn validate(&self, row: &RawRow) -> ImportPreview {
        let mut errors: Vec<&str> = Vec::new();

        let vehicle = self.reference.vehicles.find_by_plate(&row.plate);
        if vehicle.is_none() {
            errors.push(MSG_VEHICLE_NOT_FOUND);
        }

        if row.origin.trim().is_empty() {
            errors.push(MSG_EMPTY_ORIGIN);
        }
        if row.destination.trim().is_empty() {
            errors.push(MSG_EMPTY_DESTINATION);
        }

        let driver = self.reference.drivers.find_by_name(&row.driver_name);

        // Commission is only looked up for registered drivers
        let commission = driver.and_then(|_| {
            self.reference
                .rules
                .commission_for(&row.origin, &row.destination)
        });

        let mut preview = ImportPreview::from_row(row);
        preview.vehicle_id = vehicle.map(|v| v.id.clone());
        preview.driver_id = driver.map(|d| d.id.clone());

        if !errors.is_empty() {
            preview.status = ImportStatus::Error;
            preview.message = errors.join(", ");
            preview.commission = commission;
        } else if driver.is_none() {
            preview.status = ImportStatus::Warning;
            preview.message = MSG_UNREGISTERED_DRIVER.to_string();
            preview.commission = Some(0.0);
        } else {
            preview.status = ImportStatus::Valid;
            preview.message = String::new();
            preview.commission = commission;
        }

        preview
    }
}

// ============================================================================
// TESTS
// ============================================================================
