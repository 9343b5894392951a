// 🚛 Vehicle Entity - Fleet snapshot used for plate lookups
//
// Vehicles are read-only here: the registry is built once per import
// session from whatever the persistence layer returned.

use crate::normalize::normalize_key;
use serde::{Deserialize, Serialize};

// ============================================================================
// VEHICLE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Stable identity from the fleet database
    pub id: String,

    /// License plate as registered (e.g. "ABC1D23")
    pub plate: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Vehicle {
    pub fn new(id: &str, plate: &str) -> Self {
        Vehicle {
            id: id.to_string(),
            plate: plate.to_string(),
            model: None,
        }
    }
}

// ============================================================================
// VEHICLE REGISTRY
// ============================================================================

/// Plate lookup over a vehicle snapshot
///
/// Keys are precomputed with normalize_key(). When two vehicles share a
/// plate the first one in snapshot order wins.
#[derive(Debug, Clone, Default)]
pub struct VehicleRegistry {
    entries: Vec<(String, Vehicle)>,
}

impl VehicleRegistry {
    pub fn new(vehicles: Vec<Vehicle>) -> Self {
        let entries = vehicles
            .into_iter()
            .map(|v| (normalize_key(&v.plate), v))
            .collect();

        VehicleRegistry { entries }
    }

    pub fn find_by_plate(&self, plate: &str) -> Option<&Vehicle> {
        let key = normalize_key(plate);
        self.entries
            .iter()
            .find(|(plate_key, _)| *plate_key == key)
            .map(|(_, vehicle)| vehicle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
