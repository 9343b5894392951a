// 👤 Driver Entity - Registered drivers for name lookups
//
// A driver that isn't registered is not an error for the import: the
// typed name travels to the trip record as-is.

use crate::normalize::normalize_key;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,

    /// Full name as registered ("João da Silva")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
}

impl Driver {
    pub fn new(id: &str, name: &str) -> Self {
        Driver {
            id: id.to_string(),
            name: name.to_string(),
            license_number: None,
        }
    }
}

/// Name lookup over a driver snapshot (first registration wins)
#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    entries: Vec<(String, Driver)>,
}

impl DriverRegistry {
    pub fn new(drivers: Vec<Driver>) -> Self {
        let entries = drivers
            .into_iter()
            .map(|d| (normalize_key(&d.name), d))
            .collect();

        DriverRegistry { entries }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Driver> {
        let key = normalize_key(name);
        self.entries
            .iter()
            .find(|(name_key, _)| *name_key == key)
            .map(|(_, driver)| driver)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
