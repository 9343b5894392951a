// Entity Models - Read-only fleet snapshots used by the import
//
// Each entity has:
// - Stable identity (id from the fleet database)
// - Registry for normalized lookups

pub mod vehicle;
pub mod driver;

pub use vehicle::{Vehicle, VehicleRegistry};
pub use driver::{Driver, DriverRegistry};
