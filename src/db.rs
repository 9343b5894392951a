use crate::commit::TripRecord;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trip as read back from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTrip {
    pub id: String,
    pub created_at: DateTime<Utc>,

    #[serde(flatten)]
    pub trip: TripRecord,
}

/// Event for audit trail ("Every change is an event")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// TRIP STORE (persistence collaborator)
// ============================================================================

/// Where committed trips go. One call per trip, no transaction.
pub trait TripStore {
    /// Persist one trip on behalf of `actor` and return its new id
    fn add_trip(&mut self, trip: &TripRecord, actor: &str) -> Result<String>;

    fn list_trips(&self) -> Result<Vec<StoredTrip>>;

    /// Audit hook, a no-op unless the store keeps an event log
    fn record_event(&mut self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteTripStore {
    conn: Connection,
}

impl SqliteTripStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteTripStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn count_trips(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl TripStore for SqliteTripStore {
    fn add_trip(&mut self, trip: &TripRecord, actor: &str) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = Utc::now();

        self.conn.execute(
            "INSERT INTO trips (
                trip_id, vehicle_id, driver_id, origin, destination,
                departure_date, freight_value, driver_commission, status,
                cte_number, mdfe_number, invoice_number, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                id,
                trip.vehicle_id,
                trip.driver_id,
                trip.origin,
                trip.destination,
                trip.departure_date,
                trip.freight_value,
                trip.driver_commission,
                trip.status,
                trip.cte_number,
                trip.mdfe_number,
                trip.invoice_number,
                created_at.to_rfc3339(),
            ],
        )
        .with_context(|| format!("Failed to insert trip {} → {}", trip.origin, trip.destination))?;

        let event = Event::new(
            "trip_imported",
            "trip",
            &id,
            serde_json::json!({
                "vehicle_id": trip.vehicle_id,
                "driver_id": trip.driver_id,
                "departure_date": trip.departure_date,
            }),
            actor,
        );
        insert_event(&self.conn, &event)?;

        debug!("Stored trip {}", id);
        Ok(id)
    }

    fn list_trips(&self) -> Result<Vec<StoredTrip>> {
        get_all_trips(&self.conn)
    }

    fn record_event(&mut self, event: &Event) -> Result<()> {
        insert_event(&self.conn, event)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases stay "memory")
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS trips (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trip_id TEXT UNIQUE NOT NULL,
            vehicle_id TEXT NOT NULL,
            driver_id TEXT NOT NULL,
            origin TEXT NOT NULL,
            destination TEXT NOT NULL,
            departure_date TEXT NOT NULL,
            freight_value REAL NOT NULL DEFAULT 0,
            driver_commission REAL,
            status TEXT NOT NULL,
            cte_number TEXT NOT NULL DEFAULT '',
            mdfe_number TEXT NOT NULL DEFAULT '',
            invoice_number TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_trips_departure ON trips(departure_date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_trips_vehicle ON trips(vehicle_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

fn parse_timestamp(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

pub fn get_all_trips(conn: &Connection) -> Result<Vec<StoredTrip>> {
    let mut stmt = conn.prepare(
        "SELECT trip_id, vehicle_id, driver_id, origin, destination,
                departure_date, freight_value, driver_commission, status,
                cte_number, mdfe_number, invoice_number, created_at
         FROM trips
         ORDER BY id",
    )?;

    let trips = stmt
        .query_map([], |row| {
            let created_at: String = row.get(12)?;

            Ok(StoredTrip {
                id: row.get(0)?,
                created_at: parse_timestamp(12, &created_at)?,
                trip: TripRecord {
                    vehicle_id: row.get(1)?,
                    driver_id: row.get(2)?,
                    origin: row.get(3)?,
                    destination: row.get(4)?,
                    departure_date: row.get(5)?,
                    freight_value: row.get(6)?,
                    driver_commission: row.get(7)?,
                    status: row.get(8)?,
                    cte_number: row.get(9)?,
                    mdfe_number: row.get(10)?,
                    invoice_number: row.get(11)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(trips)
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: parse_timestamp(1, &timestamp_str)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// MEMORY STORE (tests, dry runs)
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryTripStore {
    pub trips: Vec<StoredTrip>,
    pub events: Vec<Event>,

    /// Fail every write after this many successful ones
    pub fail_after: Option<usize>,

    /// Reject every audit event
    pub fail_events: bool,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(writes: usize) -> Self {
        MemoryTripStore {
            fail_after: Some(writes),
            ..Default::default()
        }
    }

    pub fn failing_events() -> Self {
        MemoryTripStore {
            fail_events: true,
            ..Default::default()
        }
    }
}

impl TripStore for MemoryTripStore {
    fn add_trip(&mut self, trip: &TripRecord, _actor: &str) -> Result<String> {
        if let Some(limit) = self.fail_after {
            if self.trips.len() >= limit {
                return Err(anyhow!("connection lost after {} writes", limit));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.trips.push(StoredTrip {
            id: id.clone(),
            created_at: Utc::now(),
            trip: trip.clone(),
        });
        Ok(id)
    }

    fn list_trips(&self) -> Result<Vec<StoredTrip>> {
        Ok(self.trips.clone())
    }

    fn record_event(&mut self, event: &Event) -> Result<()> {
        if self.fail_events {
            return Err(anyhow!("audit log unavailable"));
        }
        self.events.push(event.clone());
        Ok(())
    }
}
