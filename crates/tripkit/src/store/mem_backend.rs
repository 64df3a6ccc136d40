use std::cell::RefCell;
use std::collections::HashMap;

use super::{TripBackend, TripSnapshot};
use crate::error::{PlannerError, Result};
use crate::ids::TripId;

/// In-memory trip backend for testing.
///
/// Uses `RefCell` for interior mutability since the planner is
/// single-threaded, so `TripBackend` can keep `&self` methods.
#[derive(Default)]
pub struct MemBackend {
    trips: RefCell<HashMap<TripId, TripSnapshot>>,
    owners: RefCell<HashMap<String, Vec<TripId>>>,
    simulate_write_error: RefCell<bool>,
    simulate_read_error: RefCell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    pub fn set_simulate_read_error(&self, simulate: bool) {
        *self.simulate_read_error.borrow_mut() = simulate;
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.trips.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.borrow().is_empty()
    }
}

impl TripBackend for MemBackend {
    fn load_trip(&self, id: &TripId) -> Result<Option<TripSnapshot>> {
        if *self.simulate_read_error.borrow() {
            return Err(PlannerError::Store("Simulated read error".to_string()));
        }
        Ok(self.trips.borrow().get(id).cloned())
    }

    fn save_trip(&self, snapshot: &TripSnapshot, owner_id: &str) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(PlannerError::Store("Simulated write error".to_string()));
        }
        let id = snapshot.trip_id();
        self.trips.borrow_mut().insert(id, snapshot.clone());
        let mut owners = self.owners.borrow_mut();
        let owned = owners.entry(owner_id.to_string()).or_default();
        if !owned.contains(&id) {
            owned.push(id);
        }
        Ok(())
    }

    fn list_trips(&self, owner_id: &str) -> Result<Vec<TripId>> {
        Ok(self.owners.borrow().get(owner_id).cloned().unwrap_or_default())
    }

    fn delete_trip(&self, id: &TripId) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(PlannerError::Store("Simulated write error".to_string()));
        }
        self.trips.borrow_mut().remove(id);
        for owned in self.owners.borrow_mut().values_mut() {
            owned.retain(|t| t != id);
        }
        Ok(())
    }
}
