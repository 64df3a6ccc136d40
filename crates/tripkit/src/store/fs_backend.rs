use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use super::{TripBackend, TripSnapshot};
use crate::error::{PlannerError, Result};
use crate::ids::TripId;

const OWNERS_FILE: &str = "owners.json";
const TRIPS_DIR: &str = "trips";

type OwnerIndex = BTreeMap<String, Vec<TripId>>;

/// Filesystem trip backend: one pretty-printed JSON snapshot per trip and a
/// small owner index, all written atomically (temp file + rename).
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn trips_dir(&self) -> PathBuf {
        self.root.join(TRIPS_DIR)
    }

    /// Where the snapshot of `id` lives, whether or not it exists yet.
    pub fn trip_path(&self, id: &TripId) -> PathBuf {
        self.trips_dir().join(format!("trip-{}.json", id.as_uuid()))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(PlannerError::Io)?;
        }
        Ok(())
    }

    fn write_atomic(&self, dir: &Path, target: &Path, content: &str) -> Result<()> {
        self.ensure_dir(dir)?;
        let tmp = dir.join(format!(".tripkit-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, content).map_err(PlannerError::Io)?;
        fs::rename(&tmp, target).map_err(PlannerError::Io)?;
        Ok(())
    }

    fn load_owners(&self) -> Result<OwnerIndex> {
        let path = self.root.join(OWNERS_FILE);
        if !path.exists() {
            return Ok(OwnerIndex::new());
        }
        let content = fs::read_to_string(path).map_err(PlannerError::Io)?;
        serde_json::from_str(&content).map_err(PlannerError::Serialization)
    }

    fn save_owners(&self, index: &OwnerIndex) -> Result<()> {
        let content = serde_json::to_string_pretty(index).map_err(PlannerError::Serialization)?;
        self.write_atomic(&self.root, &self.root.join(OWNERS_FILE), &content)
    }
}

impl TripBackend for FsBackend {
    fn load_trip(&self, id: &TripId) -> Result<Option<TripSnapshot>> {
        let path = self.trip_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(PlannerError::Io)?;
        let snapshot: TripSnapshot = serde_json::from_str(&content).map_err(PlannerError::Serialization)?;
        if snapshot.trip_id() != *id {
            return Err(PlannerError::Store(format!(
                "{} holds trip {}, expected {}",
                path.display(),
                snapshot.trip_id(),
                id
            )));
        }
        Ok(Some(snapshot))
    }

    fn save_trip(&self, snapshot: &TripSnapshot, owner_id: &str) -> Result<()> {
        let id = snapshot.trip_id();
        let content = serde_json::to_string_pretty(snapshot).map_err(PlannerError::Serialization)?;
        self.write_atomic(&self.trips_dir(), &self.trip_path(&id), &content)?;

        let mut owners = self.load_owners()?;
        let owned = owners.entry(owner_id.to_string()).or_default();
        if !owned.contains(&id) {
            owned.push(id);
            self.save_owners(&owners)?;
        }
        debug!(trip = %id, owner = owner_id, "trip saved");
        Ok(())
    }

    /// Index entries whose snapshot file has disappeared are skipped.
    fn list_trips(&self, owner_id: &str) -> Result<Vec<TripId>> {
        let owners = self.load_owners()?;
        Ok(owners
            .get(owner_id)
            .map(|ids| ids.iter().copied().filter(|id| self.trip_path(id).exists()).collect())
            .unwrap_or_default())
    }

    fn delete_trip(&self, id: &TripId) -> Result<()> {
        let path = self.trip_path(id);
        if path.exists() {
            fs::remove_file(&path).map_err(PlannerError::Io)?;
        }

        let mut owners = self.load_owners()?;
        let mut changed = false;
        for owned in owners.values_mut() {
            let before = owned.len();
            owned.retain(|t| t != id);
            changed |= owned.len() != before;
        }
        if changed {
            self.save_owners(&owners)?;
        }
        Ok(())
    }
}
