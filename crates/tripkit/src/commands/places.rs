use chrono::Utc;
use tracing::debug;

use crate::ids::PlaceId;
use crate::model::{PlaceInput, PlaceSource};
use crate::state::PlannerState;

/// Inserts `input` under `id`, or under a fresh id when `id` is `None`.
/// An existing record keeps its `created_at`.
pub fn upsert_place(state: &mut PlannerState, id: Option<PlaceId>, input: PlaceInput) -> PlaceId {
    let id = id.unwrap_or_default();
    match state.places.get_mut(&id) {
        Some(existing) => {
            existing.name = input.name;
            existing.location = input.location;
            existing.address = input.address;
            existing.source = input.source;
            existing.external_id = input.external_id;
            existing.updated_at = Utc::now();
        }
        None => {
            state.places.insert(id, input.into_place(id));
        }
    }
    id
}

/// Removes a place. Items pointing at it keep a dangling `place_id`, which
/// readers treat as "no location".
pub fn remove_place(state: &mut PlannerState, id: &PlaceId) {
    if state.places.remove(id).is_none() {
        debug!(place = %id, "remove_place: unknown place");
    }
}

/// The stored template place matching `input` exactly: same external id,
/// name, address and location. A record whose content drifted (for example
/// after a template override moved a stop) does not match.
pub fn find_template_place(state: &PlannerState, input: &PlaceInput) -> Option<PlaceId> {
    let key = input.external_id.as_deref()?;
    state
        .places
        .values()
        .filter(|p| p.source == PlaceSource::Template && p.external_id.as_deref() == Some(key))
        .find(|p| p.name == input.name && p.address == input.address && p.location == input.location)
        .map(|p| p.id)
}

/// Reuses the matching template place or stores `input` as a new one.
pub(crate) fn template_place(state: &mut PlannerState, input: PlaceInput) -> PlaceId {
    match find_template_place(state, &input) {
        Some(id) => id,
        None => upsert_place(state, None, input),
    }
}
