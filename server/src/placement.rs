//! Item selection bookkeeping, ghost relay and placement arbitration.
//!
//! The authority never trusts a client's own validity determination; every
//! confirm is re-validated here against the placed items and static level
//! geometry before it spawns anything.

use log::{debug, warn};
use shared::{Aabb, ClientId, ItemCatalog, ListEvent, ReplicatedList, Vec3};
use std::collections::{HashMap, HashSet};

/// A client's item choice for the upcoming round.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRow {
    pub chosen_item_id: String,
    pub has_selected: bool,
}

/// Tentative preview of a client's pending placement. Advisory only; it
/// never affects collision or scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostRow {
    pub position: Vec3,
    pub rotation_z: f32,
    pub visible: bool,
}

/// A confirmed placement. Persists until the next selection phase clears
/// the level.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem {
    pub item_id: String,
    pub position: Vec3,
    pub rotation_z: f32,
}

/// Result of an authority-side confirm.
#[derive(Debug, PartialEq)]
pub enum ConfirmOutcome {
    /// Client had no item on record; silently ignored.
    NoSelection,
    /// Placement overlapped an existing volume; silently rejected.
    Overlapping,
    Placed(PlacedItem),
}

pub struct PlacementCoordinator {
    catalog: ItemCatalog,
    static_geometry: Vec<Aabb>,
    selections: ReplicatedList<SelectionRow>,
    ghosts: ReplicatedList<GhostRow>,
    /// Items assigned at the selection->placement transition, consumed on
    /// confirm.
    assigned: HashMap<ClientId, String>,
    roster: HashSet<ClientId>,
    placed: Vec<PlacedItem>,
    placed_bounds: Vec<Aabb>,
}

impl PlacementCoordinator {
    pub fn new(catalog: ItemCatalog, static_geometry: Vec<Aabb>) -> Self {
        Self {
            catalog,
            static_geometry,
            selections: ReplicatedList::new(),
            ghosts: ReplicatedList::new(),
            assigned: HashMap::new(),
            roster: HashSet::new(),
            placed: Vec::new(),
            placed_bounds: Vec::new(),
        }
    }

    pub fn subscribe_selections(
        &mut self,
        observer: impl FnMut(&ListEvent<SelectionRow>) + Send + 'static,
    ) {
        self.selections.subscribe(observer);
    }

    pub fn subscribe_ghosts(&mut self, observer: impl FnMut(&ListEvent<GhostRow>) + Send + 'static) {
        self.ghosts.subscribe(observer);
    }

    /// Upserts a client's selection. Re-selecting simply replaces the row.
    pub fn select_item(&mut self, client_id: ClientId, item_id: String) {
        if self.catalog.resolve(&item_id).is_none() {
            // Accept the identifier anyway; resolution only matters once a
            // placement has to be validated or spawned.
            warn!("Client {} selected unknown item {:?}", client_id, item_id);
        }
        self.selections.upsert(
            client_id,
            SelectionRow {
                chosen_item_id: item_id,
                has_selected: true,
            },
        );
    }

    /// True when every connected client has a completed selection. An empty
    /// roster never passes.
    pub fn all_selected(&self, connected: &HashSet<ClientId>) -> bool {
        !connected.is_empty()
            && connected.iter().all(|id| {
                self.selections
                    .get(*id)
                    .map(|row| row.has_selected)
                    .unwrap_or(false)
            })
    }

    /// Clears all round-scoped state, including the placed level. Called at
    /// the top of every selection phase.
    pub fn begin_selection(&mut self) {
        self.selections.clear();
        self.ghosts.clear();
        self.assigned.clear();
        self.roster.clear();
        self.placed.clear();
        self.placed_bounds.clear();
    }

    /// Snapshots each connected client's choice into the assignment table
    /// and clears the selection state for the round. Returns the per-client
    /// assignments for point-to-point delivery.
    pub fn begin_placement(&mut self, connected: &HashSet<ClientId>) -> Vec<(ClientId, String)> {
        let assignments: Vec<(ClientId, String)> = connected
            .iter()
            .filter_map(|id| {
                self.selections
                    .get(*id)
                    .filter(|row| row.has_selected)
                    .map(|row| (*id, row.chosen_item_id.clone()))
            })
            .collect();

        self.assigned = assignments.iter().cloned().collect();
        self.selections.clear();
        self.ghosts.clear();
        self.roster.clear();

        assignments
    }

    pub fn update_ghost(
        &mut self,
        client_id: ClientId,
        position: Vec3,
        rotation_z: f32,
        visible: bool,
    ) {
        self.ghosts.upsert(
            client_id,
            GhostRow {
                position,
                rotation_z,
                visible,
            },
        );
    }

    pub fn clear_ghosts(&mut self) {
        self.ghosts.clear();
    }

    /// Checks a candidate placement against every placed item and the static
    /// level geometry. An item with no collider, or an identifier that does
    /// not resolve locally, is fail-open valid; the candidate's own collider
    /// tree is never part of the obstacle set.
    pub fn is_valid_placement(&self, item_id: &str, position: Vec3) -> bool {
        let Some(def) = self.catalog.resolve(item_id) else {
            warn!("Cannot resolve item {:?}, treating placement as valid", item_id);
            return true;
        };
        let Some(candidate) = def.placement_bounds(position) else {
            return true;
        };

        let blocked = self
            .placed_bounds
            .iter()
            .chain(self.static_geometry.iter())
            .any(|obstacle| candidate.overlaps(obstacle));

        !blocked
    }

    /// Authority-side confirm. Looks up the client's assigned item,
    /// re-validates the placement and records it.
    pub fn confirm(
        &mut self,
        client_id: ClientId,
        position: Vec3,
        rotation_z: f32,
    ) -> ConfirmOutcome {
        let Some(item_id) = self.assigned.get(&client_id).cloned() else {
            debug!("Client {} confirmed without a recorded selection", client_id);
            return ConfirmOutcome::NoSelection;
        };

        if !self.is_valid_placement(&item_id, position) {
            debug!(
                "Client {} placement of {:?} at {:?} overlaps, rejected",
                client_id, item_id, position
            );
            return ConfirmOutcome::Overlapping;
        }

        let item = PlacedItem {
            item_id: item_id.clone(),
            position,
            rotation_z,
        };

        if let Some(bounds) = self
            .catalog
            .resolve(&item_id)
            .and_then(|def| def.placement_bounds(position))
        {
            self.placed_bounds.push(bounds);
        }
        self.placed.push(item.clone());
        self.assigned.remove(&client_id);
        self.roster.insert(client_id);

        ConfirmOutcome::Placed(item)
    }

    /// Seats a client in the roster without a placement. Used for clients
    /// that join mid-placement and sit the round out.
    pub fn seat_without_placement(&mut self, client_id: ClientId) {
        self.roster.insert(client_id);
    }

    /// True when every connected client has confirmed. An empty roster never
    /// passes.
    pub fn all_placed(&self, connected: &HashSet<ClientId>) -> bool {
        !connected.is_empty() && connected.iter().all(|id| self.roster.contains(id))
    }

    /// Purges every per-client row on disconnect.
    pub fn remove_client(&mut self, client_id: ClientId) {
        self.selections.remove(client_id);
        self.ghosts.remove(client_id);
        self.assigned.remove(&client_id);
        self.roster.remove(&client_id);
    }

    pub fn has_confirmed(&self, client_id: ClientId) -> bool {
        self.roster.contains(&client_id)
    }

    pub fn roster(&self) -> &HashSet<ClientId> {
        &self.roster
    }

    pub fn placed_items(&self) -> &[PlacedItem] {
        &self.placed
    }

    pub fn selections(&self) -> &ReplicatedList<SelectionRow> {
        &self.selections
    }

    pub fn ghosts(&self) -> &ReplicatedList<GhostRow> {
        &self.ghosts
    }
}
