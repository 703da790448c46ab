//! Client-side mirror of the canonical session state.
//!
//! Everything here is a read-only replica refreshed by authority packets.
//! Local behavior (movement enabled, fall detection, scoreboard) is
//! re-derived purely from the current phase value, never from transition
//! deltas, so a late joiner resynchronizes by reading current phase alone.

use crate::movement::{MirrorInterpolator, OwnerIntegrator};
use log::{debug, error, info};
use shared::{ClientId, GamePhase, ItemCatalog, Packet, Vec3};
use std::collections::{HashMap, HashSet};

/// Another player's pending placement preview.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostView {
    pub position: Vec3,
    pub rotation_z: f32,
    pub visible: bool,
}

/// A confirmed placement as mirrored locally.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItemView {
    pub item_id: String,
    pub position: Vec3,
    pub rotation_z: f32,
}

pub struct ClientGameState {
    pub client_id: Option<ClientId>,
    phase: GamePhase,

    pub own: OwnerIntegrator,
    pub remotes: HashMap<ClientId, MirrorInterpolator>,

    pub selections: HashMap<ClientId, bool>,
    pub ghosts: HashMap<ClientId, GhostView>,
    pub placed_items: Vec<PlacedItemView>,
    pub confirmed: HashSet<ClientId>,
    pub scores: HashMap<ClientId, u32>,
    pub assigned_item: Option<String>,
    pub winner: Option<ClientId>,

    // Derived from the current phase, nothing else.
    pub movement_enabled: bool,
    pub fall_detection_enabled: bool,
    pub scoreboard_visible: bool,

    catalog: ItemCatalog,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            client_id: None,
            phase: GamePhase::ItemSelection,
            own: OwnerIntegrator::new(),
            remotes: HashMap::new(),
            selections: HashMap::new(),
            ghosts: HashMap::new(),
            placed_items: Vec::new(),
            confirmed: HashSet::new(),
            scores: HashMap::new(),
            assigned_item: None,
            winner: None,
            movement_enabled: false,
            fall_detection_enabled: false,
            scoreboard_visible: false,
            catalog: ItemCatalog::standard(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Folds one authority packet into the local mirrors.
    pub fn apply_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Connected { client_id } => {
                info!("Connected as client {}", client_id);
                self.client_id = Some(client_id);
            }
            Packet::Disconnected { reason } => {
                info!("Disconnected by server: {}", reason);
            }
            Packet::PlayerJoined {
                client_id,
                display_name,
            } => {
                debug!("Player {} ({}) joined", client_id, display_name);
            }
            Packet::PlayerLeft { client_id } => {
                self.remotes.remove(&client_id);
                self.selections.remove(&client_id);
                self.ghosts.remove(&client_id);
                self.confirmed.remove(&client_id);
                self.scores.remove(&client_id);
            }
            Packet::PhaseChanged { phase } => {
                self.apply_phase(phase);
            }
            Packet::SelectionUpdated {
                client_id,
                has_selected,
            } => {
                self.selections.insert(client_id, has_selected);
            }
            Packet::AssignItem { item_id } => {
                if self.catalog.resolve(&item_id).is_none() {
                    error!("Assigned item {:?} does not resolve locally", item_id);
                }
                self.assigned_item = Some(item_id);
            }
            Packet::GhostUpdated {
                client_id,
                position,
                rotation_z,
                visible,
            } => {
                self.ghosts.insert(
                    client_id,
                    GhostView {
                        position,
                        rotation_z,
                        visible,
                    },
                );
            }
            Packet::SpawnPlacedItem {
                item_id,
                position,
                rotation_z,
            } => {
                if self.catalog.resolve(&item_id).is_none() {
                    // Canonical state already accepted the identifier; only
                    // the local spawn is abandoned.
                    error!("Cannot resolve placed item {:?}, skipping local spawn", item_id);
                    return;
                }
                self.placed_items.push(PlacedItemView {
                    item_id,
                    position,
                    rotation_z,
                });
            }
            Packet::ClearGhost => {
                if let Some(client_id) = self.client_id {
                    self.ghosts.remove(&client_id);
                }
            }
            Packet::PlacementConfirmed { client_id } => {
                self.confirmed.insert(client_id);
            }
            Packet::PlayerStates { players, .. } => {
                for state in players {
                    if Some(state.id) == self.client_id {
                        // The owner is its own source of truth between
                        // authority corrections.
                        continue;
                    }
                    match self.remotes.get_mut(&state.id) {
                        Some(mirror) => mirror.apply_canonical(&state),
                        None => {
                            self.remotes
                                .insert(state.id, MirrorInterpolator::from_state(&state));
                        }
                    }
                }
            }
            Packet::TeleportTo { position } => {
                self.own.apply_teleport(position);
            }
            Packet::ScoreUpdated { client_id, stars } => {
                self.scores.insert(client_id, stars);
            }
            Packet::GameWon { client_id } => {
                info!("Client {} won the game", client_id);
                self.winner = Some(client_id);
            }
            other => {
                debug!("Ignoring client-bound packet: {:?}", other);
            }
        }
    }

    /// Re-derives all local behavior from the new phase value.
    fn apply_phase(&mut self, phase: GamePhase) {
        self.phase = phase;

        match phase {
            GamePhase::ItemSelection => {
                self.movement_enabled = false;
                self.fall_detection_enabled = false;
                self.scoreboard_visible = false;
                // Round-scoped mirrors and the placed level reset here.
                self.selections.clear();
                self.ghosts.clear();
                self.confirmed.clear();
                self.placed_items.clear();
                self.assigned_item = None;
            }
            GamePhase::ItemPlacement => {
                self.movement_enabled = false;
                self.fall_detection_enabled = false;
                self.scoreboard_visible = false;
            }
            GamePhase::RoundInProgress => {
                self.movement_enabled = true;
                self.fall_detection_enabled = true;
                self.scoreboard_visible = false;
                self.ghosts.clear();
            }
            GamePhase::RoundOver => {
                self.movement_enabled = false;
                self.fall_detection_enabled = false;
                self.scoreboard_visible = true;
            }
        }
    }

    /// Advances the local simulation: owner integration plus mirror
    /// correction.
    pub fn tick(&mut self, dt: f32) {
        if self.movement_enabled {
            self.own.integrate(dt);
        }
        for mirror in self.remotes.values_mut() {
            mirror.step(dt);
        }
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PlayerState;

    fn state() -> ClientGameState {
        let mut state = ClientGameState::new();
        state.apply_packet(Packet::Connected { client_id: 1 });
        state
    }

    fn remote_at(id: ClientId, position: Vec3) -> PlayerState {
        let mut player = PlayerState::new(id, "remote".to_string());
        player.position = position;
        player
    }

    #[test]
    fn test_behavior_derives_from_phase() {
        let mut state = state();

        state.apply_packet(Packet::PhaseChanged {
            phase: GamePhase::RoundInProgress,
        });
        assert!(state.movement_enabled);
        assert!(state.fall_detection_enabled);
        assert!(!state.scoreboard_visible);

        state.apply_packet(Packet::PhaseChanged {
            phase: GamePhase::RoundOver,
        });
        assert!(!state.movement_enabled);
        assert!(state.scoreboard_visible);
    }

    #[test]
    fn test_item_selection_clears_round_state() {
        let mut state = state();
        state.apply_packet(Packet::SpawnPlacedItem {
            item_id: "Cannon".to_string(),
            position: Vec3::ZERO,
            rotation_z: 0.0,
        });
        state.apply_packet(Packet::AssignItem {
            item_id: "Cannon".to_string(),
        });
        state.apply_packet(Packet::PlacementConfirmed { client_id: 2 });

        state.apply_packet(Packet::PhaseChanged {
            phase: GamePhase::ItemSelection,
        });

        assert!(state.placed_items.is_empty());
        assert!(state.assigned_item.is_none());
        assert!(state.confirmed.is_empty());
    }

    #[test]
    fn test_scores_persist_across_phase_reset() {
        let mut state = state();
        state.apply_packet(Packet::ScoreUpdated {
            client_id: 2,
            stars: 3,
        });

        state.apply_packet(Packet::PhaseChanged {
            phase: GamePhase::ItemSelection,
        });

        assert_eq!(state.scores.get(&2), Some(&3));
    }

    #[test]
    fn test_player_states_skip_own_player() {
        let mut state = state();
        state.own.position = Vec3::new(9.0, 0.0, 0.0);

        state.apply_packet(Packet::PlayerStates {
            tick: 1,
            timestamp: 0,
            players: vec![
                remote_at(1, Vec3::ZERO),
                remote_at(2, Vec3::new(3.0, 0.0, 0.0)),
            ],
        });

        assert_eq!(state.own.position, Vec3::new(9.0, 0.0, 0.0));
        assert!(!state.remotes.contains_key(&1));
        assert!(state.remotes.contains_key(&2));
    }

    #[test]
    fn test_unresolvable_placed_item_skipped_locally() {
        let mut state = state();
        state.apply_packet(Packet::SpawnPlacedItem {
            item_id: "NotInCatalog".to_string(),
            position: Vec3::ZERO,
            rotation_z: 0.0,
        });

        assert!(state.placed_items.is_empty());
    }

    #[test]
    fn test_clear_ghost_removes_own_preview() {
        let mut state = state();
        state.apply_packet(Packet::GhostUpdated {
            client_id: 1,
            position: Vec3::ZERO,
            rotation_z: 0.0,
            visible: true,
        });
        state.apply_packet(Packet::GhostUpdated {
            client_id: 2,
            position: Vec3::ZERO,
            rotation_z: 0.0,
            visible: true,
        });

        state.apply_packet(Packet::ClearGhost);

        assert!(!state.ghosts.contains_key(&1));
        assert!(state.ghosts.contains_key(&2));
    }

    #[test]
    fn test_player_left_purges_rows() {
        let mut state = state();
        state.apply_packet(Packet::PlayerStates {
            tick: 1,
            timestamp: 0,
            players: vec![remote_at(2, Vec3::ZERO)],
        });
        state.apply_packet(Packet::ScoreUpdated {
            client_id: 2,
            stars: 1,
        });

        state.apply_packet(Packet::PlayerLeft { client_id: 2 });

        assert!(!state.remotes.contains_key(&2));
        assert!(!state.scores.contains_key(&2));
    }

    #[test]
    fn test_teleport_relocates_owner() {
        let mut state = state();
        state.own.velocity = Vec3::new(4.0, 0.0, 0.0);

        state.apply_packet(Packet::TeleportTo {
            position: Vec3::new(0.0, 1.0, 0.0),
        });

        assert_eq!(state.own.position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(state.own.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_tick_freezes_owner_outside_round() {
        let mut state = state();
        state.own.velocity = Vec3::new(1.0, 0.0, 0.0);

        state.tick(1.0);
        assert_eq!(state.own.position, Vec3::ZERO);

        state.apply_packet(Packet::PhaseChanged {
            phase: GamePhase::RoundInProgress,
        });
        state.tick(1.0);
        assert!(state.own.position.x > 0.0);
    }
}
