//! Wire protocol shared between the authority and all clients.
//!
//! Every message is a `Packet` variant serialized with bincode. Clients only
//! ever send intent; the authority validates intent, folds it into canonical
//! state and fans the result back out, either point-to-point or broadcast.

use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Unique identifier the server assigns to each connection.
pub type ClientId = u32;

/// The shared phase every participant cycles through, round after round.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    ItemSelection,
    ItemPlacement,
    RoundInProgress,
    RoundOver,
}

impl GamePhase {
    /// The phase that follows this one in the round cycle.
    pub fn next(&self) -> GamePhase {
        match self {
            GamePhase::ItemSelection => GamePhase::ItemPlacement,
            GamePhase::ItemPlacement => GamePhase::RoundInProgress,
            GamePhase::RoundInProgress => GamePhase::RoundOver,
            GamePhase::RoundOver => GamePhase::ItemSelection,
        }
    }
}

/// Per-player replicated state as carried in the periodic snapshot broadcast.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub id: ClientId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    pub facing_right: bool,
    pub dancing: bool,
    pub visible: bool,
    pub color_index: i8,
    pub display_name: String,
}

impl PlayerState {
    pub fn new(id: ClientId, display_name: String) -> Self {
        Self {
            id,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            grounded: true,
            facing_right: true,
            dancing: false,
            visible: true,
            color_index: -1,
            display_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Client -> authority.
    Connect {
        client_version: u32,
        display_name: String,
    },
    Disconnect,
    SelectItem {
        item_id: String,
    },
    UpdateGhost {
        position: Vec3,
        rotation_z: f32,
        visible: bool,
    },
    ConfirmPlacement {
        position: Vec3,
        rotation_z: f32,
    },
    PlayerUpdate {
        position: Vec3,
        velocity: Vec3,
        grounded: bool,
        facing_right: bool,
        dancing: bool,
    },
    FinishedLevel,
    FellOut,

    // Authority -> one client or all clients.
    Connected {
        client_id: ClientId,
    },
    Disconnected {
        reason: String,
    },
    PlayerJoined {
        client_id: ClientId,
        display_name: String,
    },
    PlayerLeft {
        client_id: ClientId,
    },
    PhaseChanged {
        phase: GamePhase,
    },
    SelectionUpdated {
        client_id: ClientId,
        has_selected: bool,
    },
    AssignItem {
        item_id: String,
    },
    GhostUpdated {
        client_id: ClientId,
        position: Vec3,
        rotation_z: f32,
        visible: bool,
    },
    SpawnPlacedItem {
        item_id: String,
        position: Vec3,
        rotation_z: f32,
    },
    ClearGhost,
    PlacementConfirmed {
        client_id: ClientId,
    },
    PlayerStates {
        tick: u32,
        timestamp: u64,
        players: Vec<PlayerState>,
    },
    TeleportTo {
        position: Vec3,
    },
    ScoreUpdated {
        client_id: ClientId,
        stars: u32,
    },
    GameWon {
        client_id: ClientId,
    },
}
