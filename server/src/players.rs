//! Canonical per-player session state and the server end of movement sync.
//!
//! Owners send movement updates at a fixed cadence; everything they send is
//! clamped here before it becomes canonical. Fanout of positions happens
//! wholesale at tick cadence, so movement writes skip per-write events.

use log::info;
use shared::{
    ClientId, ListEvent, PlayerState, ReplicatedList, Vec3, MAX_PLAYER_SPEED, SPEED_TOLERANCE,
};

pub struct PlayerStore {
    players: ReplicatedList<PlayerState>,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self {
            players: ReplicatedList::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&ListEvent<PlayerState>) + Send + 'static) {
        self.players.subscribe(observer);
    }

    /// Creates the canonical session for a newly connected client. A repeat
    /// connect keeps the existing session untouched.
    pub fn spawn(&mut self, client_id: ClientId, display_name: &str) {
        if self.players.contains(client_id) {
            return;
        }
        let mut state = PlayerState::new(client_id, display_name.to_string());
        state.color_index = (client_id % 8) as i8;
        info!("Spawned player session for client {} ({})", client_id, display_name);
        self.players.upsert(client_id, state);
    }

    pub fn despawn(&mut self, client_id: ClientId) {
        if self.players.remove(client_id).is_some() {
            info!("Removed player session for client {}", client_id);
        }
    }

    /// Folds an owner's movement update into canonical state, clamping the
    /// velocity magnitude. Unknown clients are ignored.
    pub fn apply_movement(
        &mut self,
        client_id: ClientId,
        position: Vec3,
        velocity: Vec3,
        grounded: bool,
        facing_right: bool,
        dancing: bool,
    ) -> bool {
        let clamped = velocity.clamp_length(MAX_PLAYER_SPEED * SPEED_TOLERANCE);
        self.players.replace_quiet(client_id, |state| {
            state.position = position;
            state.velocity = clamped;
            state.grounded = grounded;
            state.facing_right = facing_right;
            state.dancing = dancing;
        })
    }

    /// Server-directed relocation, used for round resets and respawns.
    pub fn teleport(&mut self, client_id: ClientId, position: Vec3) -> bool {
        self.players.replace_quiet(client_id, |state| {
            state.position = position;
            state.velocity = Vec3::ZERO;
            state.grounded = true;
        })
    }

    pub fn get(&self, client_id: ClientId) -> Option<&PlayerState> {
        self.players.get(client_id)
    }

    pub fn contains(&self, client_id: ClientId) -> bool {
        self.players.contains(client_id)
    }

    /// Wholesale snapshot for the periodic canonical-state broadcast.
    pub fn snapshot(&self) -> Vec<PlayerState> {
        self.players.iter().map(|(_, state)| state.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new()
    }
}
