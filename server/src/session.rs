//! The authoritative session state machine.
//!
//! Owns the phase cell, the placement coordinator, the score ledger and the
//! canonical player store, and drives every phase transition. All mutation
//! paths run on the server's single-threaded message loop, one inbound
//! message at a time; completion checks are idempotent recomputations over
//! live state, so ordering across clients never matters.

use crate::config::SessionConfig;
use crate::placement::{ConfirmOutcome, PlacementCoordinator};
use crate::players::PlayerStore;
use crate::score::ScoreLedger;
use log::{debug, info, warn};
use shared::{
    ClientId, GamePhase, ItemCatalog, ListEvent, Packet, PlayerState, ReplicatedValue, Vec3,
    FALLBACK_SPAWN, ROUND_OVER_DELAY_SECS,
};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

/// An authority-to-client message leaving the session: point-to-point or
/// fan-out to everyone.
#[derive(Debug)]
pub enum Outbound {
    To(ClientId, Packet),
    Broadcast(Packet),
}

pub struct Session {
    phase: ReplicatedValue<GamePhase>,
    connected: HashSet<ClientId>,
    placement: PlacementCoordinator,
    scores: ScoreLedger,
    players: PlayerStore,
    finished: HashSet<ClientId>,
    round_deadline: Option<Instant>,
    scoreboard_until: Option<Instant>,
    winner: Option<ClientId>,
    config: SessionConfig,
    outbox: UnboundedSender<Outbound>,
}

impl Session {
    /// Builds the session and wires replication fanout: every effective
    /// write to a replicated cell pushes the matching packet into `outbox`.
    pub fn new(
        config: SessionConfig,
        catalog: ItemCatalog,
        outbox: UnboundedSender<Outbound>,
    ) -> Self {
        let mut phase = ReplicatedValue::new(GamePhase::ItemSelection);
        let tx = outbox.clone();
        phase.subscribe(move |phase| {
            let _ = tx.send(Outbound::Broadcast(Packet::PhaseChanged { phase: *phase }));
        });

        let mut placement = PlacementCoordinator::new(catalog, config.static_geometry.clone());
        let tx = outbox.clone();
        placement.subscribe_selections(move |event| {
            if let ListEvent::Upserted { id, row } = event {
                let _ = tx.send(Outbound::Broadcast(Packet::SelectionUpdated {
                    client_id: *id,
                    has_selected: row.has_selected,
                }));
            }
        });
        let tx = outbox.clone();
        placement.subscribe_ghosts(move |event| {
            if let ListEvent::Upserted { id, row } = event {
                let _ = tx.send(Outbound::Broadcast(Packet::GhostUpdated {
                    client_id: *id,
                    position: row.position,
                    rotation_z: row.rotation_z,
                    visible: row.visible,
                }));
            }
        });

        let mut scores = ScoreLedger::new(config.finish_score);
        let tx = outbox.clone();
        scores.subscribe(move |event| {
            if let ListEvent::Upserted { id, row } = event {
                let _ = tx.send(Outbound::Broadcast(Packet::ScoreUpdated {
                    client_id: *id,
                    stars: row.stars,
                }));
            }
        });

        Self {
            phase,
            connected: HashSet::new(),
            placement,
            scores,
            players: PlayerStore::new(),
            finished: HashSet::new(),
            round_deadline: None,
            scoreboard_until: None,
            winner: None,
            config,
            outbox,
        }
    }

    pub fn phase(&self) -> GamePhase {
        *self.phase.get()
    }

    pub fn connected_count(&self) -> usize {
        self.connected.len()
    }

    pub fn winner(&self) -> Option<ClientId> {
        self.winner
    }

    pub fn stars(&self, client_id: ClientId) -> Option<u32> {
        self.scores.stars(client_id)
    }

    pub fn player(&self, client_id: ClientId) -> Option<&PlayerState> {
        self.players.get(client_id)
    }

    pub fn placement(&self) -> &PlacementCoordinator {
        &self.placement
    }

    /// Wholesale canonical player snapshot for the periodic broadcast.
    pub fn player_snapshot(&self) -> Vec<PlayerState> {
        self.players.snapshot()
    }

    fn send_to(&self, client_id: ClientId, packet: Packet) {
        let _ = self.outbox.send(Outbound::To(client_id, packet));
    }

    fn broadcast(&self, packet: Packet) {
        let _ = self.outbox.send(Outbound::Broadcast(packet));
    }

    /// Registers a connection in any phase: spawns the player session and a
    /// zero-star score entry, replays current canonical state to the joiner,
    /// and seats mid-placement joiners out of the running round.
    pub fn handle_connect(&mut self, client_id: ClientId, display_name: &str, now: Instant) {
        self.connected.insert(client_id);
        self.players.spawn(client_id, display_name);
        self.scores.track(client_id);

        self.broadcast(Packet::PlayerJoined {
            client_id,
            display_name: display_name.to_string(),
        });
        self.sync_to(client_id);

        if self.phase() == GamePhase::ItemPlacement {
            info!(
                "Client {} joined mid-placement, sitting this round out",
                client_id
            );
            self.placement.seat_without_placement(client_id);
            self.broadcast(Packet::PlacementConfirmed { client_id });
        }

        self.maybe_advance(now);
    }

    /// Replays current canonical state to one client so a late joiner can
    /// resynchronize from scratch.
    fn sync_to(&self, client_id: ClientId) {
        self.send_to(client_id, Packet::PhaseChanged { phase: self.phase() });

        for (id, row) in self.placement.selections().iter() {
            self.send_to(
                client_id,
                Packet::SelectionUpdated {
                    client_id: *id,
                    has_selected: row.has_selected,
                },
            );
        }
        for (id, row) in self.placement.ghosts().iter() {
            self.send_to(
                client_id,
                Packet::GhostUpdated {
                    client_id: *id,
                    position: row.position,
                    rotation_z: row.rotation_z,
                    visible: row.visible,
                },
            );
        }
        for item in self.placement.placed_items() {
            self.send_to(
                client_id,
                Packet::SpawnPlacedItem {
                    item_id: item.item_id.clone(),
                    position: item.position,
                    rotation_z: item.rotation_z,
                },
            );
        }
        for id in self.placement.roster() {
            self.send_to(client_id, Packet::PlacementConfirmed { client_id: *id });
        }
        for (id, stars) in self.scores.standings() {
            self.send_to(client_id, Packet::ScoreUpdated { client_id: id, stars });
        }
        if let Some(winner) = self.winner {
            self.send_to(client_id, Packet::GameWon { client_id: winner });
        }
    }

    /// Purges every per-client row and re-evaluates completion checks
    /// against the shrunken roster.
    pub fn handle_disconnect(&mut self, client_id: ClientId, now: Instant) {
        if !self.connected.remove(&client_id) {
            return;
        }

        self.players.despawn(client_id);
        self.scores.forget(client_id);
        self.placement.remove_client(client_id);
        self.finished.remove(&client_id);

        self.broadcast(Packet::PlayerLeft { client_id });
        self.maybe_advance(now);
    }

    pub fn handle_select_item(&mut self, client_id: ClientId, item_id: String, now: Instant) {
        if self.phase() != GamePhase::ItemSelection {
            debug!("Ignoring selection from client {} outside selection phase", client_id);
            return;
        }
        if !self.connected.contains(&client_id) {
            return;
        }

        self.placement.select_item(client_id, item_id);
        self.maybe_advance(now);
    }

    pub fn handle_update_ghost(
        &mut self,
        client_id: ClientId,
        position: Vec3,
        rotation_z: f32,
        visible: bool,
    ) {
        if self.phase() != GamePhase::ItemPlacement || !self.connected.contains(&client_id) {
            return;
        }
        self.placement
            .update_ghost(client_id, position, rotation_z, visible);
    }

    pub fn handle_confirm_placement(
        &mut self,
        client_id: ClientId,
        position: Vec3,
        rotation_z: f32,
        now: Instant,
    ) {
        if self.phase() != GamePhase::ItemPlacement || !self.connected.contains(&client_id) {
            return;
        }

        match self.placement.confirm(client_id, position, rotation_z) {
            ConfirmOutcome::Placed(item) => {
                self.broadcast(Packet::SpawnPlacedItem {
                    item_id: item.item_id,
                    position: item.position,
                    rotation_z: item.rotation_z,
                });
                self.broadcast(Packet::PlacementConfirmed { client_id });
                self.send_to(client_id, Packet::ClearGhost);
                self.maybe_advance(now);
            }
            ConfirmOutcome::NoSelection | ConfirmOutcome::Overlapping => {
                // Rejected silently; a well-behaved client never gets here.
            }
        }
    }

    pub fn handle_player_update(
        &mut self,
        client_id: ClientId,
        position: Vec3,
        velocity: Vec3,
        grounded: bool,
        facing_right: bool,
        dancing: bool,
    ) {
        self.players
            .apply_movement(client_id, position, velocity, grounded, facing_right, dancing);
    }

    /// A finished signal: reaching the goal awards a star, a fatal fall or
    /// hazard does not. Both count toward ending the round.
    pub fn handle_finished(&mut self, client_id: ClientId, reached_goal: bool, now: Instant) {
        if self.phase() != GamePhase::RoundInProgress || !self.connected.contains(&client_id) {
            return;
        }

        let first_signal = self.finished.insert(client_id);
        if first_signal && reached_goal {
            self.award_star(client_id, 1, now);
        }
        self.maybe_advance(now);
    }

    /// Authority-only score mutation, also callable by gameplay feature
    /// hooks (e.g. a level-finish interaction). Unknown clients are a no-op.
    pub fn award_star(&mut self, client_id: ClientId, count: u32, now: Instant) {
        if self.scores.award_star(client_id, count).is_none() {
            return;
        }

        if self.winner.is_none() && self.scores.reached_finish(client_id) {
            info!(
                "Client {} reached the finish score of {}",
                client_id,
                self.scores.finish_score()
            );
            self.winner = Some(client_id);
            self.broadcast(Packet::GameWon { client_id });
            if self.phase() == GamePhase::RoundInProgress {
                self.enter_round_over(now);
            }
        }
    }

    /// Host-local timers, evaluated once per tick of the authority loop.
    pub fn tick(&mut self, now: Instant) {
        match self.phase() {
            GamePhase::RoundInProgress => {
                if let Some(deadline) = self.round_deadline {
                    if now >= deadline {
                        info!("Round timer elapsed, ending round");
                        self.enter_round_over(now);
                    }
                }
            }
            GamePhase::RoundOver => {
                if let Some(until) = self.scoreboard_until {
                    if now >= until {
                        self.enter_item_selection();
                    }
                }
            }
            _ => {}
        }
    }

    /// Externally drivable scoreboard dismissal.
    pub fn advance_round(&mut self) {
        if self.phase() == GamePhase::RoundOver {
            self.enter_item_selection();
        }
    }

    /// Recomputes the current phase's completion check against the live
    /// connected set and advances when satisfied. Safe to call after any
    /// upsert or disconnect; empty rosters never pass.
    fn maybe_advance(&mut self, now: Instant) {
        match self.phase() {
            GamePhase::ItemSelection => {
                if self.placement.all_selected(&self.connected) {
                    self.enter_item_placement();
                }
            }
            GamePhase::ItemPlacement => {
                if self.placement.all_placed(&self.connected) {
                    self.enter_round_in_progress(now);
                }
            }
            GamePhase::RoundInProgress => {
                if !self.connected.is_empty()
                    && self.connected.iter().all(|id| self.finished.contains(id))
                {
                    self.enter_round_over(now);
                }
            }
            GamePhase::RoundOver => {}
        }
    }

    fn enter_item_selection(&mut self) {
        self.placement.begin_selection();
        self.finished.clear();
        self.round_deadline = None;
        self.scoreboard_until = None;
        info!("Entering item selection");
        self.phase.set(GamePhase::ItemSelection);
    }

    fn enter_item_placement(&mut self) {
        let assignments = self.placement.begin_placement(&self.connected);
        info!("All clients selected, assigning {} items", assignments.len());
        for (client_id, item_id) in assignments {
            self.send_to(client_id, Packet::AssignItem { item_id });
        }
        self.phase.set(GamePhase::ItemPlacement);
    }

    fn enter_round_in_progress(&mut self, now: Instant) {
        self.placement.clear_ghosts();
        self.finished.clear();
        self.reset_to_spawns();
        self.round_deadline = Some(now + Duration::from_secs(self.config.round_secs));
        info!("All placements confirmed, round starting");
        self.phase.set(GamePhase::RoundInProgress);
    }

    fn enter_round_over(&mut self, now: Instant) {
        self.round_deadline = None;
        self.scoreboard_until = Some(now + Duration::from_secs(ROUND_OVER_DELAY_SECS));
        info!("Round over, showing scoreboard");
        self.phase.set(GamePhase::RoundOver);
    }

    /// Teleports every player to its spawn point, both as a point-to-point
    /// directive to the owner and as a canonical update for everyone else.
    fn reset_to_spawns(&mut self) {
        let mut ids: Vec<ClientId> = self.connected.iter().copied().collect();
        ids.sort_unstable();

        for client_id in ids {
            let spawn = self.spawn_point(client_id);
            if !self.players.teleport(client_id, spawn) {
                warn!("No player session for connected client {}", client_id);
                continue;
            }
            self.send_to(client_id, Packet::TeleportTo { position: spawn });
        }
    }

    fn spawn_point(&self, client_id: ClientId) -> Vec3 {
        if self.config.spawn_points.is_empty() {
            FALLBACK_SPAWN
        } else {
            let index = client_id as usize % self.config.spawn_points.len();
            self.config.spawn_points[index]
        }
    }
}
