//! Client network loop: connects to the session server, mirrors canonical
//! state and relays local intent at the sync cadence.
//!
//! The client can run fully headless with a scripted participant, which is
//! how session soak tests exercise a server without a rendering frontend.

use crate::game::ClientGameState;
use crate::ghost::GhostSender;
use bincode::{deserialize, serialize};
use log::{info, warn};
use shared::{GamePhase, Packet, Vec3, PROTOCOL_VERSION, SYNC_RATE_HZ};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::time::interval;

/// Where the scripted participant places its item, spread by client id so
/// concurrent bots never overlap.
const BOT_PLACEMENT_SPACING: f32 = 4.0;
/// How far the scripted participant runs before reporting a finish.
const BOT_FINISH_X: f32 = 20.0;

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    display_name: String,
    connected: bool,

    pub game_state: ClientGameState,
    ghost_sender: GhostSender,

    /// Runs the scripted participant when no frontend drives the session.
    scripted: bool,
    sent_finished: bool,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        display_name: &str,
        scripted: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            display_name: display_name.to_string(),
            connected: false,
            game_state: ClientGameState::new(),
            ghost_sender: GhostSender::new(),
            scripted,
            sent_finished: false,
        })
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {} as {}", self.server_addr, self.display_name);
        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
            display_name: self.display_name.clone(),
        };
        self.send_packet(&packet).await
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    fn handle_packet(&mut self, packet: Packet) {
        match &packet {
            Packet::Connected { .. } => {
                self.connected = true;
            }
            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
            }
            Packet::PhaseChanged { phase } => {
                if *phase == GamePhase::ItemSelection {
                    self.ghost_sender.reset();
                    self.sent_finished = false;
                }
            }
            Packet::ClearGhost => {
                self.ghost_sender.reset();
            }
            _ => {}
        }
        self.game_state.apply_packet(packet);
    }

    /// Relays the owner's current movement state to the authority.
    async fn send_player_update(&self) -> Result<(), Box<dyn std::error::Error>> {
        let own = &self.game_state.own;
        let packet = Packet::PlayerUpdate {
            position: own.position,
            velocity: own.velocity,
            grounded: own.grounded,
            facing_right: own.facing_right,
            dancing: own.dancing,
        };
        self.send_packet(&packet).await
    }

    /// Relays a ghost pose when it moved enough to matter.
    pub async fn send_ghost(
        &mut self,
        position: Vec3,
        rotation_z: f32,
        visible: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if !self.ghost_sender.should_send(position, rotation_z, visible) {
            return Ok(());
        }
        self.send_packet(&Packet::UpdateGhost {
            position,
            rotation_z,
            visible,
        })
        .await
    }

    /// One scripted decision per tick: select, place, race, finish.
    async fn step_script(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(client_id) = self.game_state.client_id else {
            return Ok(());
        };

        match self.game_state.phase() {
            GamePhase::ItemSelection => {
                let already_selected = self
                    .game_state
                    .selections
                    .get(&client_id)
                    .copied()
                    .unwrap_or(false);
                if !already_selected {
                    let item = if client_id % 2 == 0 { "SpikeTrap" } else { "Cannon" };
                    self.send_packet(&Packet::SelectItem {
                        item_id: item.to_string(),
                    })
                    .await?;
                }
            }
            GamePhase::ItemPlacement => {
                if self.game_state.assigned_item.is_some()
                    && !self.game_state.confirmed.contains(&client_id)
                {
                    let position =
                        Vec3::new(client_id as f32 * BOT_PLACEMENT_SPACING, 0.0, 0.0);
                    self.send_ghost(position, 0.0, true).await?;
                    self.send_packet(&Packet::ConfirmPlacement {
                        position,
                        rotation_z: 0.0,
                    })
                    .await?;
                }
            }
            GamePhase::RoundInProgress => {
                self.game_state.own.velocity = Vec3::new(6.0, 0.0, 0.0);
                if !self.sent_finished && self.game_state.own.position.x >= BOT_FINISH_X {
                    self.send_packet(&Packet::FinishedLevel).await?;
                    self.sent_finished = true;
                }
            }
            GamePhase::RoundOver => {
                self.game_state.own.velocity = Vec3::ZERO;
            }
        }

        Ok(())
    }

    /// Main client loop: receive canonical updates, advance local mirrors
    /// and relay intent at the sync cadence.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let tick_duration = Duration::from_secs_f32(1.0 / SYNC_RATE_HZ as f32);
        let mut tick_interval = interval(tick_duration);
        let mut last_tick = Instant::now();
        let mut buffer = [0u8; 2048];

        loop {
            tokio::select! {
                result = self.socket.recv(&mut buffer) => {
                    match result {
                        Ok(len) => {
                            if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                                self.handle_packet(packet);
                            } else {
                                warn!("Failed to deserialize packet from server");
                            }
                        }
                        Err(e) => {
                            warn!("Receive error: {}", e);
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    if !self.connected {
                        continue;
                    }

                    self.game_state.tick(dt);

                    if self.scripted {
                        self.step_script().await?;
                    }

                    if self.game_state.movement_enabled {
                        self.send_player_update().await?;
                    }
                },
            }
        }
    }
}
