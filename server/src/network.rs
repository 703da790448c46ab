//! Server network layer: UDP transport and the authority message loop.
//!
//! All inbound packets funnel through one `tokio::select!` loop and are
//! applied to the session one at a time, in arrival order. Outbound traffic
//! produced by the session (replication fanout, point-to-point directives)
//! is drained by a dedicated sender task that resolves client ids to
//! addresses.

use crate::client_manager::ClientManager;
use crate::config::SessionConfig;
use crate::session::{Outbound, Session};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{ClientId, ItemCatalog, Packet, PROTOCOL_VERSION, SYNC_RATE_HZ};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages sent from network tasks to the authority loop.
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: ClientId,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// The session server: socket, connection roster and the authoritative
/// session state machine.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    session: Session,
    tick_duration: Duration,
    tick: u32,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
}

impl Server {
    pub async fn new(
        addr: &str,
        config: SessionConfig,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Session server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let session = Session::new(config, ItemCatalog::standard(), outbound_tx.clone());

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            session,
            tick_duration: Duration::from_secs_f32(1.0 / SYNC_RATE_HZ as f32),
            tick: 0,
            server_tx,
            server_rx,
            outbound_tx,
            outbound_rx,
        })
    }

    /// Spawns the task that continuously listens for incoming packets.
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the session's outbound queue, resolving
    /// client ids to addresses.
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut outbound_rx = std::mem::replace(&mut self.outbound_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                match message {
                    Outbound::To(client_id, packet) => {
                        let addr = {
                            let clients_guard = clients.read().await;
                            clients_guard.addr_of(client_id)
                        };

                        if let Some(addr) = addr {
                            if let Err(e) = send_packet(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                    Outbound::Broadcast(packet) => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if let Err(e) = send_packet(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns the task that monitors client timeouts.
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts(CLIENT_TIMEOUT)
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    /// Applies one inbound packet to the session.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr, now: Instant) {
        match packet {
            Packet::Connect {
                client_version,
                display_name,
            } => {
                if client_version != PROTOCOL_VERSION {
                    let response = Packet::Disconnected {
                        reason: "Protocol version mismatch".to_string(),
                    };
                    if let Err(e) = send_packet(&self.socket, &response, addr).await {
                        error!("Failed to reject client at {}: {}", addr, e);
                    }
                    return;
                }

                // A reconnect from the same address replaces the stale
                // session.
                let existing = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };
                if let Some(existing_id) = existing {
                    info!("Replacing existing client {} from {}", existing_id, addr);
                    self.clients.write().await.remove_client(existing_id);
                    self.session.handle_disconnect(existing_id, now);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr, &display_name)
                };

                match client_id {
                    Some(client_id) => {
                        let _ = self
                            .outbound_tx
                            .send(Outbound::To(client_id, Packet::Connected { client_id }));
                        self.session.handle_connect(client_id, &display_name, now);
                    }
                    None => {
                        let response = Packet::Disconnected {
                            reason: "Server full".to_string(),
                        };
                        if let Err(e) = send_packet(&self.socket, &response, addr).await {
                            error!("Failed to reject client at {}: {}", addr, e);
                        }
                    }
                }
            }

            Packet::Disconnect => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };
                if let Some(client_id) = client_id {
                    self.clients.write().await.remove_client(client_id);
                    self.session.handle_disconnect(client_id, now);
                }
            }

            other => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };
                let Some(client_id) = client_id else {
                    debug!("Dropping packet from unknown address {}", addr);
                    return;
                };
                self.clients.write().await.touch(client_id);
                self.dispatch(client_id, other, now);
            }
        }
    }

    fn dispatch(&mut self, client_id: ClientId, packet: Packet, now: Instant) {
        match packet {
            Packet::SelectItem { item_id } => {
                self.session.handle_select_item(client_id, item_id, now);
            }
            Packet::UpdateGhost {
                position,
                rotation_z,
                visible,
            } => {
                self.session
                    .handle_update_ghost(client_id, position, rotation_z, visible);
            }
            Packet::ConfirmPlacement {
                position,
                rotation_z,
            } => {
                self.session
                    .handle_confirm_placement(client_id, position, rotation_z, now);
            }
            Packet::PlayerUpdate {
                position,
                velocity,
                grounded,
                facing_right,
                dancing,
            } => {
                self.session.handle_player_update(
                    client_id,
                    position,
                    velocity,
                    grounded,
                    facing_right,
                    dancing,
                );
            }
            Packet::FinishedLevel => {
                self.session.handle_finished(client_id, true, now);
            }
            Packet::FellOut => {
                self.session.handle_finished(client_id, false, now);
            }
            _ => {
                warn!("Unexpected packet type from client {}", client_id);
            }
        }
    }

    /// Broadcasts the canonical player snapshot to everyone connected.
    fn broadcast_player_states(&mut self) {
        if self.session.connected_count() == 0 {
            return;
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis();
        let timestamp_safe = (timestamp.min(u64::MAX as u128)) as u64;

        let packet = Packet::PlayerStates {
            tick: self.tick,
            timestamp: timestamp_safe,
            players: self.session.player_snapshot(),
        };

        if let Err(e) = self.outbound_tx.send(Outbound::Broadcast(packet)) {
            error!("Failed to queue player state broadcast: {}", e);
        }
    }

    /// Main authority loop coordinating all operations.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);

        info!("Session server started");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    let now = Instant::now();
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr, now).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.session.handle_disconnect(client_id, now);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Session server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    self.session.tick(now);
                    self.tick += 1;
                    self.broadcast_player_states();

                    if self.tick % (SYNC_RATE_HZ * 2) == 0 && self.session.connected_count() > 0 {
                        debug!(
                            "Tick {}: phase {:?}, {} clients",
                            self.tick,
                            self.session.phase(),
                            self.session.connected_count()
                        );
                    }
                },
            }
        }

        Ok(())
    }
}

async fn send_packet(
    socket: &UdpSocket,
    packet: &Packet,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = serialize(packet)?;
    socket.send_to(&data, addr).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_server_message_packet_received() {
        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
            display_name: "Ola".to_string(),
        };
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);

        let msg = ServerMessage::PacketReceived { packet, addr };

        match msg {
            ServerMessage::PacketReceived { packet: p, addr: a } => {
                assert_eq!(a, addr);
                match p {
                    Packet::Connect { client_version, .. } => {
                        assert_eq!(client_version, PROTOCOL_VERSION);
                    }
                    _ => panic!("Unexpected packet type"),
                }
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_client_timeout_message() {
        let msg = ServerMessage::ClientTimeout { client_id: 42 };
        match msg {
            ServerMessage::ClientTimeout { client_id } => assert_eq!(client_id, 42),
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_tick_duration_matches_sync_rate() {
        let duration = Duration::from_secs_f32(1.0 / SYNC_RATE_HZ as f32);
        assert!(duration.as_millis() > 0);
        assert!(duration.as_millis() < 1000);

        let hz = 1000.0 / duration.as_millis() as f64;
        assert!((25.0..=40.0).contains(&hz));
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let server = Server::new("127.0.0.1:0", SessionConfig::default(), 8).await;
        assert!(server.is_ok());
    }
}
