//! Client connection management for the session server.
//!
//! Tracks which network address belongs to which client id, enforces the
//! capacity limit, and detects timeouts so the session can purge dead
//! connections. The session itself never sees addresses; it deals in
//! client ids only.

use log::info;
use shared::ClientId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected client's transport-level bookkeeping.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub addr: SocketAddr,
    pub display_name: String,
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: ClientId, addr: SocketAddr, display_name: String) -> Self {
        Self {
            id,
            addr,
            display_name,
            last_seen: Instant::now(),
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Roster of live connections indexed by client id.
pub struct ClientManager {
    clients: HashMap<ClientId, Client>,
    next_client_id: ClientId,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a connection, returning None when the server is full.
    pub fn add_client(&mut self, addr: SocketAddr, display_name: &str) -> Option<ClientId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} ({}) connected from {}", client_id, display_name, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, display_name.to_string()));

        Some(client_id)
    }

    pub fn remove_client(&mut self, client_id: ClientId) -> bool {
        if let Some(client) = self.clients.remove(&client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<ClientId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn addr_of(&self, client_id: ClientId) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Marks a client as recently active. Any inbound packet counts.
    pub fn touch(&mut self, client_id: ClientId) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.last_seen = Instant::now();
        }
    }

    /// Removes clients that have gone silent past `timeout` and returns
    /// their ids so session state can be purged too.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<ClientId> {
        let timed_out: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(*client_id);
        }

        timed_out
    }

    pub fn get_client_addrs(&self) -> Vec<(ClientId, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_add_and_remove_client() {
        let mut manager = ClientManager::new(4);
        let client_id = manager.add_client(test_addr(), "Ola").unwrap();

        assert_eq!(client_id, 1);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.addr_of(client_id), Some(test_addr()));

        assert!(manager.remove_client(client_id));
        assert!(manager.is_empty());
        assert!(!manager.remove_client(client_id));
    }

    #[test]
    fn test_capacity_limit() {
        let mut manager = ClientManager::new(1);
        assert!(manager.add_client(test_addr(), "a").is_some());
        assert!(manager.add_client(test_addr2(), "b").is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut manager = ClientManager::new(4);
        let first = manager.add_client(test_addr(), "a").unwrap();
        manager.remove_client(first);
        let second = manager.add_client(test_addr(), "a").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = ClientManager::new(4);
        let client_id = manager.add_client(test_addr(), "Ola").unwrap();

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(client_id));
        assert_eq!(manager.find_client_by_addr(test_addr2()), None);
    }

    #[test]
    fn test_timeout_detection() {
        let mut manager = ClientManager::new(4);
        let client_id = manager.add_client(test_addr(), "Ola").unwrap();

        assert!(manager.check_timeouts(Duration::from_secs(5)).is_empty());

        manager.clients.get_mut(&client_id).unwrap().last_seen =
            Instant::now() - Duration::from_secs(10);

        let timed_out = manager.check_timeouts(Duration::from_secs(5));
        assert_eq!(timed_out, vec![client_id]);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_touch_resets_timeout() {
        let mut manager = ClientManager::new(4);
        let client_id = manager.add_client(test_addr(), "Ola").unwrap();

        manager.clients.get_mut(&client_id).unwrap().last_seen =
            Instant::now() - Duration::from_secs(10);
        manager.touch(client_id);

        assert!(manager.check_timeouts(Duration::from_secs(5)).is_empty());
    }
}
