//! # Session Server Library
//!
//! This library provides the authoritative session coordinator for the
//! round-based multiplayer game. It advances every connected client through
//! the shared phase cycle (item selection, item placement, race, round over),
//! replicates transient per-player state to all participants, arbitrates
//! placement legality and maintains the monotonic score ledger.
//!
//! ## Architecture
//!
//! ### Single Authoritative Writer
//! The server is the only writer of canonical session state. All inbound
//! client messages are processed to completion, one at a time, on a single
//! `tokio::select!` loop; no internal locking is needed for session state
//! and behavior is deterministic in arrival order. Completion checks
//! ("everyone selected", "everyone placed", "everyone finished") are
//! idempotent recomputations over live state rather than event counters, so
//! they are insensitive to interleaving and self-heal on disconnects.
//!
//! ### Replication
//! Canonical state lives in replicated value/list cells. Every effective
//! write fires change observers, which push the matching packet into the
//! outbound queue. Clients hold read-only mirrors refreshed by those
//! notifications and re-derive their local behavior purely from the current
//! phase value, so a late joiner resynchronizes by replaying current state.
//!
//! ## Module Organization
//!
//! - [`session`] — the phase state machine owning all other components
//! - [`placement`] — selection bookkeeping, ghost relay, placement arbitration
//! - [`players`] — canonical per-player movement state with velocity clamping
//! - [`score`] — the per-player star ledger and win threshold
//! - [`client_manager`] — connection roster, capacity and timeouts
//! - [`network`] — UDP transport and the authority message loop
//! - [`config`] — session configuration handed over by the lobby
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::SessionConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:8080", SessionConfig::default(), 8).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod network;
pub mod placement;
pub mod players;
pub mod score;
pub mod session;
