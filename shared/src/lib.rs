//! Types shared between the authoritative session server and its clients:
//! the wire protocol, vector/AABB math, the placeable item catalog and the
//! replicated value/list primitives that carry canonical state.

pub mod items;
pub mod math;
pub mod protocol;
pub mod replication;

pub use items::{ColliderShape, ItemCatalog, ItemDef};
pub use math::{Aabb, Vec3};
pub use protocol::{ClientId, GamePhase, Packet, PlayerState};
pub use replication::{ListEvent, ReplicatedList, ReplicatedValue};

/// Client/server protocol compatibility version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Hard cap on player speed; the authority clamps anything above this plus
/// tolerance before a movement update becomes canonical.
pub const MAX_PLAYER_SPEED: f32 = 12.0;
pub const SPEED_TOLERANCE: f32 = 1.1;

/// Cadence at which owners send movement updates and the authority fans out
/// canonical player snapshots.
pub const SYNC_RATE_HZ: u32 = 30;

/// Observers snap instead of interpolating past this positional discrepancy.
pub const SNAP_DISTANCE: f32 = 5.0;
/// Fraction of remaining correction applied per second while interpolating.
pub const CORRECTION_RATE: f32 = 10.0;

/// Minimum deltas before a client re-sends its ghost placement preview.
pub const GHOST_POSITION_EPSILON: f32 = 0.1;
pub const GHOST_ROTATION_EPSILON: f32 = 5.0;

/// Placement volumes are shrunk by 5% so edge-adjacent placements pass.
pub const PLACEMENT_SHRINK: f32 = 0.95;

pub const DEFAULT_FINISH_SCORE: u32 = 5;
pub const DEFAULT_ROUND_SECS: u64 = 120;
/// How long the scoreboard stays up before the next round starts.
pub const ROUND_OVER_DELAY_SECS: u64 = 5;

/// Spawn position used when the level configures no spawn points.
pub const FALLBACK_SPAWN: Vec3 = Vec3 {
    x: 0.0,
    y: 1.0,
    z: 0.0,
};
