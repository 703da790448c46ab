//! # Game Client Library
//!
//! Client-side implementation for the item-placement racing game. The client
//! mirrors the authoritative session hosted by the server: it replicates the
//! phase machine, standings and placed level, integrates its own avatar
//! locally, and smooths every remote avatar toward canonical state.
//!
//! ## Architecture Overview
//!
//! The client never decides game outcomes. It has exactly one writable
//! surface per concern and everything else is a read-only mirror fed by
//! server packets:
//!
//! ### Owner Integration
//! The locally controlled avatar is integrated every frame from its own
//! velocity without waiting for the server, so movement feels immediate.
//! The authority clamps and rebroadcasts what it accepts.
//!
//! ### Mirror Interpolation
//! Remote avatars are rendered behind their canonical state and pulled
//! toward it with a rate-limited lerp, snapping only when the error grows
//! past the teleport threshold. Discrete state (facing, dancing) applies
//! immediately.
//!
//! ### Ghost Previews
//! During item placement the cursor is projected onto the gameplay plane
//! and the resulting pose is relayed only when it moved past the send
//! epsilons, keeping preview traffic sparse.
//!
//! ## Module Organization
//!
//! - `game`: replicated session mirror and packet application
//! - `ghost`: cursor projection and ghost send gating
//! - `movement`: owner integration and mirror interpolation
//! - `network`: UDP connection, receive loop and sync-rate send cadence

pub mod game;
pub mod ghost;
pub mod movement;
pub mod network;
