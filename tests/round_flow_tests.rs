//! Full round-flow tests driving the authoritative session end to end
//!
//! These exercise the phase machine the way the network layer does at
//! runtime: connect handlers, intent handlers and the timer tick, with
//! the outbound channel standing in for the UDP sender task.

use server::config::SessionConfig;
use server::session::{Outbound, Session};
use shared::{GamePhase, ItemCatalog, Packet, Vec3, ROUND_OVER_DELAY_SECS};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

fn new_session(finish_score: u32) -> (Session, UnboundedReceiver<Outbound>) {
    let (tx, rx) = unbounded_channel();
    let config = SessionConfig {
        finish_score,
        round_secs: 60,
        spawn_points: vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(3.0, 1.0, 0.0)],
        static_geometry: Vec::new(),
    };
    (Session::new(config, ItemCatalog::standard(), tx), rx)
}

fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }
    messages
}

/// Drives both clients from item selection to a running round.
fn advance_to_round(session: &mut Session, now: Instant) {
    session.handle_select_item(1, "Cannon".to_string(), now);
    session.handle_select_item(2, "SpikeTrap".to_string(), now);
    assert_eq!(session.phase(), GamePhase::ItemPlacement);

    session.handle_confirm_placement(1, Vec3::new(0.0, 0.0, 0.0), 0.0, now);
    session.handle_confirm_placement(2, Vec3::new(10.0, 0.0, 0.0), 0.0, now);
    assert_eq!(session.phase(), GamePhase::RoundInProgress);
}

/// A complete round: selection, placement, race, scoreboard, next selection
#[test]
fn full_round_cycle() {
    let (mut session, mut rx) = new_session(5);
    let now = Instant::now();

    session.handle_connect(1, "Ola", now);
    session.handle_connect(2, "Kari", now);
    assert_eq!(session.phase(), GamePhase::ItemSelection);

    advance_to_round(&mut session, now);

    // Both placements reached every mirror
    let messages = drain(&mut rx);
    let spawned = messages
        .iter()
        .filter(|m| matches!(m, Outbound::Broadcast(Packet::SpawnPlacedItem { .. })))
        .count();
    assert_eq!(spawned, 2);

    // First finisher earns a star and ends the round
    session.handle_finished(1, true, now);
    session.handle_finished(2, true, now);
    assert_eq!(session.phase(), GamePhase::RoundOver);
    assert_eq!(session.stars(1), Some(1));
    assert_eq!(session.stars(2), Some(1));

    // Scoreboard holds until its delay elapses
    session.tick(now + Duration::from_secs(1));
    assert_eq!(session.phase(), GamePhase::RoundOver);

    session.tick(now + Duration::from_secs(ROUND_OVER_DELAY_SECS + 1));
    assert_eq!(session.phase(), GamePhase::ItemSelection);

    // The placed level was cleared for the new round
    assert!(session.placement().placed_items().is_empty());
}

/// Round timer expiry ends the round without any finisher
#[test]
fn round_timer_ends_round() {
    let (mut session, _rx) = new_session(5);
    let now = Instant::now();

    session.handle_connect(1, "Ola", now);
    session.handle_connect(2, "Kari", now);
    advance_to_round(&mut session, now);

    session.tick(now + Duration::from_secs(59));
    assert_eq!(session.phase(), GamePhase::RoundInProgress);

    session.tick(now + Duration::from_secs(61));
    assert_eq!(session.phase(), GamePhase::RoundOver);
    assert_eq!(session.stars(1), Some(0));
    assert_eq!(session.stars(2), Some(0));
}

/// A fatal fall ends the player's round but never awards a star
#[test]
fn fell_out_counts_without_star() {
    let (mut session, _rx) = new_session(5);
    let now = Instant::now();

    session.handle_connect(1, "Ola", now);
    session.handle_connect(2, "Kari", now);
    advance_to_round(&mut session, now);

    session.handle_finished(1, true, now);
    session.handle_finished(2, false, now);

    assert_eq!(session.phase(), GamePhase::RoundOver);
    assert_eq!(session.stars(1), Some(1));
    assert_eq!(session.stars(2), Some(0));
}

/// Reaching the finish score broadcasts the winner and ends the round early
#[test]
fn winner_declared_at_finish_score() {
    let (mut session, mut rx) = new_session(1);
    let now = Instant::now();

    session.handle_connect(1, "Ola", now);
    session.handle_connect(2, "Kari", now);
    advance_to_round(&mut session, now);
    drain(&mut rx);

    session.handle_finished(1, true, now);

    assert_eq!(session.winner(), Some(1));
    assert_eq!(session.phase(), GamePhase::RoundOver);
    let messages = drain(&mut rx);
    assert!(messages
        .iter()
        .any(|m| matches!(m, Outbound::Broadcast(Packet::GameWon { client_id: 1 }))));
}

/// A disconnect mid-selection completes the phase for the remaining roster
#[test]
fn disconnect_unblocks_selection() {
    let (mut session, _rx) = new_session(5);
    let now = Instant::now();

    session.handle_connect(1, "Ola", now);
    session.handle_connect(2, "Kari", now);

    session.handle_select_item(1, "Cannon".to_string(), now);
    assert_eq!(session.phase(), GamePhase::ItemSelection);

    session.handle_disconnect(2, now);
    assert_eq!(session.phase(), GamePhase::ItemPlacement);
}

/// A disconnect mid-race completes the everyone-finished check for the
/// remaining roster
#[test]
fn disconnect_during_round_ends_round() {
    let (mut session, _rx) = new_session(5);
    let now = Instant::now();

    session.handle_connect(1, "Ola", now);
    session.handle_connect(2, "Kari", now);
    advance_to_round(&mut session, now);

    session.handle_finished(1, true, now);
    assert_eq!(session.phase(), GamePhase::RoundInProgress);

    session.handle_disconnect(2, now);
    assert_eq!(session.phase(), GamePhase::RoundOver);
    assert_eq!(session.stars(1), Some(1));
}

/// Multiple rounds accumulate stars across the same ledger
#[test]
fn stars_accumulate_across_rounds() {
    let (mut session, _rx) = new_session(5);
    let mut now = Instant::now();

    session.handle_connect(1, "Ola", now);
    session.handle_connect(2, "Kari", now);

    for round in 0..3 {
        advance_to_round(&mut session, now);
        session.handle_finished(1, true, now);
        session.handle_finished(2, round == 0, now);
        assert_eq!(session.phase(), GamePhase::RoundOver);

        now += Duration::from_secs(ROUND_OVER_DELAY_SECS + 1);
        session.tick(now);
        assert_eq!(session.phase(), GamePhase::ItemSelection);
    }

    assert_eq!(session.stars(1), Some(3));
    assert_eq!(session.stars(2), Some(1));
}
