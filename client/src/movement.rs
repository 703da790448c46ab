//! Movement roles: the owner integrator and the mirror interpolator.
//!
//! The two roles are distinct types picked at construction. An owner is the
//! source of truth for its own rendered position and never interpolates; a
//! mirror only ever consumes canonical updates and smooths toward them,
//! snapping when the discrepancy is too large to chase visibly.

use shared::{PlayerState, Vec3, CORRECTION_RATE, SNAP_DISTANCE};

/// The local player's movement state. Input-derived fields are written by
/// game code; the authority only ever relocates it via teleport directives.
#[derive(Debug, Clone)]
pub struct OwnerIntegrator {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    pub facing_right: bool,
    pub dancing: bool,
}

impl OwnerIntegrator {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            grounded: true,
            facing_right: true,
            dancing: false,
        }
    }

    /// Advances position by the current velocity. The actual physics step
    /// lives in gameplay code; this is the minimal integration the sync
    /// layer needs.
    pub fn integrate(&mut self, dt: f32) {
        self.position = self.position.add(&self.velocity.scale(dt));
    }

    /// Applies a server-directed relocation (round reset, respawn).
    pub fn apply_teleport(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.grounded = true;
    }
}

impl Default for OwnerIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

/// A remote player's view: rendered position chasing the latest canonical
/// position. Discrete booleans apply immediately, without smoothing.
#[derive(Debug, Clone)]
pub struct MirrorInterpolator {
    pub rendered: Vec3,
    target: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    pub facing_right: bool,
    pub dancing: bool,
    pub visible: bool,
    pub display_name: String,
}

impl MirrorInterpolator {
    pub fn from_state(state: &PlayerState) -> Self {
        Self {
            rendered: state.position,
            target: state.position,
            velocity: state.velocity,
            grounded: state.grounded,
            facing_right: state.facing_right,
            dancing: state.dancing,
            visible: state.visible,
            display_name: state.display_name.clone(),
        }
    }

    /// Folds in the latest canonical state. Snaps straight to the target
    /// when the discrepancy exceeds the snap threshold.
    pub fn apply_canonical(&mut self, state: &PlayerState) {
        self.target = state.position;
        self.velocity = state.velocity;
        self.grounded = state.grounded;
        self.facing_right = state.facing_right;
        self.dancing = state.dancing;
        self.visible = state.visible;

        if self.rendered.distance(&self.target) > SNAP_DISTANCE {
            self.rendered = self.target;
        }
    }

    /// Moves the rendered position toward the canonical target at the fixed
    /// correction rate.
    pub fn step(&mut self, dt: f32) {
        self.rendered = self.rendered.lerp(&self.target, CORRECTION_RATE * dt);
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }
}
