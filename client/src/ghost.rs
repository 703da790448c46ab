//! Local ghost placement: cursor projection and delta-gated updates.
//!
//! During item placement each client computes its candidate position by
//! projecting the 2D cursor ray onto a fixed depth plane and relays it to
//! the authority only once it has moved or rotated meaningfully, keeping
//! the ghost channel well under the movement-sync rate.

use shared::{Vec3, GHOST_POSITION_EPSILON, GHOST_ROTATION_EPSILON};

/// Projects a cursor ray onto the placement plane at `plane_z`. Returns
/// None when the ray runs parallel to the plane.
pub fn project_cursor(ray_origin: Vec3, ray_direction: Vec3, plane_z: f32) -> Option<Vec3> {
    if ray_direction.z.abs() < f32::EPSILON {
        return None;
    }

    let t = (plane_z - ray_origin.z) / ray_direction.z;
    if t < 0.0 {
        return None;
    }

    Some(ray_origin.add(&ray_direction.scale(t)))
}

/// Tracks the last relayed ghost pose and decides when a new one differs
/// enough to be worth sending.
#[derive(Debug, Default)]
pub struct GhostSender {
    last_sent: Option<(Vec3, f32, bool)>,
}

impl GhostSender {
    pub fn new() -> Self {
        Self { last_sent: None }
    }

    /// True when the pose moved past the positional epsilon, rotated past
    /// the rotational epsilon, or toggled visibility. Records the pose as
    /// sent when it qualifies.
    pub fn should_send(&mut self, position: Vec3, rotation_z: f32, visible: bool) -> bool {
        let qualifies = match self.last_sent {
            None => true,
            Some((last_position, last_rotation, last_visible)) => {
                last_visible != visible
                    || last_position.distance(&position) >= GHOST_POSITION_EPSILON
                    || (rotation_z - last_rotation).abs() >= GHOST_ROTATION_EPSILON
            }
        };

        if qualifies {
            self.last_sent = Some((position, rotation_z, visible));
        }
        qualifies
    }

    /// Forgets the last pose, e.g. after the authority cleared the ghost.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}
