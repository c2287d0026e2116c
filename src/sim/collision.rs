//! Contact queries between marbles and the static geometry around them
//!
//! Every query treats the first argument as the moving circle and reports the
//! contact normal pointing toward that circle's center, which is the direction
//! the circle has to be pushed to separate.

use glam::Vec2;

/// Result of a contact check
#[derive(Debug, Clone, Copy)]
pub struct CollisionResult {
    /// Whether the shapes overlap
    pub hit: bool,
    /// Contact point on the other shape's surface
    pub point: Vec2,
    /// Surface normal pointing toward the circle center
    pub normal: Vec2,
    /// Overlap depth along the normal
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Circle against circle
pub fn circle_circle(
    pos: Vec2,
    radius: f32,
    other_pos: Vec2,
    other_radius: f32,
) -> CollisionResult {
    let delta = pos - other_pos;
    let dist_sq = delta.length_squared();
    let reach = radius + other_radius;
    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Coincident centers: pick a stable separating direction
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::Y };
    CollisionResult {
        hit: true,
        point: other_pos + normal * other_radius,
        normal,
        penetration: reach - dist,
    }
}

/// Circle against an oriented box
///
/// The circle center is moved into box-local space, clamped to the extents to
/// find the closest point, then the result is rotated back.
pub fn circle_box(
    pos: Vec2,
    radius: f32,
    box_center: Vec2,
    box_rotation: f32,
    half_extents: Vec2,
) -> CollisionResult {
    let rot = Vec2::from_angle(box_rotation);
    let inv_rot = Vec2::new(rot.x, -rot.y);
    let local = inv_rot.rotate(pos - box_center);

    let inside = local.x.abs() <= half_extents.x && local.y.abs() <= half_extents.y;
    if !inside {
        let closest = local.clamp(-half_extents, half_extents);
        let delta = local - closest;
        let dist_sq = delta.length_squared();
        if dist_sq >= radius * radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        let local_normal = if dist > 1e-6 { delta / dist } else { Vec2::Y };
        return CollisionResult {
            hit: true,
            point: box_center + rot.rotate(closest),
            normal: rot.rotate(local_normal),
            penetration: radius - dist,
        };
    }

    // Center is inside the box: push out through the nearest face
    let gap_x = half_extents.x - local.x.abs();
    let gap_y = half_extents.y - local.y.abs();
    let (local_normal, face_point, gap) = if gap_x < gap_y {
        let sign = if local.x >= 0.0 { 1.0 } else { -1.0 };
        (
            Vec2::new(sign, 0.0),
            Vec2::new(sign * half_extents.x, local.y),
            gap_x,
        )
    } else {
        let sign = if local.y >= 0.0 { 1.0 } else { -1.0 };
        (
            Vec2::new(0.0, sign),
            Vec2::new(local.x, sign * half_extents.y),
            gap_y,
        )
    };
    CollisionResult {
        hit: true,
        point: box_center + rot.rotate(face_point),
        normal: rot.rotate(local_normal),
        penetration: radius + gap,
    }
}
