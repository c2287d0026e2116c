//! Helpers that build the handful of body shapes scenes are made from

use glam::Vec2;

use super::arena::BodyHandle;
use super::body::{Body, BodyKind, Material, Shape, Style};
use super::world::World;
use crate::error::SimError;

/// Static axis-aligned box, used for floors and side walls
pub fn create_wall(world: &mut World, center: Vec2, size: Vec2) -> Result<BodyHandle, SimError> {
    create_wall_with(world, center, size, Material::WALL)
}

/// Static axis-aligned box with a custom surface
pub fn create_wall_with(
    world: &mut World,
    center: Vec2,
    size: Vec2,
    material: Material,
) -> Result<BodyHandle, SimError> {
    let body = Body::new(
        BodyKind::Static,
        Shape::Box {
            half_extents: size * 0.5,
        },
        material,
        center,
    );
    world.add_body(body)
}

/// Circle body; dynamic circles are styled as marbles, static ones as obstacles
pub fn create_circle(
    world: &mut World,
    position: Vec2,
    radius: f32,
    material: Material,
    kind: BodyKind,
) -> Result<BodyHandle, SimError> {
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(SimError::InvalidRadius);
    }
    let style = match kind {
        BodyKind::Dynamic => Style::Marble,
        BodyKind::Static => Style::Obstacle,
    };
    let body = Body::new(kind, Shape::Circle { radius }, material, position).with_style(style);
    world.add_body(body)
}

/// Static thin box spanning `p1` to `p2`
///
/// The box is centered on the midpoint and rotated to the segment angle. Lines
/// are visible obstacles; hide them afterwards if a scene needs invisible rails.
pub fn create_line(
    world: &mut World,
    p1: Vec2,
    p2: Vec2,
    thickness: f32,
    material: Material,
) -> Result<BodyHandle, SimError> {
    let delta = p2 - p1;
    let length = delta.length();
    if length < 1e-6 {
        return Err(SimError::DegenerateLine);
    }
    let body = Body::new(
        BodyKind::Static,
        Shape::Box {
            half_extents: Vec2::new(length * 0.5, thickness * 0.5),
        },
        material,
        (p1 + p2) * 0.5,
    )
    .with_rotation(delta.y.atan2(delta.x))
    .with_style(Style::Obstacle);
    world.add_body(body)
}
