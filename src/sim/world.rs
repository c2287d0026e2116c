//! Physics world: gravity, bodies and the fixed-timestep solver
//!
//! World units are LED cells with y pointing up. A world only ever advances by
//! `SIM_DT`; the solver splits that timestep into a fixed number of substeps so
//! fast marbles cannot tunnel through the thin walls.

use glam::Vec2;

use super::arena::{BodyArena, BodyHandle, WorldId};
use super::body::{Body, Shape};
use super::collision::{CollisionResult, circle_box, circle_circle};
use crate::consts::{MAX_BODIES, SIM_DT, SIM_HZ, SOLVER_SUBSTEPS};
use crate::error::SimError;

/// Closing speed below which contacts stop bouncing
const RESTITUTION_THRESHOLD: f32 = 1.0;
/// Penetration allowed before positional correction kicks in
const LINEAR_SLOP: f32 = 0.005;
/// Fraction of the remaining overlap removed per substep
const CORRECTION_FACTOR: f32 = 0.8;

/// How the restitution of two touching materials is combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestitutionMix {
    /// Bounciest surface wins
    #[default]
    Max,
    /// Deadest surface wins, so marbles bounce off each other but not the track
    Min,
}

impl RestitutionMix {
    #[inline]
    fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            RestitutionMix::Max => a.max(b),
            RestitutionMix::Min => a.min(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    pub gravity: Vec2,
    pub max_bodies: usize,
    pub restitution_mix: RestitutionMix,
}

impl WorldConfig {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            max_bodies: MAX_BODIES,
            restitution_mix: RestitutionMix::default(),
        }
    }

    pub fn with_max_bodies(mut self, max_bodies: usize) -> Self {
        self.max_bodies = max_bodies;
        self
    }

    pub fn with_restitution_mix(mut self, mix: RestitutionMix) -> Self {
        self.restitution_mix = mix;
        self
    }
}

/// The mutable simulation state for one mode activation
#[derive(Debug)]
pub struct World {
    id: WorldId,
    gravity: Vec2,
    restitution_mix: RestitutionMix,
    bodies: BodyArena,
    ticks: u64,
}

impl World {
    /// Allocate an empty world
    pub fn new(config: WorldConfig) -> Result<Self, SimError> {
        if !config.gravity.is_finite() {
            return Err(SimError::InvalidGravity);
        }
        if config.max_bodies == 0 {
            return Err(SimError::ZeroCapacity);
        }
        let id = WorldId::next();
        Ok(Self {
            id,
            gravity: config.gravity,
            restitution_mix: config.restitution_mix,
            bodies: BodyArena::new(id, config.max_bodies),
            ticks: 0,
        })
    }

    #[inline]
    pub fn id(&self) -> WorldId {
        self.id
    }

    #[inline]
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Number of fixed timesteps taken so far
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time in seconds, always `ticks / SIM_HZ`
    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 / SIM_HZ as f64
    }

    #[inline]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn add_body(&mut self, body: Body) -> Result<BodyHandle, SimError> {
        self.bodies.insert(body)
    }

    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<(), SimError> {
        self.bodies.remove(handle).map(|_| ())
    }

    #[inline]
    pub fn is_valid(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter()
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(handle).map(|b| b.position)
    }

    pub fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(handle).map(|b| b.linear_velocity)
    }

    /// Teleport a body
    pub fn set_transform(
        &mut self,
        handle: BodyHandle,
        position: Vec2,
        rotation: f32,
    ) -> Result<(), SimError> {
        let body = self.bodies.get_mut(handle).ok_or(SimError::StaleHandle)?;
        body.position = position;
        body.rotation = rotation;
        Ok(())
    }

    pub fn set_linear_velocity(
        &mut self,
        handle: BodyHandle,
        velocity: Vec2,
    ) -> Result<(), SimError> {
        let body = self.bodies.get_mut(handle).ok_or(SimError::StaleHandle)?;
        body.linear_velocity = velocity;
        Ok(())
    }

    pub fn set_angular_velocity(
        &mut self,
        handle: BodyHandle,
        velocity: f32,
    ) -> Result<(), SimError> {
        let body = self.bodies.get_mut(handle).ok_or(SimError::StaleHandle)?;
        body.angular_velocity = velocity;
        Ok(())
    }

    /// Release every body; outstanding handles become stale
    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    /// Advance the simulation by exactly one `SIM_DT`
    pub fn step(&mut self) {
        let h = SIM_DT / SOLVER_SUBSTEPS as f32;
        for _ in 0..SOLVER_SUBSTEPS {
            self.integrate(h);
            self.solve_contacts();
        }
        self.ticks += 1;
    }

    fn integrate(&mut self, h: f32) {
        let gravity = self.gravity;
        for slot in 0..self.bodies.slot_count() {
            let Some(body) = self.bodies.slot_body_mut(slot) else {
                continue;
            };
            if !body.is_dynamic() {
                continue;
            }
            body.linear_velocity += gravity * h;
            body.position += body.linear_velocity * h;
            body.rotation += body.angular_velocity * h;
        }
    }

    fn solve_contacts(&mut self) {
        let slots = self.bodies.slot_count();
        for a in 0..slots {
            let is_moving_circle = self
                .bodies
                .slot_body(a)
                .is_some_and(|b| b.is_dynamic() && b.radius().is_some());
            if !is_moving_circle {
                continue;
            }
            for b in 0..slots {
                if a == b {
                    continue;
                }
                // Dynamic pairs are visited once, from the lower slot
                let other_dynamic = self.bodies.slot_body(b).is_some_and(|o| o.is_dynamic());
                if other_dynamic && b < a {
                    continue;
                }
                let mix = self.restitution_mix;
                if let Some((circle, other)) = self.bodies.pair_mut(a, b) {
                    let contact = find_contact(circle, other);
                    if contact.hit {
                        resolve_contact(circle, other, &contact, mix);
                    }
                }
            }
        }
    }
}

fn find_contact(circle: &Body, other: &Body) -> CollisionResult {
    let Some(radius) = circle.radius() else {
        return CollisionResult::miss();
    };
    match other.shape {
        Shape::Circle { radius: other_radius } => {
            circle_circle(circle.position, radius, other.position, other_radius)
        }
        Shape::Box { half_extents } => circle_box(
            circle.position,
            radius,
            other.position,
            other.rotation,
            half_extents,
        ),
    }
}

/// Impulse response for one contact; `contact.normal` points from `other`
/// toward `circle`
fn resolve_contact(
    circle: &mut Body,
    other: &mut Body,
    contact: &CollisionResult,
    mix: RestitutionMix,
) {
    let n = contact.normal;
    let inv_mass_sum = circle.inv_mass() + other.inv_mass();
    if inv_mass_sum <= 0.0 {
        return;
    }

    // Positional correction, split by inverse mass
    let depth = (contact.penetration - LINEAR_SLOP).max(0.0);
    let correction = depth * CORRECTION_FACTOR / inv_mass_sum;
    circle.position += n * correction * circle.inv_mass();
    other.position -= n * correction * other.inv_mass();

    let r_a = contact.point - circle.position;
    let r_b = contact.point - other.position;
    let relative_velocity = |a: &Body, b: &Body| {
        (a.linear_velocity + r_a.perp() * a.angular_velocity)
            - (b.linear_velocity + r_b.perp() * b.angular_velocity)
    };

    let v_rel = relative_velocity(circle, other);
    let v_n = v_rel.dot(n);
    if v_n >= 0.0 {
        return;
    }

    let restitution = if -v_n < RESTITUTION_THRESHOLD {
        0.0
    } else {
        mix.combine(circle.material.restitution, other.material.restitution)
    };
    let j_n = -(1.0 + restitution) * v_n / inv_mass_sum;
    apply_impulse(circle, other, n * j_n, r_a, r_b);

    // Coulomb friction along the contact tangent
    let v_rel = relative_velocity(circle, other);
    let tangent = v_rel - n * v_rel.dot(n);
    let Some(t) = tangent.try_normalize() else {
        return;
    };
    let k_t = inv_mass_sum
        + r_a.perp_dot(t).powi(2) * circle.inv_inertia()
        + r_b.perp_dot(t).powi(2) * other.inv_inertia();
    if k_t <= 0.0 {
        return;
    }
    let friction = (circle.material.friction * other.material.friction).sqrt();
    let j_t = (-v_rel.dot(t) / k_t).clamp(-friction * j_n, friction * j_n);
    apply_impulse(circle, other, t * j_t, r_a, r_b);
}

#[inline]
fn apply_impulse(a: &mut Body, b: &mut Body, impulse: Vec2, r_a: Vec2, r_b: Vec2) {
    a.linear_velocity += impulse * a.inv_mass();
    a.angular_velocity += r_a.perp_dot(impulse) * a.inv_inertia();
    b.linear_velocity -= impulse * b.inv_mass();
    b.angular_velocity -= r_b.perp_dot(impulse) * b.inv_inertia();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::{BodyKind, Material};
    use crate::sim::primitives::{create_circle, create_wall};

    fn falling_world() -> World {
        World::new(WorldConfig::new(Vec2::new(0.0, -9.8))).unwrap()
    }

    #[test]
    fn test_world_creation_failures() {
        assert_eq!(
            World::new(WorldConfig::new(Vec2::new(f32::NAN, 0.0))).unwrap_err(),
            SimError::InvalidGravity
        );
        assert_eq!(
            World::new(WorldConfig::new(Vec2::ZERO).with_max_bodies(0)).unwrap_err(),
            SimError::ZeroCapacity
        );
    }

    #[test]
    fn test_fixed_timestep_elapsed() {
        let mut world = falling_world();
        for _ in 0..90 {
            world.step();
        }
        assert_eq!(world.ticks(), 90);
        assert_eq!(world.elapsed(), 90.0 * (1.0 / 60.0));
    }

    #[test]
    fn test_free_fall_matches_gravity() {
        let mut world = falling_world();
        let marble = create_circle(
            &mut world,
            Vec2::new(5.0, 100.0),
            0.5,
            Material::new(0.3, 0.85),
            BodyKind::Dynamic,
        )
        .unwrap();
        for _ in 0..60 {
            world.step();
        }
        let v = world.linear_velocity(marble).unwrap();
        assert!((v.y + 9.8).abs() < 1e-3, "velocity after 1s was {v}");
        let y = world.position(marble).unwrap().y;
        assert!(y < 96.0 && y > 94.0, "fell to {y}");
    }

    #[test]
    fn test_marble_comes_to_rest_on_floor() {
        let mut world = falling_world();
        create_wall(&mut world, Vec2::new(5.0, -0.125), Vec2::new(20.0, 0.25)).unwrap();
        let marble = create_circle(
            &mut world,
            Vec2::new(5.0, 3.0),
            0.5,
            Material::new(0.3, 0.85),
            BodyKind::Dynamic,
        )
        .unwrap();
        for _ in 0..600 {
            world.step();
        }
        let pos = world.position(marble).unwrap();
        assert!((pos.y - 0.5).abs() < 0.05, "resting height {}", pos.y);
        assert!(world.linear_velocity(marble).unwrap().length() < 0.2);
    }

    #[test]
    fn test_marble_bounces_off_floor() {
        let mut world = falling_world();
        create_wall(&mut world, Vec2::new(5.0, -0.125), Vec2::new(20.0, 0.25)).unwrap();
        let marble = create_circle(
            &mut world,
            Vec2::new(5.0, 6.0),
            0.5,
            Material::new(0.3, 0.85),
            BodyKind::Dynamic,
        )
        .unwrap();
        let mut went_up = false;
        for _ in 0..120 {
            world.step();
            if world.linear_velocity(marble).unwrap().y > 2.0 {
                went_up = true;
            }
        }
        assert!(went_up, "marble never rebounded");
    }

    #[test]
    fn test_dynamic_marbles_push_apart() {
        let mut world = World::new(WorldConfig::new(Vec2::ZERO)).unwrap();
        let glass = Material::new(0.0, 0.85);
        let a = create_circle(&mut world, Vec2::ZERO, 0.5, glass, BodyKind::Dynamic).unwrap();
        let b = create_circle(&mut world, Vec2::new(0.6, 0.0), 0.5, glass, BodyKind::Dynamic)
            .unwrap();
        for _ in 0..30 {
            world.step();
        }
        let gap = world.position(b).unwrap().x - world.position(a).unwrap().x;
        assert!(gap >= 0.95, "marbles still overlap: {gap}");
    }

    #[test]
    fn test_accessors_reject_stale_handles() {
        let mut world = falling_world();
        let marble =
            create_circle(&mut world, Vec2::ZERO, 0.5, Material::WALL, BodyKind::Dynamic).unwrap();
        world.remove_body(marble).unwrap();
        assert!(!world.is_valid(marble));
        assert_eq!(world.position(marble), None);
        assert_eq!(
            world.set_linear_velocity(marble, Vec2::ONE),
            Err(SimError::StaleHandle)
        );
        assert_eq!(world.remove_body(marble), Err(SimError::StaleHandle));
    }

    #[test]
    fn test_restitution_mix() {
        assert_eq!(RestitutionMix::Max.combine(0.0, 0.85), 0.85);
        assert_eq!(RestitutionMix::Min.combine(0.0, 0.85), 0.0);
    }
}
