//! Scene setup for the physics modes
//!
//! A scene owns the handles of the bodies it created and knows how to draw
//! them. Per frame it is driven in three steps:
//! - `draw` paints a sampled snapshot (no lock held)
//! - `plan` inspects the snapshot and decides whether a reset is due
//! - `apply` performs the reset against the live world (lock held)
//!
//! Both `populate` and `apply` run under the world lock, so they collect body
//! failures into a `Report` instead of logging; the caller logs afterwards.

pub mod bounce;
pub mod connect4;
pub mod pachinko;
pub mod ringer;
pub mod roller;

pub use bounce::Bounce;
pub use connect4::{Connect4, Pattern, PatternSource};
pub use pachinko::Pachinko;
pub use ringer::Ringer;
pub use roller::Roller;

use std::fmt::Debug;
use std::time::Instant;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::consts::{GLASS_RESTITUTION, MARBLE_FRICTION};
use crate::error::SimError;
use crate::grid::Grid;
use crate::pixels::{MARBLE_PALETTE, Rgb, palette_color};
use crate::raster::{Canvas, Snapshot, world_to_cell};
use crate::sim::{
    BodyHandle, BodyKind, Material, World, WorldConfig, create_circle, create_wall_with,
};

/// Surface of an ordinary glass marble
pub const GLASS: Material = Material::new(MARBLE_FRICTION, GLASS_RESTITUTION);

/// Outcome of a batch of body operations done under the lock
#[derive(Debug, Default)]
pub struct Report {
    pub created: usize,
    pub failures: Vec<SimError>,
}

impl Report {
    /// Record a creation result, keeping the handle on success
    pub fn track(&mut self, result: Result<BodyHandle, SimError>) -> Option<BodyHandle> {
        match result {
            Ok(handle) => {
                self.created += 1;
                Some(handle)
            }
            Err(e) => {
                self.failures.push(e);
                None
            }
        }
    }

    /// Record a fallible mutation
    pub fn check(&mut self, result: Result<(), SimError>) {
        if let Err(e) = result {
            self.failures.push(e);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub trait Scene: Send {
    /// Deferred world mutation decided from a snapshot
    type Action: Debug;

    fn name(&self) -> &'static str;

    fn world_config(&self, grid: &Grid) -> WorldConfig;

    /// Build boundaries and bodies into a fresh world
    fn populate(&mut self, world: &mut World, grid: &Grid, rng: &mut Pcg32) -> Report;

    /// Paint one frame from a snapshot; the canvas is already cleared
    fn draw(&self, snapshot: &Snapshot, canvas: &mut Canvas<'_>);

    /// Decide whether the world needs a reset or respawn this frame
    fn plan(&mut self, snapshot: &Snapshot, grid: &Grid, now: Instant) -> Option<Self::Action>;

    /// Carry out a planned action under the world lock
    fn apply(
        &mut self,
        action: Self::Action,
        world: &mut World,
        grid: &Grid,
        rng: &mut Pcg32,
    ) -> Report;
}

/// Invisible side walls just outside the display, optionally with a floor
pub(crate) fn build_walls(
    world: &mut World,
    grid: &Grid,
    floor: bool,
    material: Material,
    report: &mut Report,
) {
    let w = grid.width() as f32;
    let h = grid.height() as f32;
    if floor {
        report.track(create_wall_with(
            world,
            Vec2::new(w / 2.0, -0.125),
            Vec2::new(w + 0.5, 0.25),
            material,
        ));
    }
    report.track(create_wall_with(
        world,
        Vec2::new(-0.25, h / 2.0),
        Vec2::new(0.25, h + 2.0),
        material,
    ));
    report.track(create_wall_with(
        world,
        Vec2::new(w - 1.0 + 0.25, h / 2.0),
        Vec2::new(0.25, h + 2.0),
        material,
    ));
}

/// Glass marble parked at the origin, to be placed by the caller
pub(crate) fn glass_marble(world: &mut World, radius: f32) -> Result<BodyHandle, SimError> {
    create_circle(world, Vec2::ZERO, radius, GLASS, BodyKind::Dynamic)
}

/// Teleport a body, set its velocity and stop its spin
pub(crate) fn place(
    world: &mut World,
    handle: BodyHandle,
    position: Vec2,
    velocity: Vec2,
) -> Result<(), SimError> {
    world.set_transform(handle, position, 0.0)?;
    world.set_linear_velocity(handle, velocity)?;
    world.set_angular_velocity(handle, 0.0)
}

/// Random launch: sideways in [-2, 2], upward in [0.2, 3]
pub(crate) fn random_push(rng: &mut Pcg32) -> Vec2 {
    Vec2::new(
        rng.random_range(-100..=100) as f32 / 50.0,
        rng.random_range(10..=150) as f32 / 50.0,
    )
}

/// Plot marbles in the standard palette order
pub(crate) fn draw_marbles(
    snapshot: &Snapshot,
    marbles: &[BodyHandle],
    canvas: &mut Canvas<'_>,
) -> bool {
    draw_marbles_in(snapshot, marbles, &MARBLE_PALETTE, canvas)
}

/// Plot marbles cycling through `palette`; returns whether any landed on the display
pub(crate) fn draw_marbles_in(
    snapshot: &Snapshot,
    marbles: &[BodyHandle],
    palette: &[Rgb],
    canvas: &mut Canvas<'_>,
) -> bool {
    let mut visible = false;
    for (i, handle) in marbles.iter().enumerate() {
        if let Some(position) = snapshot.position(*handle) {
            visible |= canvas.plot(position, palette_color(palette, i));
        }
    }
    visible
}

/// Whether any of the marbles samples onto the display
pub(crate) fn any_visible(snapshot: &Snapshot, marbles: &[BodyHandle], grid: &Grid) -> bool {
    marbles
        .iter()
        .filter_map(|h| snapshot.position(*h))
        .any(|p| {
            let (col, row) = world_to_cell(grid, p);
            grid.contains(col, row)
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rand::SeedableRng;

    pub fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    /// Populate a scene into a fresh world, panicking on any body failure
    pub fn populated<S: Scene>(scene: &mut S, grid: &Grid) -> World {
        let mut world = World::new(scene.world_config(grid)).unwrap();
        let report = scene.populate(&mut world, grid, &mut rng());
        assert!(report.is_clean(), "{:?}", report.failures);
        world
    }
}
