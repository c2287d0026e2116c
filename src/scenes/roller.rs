//! Zig-zag roller track: marbles run down tilted rails and loop back to the top

use std::time::{Duration, Instant};

use glam::Vec2;
use rand_pcg::Pcg32;

use super::{Report, Scene, build_walls, draw_marbles_in, place};
use crate::consts::GLASS_RESTITUTION;
use crate::grid::Grid;
use crate::modes::Every;
use crate::pixels::Rgb;
use crate::raster::{Canvas, Snapshot, world_to_cell};
use crate::sim::{
    Body, BodyHandle, BodyKind, Material, RestitutionMix, Shape, Style, World, WorldConfig,
    create_circle,
};

const MAX_MARBLES: usize = 7;
const MARBLE_RADIUS: f32 = 0.45;
/// Frictionless so marbles slide the rails instead of sticking
const ROLLER_GLASS: Material = Material::new(0.0, GLASS_RESTITUTION);
const ROLLER_GRAVITY: f32 = -19.8;
const SPAWN_PERIOD: Duration = Duration::from_secs(5);
const TRACK_COUNT: usize = 6;
const TRACK_SPACING: f32 = 3.0;
const TRACK_TILT_DEGREES: f32 = 5.5;
const TRACK_THICKNESS: f32 = 0.25;

/// Marble colors for the roller, yellow moved toward the end
const ROLLER_PALETTE: [Rgb; 9] = [
    Rgb::RED,
    Rgb::GREEN,
    Rgb::BLUE,
    Rgb::PURPLE,
    Rgb::CYAN,
    Rgb::ORANGE,
    Rgb::PINK,
    Rgb::YELLOW,
    Rgb::LIME_GREEN,
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RollerAction {
    pub spawn: bool,
    /// Marbles that have dropped out of the bottom
    pub recycle: Vec<BodyHandle>,
}

pub struct Roller {
    marbles: Vec<BodyHandle>,
    tracks: Vec<BodyHandle>,
    spawn: Every,
}

impl Default for Roller {
    fn default() -> Self {
        Self {
            marbles: Vec::with_capacity(MAX_MARBLES),
            tracks: Vec::with_capacity(TRACK_COUNT),
            spawn: Every::new(SPAWN_PERIOD),
        }
    }
}

impl Roller {
    pub fn marbles(&self) -> &[BodyHandle] {
        &self.marbles
    }

    pub fn tracks(&self) -> &[BodyHandle] {
        &self.tracks
    }

    /// Where new and recycled marbles enter
    fn spawn_point(grid: &Grid) -> Vec2 {
        Vec2::new(0.0, grid.height() as f32 - 1.0)
    }

    /// Rails alternate sloping left and right, each shifted toward its high end
    fn track_bodies(grid: &Grid) -> impl Iterator<Item = Body> {
        let w = grid.width() as f32;
        let h = grid.height() as f32;
        let tilt = TRACK_TILT_DEGREES.to_radians();
        (0..TRACK_COUNT).map(move |i| {
            let (shift, angle) = if i % 2 == 0 { (-1.0, -tilt) } else { (1.0, tilt) };
            let center = Vec2::new(
                w / 2.0 + shift,
                h - 2.0 - TRACK_SPACING * i as f32 + TRACK_THICKNESS / 2.0,
            );
            let shape = Shape::Box {
                half_extents: Vec2::new((w - 1.5) / 2.0, TRACK_THICKNESS / 2.0),
            };
            Body::new(BodyKind::Static, shape, Material::WALL, center)
                .with_rotation(angle)
                .with_style(Style::Obstacle)
        })
    }
}

impl Scene for Roller {
    type Action = RollerAction;

    fn name(&self) -> &'static str {
        "PhysicsRoller"
    }

    fn world_config(&self, _grid: &Grid) -> WorldConfig {
        // Marbles bounce off each other but land dead on the rails
        WorldConfig::new(Vec2::new(0.0, ROLLER_GRAVITY)).with_restitution_mix(RestitutionMix::Min)
    }

    fn populate(&mut self, world: &mut World, grid: &Grid, _rng: &mut Pcg32) -> Report {
        let mut report = Report::default();
        build_walls(world, grid, false, Material::WALL, &mut report);
        self.tracks = Self::track_bodies(grid)
            .filter_map(|body| report.track(world.add_body(body)))
            .collect();
        self.marbles.clear();
        self.spawn.reset();
        report
    }

    fn draw(&self, snapshot: &Snapshot, canvas: &mut Canvas<'_>) {
        canvas.draw_obstacles(snapshot, Rgb::OBSTACLE);
        draw_marbles_in(snapshot, &self.marbles, &ROLLER_PALETTE, canvas);
    }

    fn plan(&mut self, snapshot: &Snapshot, grid: &Grid, now: Instant) -> Option<RollerAction> {
        let spawn = self.spawn.ready(now) && self.marbles.len() < MAX_MARBLES;
        let last_row = grid.height() as i32 - 1;
        let recycle: Vec<BodyHandle> = self
            .marbles
            .iter()
            .filter(|h| {
                snapshot
                    .position(**h)
                    .is_some_and(|p| world_to_cell(grid, p).1 > last_row)
            })
            .copied()
            .collect();
        (spawn || !recycle.is_empty()).then_some(RollerAction { spawn, recycle })
    }

    fn apply(
        &mut self,
        action: RollerAction,
        world: &mut World,
        grid: &Grid,
        _rng: &mut Pcg32,
    ) -> Report {
        let mut report = Report::default();
        let start = Self::spawn_point(grid);
        for handle in action.recycle {
            report.check(place(world, handle, start, Vec2::ZERO));
        }
        if action.spawn && self.marbles.len() < MAX_MARBLES {
            let created =
                create_circle(world, start, MARBLE_RADIUS, ROLLER_GLASS, BodyKind::Dynamic);
            if let Some(handle) = report.track(created) {
                self.marbles.push(handle);
            }
        }
        report
    }
}
