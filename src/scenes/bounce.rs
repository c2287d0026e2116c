//! Marbles dropped into an open box, re-thrown every ten seconds

use std::time::{Duration, Instant};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Report, Scene, build_walls, draw_marbles, glass_marble, place, random_push};
use crate::consts::GRAVITY;
use crate::grid::Grid;
use crate::modes::Every;
use crate::raster::{Canvas, Snapshot};
use crate::sim::{BodyHandle, Material, World, WorldConfig};

const MARBLE_COUNT: usize = 8;
const MARBLE_RADIUS: f32 = 0.5;
const RESET_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceAction {
    Rethrow,
}

pub struct Bounce {
    marbles: Vec<BodyHandle>,
    reset: Every,
}

impl Default for Bounce {
    fn default() -> Self {
        Self {
            marbles: Vec::with_capacity(MARBLE_COUNT),
            reset: Every::new(RESET_PERIOD),
        }
    }
}

impl Bounce {
    pub fn marbles(&self) -> &[BodyHandle] {
        &self.marbles
    }

    /// Scatter every marble into the top quarter with a random push
    fn rethrow(&self, world: &mut World, grid: &Grid, rng: &mut Pcg32, report: &mut Report) {
        let w = grid.width() as i32;
        let h = grid.height() as i32;
        for handle in &self.marbles {
            let x = rng.random_range(0..w) as f32;
            let y = (h - rng.random_range(1..(h / 4).max(2))) as f32;
            report.check(place(world, *handle, Vec2::new(x, y), random_push(rng)));
        }
    }
}

impl Scene for Bounce {
    type Action = BounceAction;

    fn name(&self) -> &'static str {
        "Bounce"
    }

    fn world_config(&self, _grid: &Grid) -> WorldConfig {
        WorldConfig::new(Vec2::new(0.0, GRAVITY))
    }

    fn populate(&mut self, world: &mut World, grid: &Grid, rng: &mut Pcg32) -> Report {
        let mut report = Report::default();
        build_walls(world, grid, true, Material::WALL, &mut report);
        self.marbles = (0..MARBLE_COUNT)
            .filter_map(|_| {
                report.track(glass_marble(world, MARBLE_RADIUS))
            })
            .collect();
        self.rethrow(world, grid, rng, &mut report);
        self.reset.reset();
        report
    }

    fn draw(&self, snapshot: &Snapshot, canvas: &mut Canvas<'_>) {
        draw_marbles(snapshot, &self.marbles, canvas);
    }

    fn plan(&mut self, _snapshot: &Snapshot, _grid: &Grid, now: Instant) -> Option<BounceAction> {
        self.reset.ready(now).then_some(BounceAction::Rethrow)
    }

    fn apply(
        &mut self,
        action: BounceAction,
        world: &mut World,
        grid: &Grid,
        rng: &mut Pcg32,
    ) -> Report {
        let mut report = Report::default();
        match action {
            BounceAction::Rethrow => self.rethrow(world, grid, rng, &mut report),
        }
        report
    }
}
