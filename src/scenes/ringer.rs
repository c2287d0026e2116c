//! Zero-gravity ringer: a heavy shooter fired into a cluster of marbles

use std::iter;
use std::time::{Duration, Instant};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Report, Scene, draw_marbles, glass_marble, place};
use crate::grid::Grid;
use crate::modes::Every;
use crate::raster::{Canvas, Snapshot};
use crate::sim::{BodyHandle, World, WorldConfig};

const TARGET_COUNT: usize = 7;
const SHOOTER_RADIUS: f32 = 0.9;
const TARGET_RADIUS: f32 = 0.45;
const RESET_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingerAction {
    Reshoot,
}

pub struct Ringer {
    /// Shooter first, then the targets
    marbles: Vec<BodyHandle>,
    reset: Every,
}

impl Default for Ringer {
    fn default() -> Self {
        Self {
            marbles: Vec::with_capacity(TARGET_COUNT + 1),
            reset: Every::new(RESET_PERIOD),
        }
    }
}

/// Random point on one of the four display edges
fn edge_point(grid: &Grid, rng: &mut Pcg32) -> Vec2 {
    let right = (grid.width() - 1) as i32;
    let top = (grid.height() - 1) as i32;
    let (x, y) = match rng.random_range(0..4) {
        0 => (rng.random_range(0..right), top),
        1 => (right, rng.random_range(0..top)),
        2 => (rng.random_range(0..right), 0),
        _ => (0, rng.random_range(0..top)),
    };
    Vec2::new(x as f32, y as f32)
}

impl Ringer {
    pub fn marbles(&self) -> &[BodyHandle] {
        &self.marbles
    }

    fn rack(&self, world: &mut World, grid: &Grid, rng: &mut Pcg32, report: &mut Report) {
        let Some((shooter, targets)) = self.marbles.split_first() else {
            return;
        };

        let from = edge_point(grid, rng);
        let center = Vec2::new((grid.width() / 2) as f32, (grid.height() / 2) as f32);
        let speed = rng.random_range(10..20) as f32;
        let velocity = (center - from)
            .try_normalize()
            .map_or(Vec2::new(0.0, speed), |dir| dir * speed);
        report.check(place(world, *shooter, from, velocity));

        let (w, h) = (grid.width(), grid.height());
        for handle in targets {
            let pos = Vec2::new(
                rng.random_range(w / 3..w * 2 / 3) as f32,
                rng.random_range(h / 3..h * 2 / 3) as f32,
            );
            report.check(place(world, *handle, pos, Vec2::ZERO));
        }
    }
}

impl Scene for Ringer {
    type Action = RingerAction;

    fn name(&self) -> &'static str {
        "Ringer"
    }

    fn world_config(&self, _grid: &Grid) -> WorldConfig {
        WorldConfig::new(Vec2::ZERO)
    }

    fn populate(&mut self, world: &mut World, grid: &Grid, rng: &mut Pcg32) -> Report {
        let mut report = Report::default();
        let radii = iter::once(SHOOTER_RADIUS).chain(iter::repeat_n(TARGET_RADIUS, TARGET_COUNT));
        self.marbles = radii
            .filter_map(|r| report.track(glass_marble(world, r)))
            .collect();
        self.rack(world, grid, rng, &mut report);
        self.reset.reset();
        report
    }

    fn draw(&self, snapshot: &Snapshot, canvas: &mut Canvas<'_>) {
        draw_marbles(snapshot, &self.marbles, canvas);
    }

    fn plan(&mut self, _snapshot: &Snapshot, _grid: &Grid, now: Instant) -> Option<RingerAction> {
        self.reset.ready(now).then_some(RingerAction::Reshoot)
    }

    fn apply(
        &mut self,
        action: RingerAction,
        world: &mut World,
        grid: &Grid,
        rng: &mut Pcg32,
    ) -> Report {
        let mut report = Report::default();
        match action {
            RingerAction::Reshoot => self.rack(world, grid, rng, &mut report),
        }
        report
    }
}
