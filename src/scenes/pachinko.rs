//! Marbles rattling down through a field of steel pins

use std::time::Instant;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{
    Report, Scene, any_visible, build_walls, draw_marbles, glass_marble, place, random_push,
};
use crate::consts::{GRAVITY, MARBLE_FRICTION, STEEL_PIN_RESTITUTION};
use crate::grid::Grid;
use crate::pixels::Rgb;
use crate::raster::{Canvas, Snapshot};
use crate::sim::{BodyHandle, BodyKind, Material, World, WorldConfig, create_circle};

const MARBLE_COUNT: usize = 6;
const MARBLE_RADIUS: f32 = 0.45;
const PIN_RADIUS: f32 = 0.25;
const STEEL: Material = Material::new(MARBLE_FRICTION, STEEL_PIN_RESTITUTION);
/// Grippy side walls so marbles don't skate down them
const RAIL: Material = Material::new(0.8, 0.0);

/// Pin layout, one bit per column with the most significant bit on the left
const PIN_PATTERN: [u32; 19] = [
    0b0000000000000000000,
    0b0010001000100010001,
    0b0000000000000000000,
    0b1000100010001000100,
    0b0000000000000000000,
    0b0010001000100010001,
    0b0000000000000000000,
    0b1000100010001000100,
    0b0000000000000000000,
    0b0010001000100010001,
    0b0000000000000000000,
    0b1000100010001000100,
    0b0000000000000000000,
    0b0010001000100010001,
    0b0000000000000000000,
    0b1000100010001000100,
    0b0000000000000000000,
    0b0010001000100010001,
    0b0000000000000000000,
];

/// Grid cells holding a pin
fn pin_cells(grid: &Grid) -> impl Iterator<Item = (usize, usize)> + '_ {
    let width = grid.width().min(32);
    PIN_PATTERN
        .iter()
        .take(grid.height())
        .enumerate()
        .flat_map(move |(row, bits)| {
            (0..width)
                .filter(move |col| (bits >> (width - 1 - col)) & 1 == 1)
                .map(move |col| (col, row))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PachinkoAction {
    /// Every marble has left the display
    Respawn,
}

#[derive(Default)]
pub struct Pachinko {
    marbles: Vec<BodyHandle>,
    pins: usize,
}

impl Pachinko {
    pub fn marbles(&self) -> &[BodyHandle] {
        &self.marbles
    }

    pub fn pin_count(&self) -> usize {
        self.pins
    }

    fn drop_marbles(&self, world: &mut World, grid: &Grid, rng: &mut Pcg32, report: &mut Report) {
        let top = grid.height() as f32;
        for handle in &self.marbles {
            let x = rng.random_range(0..grid.width()) as f32;
            report.check(place(world, *handle, Vec2::new(x, top), random_push(rng)));
        }
    }
}

impl Scene for Pachinko {
    type Action = PachinkoAction;

    fn name(&self) -> &'static str {
        "Pachinko"
    }

    fn world_config(&self, _grid: &Grid) -> WorldConfig {
        WorldConfig::new(Vec2::new(0.0, GRAVITY))
    }

    fn populate(&mut self, world: &mut World, grid: &Grid, rng: &mut Pcg32) -> Report {
        let mut report = Report::default();
        build_walls(world, grid, false, RAIL, &mut report);

        let h = grid.height() as f32;
        self.pins = pin_cells(grid)
            .filter_map(|(col, row)| {
                let pos = Vec2::new(col as f32, h - row as f32);
                report.track(create_circle(world, pos, PIN_RADIUS, STEEL, BodyKind::Static))
            })
            .count();

        self.marbles = (0..MARBLE_COUNT)
            .filter_map(|_| {
                report.track(glass_marble(world, MARBLE_RADIUS))
            })
            .collect();
        self.drop_marbles(world, grid, rng, &mut report);
        report
    }

    fn draw(&self, snapshot: &Snapshot, canvas: &mut Canvas<'_>) {
        canvas.draw_obstacles(snapshot, Rgb::OBSTACLE);
        draw_marbles(snapshot, &self.marbles, canvas);
    }

    fn plan(&mut self, snapshot: &Snapshot, grid: &Grid, _now: Instant) -> Option<PachinkoAction> {
        (!self.marbles.is_empty() && !any_visible(snapshot, &self.marbles, grid))
            .then_some(PachinkoAction::Respawn)
    }

    fn apply(
        &mut self,
        action: PachinkoAction,
        world: &mut World,
        grid: &Grid,
        rng: &mut Pcg32,
    ) -> Report {
        let mut report = Report::default();
        match action {
            PachinkoAction::Respawn => self.drop_marbles(world, grid, rng, &mut report),
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::PixelBuffer;
    use crate::scenes::test_support::{populated, rng};

    #[test]
    fn test_pins_follow_pattern() {
        let grid = Grid::default();
        let cells: Vec<_> = pin_cells(&grid).collect();
        // Nine rows carry five pins each
        assert_eq!(cells.len(), 45);
        assert!(cells.contains(&(2, 1)));
        assert!(cells.contains(&(0, 3)));
        assert!(!cells.iter().any(|(_, row)| row % 2 == 0));
    }

    #[test]
    fn test_pins_drawn_in_obstacle_color() {
        let grid = Grid::default();
        let mut scene = Pachinko::default();
        let world = populated(&mut scene, &grid);
        assert_eq!(scene.pin_count(), 45);

        let snapshot = Snapshot::capture(&world);
        let mut pixels = PixelBuffer::new(&grid);
        let mut canvas = Canvas::new(grid, &mut pixels);
        scene.draw(&snapshot, &mut canvas);
        assert_eq!(canvas.get(2, 1), Rgb::OBSTACLE);
        assert_eq!(canvas.get(18, 1), Rgb::OBSTACLE);
        assert_eq!(canvas.get(0, 3), Rgb::OBSTACLE);
    }

    #[test]
    fn test_respawn_when_all_marbles_gone() {
        let grid = Grid::default();
        let mut scene = Pachinko::default();
        let mut world = populated(&mut scene, &grid);
        let now = Instant::now();

        // Freshly dropped marbles sit on the top row
        assert_eq!(scene.plan(&Snapshot::capture(&world), &grid, now), None);

        let marbles = scene.marbles().to_vec();
        for (i, handle) in marbles.iter().enumerate() {
            world
                .set_transform(*handle, Vec2::new(i as f32, -3.0), 0.0)
                .unwrap();
        }
        let action = scene.plan(&Snapshot::capture(&world), &grid, now).unwrap();
        assert_eq!(action, PachinkoAction::Respawn);

        assert!(scene.apply(action, &mut world, &grid, &mut rng()).is_clean());
        for handle in &marbles {
            assert_eq!(world.position(*handle).unwrap().y, 19.0);
        }
        assert_eq!(scene.plan(&Snapshot::capture(&world), &grid, now), None);
    }
}
