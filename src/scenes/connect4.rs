//! Connect-4 style marble wall
//!
//! A block of marbles rests on a removable floor between thin column walls.
//! Marbles picked out by a pattern (normally the clock face) are lit, the rest
//! are drawn black. On each release the floor is destroyed so the block
//! drops out; once every marble is below the display the floor is rebuilt and
//! the marbles are stacked back in above the top edge.

use std::time::{Duration, Instant};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Report, Scene, glass_marble, place};
use crate::consts::GRAVITY;
use crate::grid::Grid;
use crate::modes::Every;
use crate::pixels::Rgb;
use crate::raster::{Canvas, Snapshot};
use crate::round_to_cell;
use crate::sim::{BodyHandle, Material, World, WorldConfig, create_line};

pub const PATTERN_WIDTH: usize = 17;
pub const PATTERN_HEIGHT: usize = 5;
const MARBLE_COUNT: usize = PATTERN_WIDTH * PATTERN_HEIGHT;
const MARBLE_RADIUS: f32 = 0.5;
const FLOOR_THICKNESS: f32 = 0.9;
const COLUMN_THICKNESS: f32 = 0.1;
const RELEASE_PERIOD: Duration = Duration::from_secs(60);

/// Lit cells of the marble block, row 0 at the top
pub type Pattern = [[bool; PATTERN_WIDTH]; PATTERN_HEIGHT];

/// Supplies the pattern shown by the next stack of marbles
pub trait PatternSource: Send {
    fn pattern(&mut self) -> Pattern;
}

impl<F> PatternSource for F
where
    F: FnMut() -> Pattern + Send,
{
    fn pattern(&mut self) -> Pattern {
        self()
    }
}

/// Fixed "12:34" face used when no clock is attached
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPattern;

impl PatternSource for FixedPattern {
    fn pattern(&mut self) -> Pattern {
        const ROWS: [&str; PATTERN_HEIGHT] = [
            ".#..###...###.#.#",
            "##....#.#...#.#.#",
            ".#..###...###.###",
            ".#..#...#...#...#",
            "###.###...###...#",
        ];
        let mut pattern = [[false; PATTERN_WIDTH]; PATTERN_HEIGHT];
        for (row, line) in ROWS.iter().enumerate() {
            for (col, ch) in line.chars().take(PATTERN_WIDTH).enumerate() {
                pattern[row][col] = ch == '#';
            }
        }
        pattern
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connect4Action {
    /// Drop the floor and nudge the block downward
    Release,
    /// Rebuild the floor and stack the marbles with a new pattern
    Restack(Pattern),
}

pub struct Connect4 {
    marbles: Vec<BodyHandle>,
    floor: Option<BodyHandle>,
    lit: Pattern,
    color: Rgb,
    source: Box<dyn PatternSource>,
    release: Every,
}

impl Default for Connect4 {
    fn default() -> Self {
        Self::new(Box::new(FixedPattern), Rgb::WHITE)
    }
}

impl Connect4 {
    pub fn new(source: Box<dyn PatternSource>, color: Rgb) -> Self {
        Self {
            marbles: Vec::with_capacity(MARBLE_COUNT),
            floor: None,
            lit: [[false; PATTERN_WIDTH]; PATTERN_HEIGHT],
            color,
            source,
            release: Every::immediate(RELEASE_PERIOD),
        }
    }

    pub fn marbles(&self) -> &[BodyHandle] {
        &self.marbles
    }

    pub fn floor(&self) -> Option<BodyHandle> {
        self.floor
    }

    fn floor_height(grid: &Grid) -> f32 {
        ((grid.height() - PATTERN_HEIGHT) / 2) as f32
    }

    /// Columns are centered on the display
    fn col_offset(grid: &Grid) -> i32 {
        (grid.width() as i32 - PATTERN_WIDTH as i32) / 2
    }

    fn build_floor(world: &mut World, grid: &Grid) -> Result<BodyHandle, crate::SimError> {
        let y = Self::floor_height(grid);
        create_line(
            world,
            Vec2::new(0.0, y),
            Vec2::new(grid.width() as f32, y),
            FLOOR_THICKNESS,
            Material::WALL,
        )
    }

    /// Marble `index` is row-major with row 0 at the bottom of the block
    fn is_lit(&self, index: usize) -> bool {
        let row = index / PATTERN_WIDTH;
        let col = index % PATTERN_WIDTH;
        self.lit[PATTERN_HEIGHT - 1 - row][col]
    }

    /// Stack every marble just above the display
    fn stack(&self, world: &mut World, grid: &Grid, rng: &mut Pcg32, report: &mut Report) {
        let top = grid.height() as f32;
        for (index, handle) in self.marbles.iter().enumerate() {
            let row = (index / PATTERN_WIDTH) as f32;
            let col = (index % PATTERN_WIDTH) as f32;
            let pos = Vec2::new(col, top + row + 1.0);
            report.check(place(world, *handle, pos, Vec2::new(0.0, downward_nudge(rng))));
        }
    }
}

/// Small random downward speed in [-2, 0)
fn downward_nudge(rng: &mut Pcg32) -> f32 {
    rng.random_range(-100..0) as f32 / 50.0
}

impl Scene for Connect4 {
    type Action = Connect4Action;

    fn name(&self) -> &'static str {
        "Connect4"
    }

    fn world_config(&self, _grid: &Grid) -> WorldConfig {
        WorldConfig::new(Vec2::new(0.0, GRAVITY))
    }

    fn populate(&mut self, world: &mut World, grid: &Grid, rng: &mut Pcg32) -> Report {
        let mut report = Report::default();
        self.floor = report.track(Self::build_floor(world, grid));

        // One more wall than columns so every column is boxed in
        let wall_top = grid.height() as f32 * 2.0;
        for c in 0..=grid.width() {
            let x = c as f32 - 0.5;
            report.track(create_line(
                world,
                Vec2::new(x, 0.0),
                Vec2::new(x, wall_top),
                COLUMN_THICKNESS,
                Material::WALL,
            ));
        }

        self.marbles = (0..MARBLE_COUNT)
            .filter_map(|_| {
                report.track(glass_marble(world, MARBLE_RADIUS))
            })
            .collect();
        self.stack(world, grid, rng, &mut report);
        self.release.reset();
        report
    }

    fn draw(&self, snapshot: &Snapshot, canvas: &mut Canvas<'_>) {
        let offset = Self::col_offset(canvas.grid());
        for (index, handle) in self.marbles.iter().enumerate() {
            if let Some(position) = snapshot.position(*handle) {
                let color = if self.is_lit(index) { self.color } else { Rgb::BLACK };
                canvas.plot_offset(position, offset, color);
            }
        }
    }

    fn plan(&mut self, snapshot: &Snapshot, _grid: &Grid, now: Instant) -> Option<Connect4Action> {
        let floor_present = self.floor.is_some_and(|f| snapshot.get(f).is_some());
        if floor_present {
            return self.release.ready(now).then_some(Connect4Action::Release);
        }
        let all_below = self
            .marbles
            .iter()
            .filter_map(|h| snapshot.position(*h))
            .all(|p| round_to_cell(p.y) < 0);
        // Pattern is fetched here, outside the world lock
        all_below.then(|| Connect4Action::Restack(self.source.pattern()))
    }

    fn apply(
        &mut self,
        action: Connect4Action,
        world: &mut World,
        grid: &Grid,
        rng: &mut Pcg32,
    ) -> Report {
        let mut report = Report::default();
        match action {
            Connect4Action::Release => {
                if let Some(floor) = self.floor.take() {
                    report.check(world.remove_body(floor));
                }
                for handle in &self.marbles {
                    let nudge = Vec2::new(0.0, downward_nudge(rng));
                    report.check(world.set_linear_velocity(*handle, nudge));
                }
            }
            Connect4Action::Restack(pattern) => {
                self.floor = report.track(Self::build_floor(world, grid));
                self.lit = pattern;
                self.stack(world, grid, rng, &mut report);
            }
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
    fn test_fixed_pattern_shape() {
        let pattern = FixedPattern.pattern();
        // Colon column is lit on rows 1 and 3 only
        let colon: Vec<bool> = pattern.iter().map(|row| row[8]).collect();
        assert_eq!(colon, vec![false, true, false, true, false]);
        assert!(pattern[4][0] && pattern[4][1] && pattern[4][2]);
    }

    #[test]
    fn test_population_and_stack_layout() {
        let grid = Grid::default();
        let mut scene = Connect4::default();
        let world = populated(&mut scene, &grid);
        // Floor, 20 column walls, 85 marbles
        assert_eq!(world.body_count(), 1 + 20 + MARBLE_COUNT);
        assert!(scene.floor().is_some());

        let bottom_left = world.position(scene.marbles()[0]).unwrap();
        assert_eq!(bottom_left, Vec2::new(0.0, 20.0));
        let top_right = world.position(scene.marbles()[MARBLE_COUNT - 1]).unwrap();
        assert_eq!(top_right, Vec2::new(16.0, 24.0));
        assert!(world.linear_velocity(scene.marbles()[0]).unwrap().y < 0.0);
    }

    #[test]
    fn test_release_and_restack_cycle() {
        let grid = Grid::default();
        let all_lit = || [[true; PATTERN_WIDTH]; PATTERN_HEIGHT];
        let mut scene = Connect4::new(Box::new(all_lit), Rgb::CYAN);
        let mut world = populated(&mut scene, &grid);
        let now = Instant::now();
        let old_floor = scene.floor().unwrap();

        // First release is immediate
        let action = scene.plan(&Snapshot::capture(&world), &grid, now).unwrap();
        assert_eq!(action, Connect4Action::Release);
        assert!(scene.apply(action, &mut world, &grid, &mut rng()).is_clean());
        assert!(!world.is_valid(old_floor));
        assert!(scene.floor().is_none());

        // Still falling: nothing to do yet
        assert_eq!(scene.plan(&Snapshot::capture(&world), &grid, now), None);

        for handle in scene.marbles().to_vec() {
            world.set_transform(handle, Vec2::new(3.0, -5.0), 0.0).unwrap();
        }
        let action = scene.plan(&Snapshot::capture(&world), &grid, now).unwrap();
        assert!(matches!(action, Connect4Action::Restack(_)));
        assert!(scene.apply(action, &mut world, &grid, &mut rng()).is_clean());

        let new_floor = scene.floor().unwrap();
        assert_ne!(new_floor, old_floor);
        assert!(world.is_valid(new_floor));
        assert!(!world.is_valid(old_floor));
        assert_eq!(world.position(scene.marbles()[0]), Some(Vec2::new(0.0, 20.0)));

        // Release waits a full period after the first one
        let snapshot = Snapshot::capture(&world);
        assert_eq!(scene.plan(&snapshot, &grid, now + Duration::from_secs(30)), None);
        assert_eq!(
            scene.plan(&snapshot, &grid, now + RELEASE_PERIOD),
            Some(Connect4Action::Release)
        );
    }

    #[test]
    fn test_draw_centers_block_and_colors_pattern() {
        let grid = Grid::default();
        let all_lit = || [[true; PATTERN_WIDTH]; PATTERN_HEIGHT];
        let mut scene = Connect4::new(Box::new(all_lit), Rgb::CYAN);
        let mut world = populated(&mut scene, &grid);
        let now = Instant::now();
        // Restack with the all-lit pattern so every marble is colored
        let lit = [[true; PATTERN_WIDTH]; PATTERN_HEIGHT];
        scene.apply(Connect4Action::Restack(lit), &mut world, &grid, &mut rng());
        scene.plan(&Snapshot::capture(&world), &grid, now);

        let marble = scene.marbles()[0];
        world.set_transform(marble, Vec2::new(0.0, 8.0), 0.0).unwrap();
        let snapshot = Snapshot::capture(&world);
        let mut pixels = PixelBuffer::new(&grid);
        scene.draw(&snapshot, &mut Canvas::new(grid, &mut pixels));
        // Column 0 of the block lands on display column 1
        assert_eq!(pixels.get(grid.map(1, 11)), Rgb::CYAN);
        assert!(pixels.get(grid.map(0, 11)).is_black());
    }
}
