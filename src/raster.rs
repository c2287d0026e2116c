//! Frame sampling and grid rasterization
//!
//! A frame is drawn in two phases. `Snapshot::refresh` copies every body's
//! transform out of the world in a single pass under the lock; everything
//! after that (clearing, obstacle silhouettes, marble plotting) works on the
//! copy with the lock released.

use glam::Vec2;

use crate::grid::Grid;
use crate::pixels::{PixelBuffer, Rgb};
use crate::round_to_cell;
use crate::sim::{BodyHandle, BodyKind, Shape, Style, World};

/// Copied state of one body at sampling time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySample {
    pub handle: BodyHandle,
    pub kind: BodyKind,
    pub shape: Shape,
    pub style: Style,
    pub position: Vec2,
    pub rotation: f32,
}

/// Body samples for one frame, in slot order
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    samples: Vec<BodySample>,
}

impl Snapshot {
    pub fn capture(world: &World) -> Self {
        let mut snapshot = Self::default();
        snapshot.refresh(world);
        snapshot
    }

    /// Re-sample `world`, reusing the existing allocation
    pub fn refresh(&mut self, world: &World) {
        self.samples.clear();
        self.samples.extend(world.bodies().map(|(handle, body)| BodySample {
            handle,
            kind: body.kind,
            shape: body.shape,
            style: body.style,
            position: body.position,
            rotation: body.rotation,
        }));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BodySample> {
        self.samples.iter()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&BodySample> {
        self.samples.iter().find(|s| s.handle == handle)
    }

    /// Sampled position of a body, if it was alive when sampled
    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.get(handle).map(|s| s.position)
    }
}

/// World position to (col, row); y is flipped so row 0 is the top
#[inline]
pub fn world_to_cell(grid: &Grid, position: Vec2) -> (i32, i32) {
    (
        round_to_cell(position.x),
        grid.height() as i32 - round_to_cell(position.y),
    )
}

/// Continuous grid-space coordinates (cell centers on integers)
#[inline]
fn world_to_grid_space(grid: &Grid, position: Vec2) -> Vec2 {
    Vec2::new(position.x, grid.height() as f32 - position.y)
}

/// Drawing surface over the pixel buffer
pub struct Canvas<'a> {
    grid: Grid,
    pixels: &'a mut PixelBuffer,
}

impl<'a> Canvas<'a> {
    pub fn new(grid: Grid, pixels: &'a mut PixelBuffer) -> Self {
        Self { grid, pixels }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn clear(&mut self) {
        self.pixels.clear();
    }

    /// Write a cell; out-of-range cells land in the void slot
    #[inline]
    pub fn set(&mut self, col: i32, row: i32, color: Rgb) {
        self.pixels.set(self.grid.map(col, row), color);
    }

    #[inline]
    pub fn get(&self, col: i32, row: i32) -> Rgb {
        self.pixels.get(self.grid.map(col, row))
    }

    /// Plot a body at its nearest cell; returns whether the cell is visible
    pub fn plot(&mut self, position: Vec2, color: Rgb) -> bool {
        self.plot_offset(position, 0, color)
    }

    /// Plot with a column offset applied after rounding
    pub fn plot_offset(&mut self, position: Vec2, col_offset: i32, color: Rgb) -> bool {
        let (col, row) = world_to_cell(&self.grid, position);
        let col = col + col_offset;
        self.set(col, row, color);
        self.grid.contains(col, row)
    }

    /// Draw every sample styled as an obstacle
    pub fn draw_obstacles(&mut self, snapshot: &Snapshot, color: Rgb) {
        for sample in snapshot.iter().filter(|s| s.style == Style::Obstacle) {
            match sample.shape {
                Shape::Circle { .. } => {
                    self.plot(sample.position, color);
                }
                Shape::Box { .. } => {
                    if let Some(corners) = sample.shape.corners(sample.position, sample.rotation) {
                        self.fill_polygon(&corners, color);
                    }
                }
            }
        }
    }

    /// Paint each cell the world-space polygon touches
    ///
    /// Only cells inside the polygon's bounding box are tested. A cell is
    /// painted when a polygon vertex lies inside it, one of its corners lies
    /// inside the polygon, or a polygon edge crosses one of its edges.
    pub fn fill_polygon(&mut self, vertices: &[Vec2], color: Rgb) {
        if vertices.len() < 3 {
            return;
        }
        let poly: Vec<Vec2> = vertices
            .iter()
            .map(|v| world_to_grid_space(&self.grid, *v))
            .collect();

        let (min, max) = poly
            .iter()
            .fold((Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)), |(lo, hi), p| {
                (lo.min(*p), hi.max(*p))
            });
        let col_lo = round_to_cell(min.x).max(0);
        let col_hi = round_to_cell(max.x).min(self.grid.width() as i32 - 1);
        let row_lo = round_to_cell(min.y).max(0);
        let row_hi = round_to_cell(max.y).min(self.grid.height() as i32 - 1);

        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                if cell_touches_polygon(col, row, &poly) {
                    self.set(col, row, color);
                }
            }
        }
    }
}

fn cell_touches_polygon(col: i32, row: i32, poly: &[Vec2]) -> bool {
    let center = Vec2::new(col as f32, row as f32);
    let lo = center - Vec2::splat(0.5);
    let hi = center + Vec2::splat(0.5);

    if poly
        .iter()
        .any(|v| v.x >= lo.x && v.x <= hi.x && v.y >= lo.y && v.y <= hi.y)
    {
        return true;
    }

    let cell = [lo, Vec2::new(hi.x, lo.y), hi, Vec2::new(lo.x, hi.y)];
    if cell.iter().any(|c| point_in_polygon(*c, poly)) {
        return true;
    }

    edges(&cell).any(|(a, b)| edges(poly).any(|(c, d)| segments_intersect(a, b, c, d)))
}

fn edges(points: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
}

/// Even-odd crossing test
fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    let mut inside = false;
    for (a, b) in edges(poly) {
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = (p2 - p1).perp_dot(q1 - p1);
    let d2 = (p2 - p1).perp_dot(q2 - p1);
    let d3 = (q2 - q1).perp_dot(p1 - q1);
    let d4 = (q2 - q1).perp_dot(p2 - q1);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    // Collinear touching
    (d1 == 0.0 && on_segment(p1, p2, q1))
        || (d2 == 0.0 && on_segment(p1, p2, q2))
        || (d3 == 0.0 && on_segment(q1, q2, p1))
        || (d4 == 0.0 && on_segment(q1, q2, p2))
}

#[inline]
fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Material, WorldConfig, create_circle, create_line};

    fn world() -> World {
        World::new(WorldConfig::new(Vec2::ZERO)).unwrap()
    }

    fn lit_cells(grid: &Grid, pixels: &PixelBuffer) -> Vec<(i32, i32)> {
        let mut cells = Vec::new();
        for row in 0..grid.height() as i32 {
            for col in 0..grid.width() as i32 {
                if !pixels.get(grid.map(col, row)).is_black() {
                    cells.push((col, row));
                }
            }
        }
        cells
    }

    #[test]
    fn test_world_to_cell_flips_y() {
        let grid = Grid::default();
        assert_eq!(world_to_cell(&grid, Vec2::new(0.0, 19.0)), (0, 0));
        assert_eq!(world_to_cell(&grid, Vec2::new(18.4, 1.0)), (18, 18));
        // Half rounds away from zero
        assert_eq!(world_to_cell(&grid, Vec2::new(2.5, 0.5)), (3, 18));
        // y = 0 is one row below the bottom of the display
        assert_eq!(world_to_cell(&grid, Vec2::new(4.0, 0.0)), (4, 19));
    }

    #[test]
    fn test_horizontal_line_rasterizes_to_one_row() {
        let grid = Grid::default();
        let mut world = world();
        create_line(
            &mut world,
            Vec2::new(1.0, 5.0),
            Vec2::new(5.0, 5.0),
            0.25,
            Material::WALL,
        )
        .unwrap();
        let snapshot = Snapshot::capture(&world);

        let mut pixels = PixelBuffer::new(&grid);
        Canvas::new(grid, &mut pixels).draw_obstacles(&snapshot, Rgb::OBSTACLE);
        let cells = lit_cells(&grid, &pixels);
        assert_eq!(cells, (1..=5).map(|c| (c, 14)).collect::<Vec<_>>());
    }

    #[test]
    fn test_tilted_polygon_touches_cells_without_vertices() {
        let grid = Grid::default();
        let mut pixels = PixelBuffer::new(&grid);
        let mut canvas = Canvas::new(grid, &mut pixels);
        // Thin diagonal sliver from cell (2, 2) to cell (8, 8)
        let poly = [
            Vec2::new(2.0, 17.0),
            Vec2::new(2.1, 17.1),
            Vec2::new(8.1, 11.1),
            Vec2::new(8.0, 11.0),
        ];
        canvas.fill_polygon(&poly, Rgb::WHITE);
        // A cell on the diagonal with no vertex in it is still painted
        assert!(!canvas.get(5, 5).is_black());
        assert!(canvas.get(2, 8).is_black());
    }

    #[test]
    fn test_polygon_clipped_to_grid() {
        let grid = Grid::new(4, 4);
        let mut pixels = PixelBuffer::new(&grid);
        let mut canvas = Canvas::new(grid, &mut pixels);
        let poly = [
            Vec2::new(-10.0, -10.0),
            Vec2::new(10.0, -10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(-10.0, 10.0),
        ];
        canvas.fill_polygon(&poly, Rgb::WHITE);
        assert!(pixels.visible().iter().all(|c| *c == Rgb::WHITE));
        assert!(pixels.get(grid.void_index()).is_black());
    }

    #[test]
    fn test_snapshot_and_plot() {
        let grid = Grid::default();
        let mut world = world();
        let mut marble = |pos| {
            create_circle(&mut world, pos, 0.5, Material::WALL, BodyKind::Dynamic).unwrap()
        };
        let visible = marble(Vec2::new(3.0, 10.0));
        let fallen = marble(Vec2::new(3.0, -4.0));
        let snapshot = Snapshot::capture(&world);
        assert_eq!(snapshot.len(), 2);

        let mut pixels = PixelBuffer::new(&grid);
        let mut canvas = Canvas::new(grid, &mut pixels);
        assert!(canvas.plot(snapshot.position(visible).unwrap(), Rgb::RED));
        assert!(!canvas.plot(snapshot.position(fallen).unwrap(), Rgb::BLUE));
        assert_eq!(canvas.get(3, 9), Rgb::RED);
        assert_eq!(pixels.get(grid.void_index()), Rgb::BLUE);
    }
}
