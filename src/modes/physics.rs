//! Generic physics-backed mode: one session per activation, driven by a scene

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::{Every, Mode, ModeContext, ModeStatus};
use crate::consts::{FRAME_PERIOD, SIM_PERIOD};
use crate::error::SimError;
use crate::raster::{Canvas, Snapshot};
use crate::scenes::{Report, Scene};
use crate::sim::PhysicsSession;

pub struct PhysicsMode<S: Scene> {
    scene: S,
    session: Option<PhysicsSession>,
    snapshot: Snapshot,
    frame: Every,
    rng: Pcg32,
    step_period: Duration,
}

impl<S: Scene> PhysicsMode<S> {
    pub fn new(scene: S, seed: u64) -> Self {
        Self {
            scene,
            session: None,
            snapshot: Snapshot::default(),
            frame: Every::immediate(FRAME_PERIOD),
            rng: Pcg32::seed_from_u64(seed),
            step_period: SIM_PERIOD,
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }
}

fn log_report(mode: &str, stage: &str, report: &Report) {
    log::debug!("{mode}: {stage} created {} bodies", report.created);
    for failure in &report.failures {
        log::warn!("{mode}: {stage}: {failure}");
    }
}

impl<S: Scene> Mode for PhysicsMode<S> {
    fn name(&self) -> &'static str {
        self.scene.name()
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), SimError> {
        let grid = ctx.grid;
        let mut session = PhysicsSession::create(self.scene.world_config(&grid))?;

        // Fully populated before the stepper may touch it
        let scene = &mut self.scene;
        let rng = &mut self.rng;
        let report = session.with_world(|world| scene.populate(world, &grid, rng))?;
        log_report(self.scene.name(), "populate", &report);

        session.start(self.step_period)?;
        self.session = Some(session);
        self.frame.reset();
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !self.frame.ready(ctx.now) {
            return;
        }

        let snapshot = &mut self.snapshot;
        if session.read(|world| snapshot.refresh(world)).is_err() {
            return;
        }

        let grid = ctx.grid;
        {
            let mut canvas = Canvas::new(grid, &mut *ctx.pixels);
            canvas.clear();
            self.scene.draw(&self.snapshot, &mut canvas);
        }
        ctx.pixels.mark_dirty();

        let Some(action) = self.scene.plan(&self.snapshot, &grid, ctx.now) else {
            return;
        };
        log::debug!("{}: applying {action:?}", self.scene.name());
        let scene = &mut self.scene;
        let rng = &mut self.rng;
        match session.with_world(|world| scene.apply(action, world, &grid, rng)) {
            Ok(report) => log_report(self.scene.name(), "reset", &report),
            Err(e) => log::warn!("{}: reset skipped: {e}", self.scene.name()),
        }
    }

    fn leave(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.destroy();
        }
    }

    fn status(&self) -> ModeStatus {
        ModeStatus {
            world: self.session.as_ref().map(PhysicsSession::world_id),
            stepping: self.session.as_ref().is_some_and(PhysicsSession::is_stepping),
        }
    }

    fn session(&self) -> Option<&PhysicsSession> {
        self.session.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::pixels::PixelBuffer;
    use crate::scenes::Bounce;
    use std::time::Instant;

    #[test]
    fn test_enter_update_leave() {
        let grid = Grid::default();
        let mut pixels = PixelBuffer::new(&grid);
        let mut mode = PhysicsMode::new(Bounce::default(), 1);
        let mut ctx = ModeContext {
            grid,
            pixels: &mut pixels,
            speed: 128,
            now: Instant::now(),
        };

        mode.enter(&mut ctx).unwrap();
        let status = mode.status();
        assert!(status.world.is_some());
        assert!(status.stepping);

        ctx.pixels.take_dirty();
        mode.update(&mut ctx);
        assert!(ctx.pixels.is_dirty());
        let lit = ctx.pixels.visible().iter().filter(|c| !c.is_black()).count();
        assert!(lit >= 1, "no marbles drawn");

        // Rate limited: a second update within the frame period draws nothing
        ctx.pixels.take_dirty();
        mode.update(&mut ctx);
        assert!(!ctx.pixels.is_dirty());

        mode.leave();
        assert_eq!(mode.status(), ModeStatus::default());
        assert!(mode.session().is_none());
        // Leaving twice is harmless
        mode.leave();
    }
}
