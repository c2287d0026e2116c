//! One mode activation's worth of physics: a shared world plus its stepper
//!
//! The session enforces the ordering rules around the shared world. Bodies
//! are added under the lock before the stepper is started, and teardown stops
//! the stepper before any body is released, so no step ever sees a half-built
//! or half-destroyed world.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::arena::WorldId;
use super::stepper::{SharedWorld, Stepper, StepperStats};
use super::world::{World, WorldConfig};
use crate::error::SimError;

pub struct PhysicsSession {
    id: WorldId,
    world: SharedWorld,
    stepper: Option<Stepper>,
}

impl PhysicsSession {
    /// Allocate a fresh, empty world; the stepper is not started yet
    pub fn create(config: WorldConfig) -> Result<Self, SimError> {
        let world = World::new(config)?;
        let id = world.id();
        log::info!("physics world {id:?} created");
        Ok(Self {
            id,
            world: Arc::new(Mutex::new(Some(world))),
            stepper: None,
        })
    }

    #[inline]
    pub fn world_id(&self) -> WorldId {
        self.id
    }

    /// Start advancing the world on a background thread
    pub fn start(&mut self, period: Duration) -> Result<(), SimError> {
        if self.stepper.is_some() {
            return Ok(());
        }
        if !self.is_alive() {
            return Err(SimError::WorldDestroyed);
        }
        let stepper = Stepper::spawn(Arc::clone(&self.world), period)
            .map_err(|e| SimError::StepperSpawn(e.to_string()))?;
        self.stepper = Some(stepper);
        log::info!("physics stepper started for world {:?}", self.id);
        Ok(())
    }

    pub fn is_stepping(&self) -> bool {
        self.stepper.as_ref().is_some_and(Stepper::is_running)
    }

    /// Stepper counters; they stay readable after the session is destroyed
    pub fn stepper_stats(&self) -> Option<Arc<StepperStats>> {
        self.stepper.as_ref().map(Stepper::shared_stats)
    }

    /// Whether the world has not been destroyed yet
    pub fn is_alive(&self) -> bool {
        self.lock().is_some()
    }

    /// Read the world under the lock
    ///
    /// Keep `f` to a single read pass; the stepper skips ticks while it runs.
    pub fn read<R>(&self, f: impl FnOnce(&World) -> R) -> Result<R, SimError> {
        let guard = self.lock();
        guard.as_ref().map(f).ok_or(SimError::WorldDestroyed)
    }

    /// Mutate the world under the lock (population, resets, respawns)
    pub fn with_world<R>(&self, f: impl FnOnce(&mut World) -> R) -> Result<R, SimError> {
        let mut guard = self.lock();
        guard.as_mut().map(f).ok_or(SimError::WorldDestroyed)
    }

    /// Stop the stepper, release every body, then drop the world
    ///
    /// Idempotent; also runs on drop.
    pub fn destroy(&mut self) {
        if let Some(mut stepper) = self.stepper.take() {
            stepper.stop();
            log::info!(
                "physics stepper stopped for world {:?} after {} steps ({} skipped)",
                self.id,
                stepper.stats().steps(),
                stepper.stats().skipped()
            );
        }
        let released = {
            let mut guard = self.lock();
            guard.take().map(|mut world| {
                let count = world.body_count();
                world.clear();
                count
            })
        };
        if let Some(count) = released {
            log::info!("physics world {:?} destroyed ({count} bodies released)", self.id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<World>> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PhysicsSession {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::{BodyKind, Material};
    use crate::sim::primitives::create_circle;
    use glam::Vec2;
    use std::thread;
    use std::time::Instant;

    const PERIOD: Duration = Duration::from_millis(1);

    fn session(gravity: Vec2) -> PhysicsSession {
        PhysicsSession::create(WorldConfig::new(gravity)).unwrap()
    }

    #[test]
    fn test_create_failure_prevents_session() {
        let result = PhysicsSession::create(WorldConfig::new(Vec2::new(f32::INFINITY, 0.0)));
        assert!(matches!(result, Err(SimError::InvalidGravity)));
    }

    #[test]
    fn test_populate_then_start_then_destroy() {
        let mut session = session(Vec2::new(0.0, -9.8));
        let marble = session
            .with_world(|world| {
                create_circle(world, Vec2::new(5.0, 10.0), 0.5, Material::WALL, BodyKind::Dynamic)
            })
            .unwrap()
            .unwrap();
        // Nothing steps before start
        assert_eq!(session.read(World::ticks).unwrap(), 0);

        session.start(PERIOD).unwrap();
        assert!(session.is_stepping());
        let deadline = Instant::now() + Duration::from_secs(5);
        while session.read(World::ticks).unwrap() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert!(session.read(|w| w.position(marble).unwrap().y).unwrap() < 10.0);

        session.destroy();
        assert!(!session.is_stepping());
        assert!(!session.is_alive());
        assert_eq!(session.read(World::ticks), Err(SimError::WorldDestroyed));
        assert_eq!(session.start(PERIOD), Err(SimError::WorldDestroyed));

        // Second destroy is a no-op
        session.destroy();
    }

    #[test]
    fn test_destroy_stops_stepper_before_releasing_world() {
        let mut session = session(Vec2::ZERO);
        session.start(PERIOD).unwrap();
        let shared = Arc::clone(&session.world);
        session.destroy();
        // The stepper thread has been joined, so only this test holds the world
        assert_eq!(Arc::strong_count(&shared), 2);
        drop(session);
        assert_eq!(Arc::strong_count(&shared), 1);
        assert!(shared.lock().unwrap().is_none());
    }

    #[test]
    fn test_sampler_never_sees_partial_reset() {
        const MARBLES: usize = 6;
        let mut session = session(Vec2::ZERO);
        let handles = session
            .with_world(|world| {
                (0..MARBLES)
                    .map(|i| {
                        let pos = Vec2::new(10.0 * i as f32, 0.0);
                        let h = create_circle(world, pos, 0.5, Material::WALL, BodyKind::Dynamic)
                            .unwrap();
                        world.set_linear_velocity(h, Vec2::ONE).unwrap();
                        h
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap();
        session.start(PERIOD).unwrap();

        let session = Arc::new(session);
        let resetter = {
            let session = Arc::clone(&session);
            let handles = handles.clone();
            thread::spawn(move || {
                for k in 0..200 {
                    let k = k as f32;
                    session
                        .with_world(|world| {
                            for (i, h) in handles.iter().enumerate() {
                                let pos = Vec2::new(k + 10.0 * i as f32, k);
                                world.set_transform(*h, pos, 0.0).unwrap();
                                world.set_linear_velocity(*h, Vec2::ONE).unwrap();
                            }
                        })
                        .unwrap();
                    thread::yield_now();
                }
            })
        };
        let sampler = {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                for _ in 0..200 {
                    let positions: Vec<Vec2> = session
                        .read(|world| handles.iter().map(|h| world.position(*h).unwrap()).collect())
                        .unwrap();
                    let y0 = positions[0].y;
                    for (i, p) in positions.iter().enumerate() {
                        assert!((p.y - y0).abs() < 1e-3, "marble {i} from another tick");
                        assert!((p.x - 10.0 * i as f32 - p.y).abs() < 1e-3);
                    }
                    thread::yield_now();
                }
            })
        };
        resetter.join().unwrap();
        sampler.join().unwrap();
    }
}
