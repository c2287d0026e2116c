//! Background thread that advances a shared world at a fixed cadence
//!
//! The stepper never waits on the world lock. A tick that finds the lock busy
//! is counted as skipped and the schedule moves on, so a long reset in the
//! foreground can delay the simulation but never stall or deadlock it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::world::World;

/// World slot shared between the stepper and the foreground
///
/// `None` means the world has been released; the stepper idles on it.
pub type SharedWorld = Arc<Mutex<Option<World>>>;

/// Counters published by the stepper thread
#[derive(Debug, Default)]
pub struct StepperStats {
    steps: AtomicU64,
    skipped: AtomicU64,
    idle: AtomicU64,
    running: AtomicBool,
}

impl StepperStats {
    /// Ticks that advanced the world
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    /// Ticks dropped because the lock was held elsewhere
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Ticks that found no world to step
    pub fn idle(&self) -> u64 {
        self.idle.load(Ordering::Relaxed)
    }

    /// Cleared by the thread itself as its last action
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

pub struct Stepper {
    stop: Arc<AtomicBool>,
    stats: Arc<StepperStats>,
    thread: Option<JoinHandle<()>>,
}

impl Stepper {
    /// Start stepping `world` once per `period`
    pub fn spawn(world: SharedWorld, period: Duration) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(StepperStats::default());
        stats.running.store(true, Ordering::Release);
        let thread = thread::Builder::new().name("physics-stepper".into()).spawn({
            let stop = Arc::clone(&stop);
            let stats = Arc::clone(&stats);
            move || {
                run(&world, period, &stop, &stats);
                stats.running.store(false, Ordering::Release);
            }
        })?;
        Ok(Self {
            stop,
            stats,
            thread: Some(thread),
        })
    }

    pub fn stats(&self) -> &StepperStats {
        &self.stats
    }

    /// Counters that outlive the stepper
    pub fn shared_stats(&self) -> Arc<StepperStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the thread and wait for it
    ///
    /// The flag is only checked between ticks, so the thread exits with the
    /// lock released and the world fully stepped. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        thread.thread().unpark();
        if thread.join().is_err() {
            log::warn!("physics stepper panicked");
        }
    }
}

impl Drop for Stepper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(world: &Mutex<Option<World>>, period: Duration, stop: &AtomicBool, stats: &StepperStats) {
    let mut next = Instant::now() + period;
    while !stop.load(Ordering::Acquire) {
        match world.try_lock() {
            Ok(mut guard) => step_slot(&mut guard, stats),
            Err(TryLockError::Poisoned(poisoned)) => step_slot(&mut poisoned.into_inner(), stats),
            Err(TryLockError::WouldBlock) => {
                stats.skipped.fetch_add(1, Ordering::Relaxed);
            }
        }

        let now = Instant::now();
        if next <= now {
            // Fell behind: drop the missed ticks rather than bursting to catch up
            next = now + period;
        } else {
            while !stop.load(Ordering::Acquire) {
                let now = Instant::now();
                if now >= next {
                    break;
                }
                thread::park_timeout(next - now);
            }
            next += period;
        }
    }
}

#[inline]
fn step_slot(slot: &mut Option<World>, stats: &StepperStats) {
    match slot.as_mut() {
        Some(world) => {
            world.step();
            stats.steps.fetch_add(1, Ordering::Relaxed);
        }
        None => {
            stats.idle.fetch_add(1, Ordering::Relaxed);
        }
    }
}
