//! Display modes and their lifecycle
//!
//! Exactly one mode is current. Switching runs the old mode's `leave` to
//! completion (stepper stopped, world destroyed) before the new mode's
//! `enter` starts, so two worlds never coexist.

mod manager;
mod marble_track;
mod physics;
mod timer;

pub use manager::{ModeInfo, ModeManager};
pub use marble_track::MarbleTrack;
pub use physics::PhysicsMode;
pub use timer::Every;

use std::time::Instant;

use crate::error::SimError;
use crate::grid::Grid;
use crate::pixels::PixelBuffer;
use crate::sim::{PhysicsSession, WorldId};

/// What a mode gets to work with on each call
pub struct ModeContext<'a> {
    pub grid: Grid,
    pub pixels: &'a mut PixelBuffer,
    /// Read-only animation speed, 0-255
    pub speed: u8,
    pub now: Instant,
}

/// Simulation resources a mode currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeStatus {
    pub world: Option<WorldId>,
    pub stepping: bool,
}

pub trait Mode: Send {
    fn name(&self) -> &'static str;

    /// Whether the mode shows up in external listings
    fn visible(&self) -> bool {
        true
    }

    fn enter(&mut self, _ctx: &mut ModeContext<'_>) -> Result<(), SimError> {
        Ok(())
    }

    /// Called every loop iteration; rate-limits its own redraws
    fn update(&mut self, ctx: &mut ModeContext<'_>);

    /// Release everything `enter` acquired
    fn leave(&mut self) {}

    fn status(&self) -> ModeStatus {
        ModeStatus::default()
    }

    /// Live physics session, for modes that own one
    fn session(&self) -> Option<&PhysicsSession> {
        None
    }
}

/// All pixels off
#[derive(Debug, Default)]
pub struct Off;

impl Mode for Off {
    fn name(&self) -> &'static str {
        "off"
    }

    fn visible(&self) -> bool {
        false
    }

    fn update(&mut self, _ctx: &mut ModeContext<'_>) {}
}
