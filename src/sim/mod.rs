//! Physics simulation module
//!
//! A small impulse solver for marbles rolling around static geometry:
//! - Fixed timestep only (`SIM_DT`), advanced by a background stepper
//! - World shared behind a mutex; every body access holds the lock
//! - Generational handles so bodies from a torn-down world are detectably stale

pub mod arena;
pub mod body;
pub mod collision;
pub mod primitives;
pub mod session;
pub mod stepper;
pub mod world;

pub use arena::{BodyHandle, WorldId};
pub use body::{Body, BodyKind, Material, Shape, Style};
pub use collision::{CollisionResult, circle_box, circle_circle};
pub use primitives::{create_circle, create_line, create_wall, create_wall_with};
pub use session::PhysicsSession;
pub use stepper::{SharedWorld, Stepper, StepperStats};
pub use world::{RestitutionMix, World, WorldConfig};
