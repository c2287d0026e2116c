//! Rigid body types

use glam::Vec2;

use crate::consts::MARBLE_DENSITY;

/// Collision shape in body-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    /// Box centered on the body origin, oriented by the body rotation
    Box { half_extents: Vec2 },
}

impl Shape {
    /// World-space corners of a box shape, counter-clockwise
    pub fn corners(&self, position: Vec2, rotation: f32) -> Option<[Vec2; 4]> {
        let Shape::Box { half_extents: h } = *self else {
            return None;
        };
        let rot = Vec2::from_angle(rotation);
        Some(
            [
                Vec2::new(-h.x, -h.y),
                Vec2::new(h.x, -h.y),
                Vec2::new(h.x, h.y),
                Vec2::new(-h.x, h.y),
            ]
            .map(|local| position + rot.rotate(local)),
        )
    }

    fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Box { half_extents } => 4.0 * half_extents.x * half_extents.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moved by the solver, only by explicit repositioning
    Static,
    Dynamic,
}

/// Surface properties used when resolving contacts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

impl Material {
    pub const fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
        }
    }

    /// Frictionless, dead surface used for plain walls
    pub const WALL: Material = Material::new(0.0, 0.0);
}

/// How the rasterizer should treat a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// Collides but is never drawn (walls, floors)
    #[default]
    Hidden,
    /// Drawn in the obstacle color (pins, rails)
    Obstacle,
    /// Drawn by the scene in its own color
    Marble,
}

/// A simulated rigid object
#[derive(Debug, Clone)]
pub struct Body {
    pub kind: BodyKind,
    pub shape: Shape,
    pub material: Material,
    pub style: Style,
    pub position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    inv_mass: f32,
    inv_inertia: f32,
}

impl Body {
    pub fn new(kind: BodyKind, shape: Shape, material: Material, position: Vec2) -> Self {
        let (inv_mass, inv_inertia) = match kind {
            BodyKind::Static => (0.0, 0.0),
            BodyKind::Dynamic => {
                let mass = MARBLE_DENSITY * shape.area();
                let inertia = match shape {
                    Shape::Circle { radius } => 0.5 * mass * radius * radius,
                    Shape::Box { half_extents } => {
                        mass * (half_extents.x * half_extents.x + half_extents.y * half_extents.y)
                            / 3.0
                    }
                };
                (1.0 / mass, if inertia > 0.0 { 1.0 / inertia } else { 0.0 })
            }
        };
        Self {
            kind,
            shape,
            material,
            style: Style::Hidden,
            position,
            rotation: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            inv_mass,
            inv_inertia,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    #[inline]
    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    /// Circle radius, or None for box shapes
    #[inline]
    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            Shape::Circle { radius } => Some(radius),
            Shape::Box { .. } => None,
        }
    }
}
