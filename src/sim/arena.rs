//! Generational body arena
//!
//! Bodies live in a slot vector. Removing a body bumps its slot generation and
//! pushes the slot on a free list, so any handle still pointing at the old
//! occupant is rejected instead of silently aliasing the new one.

use std::sync::atomic::{AtomicU32, Ordering};

use super::body::Body;
use crate::error::SimError;

static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of one world instance; never reused within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldId(u32);

impl WorldId {
    pub(crate) fn next() -> Self {
        Self(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque reference to a body in a specific world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    world: WorldId,
    slot: u32,
    generation: u32,
}

impl BodyHandle {
    #[inline]
    pub(crate) fn slot(&self) -> usize {
        self.slot as usize
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

#[derive(Debug)]
pub struct BodyArena {
    world: WorldId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    capacity: usize,
    live: usize,
}

impl BodyArena {
    pub fn new(world: WorldId, capacity: usize) -> Self {
        Self {
            world,
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
            live: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn insert(&mut self, body: Body) -> Result<BodyHandle, SimError> {
        if self.live >= self.capacity {
            return Err(SimError::BodyLimit {
                capacity: self.capacity,
            });
        }
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize].body = Some(body);
                slot
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    body: Some(body),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.live += 1;
        Ok(BodyHandle {
            world: self.world,
            slot,
            generation: self.slots[slot as usize].generation,
        })
    }

    pub fn remove(&mut self, handle: BodyHandle) -> Result<Body, SimError> {
        if !self.contains(handle) {
            return Err(SimError::StaleHandle);
        }
        let slot = &mut self.slots[handle.slot()];
        let body = slot.body.take().ok_or(SimError::StaleHandle)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.slot);
        self.live -= 1;
        Ok(body)
    }

    #[inline]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        if handle.world != self.world {
            return None;
        }
        self.slots
            .get(handle.slot())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_ref())
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        if handle.world != self.world {
            return None;
        }
        self.slots
            .get_mut(handle.slot())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_mut())
    }

    /// Live bodies in slot order
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        let world = self.world;
        self.slots.iter().enumerate().filter_map(move |(i, s)| {
            s.body.as_ref().map(|body| {
                (
                    BodyHandle {
                        world,
                        slot: i as u32,
                        generation: s.generation,
                    },
                    body,
                )
            })
        })
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot_body(&self, slot: usize) -> Option<&Body> {
        self.slots.get(slot).and_then(|s| s.body.as_ref())
    }

    pub(crate) fn slot_body_mut(&mut self, slot: usize) -> Option<&mut Body> {
        self.slots.get_mut(slot).and_then(|s| s.body.as_mut())
    }

    /// Two distinct live bodies by slot, for pairwise contact resolution
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Body, &mut Body)> {
        if a == b || a >= self.slots.len() || b >= self.slots.len() {
            return None;
        }
        let (lo, hi) = (a.min(b), a.max(b));
        let (head, tail) = self.slots.split_at_mut(hi);
        let (lo_body, hi_body) = (head[lo].body.as_mut()?, tail[0].body.as_mut()?);
        if a < b {
            Some((lo_body, hi_body))
        } else {
            Some((hi_body, lo_body))
        }
    }

    /// Drop every body, invalidating all outstanding handles
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.body.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
            }
        }
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::{BodyKind, Material, Shape};
    use glam::Vec2;

    fn marble() -> Body {
        Body::new(
            BodyKind::Dynamic,
            Shape::Circle { radius: 0.5 },
            Material::WALL,
            Vec2::ZERO,
        )
    }

    #[test]
    fn test_removed_handle_is_stale() {
        let mut arena = BodyArena::new(WorldId::next(), 8);
        let a = arena.insert(marble()).unwrap();
        assert!(arena.contains(a));
        arena.remove(a).unwrap();
        assert!(!arena.contains(a));
        assert!(matches!(arena.remove(a), Err(SimError::StaleHandle)));
    }

    #[test]
    fn test_free_list_reuses_slot_with_new_generation() {
        let mut arena = BodyArena::new(WorldId::next(), 8);
        let a = arena.insert(marble()).unwrap();
        let _b = arena.insert(marble()).unwrap();
        arena.remove(a).unwrap();
        let c = arena.insert(marble()).unwrap();
        assert_eq!(c.slot(), a.slot());
        assert_ne!(c, a);
        assert!(arena.contains(c));
        assert!(!arena.contains(a));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.slot_count(), 2);
    }

    #[test]
    fn test_handles_do_not_cross_worlds() {
        let mut first = BodyArena::new(WorldId::next(), 8);
        let mut second = BodyArena::new(WorldId::next(), 8);
        let a = first.insert(marble()).unwrap();
        let _ = second.insert(marble()).unwrap();
        assert!(second.get(a).is_none());
    }

    #[test]
    fn test_capacity_limit() {
        let mut arena = BodyArena::new(WorldId::next(), 2);
        arena.insert(marble()).unwrap();
        arena.insert(marble()).unwrap();
        assert_eq!(
            arena.insert(marble()),
            Err(SimError::BodyLimit { capacity: 2 })
        );
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut arena = BodyArena::new(WorldId::next(), 8);
        let handles: Vec<_> = (0..4).map(|_| arena.insert(marble()).unwrap()).collect();
        arena.clear();
        assert!(arena.is_empty());
        assert!(handles.iter().all(|h| !arena.contains(*h)));
        assert_eq!(arena.iter().count(), 0);
    }
}
