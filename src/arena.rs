//! Generational arena with typed, index-stable handles.
//!
//! Particles, constraints and groups live in arenas so that handles stay valid
//! across unrelated insertions and removals. A handle whose slot was freed
//! never resolves again, even after the slot is reused.

use core::fmt;
use core::marker::PhantomData;

/// A typed handle into an [`Arena`].
pub trait ArenaId: Copy + Eq + fmt::Debug {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(self) -> u32;
    fn generation(self) -> u32;
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl ArenaId for $name {
            fn from_parts(index: u32, generation: u32) -> Self {
                $name { index, generation }
            }
            fn index(self) -> u32 { self.index }
            fn generation(self) -> u32 { self.generation }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}v{})", stringify!($name), self.index, self.generation)
            }
        }
    };
}

arena_id!(
    /// Handle to a particle owned by a [`World`](crate::world::World).
    ParticleId
);
arena_id!(
    /// Handle to a world-level constraint.
    ConstraintId
);
arena_id!(
    /// Handle to a cloth or rigid-body group.
    GroupId
);

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with generation counters and a free list.
///
/// Iteration is in slot order, which gives every pass over the arena a pinned,
/// reproducible enumeration order.
pub struct Arena<I: ArenaId, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    _id: PhantomData<fn() -> I>,
}

impl<I: ArenaId, T> Arena<I, T> {
    pub fn new() -> Self {
        Arena { slots: Vec::new(), free: Vec::new(), len: 0, _id: PhantomData }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Arena { slots: Vec::with_capacity(capacity), free: Vec::new(), len: 0, _id: PhantomData }
    }

    pub fn insert(&mut self, value: T) -> I {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return I::from_parts(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, value: Some(value) });
        I::from_parts(index, 0)
    }

    pub fn remove(&mut self, id: I) -> Option<T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.len -= 1;
        Some(value)
    }

    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: I) -> Option<&T> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Mutable access to two distinct live entries at once.
    pub fn get2_mut(&mut self, a: I, b: I) -> Option<(&mut T, &mut T)> {
        if a.index() == b.index() || !self.contains(a) || !self.contains(b) {
            return None;
        }
        self.get2_by_slot_mut(a.index() as usize, b.index() as usize)
    }

    /// Mutable access to two distinct occupied slots.
    pub fn get2_by_slot_mut(&mut self, a: usize, b: usize) -> Option<(&mut T, &mut T)> {
        if a == b || a >= self.slots.len() || b >= self.slots.len() {
            return None;
        }
        let (first, second) = if a < b {
            let (lo, hi) = self.slots.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        };
        match (first.value.as_mut(), second.value.as_mut()) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    pub fn get_by_slot(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot)?.value.as_ref()
    }

    pub fn get_by_slot_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.slots.get_mut(slot)?.value.as_mut()
    }

    /// Handle of the entry currently stored in `slot`, if occupied.
    pub fn id_at_slot(&self, slot: usize) -> Option<I> {
        let s = self.slots.get(slot)?;
        s.value.as_ref().map(|_| I::from_parts(slot as u32, s.generation))
    }

    /// Number of slots ever allocated; upper bound for slot indices.
    pub fn slot_capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value.as_ref().map(|v| (I::from_parts(i as u32, s.generation), v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            let generation = s.generation;
            s.value.as_mut().map(move |v| (I::from_parts(i as u32, generation), v))
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots.iter_mut().filter_map(|s| s.value.as_mut())
    }

    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Remove every entry for which `keep` returns false, returning the removed handles.
    pub fn retain<P: FnMut(I, &mut T) -> bool>(&mut self, mut keep: P) -> Vec<I> {
        let mut removed = Vec::new();
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            let id = I::from_parts(index as u32, slot.generation);
            let drop_it = match slot.value.as_mut() {
                Some(v) => !keep(id, v),
                None => false,
            };
            if drop_it {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                self.len -= 1;
                removed.push(id);
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}
