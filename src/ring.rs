//! Fixed-capacity single-producer/single-consumer ring.
//!
//! A [`RingSlot`] is never pushed to or popped from directly.  It is
//! [`split`](RingSlot::split) into one [`Producer`] and one [`Consumer`];
//! the split borrows the ring mutably, so while the halves are alive no
//! second pair can exist, and neither half is `Clone`.  That is the whole
//! of the synchronisation story: each slot word is filled only by the
//! producer and emptied only by the consumer.
//!
//! Occupancy is carried in the slot itself.  A slot holding [`EMPTY`] is
//! free; anything else is an item.  The producer publishes with a
//! `Release` store after an `Acquire` load saw the slot empty, and the
//! consumer hands the slot back the same way, so the item's bits are
//! always visible before the slot looks occupied and vice versa.

use crossbeam::utils::CachePadded;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::grid::{ResultItem, WorkItem, EMPTY_INDEX};

/// Slot value meaning "nothing here".
pub const EMPTY: u64 = u64::MAX;

/// An item that fits in a single slot word without ever colliding
/// with [`EMPTY`].
pub trait Packed: Copy {
    /// Encodes the item.  Must never return [`EMPTY`].
    fn pack(self) -> u64;
    /// Decodes a word produced by [`Packed::pack`].
    fn unpack(word: u64) -> Self;
}

impl Packed for WorkItem {
    #[inline]
    fn pack(self) -> u64 {
        debug_assert_ne!(self, EMPTY_INDEX);
        u64::from(self)
    }

    #[inline]
    fn unpack(word: u64) -> Self {
        word as WorkItem
    }
}

// low 32 bits index, next 8 bits value; the index is never all-ones so
// the word never is either
impl Packed for ResultItem {
    #[inline]
    fn pack(self) -> u64 {
        debug_assert_ne!(self.index, EMPTY_INDEX);
        (u64::from(self.value) << 32) | u64::from(self.index)
    }

    #[inline]
    fn unpack(word: u64) -> Self {
        ResultItem {
            index: word as u32,
            value: (word >> 32) as u8,
        }
    }
}

/// The ring itself: `N` slot words plus the two position counters.
/// Each counter sits on its own cache line and is only ever advanced by
/// the half that owns it.
pub struct RingSlot<T, const N: usize> {
    slots: [AtomicU64; N],
    head: CachePadded<usize>,
    tail: CachePadded<usize>,
    _item: PhantomData<T>,
}

impl<T: Packed, const N: usize> RingSlot<T, N> {
    /// Creates an empty ring.
    ///
    /// # Panics
    /// Panics if `N` is zero or not a power of two.
    pub fn new() -> Self {
        assert!(N.is_power_of_two(), "ring capacity must be a power of two");
        RingSlot {
            slots: [(); N].map(|_| AtomicU64::new(EMPTY)),
            head: CachePadded::new(0),
            tail: CachePadded::new(0),
            _item: PhantomData,
        }
    }

    /// Hands out the two ends of the ring.  Positions live in the ring,
    /// so splitting again later resumes exactly where the last pair
    /// stopped.
    pub fn split(&mut self) -> (Producer<'_, T, N>, Consumer<'_, T, N>) {
        let RingSlot {
            slots, head, tail, ..
        } = self;
        let slots: &[AtomicU64; N] = slots;
        (
            Producer {
                slots,
                pos: &mut **tail,
                _item: PhantomData,
            },
            Consumer {
                slots,
                pos: &mut **head,
                _item: PhantomData,
            },
        )
    }
}

impl<T: Packed, const N: usize> Default for RingSlot<T, N> {
    fn default() -> Self {
        RingSlot::new()
    }
}

/// The writing end of a ring.
pub struct Producer<'a, T, const N: usize> {
    slots: &'a [AtomicU64; N],
    pos: &'a mut usize,
    _item: PhantomData<T>,
}

impl<'a, T: Packed, const N: usize> Producer<'a, T, N> {
    /// Stores `item` if the slot under the producer position is free.
    /// Never blocks; `false` means the ring is full.
    #[inline]
    pub fn try_push(&mut self, item: T) -> bool {
        let slot = &self.slots[*self.pos];
        if slot.load(Ordering::Acquire) != EMPTY {
            return false;
        }
        slot.store(item.pack(), Ordering::Release);
        *self.pos = (*self.pos + 1) % N;
        true
    }

    /// Number of slots in the underlying ring.
    pub fn capacity(&self) -> usize {
        N
    }
}

/// The reading end of a ring.
pub struct Consumer<'a, T, const N: usize> {
    slots: &'a [AtomicU64; N],
    pos: &'a mut usize,
    _item: PhantomData<T>,
}

impl<'a, T: Packed, const N: usize> Consumer<'a, T, N> {
    /// Takes the item under the consumer position, if there is one, and
    /// hands its slot back to the producer.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        let slot = &self.slots[*self.pos];
        let word = slot.load(Ordering::Acquire);
        if word == EMPTY {
            return None;
        }
        slot.store(EMPTY, Ordering::Release);
        *self.pos = (*self.pos + 1) % N;
        Some(T::unpack(word))
    }

    /// Number of slots in the underlying ring.
    pub fn capacity(&self) -> usize {
        N
    }
}
