//! Wait-free single-producer/single-consumer ring buffer — the only
//! cross-task channel in the system (spec §4.1, §5, §9). Ground truth:
//! `original_source/common/lf_queue.h`, generalized to the explicit
//! reserve/commit API spec §4.1 mandates.
//!
//! One task exclusively advances the write cursor, a different task
//! exclusively advances the read cursor; a population counter is the
//! only value both sides touch, with acquire/release ordering so a
//! consumer observing `count > 0` sees the producer's writes to that
//! slot. No allocation after construction.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Producer-side operations: populate the next slot and publish it.
/// Implemented by [`SpscRing`] itself (single-threaded use, as in this
/// module's tests) and by [`Producer`] (the cross-thread handle from
/// [`SpscRing::split`]).
pub trait RingProducer<T> {
    fn reserve_write(&mut self) -> &mut T;
    fn commit_write(&mut self);
}

/// Consumer-side operations: inspect and retire the oldest published
/// slot.
pub trait RingConsumer<T> {
    fn peek_read(&self) -> Option<&T>;
    fn commit_read(&mut self);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct SpscRing<T> {
    slots: Box<[T]>,
    capacity: usize,
    write_idx: usize,
    read_idx: usize,
    count: AtomicUsize,
}

impl<T: Default + Clone> SpscRing<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");
        let slots = vec![T::default(); capacity].into_boxed_slice();
        SpscRing {
            slots,
            capacity,
            write_idx: 0,
            read_idx: 0,
            count: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current population, acquire-ordered so callers may safely read
    /// slots the producer has published.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Producer-only: returns the slot at the current write position for
    /// in-place population. Calling this without a matching
    /// [`commit_write`](Self::commit_write) is legal — the producer may
    /// overwrite in place without publishing. Fatal if the ring is full:
    /// per spec §4.1/§7, backpressure on overflow indicates a
    /// misconfigured capacity and would itself corrupt ordering
    /// guarantees if silently absorbed.
    pub fn reserve_write(&mut self) -> &mut T {
        assert!(
            !self.is_full(),
            "SPSC ring overflow: capacity {} exhausted",
            self.capacity
        );
        &mut self.slots[self.write_idx]
    }

    /// Producer-only: publishes the slot populated by the last
    /// `reserve_write` and advances the write cursor.
    pub fn commit_write(&mut self) {
        self.write_idx = (self.write_idx + 1) % self.capacity;
        self.count.fetch_add(1, Ordering::Release);
    }

    /// Consumer-only: the slot at the read position, or `None` if empty.
    pub fn peek_read(&self) -> Option<&T> {
        if self.len() == 0 {
            None
        } else {
            Some(&self.slots[self.read_idx])
        }
    }

    /// Consumer-only: advances the read cursor past the slot last
    /// returned by `peek_read`.
    pub fn commit_read(&mut self) {
        debug_assert!(self.len() > 0, "commit_read on empty ring");
        self.read_idx = (self.read_idx + 1) % self.capacity;
        self.count.fetch_sub(1, Ordering::Release);
    }

    /// Splits the ring into a producer handle and a consumer handle that
    /// can be moved to different threads, backed by one shared
    /// allocation. Safe because the two handles never call each other's
    /// methods: the producer only touches `write_idx`/its slot, the
    /// consumer only touches `read_idx`/its slot, and `count` is the
    /// sole point of contact, synchronised with acquire/release.
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        let shared = Arc::new(Shared {
            slots: self.slots.into_vec().into_iter().map(UnsafeCell::new).collect(),
            capacity: self.capacity,
            write_idx: UnsafeCell::new(self.write_idx),
            read_idx: UnsafeCell::new(self.read_idx),
            count: self.count,
        });
        (
            Producer {
                shared: shared.clone(),
            },
            Consumer { shared },
        )
    }
}

impl<T: Default + Clone> RingProducer<T> for SpscRing<T> {
    fn reserve_write(&mut self) -> &mut T {
        SpscRing::reserve_write(self)
    }
    fn commit_write(&mut self) {
        SpscRing::commit_write(self)
    }
}

impl<T: Default + Clone> RingConsumer<T> for SpscRing<T> {
    fn peek_read(&self) -> Option<&T> {
        SpscRing::peek_read(self)
    }
    fn commit_read(&mut self) {
        SpscRing::commit_read(self)
    }
    fn len(&self) -> usize {
        SpscRing::len(self)
    }
}

struct Shared<T> {
    slots: Box<[UnsafeCell<T>]>,
    capacity: usize,
    write_idx: UnsafeCell<usize>,
    read_idx: UnsafeCell<usize>,
    count: AtomicUsize,
}

unsafe impl<T: Send> Sync for Shared<T> {}
unsafe impl<T: Send> Send for Shared<T> {}

pub struct Producer<T> {
    shared: Arc<Shared<T>>,
}

pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> RingProducer<T> for Producer<T> {
    fn reserve_write(&mut self) -> &mut T {
        let count = self.shared.count.load(Ordering::Acquire);
        assert!(
            count < self.shared.capacity,
            "SPSC ring overflow: capacity {} exhausted",
            self.shared.capacity
        );
        unsafe {
            let idx = *self.shared.write_idx.get();
            &mut *self.shared.slots[idx].get()
        }
    }

    fn commit_write(&mut self) {
        unsafe {
            let idx = &mut *self.shared.write_idx.get();
            *idx = (*idx + 1) % self.shared.capacity;
        }
        self.shared.count.fetch_add(1, Ordering::Release);
    }
}

impl<T> RingConsumer<T> for Consumer<T> {
    fn peek_read(&self) -> Option<&T> {
        if self.shared.count.load(Ordering::Acquire) == 0 {
            None
        } else {
            unsafe {
                let idx = *self.shared.read_idx.get();
                Some(&*self.shared.slots[idx].get())
            }
        }
    }

    fn commit_read(&mut self) {
        debug_assert!(self.shared.count.load(Ordering::Relaxed) > 0, "commit_read on empty ring");
        unsafe {
            let idx = &mut *self.shared.read_idx.get();
            *idx = (*idx + 1) % self.shared.capacity;
        }
        self.shared.count.fetch_sub(1, Ordering::Release);
    }

    fn len(&self) -> usize {
        self.shared.count.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let mut ring: SpscRing<u32> = SpscRing::new(4);
        for v in [1u32, 2, 3] {
            *ring.reserve_write() = v;
            ring.commit_write();
        }
        assert_eq!(ring.len(), 3);
        let mut out = Vec::new();
        while let Some(&v) = ring.peek_read() {
            out.push(v);
            ring.commit_read();
        }
        assert_eq!(out, vec![1, 2, 3]);
        assert!(ring.is_empty());
    }

    #[test]
    fn wraps_around_capacity() {
        let mut ring: SpscRing<u32> = SpscRing::new(2);
        *ring.reserve_write() = 1;
        ring.commit_write();
        *ring.reserve_write() = 2;
        ring.commit_write();
        assert!(ring.is_full());
        ring.commit_read();
        *ring.reserve_write() = 3;
        ring.commit_write();
        let mut out = Vec::new();
        while let Some(&v) = ring.peek_read() {
            out.push(v);
            ring.commit_read();
        }
        assert_eq!(out, vec![2, 3]);
    }

    #[test]
    fn reserve_without_commit_does_not_publish() {
        let mut ring: SpscRing<u32> = SpscRing::new(2);
        *ring.reserve_write() = 99;
        assert_eq!(ring.len(), 0);
        assert!(ring.peek_read().is_none());
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn overflow_is_fatal() {
        let mut ring: SpscRing<u32> = SpscRing::new(1);
        *ring.reserve_write() = 1;
        ring.commit_write();
        ring.reserve_write();
    }
}
