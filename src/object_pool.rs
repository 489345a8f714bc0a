//! Fixed-capacity slab allocator. Ground truth: `original_source/mem_pool.h`,
//! generalized per spec §9's index-based strategy for cyclic owned nodes —
//! slots are addressed by a stable `Idx`, never by raw pointer, so
//! prev/next links on pooled nodes can be plain indices.

/// An index into an [`ObjectPool`]. `u32` keeps pooled nodes cache-dense,
/// per the teacher's `OrderIndex` comment in `data_types.rs`.
pub type Idx = u32;
pub const IDX_INVALID: Idx = Idx::MAX;

struct Slot<T> {
    value: T,
    free: bool,
}

/// A slab of `(T, free-flag)` pairs. Allocation scans forward from the
/// slot after the last allocation until a free one is found; exhaustion
/// is a fatal condition (spec §7: resource exhaustion is never silently
/// downgraded to backpressure).
pub struct ObjectPool<T> {
    slots: Vec<Slot<T>>,
    next_free_hint: usize,
    in_use: usize,
}

impl<T: Default> ObjectPool<T> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot {
            value: T::default(),
            free: true,
        });
        ObjectPool {
            slots,
            next_free_hint: 0,
            in_use: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.in_use
    }

    pub fn is_empty(&self) -> bool {
        self.in_use == 0
    }

    /// Allocates a slot, writes `value` into it and returns its stable
    /// index. Fatal (panics) when the pool is exhausted — per spec §4.2
    /// "fails fatally when the pool is exhausted."
    pub fn allocate(&mut self, value: T) -> Idx {
        let cap = self.slots.len();
        assert!(cap > 0, "object pool has zero capacity");
        for step in 0..cap {
            let i = (self.next_free_hint + step) % cap;
            if self.slots[i].free {
                self.slots[i].value = value;
                self.slots[i].free = false;
                self.next_free_hint = (i + 1) % cap;
                self.in_use += 1;
                return i as Idx;
            }
        }
        panic!(
            "object pool exhausted: capacity {} slots all in use",
            cap
        );
    }

    pub fn deallocate(&mut self, idx: Idx) {
        let slot = &mut self.slots[idx as usize];
        assert!(!slot.free, "double free of pool slot {idx}");
        slot.value = T::default();
        slot.free = true;
        self.in_use -= 1;
    }

    pub fn get(&self, idx: Idx) -> &T {
        debug_assert!(!self.slots[idx as usize].free, "read of free slot {idx}");
        &self.slots[idx as usize].value
    }

    pub fn get_mut(&mut self, idx: Idx) -> &mut T {
        debug_assert!(!self.slots[idx as usize].free, "write of free slot {idx}");
        &mut self.slots[idx as usize].value
    }
}
