use alloc::{boxed::Box, vec};

/// Fixed-capacity FIFO of the most recent observations.
///
/// Once full, every push overwrites and returns the oldest observation, which
/// is what a sliding window needs to know to evict it from derived state.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Slots, allocated once at construction
    data: Box<[T]>,
    /// Slot of the oldest observation
    head: usize,
    /// Number of observations held, never above `data.len()`
    len: usize,
}

impl<T: Default + Copy> RingBuffer<T> {
    /// Creates a buffer holding at most `capacity` observations
    ///
    /// # Panics
    ///
    /// If `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than zero");
        Self {
            data: vec![T::default(); capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Appends `value`, returning the evicted oldest observation when full
    pub fn push(&mut self, value: T) -> Option<T> {
        let cap = self.capacity();
        if self.is_full() {
            let evicted = core::mem::replace(&mut self.data[self.head], value);
            self.head = (self.head + 1) % cap;
            Some(evicted)
        } else {
            self.data[(self.head + self.len) % cap] = value;
            self.len += 1;
            None
        }
    }

    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
        self.data.fill(T::default());
    }

    /// Iterates oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let cap = self.capacity();
        (0..self.len).map(move |i| &self.data[(self.head + i) % cap])
    }
}
