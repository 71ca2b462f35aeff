use alloc::{boxed::Box, vec};

/// A fixed-capacity double-ended queue backed by a circular buffer.
///
/// All storage is allocated up front, pushing and popping at either end never
/// reallocates. Pushing onto a full deque overwrites the front element.
#[derive(Debug, Clone)]
pub struct Deque<T> {
    /// Slots of the circular buffer
    buf: Box<[T]>,
    /// Slot holding the front element
    front: usize,
    /// Slot one past the back element
    back: usize,
    /// Number of occupied slots
    len: usize,
}

impl<T> Deque<T>
where
    T: Default + Clone,
{
    /// Creates a new `Deque` holding at most `cap` elements.
    ///
    /// # Arguments
    ///
    /// * `cap` - The capacity of the deque
    ///
    /// # Panics
    ///
    /// If `cap` is zero
    #[inline]
    pub fn new(cap: usize) -> Self {
        assert!(cap > 0, "capacity must be greater than zero");
        Self {
            buf: vec![T::default(); cap].into_boxed_slice(),
            front: 0,
            back: 0,
            len: 0,
        }
    }

    /// Returns the capacity of the deque
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if the deque holds no elements
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if every slot is occupied
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    #[inline]
    fn wrap_inc(&self, slot: usize) -> usize {
        if slot + 1 == self.capacity() { 0 } else { slot + 1 }
    }

    #[inline]
    fn wrap_dec(&self, slot: usize) -> usize {
        if slot == 0 { self.capacity() - 1 } else { slot - 1 }
    }

    /// Clears the deque, keeping its storage
    #[inline]
    pub fn reset(&mut self) -> &mut Self {
        self.buf.fill(T::default());
        self.front = 0;
        self.back = 0;
        self.len = 0;
        self
    }

    /// Pushes `value` to the back of the deque
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The overwritten front element if the deque was full
    #[inline]
    pub fn push_back(&mut self, value: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.front = self.wrap_inc(self.front);
            Some(core::mem::replace(&mut self.buf[self.back], value))
        } else {
            self.buf[self.back] = value;
            self.len += 1;
            None
        };
        self.back = self.wrap_inc(self.back);
        evicted
    }

    /// Removes and returns the back element, `None` if empty
    #[inline]
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.back = self.wrap_dec(self.back);
        self.len -= 1;
        Some(core::mem::take(&mut self.buf[self.back]))
    }

    /// Removes and returns the front element, `None` if empty
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = core::mem::take(&mut self.buf[self.front]);
        self.front = self.wrap_inc(self.front);
        self.len -= 1;
        Some(value)
    }

    /// Returns the front element, `None` if empty
    #[inline]
    pub fn front(&self) -> Option<&T> {
        (!self.is_empty()).then(|| &self.buf[self.front])
    }

    /// Returns the back element, `None` if empty
    #[inline]
    pub fn back(&self) -> Option<&T> {
        (!self.is_empty()).then(|| &self.buf[self.wrap_dec(self.back)])
    }
}
