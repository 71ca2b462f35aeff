use core::marker::PhantomData;

use super::Deque;

/// Decides which queued entries a new observation dominates.
///
/// An entry at the back of the queue is discarded when the new value is at
/// least as extreme, since it can never be reported again while the new value
/// is still inside the window.
pub trait OrderPolicy<T> {
    /// Returns true if `existing` is dominated by `new`
    fn dominated(existing: &T, new: &T) -> bool;
}

/// Order policy tracking the window minimum
#[derive(Debug, Clone)]
pub struct Min;

/// Order policy tracking the window maximum
#[derive(Debug, Clone)]
pub struct Max;

impl<T: PartialOrd> OrderPolicy<T> for Min {
    #[inline]
    fn dominated(existing: &T, new: &T) -> bool {
        existing >= new
    }
}

impl<T: PartialOrd> OrderPolicy<T> for Max {
    #[inline]
    fn dominated(existing: &T, new: &T) -> bool {
        existing <= new
    }
}

// (value, observation index)
type Entry<T> = (T, usize);

/// Sliding-window extremum over the last `period` observations.
///
/// Values in the deque are monotonic from front to back, so the front always
/// holds the extremum of the window. Each observation is pushed and popped at
/// most once, giving amortized O(1) updates.
#[derive(Debug, Clone)]
pub struct MonotonicQueue<T, O> {
    deque: Deque<Entry<T>>,
    /// Number of observations pushed since construction or reset
    seen: usize,
    _order: PhantomData<O>,
}

impl<T, O> MonotonicQueue<T, O>
where
    T: PartialOrd + Copy + Default,
    O: OrderPolicy<T>,
{
    /// Creates a queue covering the last `period` observations
    #[inline]
    pub fn new(period: usize) -> Self {
        Self {
            deque: Deque::new(period),
            seen: 0,
            _order: PhantomData,
        }
    }

    /// Returns the window length
    #[inline]
    pub fn period(&self) -> usize {
        self.deque.capacity()
    }

    /// Returns the number of observations pushed so far
    #[inline]
    pub const fn seen(&self) -> usize {
        self.seen
    }

    /// Index of the oldest observation that is still inside the window once
    /// `self.seen` is pushed
    #[inline]
    fn window_start(&self) -> usize {
        (self.seen + 1).saturating_sub(self.period())
    }

    #[inline]
    fn evict_expired(&mut self) {
        let start = self.window_start();
        while let Some(&(_, index)) = self.deque.front() {
            if index >= start {
                break;
            }
            self.deque.pop_front();
        }
    }

    #[inline]
    fn evict_dominated(&mut self, value: T) {
        while let Some((existing, _)) = self.deque.back() {
            if !O::dominated(existing, &value) {
                break;
            }
            self.deque.pop_back();
        }
    }

    /// Pushes a new observation
    #[inline]
    pub fn push(&mut self, value: T) {
        self.evict_expired();
        self.evict_dominated(value);
        self.deque.push_back((value, self.seen));
        self.seen += 1;
    }

    /// Returns the extremum of the window, `None` before the first push
    #[inline]
    pub fn front(&self) -> Option<T> {
        self.deque.front().map(|&(value, _)| value)
    }

    /// Returns how many observations ago the current extremum was pushed,
    /// `0` meaning the latest one
    #[inline]
    pub fn front_age(&self) -> Option<usize> {
        self.deque
            .front()
            .map(|&(_, index)| self.seen - 1 - index)
    }

    /// Resets the queue to its initial state
    #[inline]
    pub fn reset(&mut self) -> &mut Self {
        self.deque.reset();
        self.seen = 0;
        self
    }
}
