use core::ops::Sub;

use crate::utils::{Max, Min, MonotonicQueue};

/// # Running Maximum and Minimum Over a Fixed Window
///
/// Tracks the highest and lowest of the last `period` observations with two
/// monotonic queues, one non-increasing for the maximum and one
/// non-decreasing for the minimum. Updates are amortized O(1) and reads are
/// O(1), which is what channel, stochastic and Aroon style indicators need
/// at every bar.
///
/// Before `period` observations have been seen the extremes cover every
/// observation so far.
#[derive(Debug, Clone)]
pub struct SlidingExtremum<T> {
    max: MonotonicQueue<T, Max>,
    min: MonotonicQueue<T, Min>,
}

impl<T> SlidingExtremum<T>
where
    T: PartialOrd + Copy + Default,
{
    /// Creates a tracker over the last `period` observations
    ///
    /// # Arguments
    ///
    /// * `period` - The size of the rolling window
    ///
    /// # Panics
    ///
    /// If `period` is zero
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "period must be greater than zero");
        tracing::trace!(period, "sliding extremum created");
        Self {
            max: MonotonicQueue::new(period),
            min: MonotonicQueue::new(period),
        }
    }

    /// Returns the window length
    pub fn period(&self) -> usize {
        self.max.period()
    }

    /// Number of observations currently inside the window
    pub fn len(&self) -> usize {
        self.max.seen().min(self.period())
    }

    /// Returns true once a full window has been observed
    pub fn is_ready(&self) -> bool {
        self.max.seen() >= self.period()
    }

    /// Pushes a new observation into the window
    ///
    /// # Arguments
    ///
    /// * `value` - The next value of the series
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The tracker, for chaining queries
    pub fn next(&mut self, value: T) -> &mut Self {
        self.max.push(value);
        self.min.push(value);
        self
    }

    /// Returns the maximum of the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The maximum, or `None` before the first observation
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::SlidingExtremum;
    ///
    /// let mut window = SlidingExtremum::new(3);
    /// for v in [5.0, 1.0, 4.0, 2.0] {
    ///     window.next(v);
    /// }
    /// assert_eq!(window.max(), Some(4.0));
    /// assert_eq!(window.min(), Some(1.0));
    /// ```
    pub fn max(&self) -> Option<T> {
        self.max.front()
    }

    /// Returns the minimum of the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The minimum, or `None` before the first observation
    pub fn min(&self) -> Option<T> {
        self.min.front()
    }

    /// Returns `max - min` over the window
    pub fn range(&self) -> Option<T>
    where
        T: Sub<Output = T>,
    {
        self.max().zip(self.min()).map(|(hi, lo)| hi - lo)
    }

    /// Returns how many observations ago the window maximum occurred,
    /// `0` being the latest. Ties resolve to the most recent occurrence.
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::SlidingExtremum;
    ///
    /// let mut window = SlidingExtremum::new(5);
    /// for v in [3.0, 9.0, 4.0, 1.0] {
    ///     window.next(v);
    /// }
    /// assert_eq!(window.bars_since_max(), Some(2));
    /// assert_eq!(window.bars_since_min(), Some(0));
    /// ```
    pub fn bars_since_max(&self) -> Option<usize> {
        self.max.front_age()
    }

    /// Returns how many observations ago the window minimum occurred,
    /// `0` being the latest. Ties resolve to the most recent occurrence.
    pub fn bars_since_min(&self) -> Option<usize> {
        self.min.front_age()
    }

    /// Resets the tracker to its initial state
    pub fn reset(&mut self) -> &mut Self {
        tracing::trace!(period = self.period(), "sliding extremum reset");
        self.max.reset();
        self.min.reset();
        self
    }
}
