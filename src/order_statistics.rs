use num_traits::float::FloatCore;

use crate::utils::{RbTree, RingBuffer};

/// # Rank and Median Over a Fixed Window
///
/// Holds the last `period` observations as an ordered multiset, answering
/// "how many are `<= v`", median, quantile and k-th smallest queries in
/// O(log period). Observations leave in arrival order: once the window is
/// full, every new observation evicts the oldest one.
///
/// Values are keyed by their total order (`NaN` sorts above every number),
/// so arbitrary floats are accepted. The ordered storage is a red-black tree
/// with subtree counts over a node pool allocated at construction; nothing is
/// allocated afterwards, and the pool is released when the window is dropped.
/// A window can be [`reset`](Self::reset) and reused across series.
#[derive(Debug, Clone)]
pub struct OrderStatisticWindow<T> {
    /// Ordered multiset of the window
    tree: RbTree<T>,
    /// Arrival order, for eviction
    fifo: RingBuffer<T>,
}

impl<T> OrderStatisticWindow<T>
where
    T: FloatCore + Default,
{
    /// Creates a window over the last `period` observations
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
        tracing::trace!(period, "order statistic window created");
        Self {
            tree: RbTree::new(period),
            fifo: RingBuffer::new(period),
        }
    }

    /// Returns the window length
    pub fn period(&self) -> usize {
        self.tree.capacity()
    }

    /// Number of observations currently held
    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    /// Returns true before the first observation
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns true once the window holds `period` observations
    pub fn is_full(&self) -> bool {
        self.fifo.is_full()
    }

    /// Pushes a new observation, evicting the oldest one when full
    ///
    /// # Arguments
    ///
    /// * `value` - The next value of the series
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The window, for chaining queries
    pub fn next(&mut self, value: T) -> &mut Self {
        if let Some(evicted) = self.fifo.push(value) {
            let removed = self.tree.remove(evicted);
            debug_assert!(removed, "evicted value missing from the tree");
        }
        // the eviction above frees a node whenever the window was full
        let inserted = self.tree.insert(value);
        debug_assert!(inserted.is_some(), "node pool exhausted");
        debug_assert_eq!(self.tree.total_count(), self.fifo.len());
        debug_assert!(self.tree.len() <= self.tree.total_count());
        self
    }

    /// Returns the number of observations in the window that are `<= value`
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::OrderStatisticWindow;
    ///
    /// let mut window = OrderStatisticWindow::new(3);
    /// for v in [5.0, 1.0, 4.0, 2.0] {
    ///     window.next(v);
    /// }
    /// assert_eq!(window.count_le(3.0), 2);
    /// assert_eq!(window.count_le(4.0), 3);
    /// assert_eq!(window.count_le(0.5), 0);
    /// ```
    pub fn count_le(&self, value: T) -> usize {
        self.tree.count_le(value)
    }

    /// Returns the number of observations in the window that are `< value`
    pub fn count_lt(&self, value: T) -> usize {
        self.tree.count_lt(value)
    }

    /// Returns the fraction of the window that is `<= value`
    ///
    /// # Returns
    ///
    /// * `Option<T>` - A value in `[0, 1]`, or `None` if the window is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::OrderStatisticWindow;
    ///
    /// let mut window = OrderStatisticWindow::new(4);
    /// for v in [0.2, -0.1, 0.4, 0.1] {
    ///     window.next(v);
    /// }
    /// assert_eq!(window.percent_rank(0.2), Some(0.75));
    /// ```
    pub fn percent_rank(&self, value: T) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        Some(T::from(self.count_le(value))? / T::from(len)?)
    }

    /// Returns the zero-based `k`-th smallest observation in the window
    pub fn kth(&self, k: usize) -> Option<T> {
        self.tree.kth(k)
    }

    /// Returns the median of the window, the mean of the two middle values
    /// when it holds an even number of observations
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The median, or `None` if the window is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::OrderStatisticWindow;
    ///
    /// let mut window = OrderStatisticWindow::new(3);
    /// window.next(5.0).next(1.0).next(4.0);
    /// assert_eq!(window.median(), Some(4.0));
    ///
    /// window.next(2.0);
    /// assert_eq!(window.median(), Some(2.0));
    /// ```
    pub fn median(&self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }

        let mid = len / 2;
        if len % 2 == 1 {
            self.kth(mid)
        } else {
            let lower = self.kth(mid - 1)?;
            let upper = self.kth(mid)?;
            Some((lower + upper) / (T::one() + T::one()))
        }
    }

    /// Returns the `q` quantile of the window, interpolating linearly between
    /// the two closest ranks
    ///
    /// # Arguments
    ///
    /// * `q` - The quantile, clamped to `[0, 1]`
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The quantile, or `None` if the window is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::OrderStatisticWindow;
    ///
    /// let mut window = OrderStatisticWindow::new(5);
    /// for v in [10.0, 40.0, 20.0, 50.0, 30.0] {
    ///     window.next(v);
    /// }
    /// assert_eq!(window.quantile(0.25), Some(20.0));
    /// assert_eq!(window.quantile(0.625), Some(35.0));
    /// ```
    pub fn quantile(&self, q: T) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }

        let q = if q.is_nan() {
            T::zero()
        } else {
            q.max(T::zero()).min(T::one())
        };
        let pos = q * T::from(len - 1)?;
        let lower_index = pos.floor().to_usize()?;
        let upper_index = pos.ceil().to_usize()?.min(len - 1);

        let lower = self.kth(lower_index)?;
        if lower_index == upper_index {
            return Some(lower);
        }

        let upper = self.kth(upper_index)?;
        let weight = pos - T::from(lower_index)?;
        Some(lower + weight * (upper - lower))
    }

    /// Returns the smallest observation in the window
    pub fn min(&self) -> Option<T> {
        self.tree.min()
    }

    /// Returns the largest observation in the window
    pub fn max(&self) -> Option<T> {
        self.tree.max()
    }

    /// Iterates the window oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.fifo.iter()
    }

    /// Empties the window, keeping its storage for reuse
    pub fn reset(&mut self) -> &mut Self {
        tracing::trace!(period = self.period(), "order statistic window reset");
        self.tree.reset();
        self.fifo.reset();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn series(len: usize, seed: u64, levels: u64) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) % levels) as f64 * 0.25 - 10.0
            })
            .collect()
    }

    fn sorted_tail(values: &[f64], n: usize, period: usize) -> Vec<f64> {
        let mut tail = values[n - period.min(n)..n].to_vec();
        tail.sort_by(|a, b| a.partial_cmp(b).unwrap());
        tail
    }

    #[test]
    fn test_median_scenario() {
        let mut window = OrderStatisticWindow::new(3);
        window.next(5.0).next(1.0).next(4.0);
        assert_eq!(window.median(), Some(4.0));
        window.next(2.0);
        assert_eq!(window.median(), Some(2.0));
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![1.0, 4.0, 2.0]);
    }

    #[test]
    fn test_rank_scenario() {
        let mut window = OrderStatisticWindow::new(3);
        window.next(5.0).next(1.0).next(4.0).next(2.0);
        assert_eq!(window.count_le(3.0), 2);
        assert_eq!(window.count_le(5.0), 3);
        assert_eq!(window.count_lt(4.0), 2);
    }

    #[test]
    fn test_empty_window() {
        let window = OrderStatisticWindow::<f64>::new(5);
        assert!(window.is_empty());
        assert_eq!(window.count_le(1.0), 0);
        assert_eq!(window.median(), None);
        assert_eq!(window.quantile(0.5), None);
        assert_eq!(window.percent_rank(1.0), None);
        assert_eq!(window.min(), None);
        assert_eq!(window.max(), None);
    }

    #[test]
    #[should_panic(expected = "period must be greater than zero")]
    fn test_zero_period_panics() {
        OrderStatisticWindow::<f64>::new(0);
    }

    #[test]
    fn test_even_median_averages_middle_pair() {
        let mut window = OrderStatisticWindow::new(4);
        window.next(1.0).next(10.0).next(3.0).next(8.0);
        assert_eq!(window.median(), Some(5.5));
    }

    #[test]
    fn test_period_one() {
        let mut window = OrderStatisticWindow::new(1);
        for v in [3.0, -1.0, 3.0, 7.5] {
            window.next(v);
            assert_eq!(window.len(), 1);
            assert_eq!(window.median(), Some(v));
            assert_eq!(window.count_le(v), 1);
            assert_eq!(window.count_lt(v), 0);
        }
    }

    #[test]
    fn test_matches_naive_with_heavy_ties() {
        for (period, levels) in [(1, 4), (2, 3), (5, 6), (14, 10), (50, 400), (300, 40)] {
            let values = series(700, period as u64 + levels, levels);
            let mut window = OrderStatisticWindow::new(period);

            for (i, &v) in values.iter().enumerate() {
                window.next(v);
                let n = i + 1;
                let tail = sorted_tail(&values, n, period);
                let len = tail.len();

                assert_eq!(window.len(), len);
                let expected_median = if len % 2 == 1 {
                    tail[len / 2]
                } else {
                    (tail[len / 2 - 1] + tail[len / 2]) / 2.0
                };
                assert_eq!(window.median(), Some(expected_median), "period {period} step {n}");

                for query in [v, v - 0.25, v + 0.1, -11.0, 200.0] {
                    let expected = tail.iter().filter(|&&x| x <= query).count();
                    assert_eq!(window.count_le(query), expected);
                }

                let k = i % len;
                assert_eq!(window.kth(k), Some(tail[k]));
                assert_eq!(window.min(), Some(tail[0]));
                assert_eq!(window.max(), Some(tail[len - 1]));
            }
        }
    }

    #[test]
    fn test_quantile_interpolates() {
        let mut window = OrderStatisticWindow::new(4);
        for v in [4.0, 1.0, 3.0, 2.0] {
            window.next(v);
        }
        assert_eq!(window.quantile(0.0), Some(1.0));
        assert_eq!(window.quantile(1.0), Some(4.0));
        assert_approx_eq!(window.quantile(0.5).unwrap(), 2.5);
        assert_approx_eq!(window.quantile(0.25).unwrap(), 1.75);
        assert_eq!(window.quantile(-3.0), Some(1.0));
        assert_eq!(window.quantile(7.0), Some(4.0));
        assert_eq!(window.quantile(f64::NAN), Some(1.0));
    }

    #[test]
    fn test_percent_rank() {
        let mut window = OrderStatisticWindow::new(5);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            window.next(v);
        }
        assert_eq!(window.percent_rank(6.0), Some(1.0));
        assert_eq!(window.percent_rank(4.0), Some(0.6));
        assert_eq!(window.percent_rank(1.5), Some(0.0));
    }

    #[test]
    fn test_queries_are_idempotent() {
        let mut window = OrderStatisticWindow::new(9);
        for v in series(40, 3, 12) {
            window.next(v);
            let first = (window.median(), window.count_le(0.0), window.quantile(0.3));
            let second = (window.median(), window.count_le(0.0), window.quantile(0.3));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_reset_reuses_storage() {
        let mut window = OrderStatisticWindow::new(3);
        for symbol in 0..5 {
            window.reset();
            let base = symbol as f64 * 100.0;
            window.next(base + 3.0).next(base + 1.0).next(base + 2.0).next(base + 9.0);
            assert_eq!(window.median(), Some(base + 2.0));
            assert_eq!(window.len(), 3);
            assert_eq!(window.period(), 3);
            assert!(window.is_full());
        }
    }

    struct Tracked<'a> {
        window: OrderStatisticWindow<f64>,
        drops: &'a std::cell::Cell<usize>,
    }

    impl Drop for Tracked<'_> {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn test_window_is_released_on_unwind() {
        let drops = std::cell::Cell::new(0);
        for round in 0..20 {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let mut tracked = Tracked {
                    window: OrderStatisticWindow::new(64),
                    drops: &drops,
                };
                for v in series(40, round, 30) {
                    tracked.window.next(v);
                }
                if tracked.window.len() == 40 {
                    panic!("indicator failed mid-series");
                }
            }));
            assert!(result.is_err());
            assert_eq!(drops.get(), round as usize + 1);
        }
    }

    #[test]
    fn test_reset_after_interrupted_pass() {
        let mut window = OrderStatisticWindow::new(8);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            for v in series(5, 9, 20) {
                window.next(v);
            }
            if window.len() == 5 {
                panic!("indicator failed mid-series");
            }
        }));
        assert!(result.is_err());
        assert_eq!(window.len(), 5);

        window.reset();
        assert_eq!(window.len(), 0);
        assert_eq!(window.median(), None);

        let values = series(30, 4, 50);
        for (i, &v) in values.iter().enumerate() {
            window.next(v);
            let n = i + 1;
            let tail = sorted_tail(&values, n, 8);
            let len = tail.len();
            let expected = if len % 2 == 1 {
                tail[len / 2]
            } else {
                (tail[len / 2 - 1] + tail[len / 2]) / 2.0
            };
            assert_eq!(window.median(), Some(expected));
        }
    }
}
