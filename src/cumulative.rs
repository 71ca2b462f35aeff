use alloc::vec::Vec;
use core::ops::Sub;

use num_traits::Float;

use crate::Kbn;
use crate::utils::DoubleFloat;

/// Running totals after one observation
#[derive(Debug, Clone, Copy, Default)]
struct Prefix<T> {
    sum: DoubleFloat<T>,
    sum_sq: DoubleFloat<T>,
}

impl<T: Float> Sub for Prefix<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            sum: self.sum - rhs.sum,
            sum_sq: self.sum_sq - rhs.sum_sq,
        }
    }
}

/// # Retrospective Sums Over an Append-Only Series
///
/// Keeps the running sum (and sum of squares) after every observation, so the
/// sum over the last `length` observations is the difference of two stored
/// prefixes. Any lookback can be queried at every step in O(1), which lets an
/// indicator read the same series at several lengths without keeping one
/// rolling window per length. Memory grows by one prefix per observation.
///
/// Lookbacks longer than the series shrink to the observations seen so far,
/// so early values come from a partial window rather than a zero-padded one.
///
/// Running totals are accumulated with Kahan-Babuska-Neumaier compensated
/// summation and each prefix keeps the compensation term next to the sum, so
/// a short lookback deep into a long series loses no digits to the size of
/// the prefixes. Variance is formed as `n·Σx² − (Σx)²` at the same doubled
/// precision before rounding.
#[derive(Debug, Clone)]
pub struct CumulativeWindow<T> {
    /// Running sum of inputs
    sum: Kbn<T>,
    /// Running sum of squares
    sum_sq: Kbn<T>,
    /// Prefix totals, one per observation
    prefix: Vec<Prefix<T>>,
    /// Delta Degrees of Freedom
    ddof: bool,
}

impl<T> Default for CumulativeWindow<T>
where
    T: Default + Clone + Float,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CumulativeWindow<T>
where
    T: Default + Clone + Float,
{
    /// Creates an empty `CumulativeWindow`
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty `CumulativeWindow` with room for `capacity`
    /// observations before reallocating
    ///
    /// # Arguments
    ///
    /// * `capacity` - Expected length of the series
    pub fn with_capacity(capacity: usize) -> Self {
        tracing::trace!(capacity, "cumulative window created");
        Self {
            sum: Kbn::default(),
            sum_sq: Kbn::default(),
            prefix: Vec::with_capacity(capacity),
            ddof: false,
        }
    }

    /// Number of observations seen
    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    /// Returns true before the first observation
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Returns the Delta Degrees of Freedom
    pub const fn ddof(&self) -> bool {
        self.ddof
    }

    /// Sets the Delta Degrees of Freedom, `true` selects sample variance
    pub const fn set_ddof(&mut self, ddof: bool) -> &mut Self {
        self.ddof = ddof;
        self
    }

    /// Forgets every observation, keeping the allocated log
    pub fn reset(&mut self) -> &mut Self {
        tracing::trace!(observations = self.prefix.len(), "cumulative window reset");
        self.sum = Kbn::default();
        self.sum_sq = Kbn::default();
        self.prefix.clear();
        self
    }

    /// Appends an observation
    ///
    /// # Arguments
    ///
    /// * `value` - The next value of the series
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The window, for chaining queries
    pub fn next(&mut self, value: T) -> &mut Self {
        self.sum += value;
        DoubleFloat::product(value, value).add_to(&mut self.sum_sq);
        self.prefix.push(Prefix {
            sum: DoubleFloat::from_accumulator(&self.sum),
            sum_sq: DoubleFloat::from_accumulator(&self.sum_sq),
        });
        self
    }

    /// Number of observations covered by `length` and the totals over them
    fn span(&self, length: usize) -> (usize, Prefix<T>) {
        assert!(length > 0, "length must be greater than zero");

        let n = self.prefix.len();
        let covered = length.min(n);
        if covered == 0 {
            return (0, Prefix::default());
        }

        let end = self.prefix[n - 1];
        if covered == n {
            (covered, end)
        } else {
            (covered, end - self.prefix[n - 1 - covered])
        }
    }

    /// Returns the sum of the last `length` observations
    ///
    /// # Arguments
    ///
    /// * `length` - Lookback, clamped to the observations seen so far
    ///
    /// # Panics
    ///
    /// If `length` is zero
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::CumulativeWindow;
    ///
    /// let mut window = CumulativeWindow::new();
    /// for v in [1.0, 2.0, 3.0, 4.0] {
    ///     window.next(v);
    /// }
    /// assert_eq!(window.sum(2), 7.0);
    /// assert_eq!(window.sum(10), 10.0);
    /// ```
    pub fn sum(&self, length: usize) -> T {
        let (n, totals) = self.span(length);
        if n == 0 { T::zero() } else { totals.sum.value() }
    }

    /// Returns the arithmetic mean of the last `length` observations
    ///
    /// The divisor is the number of observations actually covered, so the
    /// mean over a partial window is not diluted.
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The mean, or `None` before the first observation
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::CumulativeWindow;
    ///
    /// let mut window = CumulativeWindow::new();
    /// assert_eq!(window.mean(3), None);
    ///
    /// window.next(2.0).next(4.0);
    /// assert_eq!(window.mean(3), Some(3.0));
    /// assert_eq!(window.mean(1), Some(4.0));
    /// ```
    pub fn mean(&self, length: usize) -> Option<T> {
        let (n, totals) = self.span(length);
        if n == 0 {
            return None;
        }
        Some(totals.sum.value() / T::from(n)?)
    }

    /// Returns the variance of the last `length` observations
    ///
    /// Population variance by default, sample variance when ddof is set.
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The variance, or `None` if no observation is covered
    ///   (fewer than two with ddof)
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::CumulativeWindow;
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut window = CumulativeWindow::<f64>::new();
    /// for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
    ///     window.next(v);
    /// }
    /// assert_approx_eq!(window.variance(8).unwrap(), 4.0);
    /// window.set_ddof(true);
    /// assert_approx_eq!(window.variance(8).unwrap(), 32.0 / 7.0);
    /// ```
    pub fn variance(&self, length: usize) -> Option<T> {
        let (n, totals) = self.span(length);
        if n == 0 || (self.ddof && n < 2) {
            return None;
        }

        let count = T::from(n)?;
        let m2 = (totals.sum_sq.scale(count) - totals.sum * totals.sum)
            .value()
            .max(T::zero());

        if self.ddof {
            Some(m2 / (count * (count - T::one())))
        } else {
            Some(m2 / (count * count))
        }
    }

    /// Returns the standard deviation of the last `length` observations
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The square root of [`variance`](Self::variance)
    pub fn stddev(&self, length: usize) -> Option<T> {
        self.variance(length).map(T::sqrt)
    }
}
