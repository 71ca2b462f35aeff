use alloc::vec::Vec;

use core::ops::Sub;

use num_traits::Float;

use crate::Kbn;
use crate::utils::DoubleFloat;

/// Running paired totals after one observation
#[derive(Debug, Clone, Copy, Default)]
struct Sums<T> {
    x: DoubleFloat<T>,
    y: DoubleFloat<T>,
    xx: DoubleFloat<T>,
    yy: DoubleFloat<T>,
    xy: DoubleFloat<T>,
}

impl<T: Float> Sub for Sums<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            xx: self.xx - rhs.xx,
            yy: self.yy - rhs.yy,
            xy: self.xy - rhs.xy,
        }
    }
}

/// Compensated accumulators behind the prefix log
#[derive(Debug, Clone)]
struct Accumulators<T> {
    x: Kbn<T>,
    y: Kbn<T>,
    xx: Kbn<T>,
    yy: Kbn<T>,
    xy: Kbn<T>,
}

impl<T: Float> Accumulators<T> {
    fn new() -> Self {
        Self {
            x: Kbn::default(),
            y: Kbn::default(),
            xx: Kbn::default(),
            yy: Kbn::default(),
            xy: Kbn::default(),
        }
    }
}

/// # Retrospective Co-movement Over a Paired Series
///
/// The paired counterpart of [`CumulativeWindow`](crate::CumulativeWindow):
/// records the running sums of `x`, `y`, `x²`, `y²` and `xy` after every
/// observation so that covariance, Pearson correlation, R² and beta over the
/// last `length` pairs can be read for any `length` in O(1).
///
/// Prefixes keep their compensation term and the co-moments
/// `n·Σxy − Σx·Σy` are formed at doubled precision, so a short lookback over
/// price-level data stays accurate however long the series grows.
///
/// Lookbacks longer than the series shrink to the pairs seen so far.
/// Correlation-type statistics are `None` when they are undefined (fewer
/// than two pairs or a series with zero variance); callers that need a number
/// map that to zero.
#[derive(Debug, Clone)]
pub struct PairedCumulativeWindow<T> {
    acc: Accumulators<T>,
    /// Prefix totals, one per observation
    prefix: Vec<Sums<T>>,
    /// Delta Degrees of Freedom
    ddof: bool,
}

impl<T> Default for PairedCumulativeWindow<T>
where
    T: Default + Clone + Float,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PairedCumulativeWindow<T>
where
    T: Default + Clone + Float,
{
    /// Creates an empty `PairedCumulativeWindow`
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty `PairedCumulativeWindow` with room for `capacity`
    /// pairs before reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        tracing::trace!(capacity, "paired cumulative window created");
        Self {
            acc: Accumulators::new(),
            prefix: Vec::with_capacity(capacity),
            ddof: false,
        }
    }

    /// Number of pairs seen
    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    /// Returns true before the first pair
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Returns the Delta Degrees of Freedom
    pub const fn ddof(&self) -> bool {
        self.ddof
    }

    /// Sets the Delta Degrees of Freedom, `true` selects sample covariance.
    /// Correlation and R² do not depend on it.
    pub const fn set_ddof(&mut self, ddof: bool) -> &mut Self {
        self.ddof = ddof;
        self
    }

    /// Forgets every pair, keeping the allocated log
    pub fn reset(&mut self) -> &mut Self {
        tracing::trace!(observations = self.prefix.len(), "paired cumulative window reset");
        self.acc = Accumulators::new();
        self.prefix.clear();
        self
    }

    /// Appends a pair
    ///
    /// # Arguments
    ///
    /// * `(x, y)` - The next pair of the series
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The window, for chaining queries
    pub fn next(&mut self, (x, y): (T, T)) -> &mut Self {
        self.acc.x += x;
        self.acc.y += y;
        DoubleFloat::product(x, x).add_to(&mut self.acc.xx);
        DoubleFloat::product(y, y).add_to(&mut self.acc.yy);
        DoubleFloat::product(x, y).add_to(&mut self.acc.xy);
        self.prefix.push(Sums {
            x: DoubleFloat::from_accumulator(&self.acc.x),
            y: DoubleFloat::from_accumulator(&self.acc.y),
            xx: DoubleFloat::from_accumulator(&self.acc.xx),
            yy: DoubleFloat::from_accumulator(&self.acc.yy),
            xy: DoubleFloat::from_accumulator(&self.acc.xy),
        });
        self
    }

    /// Number of pairs covered by `length` and the totals over them
    fn span(&self, length: usize) -> (usize, Sums<T>) {
        assert!(length > 0, "length must be greater than zero");

        let n = self.prefix.len();
        let covered = length.min(n);
        if covered == 0 {
            return (0, Sums::default());
        }

        let end = self.prefix[n - 1];
        if covered == n {
            (covered, end)
        } else {
            (covered, end - self.prefix[n - 1 - covered])
        }
    }

    /// Centered co-moments over the span: `(n, n·Σxy − ΣxΣy, n·Σx² − (Σx)², n·Σy² − (Σy)²)`
    fn comoments(&self, length: usize) -> Option<(T, T, T, T)> {
        let (covered, s) = self.span(length);
        if covered == 0 {
            return None;
        }
        let n = T::from(covered)?;
        Some((
            n,
            (s.xy.scale(n) - s.x * s.y).value(),
            (s.xx.scale(n) - s.x * s.x).value(),
            (s.yy.scale(n) - s.y * s.y).value(),
        ))
    }

    /// Returns the per-component sums of the last `length` pairs
    ///
    /// # Panics
    ///
    /// If `length` is zero
    pub fn sum(&self, length: usize) -> (T, T) {
        let (_, s) = self.span(length);
        (s.x.value(), s.y.value())
    }

    /// Returns the per-component means of the last `length` pairs
    ///
    /// # Returns
    ///
    /// * `Option<(T, T)>` - The means, or `None` before the first pair
    pub fn mean(&self, length: usize) -> Option<(T, T)> {
        let (covered, s) = self.span(length);
        if covered == 0 {
            return None;
        }
        let n = T::from(covered)?;
        Some((s.x.value() / n, s.y.value() / n))
    }

    /// Returns the covariance of the last `length` pairs
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The covariance, or `None` if no pair is covered
    ///   (fewer than two with ddof)
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::PairedCumulativeWindow;
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut window = PairedCumulativeWindow::<f64>::new();
    /// for pair in [(2.0, 1.0), (4.0, 3.0), (6.0, 2.0), (8.0, 5.0), (10.0, 7.0)] {
    ///     window.next(pair);
    /// }
    /// assert_approx_eq!(window.cov(3).unwrap(), 3.3333, 1e-3);
    /// window.set_ddof(true);
    /// assert_approx_eq!(window.cov(3).unwrap(), 5.0);
    /// ```
    pub fn cov(&self, length: usize) -> Option<T> {
        let (n, sxy, _, _) = self.comoments(length)?;
        if self.ddof {
            if n < T::one() + T::one() {
                return None;
            }
            Some(sxy / (n * (n - T::one())))
        } else {
            Some(sxy / (n * n))
        }
    }

    /// Returns Pearson's correlation coefficient of the last `length` pairs
    ///
    /// `r = (nΣxy − ΣxΣy) / sqrt((nΣx² − (Σx)²)(nΣy² − (Σy)²))`, clamped to
    /// `[-1, 1]` against rounding.
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The correlation, or `None` if `length` or the number of
    ///   covered pairs is below two, or either series has zero variance
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::PairedCumulativeWindow;
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut window = PairedCumulativeWindow::<f64>::new();
    /// for (x, y) in [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0)] {
    ///     window.next((x, y));
    /// }
    /// assert_approx_eq!(window.corr(4).unwrap(), 1.0);
    /// assert_eq!(window.corr(1), None);
    /// ```
    pub fn corr(&self, length: usize) -> Option<T> {
        assert!(length > 0, "length must be greater than zero");
        if length < 2 {
            return None;
        }

        let (n, sxy, sxx, syy) = self.comoments(length)?;
        let denom = sxx * syy;
        if n < T::one() + T::one() || !(denom > T::zero()) {
            return None;
        }

        Some((sxy / denom.sqrt()).max(-T::one()).min(T::one()))
    }

    /// Returns the coefficient of determination R², the square of
    /// [`corr`](Self::corr)
    pub fn r_squared(&self, length: usize) -> Option<T> {
        self.corr(length).map(|r| r * r)
    }

    /// Returns the beta of `x` against `y` over the last `length` pairs:
    /// `cov(x, y) / var(y)`
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The beta, or `None` if `y` has zero variance
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_windows::PairedCumulativeWindow;
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut window = PairedCumulativeWindow::<f64>::new();
    /// for y in [0.01, -0.02, 0.015, 0.005] {
    ///     window.next((1.5 * y + 0.001, y));
    /// }
    /// assert_approx_eq!(window.beta(4).unwrap(), 1.5);
    /// ```
    pub fn beta(&self, length: usize) -> Option<T> {
        let (_, sxy, _, syy) = self.comoments(length)?;
        if !(syy > T::zero()) {
            return None;
        }
        Some(sxy / syy)
    }
}
