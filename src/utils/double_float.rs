use core::ops::{Mul, Sub};

use compensated_summation::two_sum;
use num_traits::Float;

use crate::Kbn;

/// An unevaluated sum `hi + lo` with `|lo| <= ulp(hi) / 2`, carrying roughly
/// twice the precision of `T`.
///
/// Prefix totals are stored in this form so that differencing two large
/// prefixes, and forming `n·Σxy − Σx·Σy` from the result, keeps the digits a
/// plain float would cancel away.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DoubleFloat<T> {
    hi: T,
    lo: T,
}

impl<T: Float> DoubleFloat<T> {
    #[inline]
    fn normalized(hi: T, lo: T) -> Self {
        let (hi, lo) = two_sum(hi, lo);
        Self { hi, lo }
    }

    /// Captures the running total of an accumulator, compensation included
    pub fn from_accumulator(acc: &Kbn<T>) -> Self {
        Self::normalized(acc.sum, acc.comp)
    }

    /// Returns the exact product `a·b`
    pub fn product(a: T, b: T) -> Self {
        let hi = a * b;
        let lo = a.mul_add(b, -hi);
        Self { hi, lo }
    }

    /// Adds both words to `acc`
    pub fn add_to(self, acc: &mut Kbn<T>) {
        *acc += self.hi;
        *acc += self.lo;
    }

    /// Returns `self · k`
    pub fn scale(self, k: T) -> Self {
        self * Self { hi: k, lo: T::zero() }
    }

    /// Rounds to the nearest `T`
    #[inline]
    pub fn value(self) -> T {
        self.hi + self.lo
    }
}

impl<T: Float> Sub for DoubleFloat<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let (hi, lo) = two_sum(self.hi, -rhs.hi);
        Self::normalized(hi, lo + (self.lo - rhs.lo))
    }
}

impl<T: Float> Mul for DoubleFloat<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let Self { hi, lo } = Self::product(self.hi, rhs.hi);
        Self::normalized(hi, lo + (self.hi * rhs.lo + self.lo * rhs.hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_is_exact() {
        let a = 1.0 + f64::EPSILON;
        let p = DoubleFloat::product(a, a);
        // (1 + e)^2 = 1 + 2e + e^2, the e^2 term is lost by a plain multiply
        assert_eq!(p.hi, 1.0 + 2.0 * f64::EPSILON);
        assert_eq!(p.lo, f64::EPSILON * f64::EPSILON);
    }

    #[test]
    fn test_difference_keeps_low_word() {
        let mut acc = Kbn::default();
        acc += 1e16;
        acc += 1.0;
        let big = DoubleFloat::from_accumulator(&acc);
        assert_eq!(big.value(), 1e16);

        let base = DoubleFloat::from_accumulator(&{
            let mut acc = Kbn::default();
            acc += 1e16;
            acc
        });
        assert_eq!((big - base).value(), 1.0);
    }

    #[test]
    fn test_centered_moment_does_not_cancel() {
        // three values near 1e8 with spread 0.5, so n·Σx² − (Σx)² is tiny next to its terms
        let values = [1e8 + 0.25, 1e8 + 0.75, 1e8 + 0.5];
        let mut sum = Kbn::default();
        let mut sum_sq = Kbn::default();
        for &v in &values {
            sum += v;
            DoubleFloat::product(v, v).add_to(&mut sum_sq);
        }
        let s = DoubleFloat::from_accumulator(&sum);
        let ss = DoubleFloat::from_accumulator(&sum_sq);
        let m2 = (ss.scale(3.0) - s * s).value();
        // 3·Σ(x − mean)² = 3 · 0.125
        assert_eq!(m2, 0.375);
    }

    #[test]
    fn test_default_is_zero() {
        let z = DoubleFloat::<f64>::default();
        assert_eq!(z.value(), 0.0);
        assert_eq!((z - z).value(), 0.0);
    }
}
