//! Suppression of numerical zeroes left behind by floating-point round-off.
//!
//! Real and imaginary parts are always judged independently: a component whose
//! magnitude is strictly below the tolerance is replaced with an exact `0.0`,
//! and every other component passes through untouched. Applying a chop twice
//! with the same tolerance is a no-op, and a tolerance `<= 0` never changes
//! anything. Non-finite components are left as they are.

use ndarray as nd;
use num_complex::Complex64 as C64;

/// Default tolerance for [`chop`].
pub const CHOP_TOL: f64 = 1e-15;

/// Replace near-zero components of a value with exact zeros, returning the
/// result.
pub trait Chop: Sized {
    fn chop(self, tol: f64) -> Self;
}

/// In-place counterpart to [`Chop`] for arrays and array views.
pub trait ChopMut {
    fn chop_mut(&mut self, tol: f64);
}

fn chop_re(x: f64, tol: f64) -> f64 {
    if x.abs() < tol { 0.0 } else { x }
}

impl Chop for f64 {
    fn chop(self, tol: f64) -> Self { chop_re(self, tol) }
}

impl Chop for C64 {
    fn chop(self, tol: f64) -> Self {
        let (re, im) = (self.re, self.im);
        C64::new(chop_re(re, tol), chop_re(im, tol))
    }
}

impl<A, S, D> ChopMut for nd::ArrayBase<S, D>
where
    A: Chop + Copy,
    S: nd::DataMut<Elem = A>,
    D: nd::Dimension,
{
    fn chop_mut(&mut self, tol: f64) {
        self.mapv_inplace(|a| a.chop(tol));
    }
}

impl<A, D> Chop for nd::Array<A, D>
where
    A: Chop + Copy,
    D: nd::Dimension,
{
    fn chop(mut self, tol: f64) -> Self {
        self.chop_mut(tol);
        self
    }
}

/// Apply [`Chop::chop`] with the default tolerance [`CHOP_TOL`].
pub fn chop<T: Chop>(x: T) -> T { x.chop(CHOP_TOL) }
