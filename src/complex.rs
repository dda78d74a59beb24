use std::ops::{Add, Mul, Neg, Sub};

use bincode::{Decode, Encode};

use crate::error::{Error, Result};
use crate::field::Field;

/// Complex number over a [`Field`]. Equality is exact, component-wise.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T: Field> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Complex { re, im }
    }

    pub fn real(re: T) -> Self {
        Complex::new(re, T::zero())
    }

    pub fn zero() -> Self {
        Complex::new(T::zero(), T::zero())
    }

    pub fn one() -> Self {
        Complex::new(T::one(), T::zero())
    }

    pub fn i() -> Self {
        Complex::new(T::zero(), T::one())
    }

    pub fn is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }

    pub fn norm(&self) -> T {
        self.re.clone() * self.re.clone() + self.im.clone() * self.im.clone()
    }

    pub fn conj(&self) -> Self {
        Complex::new(self.re.clone(), -self.im.clone())
    }

    pub fn scale(&self, k: &T) -> Self {
        Complex::new(k.clone() * self.re.clone(), k.clone() * self.im.clone())
    }

    /// Division as multiplication by the conjugate over the norm.
    pub fn div(&self, other: &Self) -> Result<Self> {
        let norm = other.norm();
        if norm.is_zero() {
            return Err(Error::DivisionByZero);
        }
        let inv = T::one() / norm;
        Ok((self.clone() * other.conj()).scale(&inv))
    }

    pub fn sqrt(&self) -> Result<Self> {
        T::complex_square_root(self)
    }

    pub fn to_f64(&self) -> Complex<f64> {
        Complex::new(self.re.to_f64(), self.im.to_f64())
    }
}

impl Complex<f64> {
    pub fn abs(&self) -> f64 {
        self.re.hypot(self.im)
    }
}

impl<T: Field> Add for Complex<T> {
    type Output = Complex<T>;

    fn add(self, other: Complex<T>) -> Complex<T> {
        Complex::new(self.re + other.re, self.im + other.im)
    }
}

impl<T: Field> Sub for Complex<T> {
    type Output = Complex<T>;

    fn sub(self, other: Complex<T>) -> Complex<T> {
        Complex::new(self.re - other.re, self.im - other.im)
    }
}

impl<T: Field> Mul for Complex<T> {
    type Output = Complex<T>;

    fn mul(self, other: Complex<T>) -> Complex<T> {
        Complex::new(
            self.re.clone() * other.re.clone() - self.im.clone() * other.im.clone(),
            self.re * other.im + self.im * other.re,
        )
    }
}

impl<T: Field> Neg for Complex<T> {
    type Output = Complex<T>;

    fn neg(self) -> Complex<T> {
        Complex::new(-self.re, -self.im)
    }
}

impl<T: Field> From<T> for Complex<T> {
    fn from(re: T) -> Self {
        Complex::real(re)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Rational;

    fn q(n: i64, d: i64) -> Rational {
        Rational::from_ratio(n, d)
    }

    #[test]
    fn exact_division_round_trips() {
        let a = Complex::new(q(3, 2), q(-7, 5));
        let b = Complex::new(q(2, 9), q(4, 1));
        let quotient = a.div(&b).unwrap();
        assert_eq!(quotient * b, a);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let a = Complex::new(1.0, 2.0);
        assert!(matches!(a.div(&Complex::zero()), Err(Error::DivisionByZero)));
    }

    #[test]
    fn norm_and_conjugate() {
        let z = Complex::new(q(3, 1), q(4, 1));
        assert_eq!(z.norm(), q(25, 1));
        assert_eq!(z.clone() * z.conj(), Complex::real(q(25, 1)));
    }

    #[test]
    fn i_squared_is_minus_one() {
        let i = Complex::<Rational>::i();
        assert_eq!(i.clone() * i, -Complex::one());
    }
}
