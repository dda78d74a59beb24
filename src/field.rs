use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Num, One, Signed, ToPrimitive, Zero};

use crate::complex::Complex;
use crate::error::{Error, Result};

/// Exact rational field used for the precise gasket construction.
pub type Rational = BigRational;

/// Scalar field every geometric type is generic over.
///
/// Two implementations exist: `f64` and [`Rational`]. Arithmetic comes from
/// `num_traits::Num`; the methods here are the pieces that differ between an
/// exact and a floating field.
pub trait Field:
    Num + Signed + Clone + PartialOrd + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    fn from_ratio(numer: i64, denom: i64) -> Self;

    /// Parses `"p/q"` or a plain decimal such as `"-0.5"`.
    fn parse(text: &str) -> Result<Self>;

    fn square_root(&self) -> Result<Self>;

    fn complex_square_root(z: &Complex<Self>) -> Result<Complex<Self>>;

    /// Lossy conversion used at the rendering boundary.
    fn to_f64(&self) -> f64;

    /// False for NaN and infinities. Exact values are always finite.
    fn is_finite(&self) -> bool {
        true
    }

    /// Equality for validation checks. Exact fields compare exactly.
    fn near(&self, other: &Self) -> bool {
        self == other
    }

    /// e^self to within `prec`.
    fn exp_within(&self, prec: &Self) -> Result<Self> {
        exp_prec(self, prec)
    }
}

/// `numer / denom`, failing instead of panicking on a zero denominator.
pub fn checked_div<T: Field>(numer: T, denom: &T) -> Result<T> {
    if denom.is_zero() {
        return Err(Error::DivisionByZero);
    }
    Ok(numer / denom.clone())
}

/// 10^-digits in the given field.
pub fn precision<T: Field>(digits: u32) -> T {
    let ten = T::from_ratio(10, 1);
    (0..digits).fold(T::one(), |p, _| p / ten.clone())
}

/// e^x from the continued fraction
/// `e^x = 1 + 2x / (2 - x + x^2 / (6 + x^2 / (10 + ...)))`,
/// evaluated with the modified Lentz recurrence until two successive
/// convergents differ by at most `prec`.
pub fn exp_prec<T: Field>(x: &T, prec: &T) -> Result<T> {
    let two = T::from_ratio(2, 1);

    // The first convergent (2 + x) / (2 - x) has a zero term at |x| = 2.
    if (two.clone() - x.clone()).is_zero() || (two.clone() + x.clone()).is_zero() {
        let half = exp_prec(&(x.clone() / two), prec)?;
        return Ok(half.clone() * half);
    }

    let x2 = x.clone() * x.clone();
    let four = T::from_ratio(4, 1);
    let mut b = T::from_ratio(6, 1);

    let mut f = T::one();
    let mut c = two.clone() + x.clone();
    let mut d = checked_div(T::one(), &(two - x.clone()))?;
    let mut next = c.clone() * d.clone() * f.clone();

    while (next.clone() - f.clone()).abs() > *prec {
        f = next;
        c = b.clone() + checked_div(x2.clone(), &c)?;
        d = checked_div(T::one(), &(b.clone() + x2.clone() * d))?;
        b = b + four.clone();
        next = c.clone() * d.clone() * f.clone();
    }
    Ok(next)
}

/// Integer square root by Newton's method, only for perfect squares.
pub fn integer_square_root(s: &BigInt) -> Result<BigInt> {
    if s.is_negative() {
        return Err(Error::NegativeSquareRoot(s.to_string()));
    }
    if s.is_zero() || s.is_one() {
        return Ok(s.clone());
    }
    let two = BigInt::from(2);
    let mut x0: BigInt = s / &two;
    let mut x1: BigInt = (&x0 + s / &x0) / &two;
    while x1 < x0 {
        x0 = x1;
        x1 = (&x0 + s / &x0) / &two;
    }
    if &x0 * &x0 != *s {
        return Err(Error::NotPerfectSquare(s.to_string()));
    }
    Ok(x0)
}

impl Field for f64 {
    fn from_ratio(numer: i64, denom: i64) -> Self {
        numer as f64 / denom as f64
    }

    fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let invalid = || Error::InvalidNumber(text.to_string());
        let value = match text.split_once('/') {
            Some((n, d)) => {
                let n: f64 = n.trim().parse().map_err(|_| invalid())?;
                let d: f64 = d.trim().parse().map_err(|_| invalid())?;
                if d == 0.0 || !n.is_finite() || !d.is_finite() {
                    return Err(invalid());
                }
                n / d
            }
            None => text.parse().map_err(|_| invalid())?,
        };
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(value)
    }

    fn square_root(&self) -> Result<Self> {
        if *self < 0.0 {
            return Err(Error::NegativeSquareRoot(self.to_string()));
        }
        Ok(f64::sqrt(*self))
    }

    fn complex_square_root(z: &Complex<Self>) -> Result<Complex<Self>> {
        let root = num_complex::Complex64::new(z.re, z.im).sqrt();
        Ok(Complex::new(root.re, root.im))
    }

    fn to_f64(&self) -> f64 {
        *self
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }

    fn near(&self, other: &Self) -> bool {
        let scale = self.abs().max(other.abs()).max(1.0);
        (self - other).abs() <= 1e-12 * scale
    }

    fn exp_within(&self, _prec: &Self) -> Result<Self> {
        Ok(self.exp())
    }
}

impl Field for Rational {
    fn from_ratio(numer: i64, denom: i64) -> Self {
        BigRational::new(BigInt::from(numer), BigInt::from(denom))
    }

    fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let invalid = || Error::InvalidNumber(text.to_string());
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        // BigInt parsing takes its own sign; only the leading minus is allowed.
        if digits.contains(['+', '-']) {
            return Err(invalid());
        }
        if digits.contains('/') {
            let value = BigRational::from_str(digits).map_err(|_| invalid())?;
            return Ok(if negative { -value } else { value });
        }
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        let mantissa = format!("{whole}{frac}");
        let numer = BigInt::from_str(&mantissa).map_err(|_| invalid())?;
        let denom = num_traits::pow(BigInt::from(10), frac.len());
        let value = BigRational::new(numer, denom);
        Ok(if negative { -value } else { value })
    }

    fn square_root(&self) -> Result<Self> {
        // Ratio keeps itself reduced with a positive denominator.
        let numer = integer_square_root(self.numer())?;
        let denom = integer_square_root(self.denom())?;
        Ok(BigRational::new(numer, denom))
    }

    fn complex_square_root(z: &Complex<Self>) -> Result<Complex<Self>> {
        let two = Self::from_ratio(2, 1);
        let length = z.norm().square_root()?;
        let u = ((length.clone() + z.re.clone()) / two.clone()).square_root()?;
        let mut v = ((length - z.re.clone()) / two).square_root()?;
        if z.im.is_negative() {
            v = -v;
        }
        Ok(Complex::new(u, v))
    }

    fn to_f64(&self) -> f64 {
        ToPrimitive::to_f64(self).unwrap_or_else(|| {
            let numer = self.numer().to_f64().unwrap_or(f64::NAN);
            let denom = self.denom().to_f64().unwrap_or(f64::NAN);
            numer / denom
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64, d: i64) -> Rational {
        Rational::from_ratio(n, d)
    }

    #[test]
    fn integer_square_root_of_perfect_squares() {
        for n in [0i64, 1, 4, 9, 144, 1_000_000] {
            let root = integer_square_root(&BigInt::from(n)).unwrap();
            assert_eq!(&root * &root, BigInt::from(n));
        }
    }

    #[test]
    fn integer_square_root_rejects_non_squares() {
        assert!(matches!(
            integer_square_root(&BigInt::from(2)),
            Err(Error::NotPerfectSquare(_))
        ));
        assert!(matches!(
            integer_square_root(&BigInt::from(-4)),
            Err(Error::NegativeSquareRoot(_))
        ));
    }

    #[test]
    fn rational_square_root() {
        assert_eq!(q(9, 49).square_root().unwrap(), q(3, 7));
        assert_eq!(q(18, 8).square_root().unwrap(), q(3, 2));
        assert!(q(1, 2).square_root().is_err());
        assert!(q(-1, 4).square_root().is_err());
    }

    #[test]
    fn exact_complex_square_root() {
        // (2 - i)^2 = 3 - 4i
        let z = Complex::new(q(3, 1), q(-4, 1));
        let root = Rational::complex_square_root(&z).unwrap();
        assert_eq!(root, Complex::new(q(2, 1), q(-1, 1)));
        assert_eq!(root.clone() * root, z);
    }

    #[test]
    fn exact_complex_square_root_needs_square_norm() {
        let z = Complex::new(q(1, 1), q(1, 1));
        assert!(Rational::complex_square_root(&z).is_err());
    }

    #[test]
    fn float_complex_square_root() {
        let z = Complex::new(-4.0, 0.0);
        let root = f64::complex_square_root(&z).unwrap();
        assert!((root.re).abs() < 1e-12);
        assert!((root.im - 2.0).abs() < 1e-12);
    }

    #[test]
    fn exp_prec_matches_native_exponential() {
        let prec = precision::<Rational>(15);
        for (n, d) in [(0, 1), (1, 3), (-1, 3), (1, 1), (2, 1), (-2, 1), (7, 2), (-50, 150)] {
            let value = Field::to_f64(&exp_prec(&q(n, d), &prec).unwrap());
            let expected = (n as f64 / d as f64).exp();
            assert!(
                (value - expected).abs() < 1e-12 * expected.max(1.0),
                "exp({n}/{d}) = {value}, expected {expected}"
            );
        }
    }

    #[test]
    fn parse_rationals_and_decimals() {
        assert_eq!(Rational::parse("6/11").unwrap(), q(6, 11));
        assert_eq!(Rational::parse("-0.25").unwrap(), q(-1, 4));
        assert_eq!(Rational::parse("3").unwrap(), q(3, 1));
        assert!(Rational::parse("abc").is_err());
        assert!((f64::parse("3/7").unwrap() - 3.0 / 7.0).abs() < 1e-15);
        assert!(f64::parse("1/0").is_err());
    }

    #[test]
    fn float_parse_rejects_non_finite_values() {
        for text in ["NaN", "nan", "inf", "-inf", "infinity", "1e400", "NaN/2", "1/inf"] {
            assert!(matches!(f64::parse(text), Err(Error::InvalidNumber(_))), "{text}");
        }
        assert_eq!(f64::parse("-0.5").unwrap(), -0.5);
    }

    #[test]
    fn rational_parse_takes_a_single_leading_minus() {
        for text in ["--1", "-+1", "+-1", "--1/2", "1/-2", "-1/+2", "1.-5"] {
            assert!(matches!(Rational::parse(text), Err(Error::InvalidNumber(_))), "{text}");
        }
        assert_eq!(Rational::parse("-3/4").unwrap(), q(-3, 4));
        assert_eq!(Rational::parse("-1").unwrap(), q(-1, 1));
        assert!(Rational::parse("1/0").is_err());
    }

    #[test]
    fn precision_is_a_negative_power_of_ten() {
        assert_eq!(precision::<Rational>(3), q(1, 1000));
    }
}
