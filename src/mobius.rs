use bincode::{Decode, Encode};

use crate::complex::Complex;
use crate::error::{Error, Result};
use crate::field::Field;

/// Below this |c| a floating transform is treated as affine when decomposing.
const AFFINE_EPS: f64 = 1e-10;

/// Fractional linear map z -> (az + b) / (cz + d).
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Mobius<T> {
    pub a: Complex<T>,
    pub b: Complex<T>,
    pub c: Complex<T>,
    pub d: Complex<T>,
}

impl<T: Field> Mobius<T> {
    pub fn new(a: Complex<T>, b: Complex<T>, c: Complex<T>, d: Complex<T>) -> Result<Self> {
        let m = Mobius { a, b, c, d };
        if m.determinant().is_zero() {
            return Err(Error::SingularTransform);
        }
        Ok(m)
    }

    // Only for results of group operations on already non-singular maps.
    fn from_parts(a: Complex<T>, b: Complex<T>, c: Complex<T>, d: Complex<T>) -> Self {
        Mobius { a, b, c, d }
    }

    pub fn identity() -> Self {
        Mobius::from_parts(Complex::one(), Complex::zero(), Complex::zero(), Complex::one())
    }

    pub fn is_identity(&self) -> bool {
        *self == Mobius::identity()
    }

    pub fn determinant(&self) -> Complex<T> {
        self.a.clone() * self.d.clone() - self.b.clone() * self.c.clone()
    }

    pub fn trace(&self) -> Complex<T> {
        self.a.clone() + self.d.clone()
    }

    pub fn apply(&self, z: &Complex<T>) -> Result<Complex<T>> {
        let denom = self.c.clone() * z.clone() + self.d.clone();
        if denom.is_zero() {
            return Err(Error::PoleEvaluation);
        }
        (self.a.clone() * z.clone() + self.b.clone()).div(&denom)
    }

    /// Image of the point at infinity, a / c. Affine maps fix infinity.
    pub fn apply_infinity(&self) -> Result<Complex<T>> {
        if self.c.is_zero() {
            return Err(Error::PoleEvaluation);
        }
        self.a.div(&self.c)
    }

    pub fn inverse(&self) -> Result<Self> {
        let sc = Complex::one().div(&self.determinant())?;
        Ok(Mobius::from_parts(
            sc.clone() * self.d.clone(),
            -(sc.clone() * self.b.clone()),
            -(sc.clone() * self.c.clone()),
            sc * self.a.clone(),
        ))
    }

    /// `self ∘ n`: applies `n` first.
    pub fn compose(&self, n: &Mobius<T>) -> Self {
        let (a, b, c, d) = (&self.a, &self.b, &self.c, &self.d);
        Mobius::from_parts(
            a.clone() * n.a.clone() + b.clone() * n.c.clone(),
            a.clone() * n.b.clone() + b.clone() * n.d.clone(),
            c.clone() * n.a.clone() + d.clone() * n.c.clone(),
            c.clone() * n.b.clone() + d.clone() * n.d.clone(),
        )
    }

    /// `s ∘ self ∘ s⁻¹`
    pub fn conjugate(&self, s: &Mobius<T>) -> Result<Self> {
        Ok(s.compose(self).compose(&s.inverse()?))
    }

    /// Coefficient-wise complex conjugate, mirroring orientation.
    pub fn flip(&self) -> Self {
        Mobius::from_parts(self.a.conj(), self.b.conj(), self.c.conj(), self.d.conj())
    }

    /// Rescales to unit determinant. Needs the field's complex square root of
    /// the determinant, which exact fields rarely have.
    pub fn normalize(&self) -> Result<Self> {
        let sdet = self.determinant().sqrt()?;
        Ok(Mobius::from_parts(
            self.a.div(&sdet)?,
            self.b.div(&sdet)?,
            self.c.div(&sdet)?,
            self.d.div(&sdet)?,
        ))
    }

    /// Finite fixed points: two for loxodromic/elliptic maps, one for
    /// parabolic ones. Affine maps also fix infinity, which is not listed.
    pub fn fixed_points(&self) -> Result<Vec<Complex<T>>> {
        let two = Complex::real(T::from_ratio(2, 1));
        let four = Complex::real(T::from_ratio(4, 1));
        let s = self.a.clone() - self.d.clone();
        if self.c.is_zero() {
            if s.is_zero() {
                return Ok(Vec::new());
            }
            return Ok(vec![self.b.div(&(self.d.clone() - self.a.clone()))?]);
        }
        let disc = s.clone() * s.clone() + four * self.b.clone() * self.c.clone();
        let e = disc.sqrt()?;
        let denom = two * self.c.clone();
        let p = (s.clone() + e.clone()).div(&denom)?;
        if e.is_zero() {
            return Ok(vec![p]);
        }
        let q = (s - e).div(&denom)?;
        Ok(vec![p, q])
    }

    pub fn to_f64(&self) -> Mobius<f64> {
        Mobius::from_parts(self.a.to_f64(), self.b.to_f64(), self.c.to_f64(), self.d.to_f64())
    }

    pub fn scaling(k: Complex<T>) -> Result<Self> {
        Mobius::new(k, Complex::zero(), Complex::zero(), Complex::one())
    }

    pub fn translation(t: Complex<T>) -> Self {
        Mobius::from_parts(Complex::one(), t, Complex::zero(), Complex::one())
    }

    /// The map sending p -> 0, q -> 1, r -> infinity.
    pub fn from_points(p: &Complex<T>, q: &Complex<T>, r: &Complex<T>) -> Result<Self> {
        let qr = q.clone() - r.clone();
        let qp = q.clone() - p.clone();
        Mobius::new(
            qr.clone(),
            -(p.clone() * qr),
            qp.clone(),
            -(r.clone() * qp),
        )
    }

    /// The map sending p1 -> p2, q1 -> q2, r1 -> r2.
    pub fn from_points_to_points(
        p1: &Complex<T>,
        q1: &Complex<T>,
        r1: &Complex<T>,
        p2: &Complex<T>,
        q2: &Complex<T>,
        r2: &Complex<T>,
    ) -> Result<Self> {
        let to_target = Mobius::from_points(p2, q2, r2)?.inverse()?;
        Ok(to_target.compose(&Mobius::from_points(p1, q1, r1)?))
    }
}

/// Affine frame: image of the origin plus images of the two unit vectors
/// relative to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Affine {
    pub origin: Complex<f64>,
    pub x: Complex<f64>,
    pub y: Complex<f64>,
}

/// Split of a floating transform into pieces an IFS renderer understands.
#[derive(Clone, Debug, PartialEq)]
pub enum Decomposition {
    Linear(Affine),
    /// `post ∘ spherical ∘ pre`, where spherical is w -> w / |w|^2 and
    /// `pre` already includes the reflection that turns it into 1 / w.
    Spherical { pre: Affine, post: Affine },
}

impl Mobius<f64> {
    pub fn decompose(&self) -> Result<Decomposition> {
        let zero = Complex::zero();
        let one = Complex::one();
        let i = Complex::i();

        if self.c.abs() <= AFFINE_EPS {
            let origin = self.apply(&zero)?;
            return Ok(Decomposition::Linear(Affine {
                x: self.apply(&one)? - origin.clone(),
                y: self.apply(&i)? - origin.clone(),
                origin,
            }));
        }

        let pre_map = Mobius::translation(self.d.div(&self.c)?);
        let pre_origin = pre_map.apply(&zero)?.conj();
        let pre = Affine {
            x: pre_map.apply(&one)?.conj() - pre_origin.clone(),
            y: pre_map.apply(&i)?.conj() - pre_origin.clone(),
            origin: pre_origin,
        };

        // (az + b) / (cz + d) = a/c - det / (c^2 (z + d/c))
        let c2 = self.c.clone() * self.c.clone();
        let post_scale = -self.determinant().div(&c2)?;
        let post_map =
            Mobius::translation(self.apply_infinity()?).compose(&Mobius::scaling(post_scale)?);
        let post_origin = post_map.apply(&zero)?;
        let post = Affine {
            x: post_map.apply(&one)? - post_origin.clone(),
            y: post_map.apply(&i)? - post_origin.clone(),
            origin: post_origin,
        };
        Ok(Decomposition::Spherical { pre, post })
    }
}
