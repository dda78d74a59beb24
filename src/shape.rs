use crate::complex::Complex;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::mobius::Mobius;

/// The two generators of a fixed Apollonian packing inside the unit circle,
/// together with the three tangency points of its base triple.
#[derive(Clone, Debug)]
pub struct GasketShape<T> {
    pa: Complex<T>,
    pb: Complex<T>,
    pc: Complex<T>,
    tr: Mobius<T>,
    rot: Mobius<T>,
}

impl<T: Field> GasketShape<T> {
    /// `r1` and `r2` are the radii of the two largest circles inside the unit
    /// circle, `phase` the unit direction of the first one's tangency point.
    pub fn new(r1: T, r2: T, phase: Complex<T>, mirror: bool) -> Result<Self> {
        let one = T::one();
        let two = T::from_ratio(2, 1);
        if !r1.is_finite() || !r2.is_finite() {
            return Err(Error::InvalidShape("Radii must be finite numbers.".into()));
        }
        if r2 > r1 {
            return Err(Error::InvalidShape(
                "First radius parameter should be greater than or equal to the second.".into(),
            ));
        }
        if r1.clone() + r2.clone() > one {
            return Err(Error::InvalidShape("Radii sum cannot be larger than 1.".into()));
        }
        if r2 <= T::zero() {
            return Err(Error::InvalidShape("All radii should be positive.".into()));
        }
        if !phase.norm().near(&one) {
            return Err(Error::InvalidShape("Phase must have unit norm.".into()));
        }

        // Descartes circle theorem with the outer circle at curvature -1.
        let a = -one.clone();
        let b = one.clone() / r1.clone();
        let c = one.clone() / r2.clone();
        let s1 = a.clone() + b.clone() + c.clone();
        let s2 = a.clone() * b.clone() + b * c.clone() + c.clone() * a;
        let e = two.clone() * s2.square_root()?;
        let mut d = s1.clone() - e.clone();
        if d <= T::zero() {
            d = s1 + e;
        }
        if d < c {
            return Err(Error::RadiiNotLargest);
        }

        // Angle between the two tangency directions, from the triangle of
        // centres with sides r1 + r2, 1 - r1, 1 - r2.
        let l1 = r1.clone() + r2.clone();
        let l2 = one.clone() - r1.clone();
        let l3 = one.clone() - r2.clone();
        let cosx = (l2.clone() * l2.clone() + l3.clone() * l3.clone() - l1.clone() * l1.clone())
            / (two * l2 * l3);
        let sinx = (one.clone() - cosx.clone() * cosx.clone()).square_root()?;

        let p1 = phase;
        let p2 = p1.clone() * Complex::new(cosx, sinx);

        let v1 = p1.scale(&(one.clone() - r1.clone()));
        let v2 = p2.scale(&(one - r2.clone()));
        let v3 = (v1.scale(&r2) + v2.scale(&r1)).scale(&(T::one() / l1));

        let canonical = |x: i64| Complex::real(T::from_ratio(x, 1));
        let mut m = Mobius::from_points_to_points(
            &canonical(1),
            &canonical(-1),
            &canonical(0),
            &p1,
            &p2,
            &v3,
        )?;
        if mirror {
            m = m.flip();
        }

        let half_plane_dive = Mobius::new(
            Complex::one(),
            Complex::zero(),
            Complex::new(T::zero(), T::from_ratio(2, 1)),
            Complex::one(),
        )?;
        let tr = half_plane_dive.conjugate(&m)?;
        let rot = Mobius::from_points_to_points(
            &canonical(0),
            &canonical(1),
            &canonical(-1),
            &canonical(1),
            &canonical(-1),
            &canonical(0),
        )?
        .conjugate(&m)?;

        Ok(GasketShape {
            pa: m.apply(&canonical(-1))?,
            pb: m.apply(&canonical(1))?,
            pc: m.apply(&canonical(0))?,
            tr,
            rot,
        })
    }

    pub fn starting_points(&self, inverse_dive: bool) -> [Complex<T>; 3] {
        if inverse_dive {
            [self.pa.clone(), self.pc.clone(), self.pb.clone()]
        } else {
            [self.pa.clone(), self.pb.clone(), self.pc.clone()]
        }
    }

    /// The three one-level descents, indexed by branch.
    pub fn dive_array(&self, inverse_dive: bool) -> Result<[Mobius<T>; 3]> {
        let base = if inverse_dive {
            self.tr.inverse()?
        } else {
            self.tr.clone()
        };
        let by_rot = base.conjugate(&self.rot)?;
        let by_rot_inv = base.conjugate(&self.rot.inverse()?)?;
        Ok([base, by_rot, by_rot_inv])
    }

    /// Both dive directions placed in the viewport `scale * (z - center)`.
    pub fn double_sided_transforms(
        &self,
        scale: &T,
        center: &Complex<T>,
    ) -> Result<Vec<Mobius<f64>>> {
        let s = Mobius::scaling(Complex::real(scale.clone()))?
            .compose(&Mobius::translation(-center.clone()));
        let mut transforms = Vec::with_capacity(6);
        for inverse_dive in [false, true] {
            for t in self.dive_array(inverse_dive)? {
                transforms.push(t.conjugate(&s)?.to_f64());
            }
        }
        Ok(transforms)
    }

    pub fn tr(&self) -> &Mobius<T> {
        &self.tr
    }

    pub fn rot(&self) -> &Mobius<T> {
        &self.rot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Rational;

    fn q(n: i64, d: i64) -> Rational {
        Rational::from_ratio(n, d)
    }

    fn sample_shape() -> GasketShape<Rational> {
        GasketShape::new(q(6, 11), q(3, 7), Complex::one(), false).unwrap()
    }

    #[test]
    fn exact_shape_places_tangency_points() {
        let shape = sample_shape();
        let [pa, pb, pc] = shape.starting_points(false);
        assert_eq!(pb, Complex::one());
        // cos = -4/5, sin = 3/5 for these radii.
        assert_eq!(pa, Complex::new(q(-4, 5), q(3, 5)));
        assert_eq!(pa.norm(), q(1, 1));
        assert!(pc.norm() < q(1, 1));
    }

    #[test]
    fn inverse_starting_points_swap_last_two() {
        let shape = sample_shape();
        let [a, b, c] = shape.starting_points(false);
        assert_eq!(shape.starting_points(true), [a, c, b]);
    }

    #[test]
    fn generators_fix_and_cycle_the_base_triple() {
        let shape = sample_shape();
        let [pa, pb, pc] = shape.starting_points(false);
        // The descent fixes the interior tangency point.
        assert_eq!(shape.tr().apply(&pc).unwrap(), pc);
        // The rotation has order three on the boundary points.
        let rot = shape.rot();
        let once = rot.apply(&pc).unwrap();
        assert_eq!(once, pb);
        assert_eq!(rot.apply(&once).unwrap(), pa);
        assert_eq!(rot.apply(&pa).unwrap(), pc);
    }

    #[test]
    fn dive_arrays_are_mutually_inverse() {
        let shape = sample_shape();
        let forward = shape.dive_array(false).unwrap();
        let inverse = shape.dive_array(true).unwrap();
        for (f, i) in forward.iter().zip(inverse.iter()) {
            assert!(f.compose(i).is_identity());
        }
    }

    #[test]
    fn double_sided_has_six_transforms() {
        let shape = sample_shape();
        let transforms = shape
            .double_sided_transforms(&q(2, 1), &Complex::new(q(1, 10), q(0, 1)))
            .unwrap();
        assert_eq!(transforms.len(), 6);
    }

    #[test]
    fn mirror_conjugates_the_shape() {
        let (r1, r2) = (6.0 / 11.0, 3.0 / 7.0);
        let plain = GasketShape::new(r1, r2, Complex::new(0.6, 0.8), false).unwrap();
        let mirrored = GasketShape::new(r1, r2, Complex::new(0.6, 0.8), true).unwrap();
        let [pa, _, _] = plain.starting_points(false);
        let [ma, _, _] = mirrored.starting_points(false);
        assert!((ma.re - pa.re).abs() < 1e-12);
        assert!((ma.im + pa.im).abs() < 1e-12);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let one = Complex::one();
        assert!(matches!(
            GasketShape::new(0.3, 0.5, one.clone(), false),
            Err(Error::InvalidShape(_))
        ));
        assert!(matches!(
            GasketShape::new(0.7, 0.5, one.clone(), false),
            Err(Error::InvalidShape(_))
        ));
        assert!(matches!(
            GasketShape::new(0.5, 0.0, one.clone(), false),
            Err(Error::InvalidShape(_))
        ));
        assert!(matches!(
            GasketShape::new(0.5, 0.3, Complex::new(1.0, 1.0), false),
            Err(Error::InvalidShape(_))
        ));
        assert!(matches!(
            GasketShape::new(0.25, 0.25, one, false),
            Err(Error::RadiiNotLargest)
        ));
    }

    #[test]
    fn zero_and_non_finite_radii_are_invalid_shapes() {
        let one = Complex::one();
        for (r1, r2) in [(0.5, 0.0), (0.5, -0.0), (f64::NAN, 0.3), (0.5, f64::NAN), (f64::INFINITY, 0.3)] {
            assert!(
                matches!(GasketShape::new(r1, r2, one.clone(), false), Err(Error::InvalidShape(_))),
                "r1 = {r1}, r2 = {r2}"
            );
        }
        let nan_phase = Complex::new(f64::NAN, 0.0);
        assert!(matches!(
            GasketShape::new(6.0 / 11.0, 3.0 / 7.0, nan_phase, false),
            Err(Error::InvalidShape(_))
        ));
        assert!(matches!(
            GasketShape::new(q(1, 2), q(0, 1), Complex::one(), false),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn exact_shape_needs_rational_square_roots() {
        // 1/4, 1/4 leads to sqrt(8) in the Descartes relation.
        let result = GasketShape::new(q(1, 4), q(1, 4), Complex::one(), false);
        assert!(matches!(result, Err(Error::NotPerfectSquare(_))));
    }
}
