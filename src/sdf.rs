use crate::complex::Complex;
use crate::field::Field;

/// Circle or line as the region a(x^2 + y^2) + bx + cy + d < 0.
///
/// a > 0 is the disc interior, a < 0 the exterior of a disc, a = 0 a
/// half-plane.
#[derive(Clone, Debug, PartialEq)]
pub struct ImplicitCircle<T> {
    a: T,
    b: T,
    c: T,
    d: T,
}

impl<T: Field> ImplicitCircle<T> {
    pub fn new(a: T, b: T, c: T, d: T) -> Self {
        ImplicitCircle { a, b, c, d }
    }

    /// Value of the quadratic form at z; zero on the boundary.
    pub fn value_at(&self, z: &Complex<T>) -> T {
        let x = z.re.clone();
        let y = z.im.clone();
        self.a.clone() * (x.clone() * x.clone() + y.clone() * y.clone())
            + self.b.clone() * x
            + self.c.clone() * y
            + self.d.clone()
    }

    pub fn inside(&self, z: &Complex<T>) -> bool {
        self.value_at(z) < T::zero()
    }

    /// Whether the axis-aligned rectangle centred at `p` lies inside.
    pub fn rect_inside(&self, p: &Complex<T>, w: &T, h: &T) -> bool {
        if self.a < T::zero() && self.circ_rect_collision(p, w, h) {
            return false;
        }
        let half = T::from_ratio(1, 2);
        let hw = w.clone() * half.clone();
        let hh = h.clone() * half;
        let corner = |sx: &T, sy: &T| {
            Complex::new(p.re.clone() + sx.clone(), p.im.clone() + sy.clone())
        };
        let (nw, nh) = (-hw.clone(), -hh.clone());
        self.inside(&corner(&nw, &nh))
            && self.inside(&corner(&hw, &nh))
            && self.inside(&corner(&nw, &hh))
            && self.inside(&corner(&hw, &hh))
    }

    /// Floating test of whether the rectangle overlaps the disc bounded by
    /// this circle. Meaningless for a = 0.
    pub fn circ_rect_collision(&self, p: &Complex<T>, w: &T, h: &T) -> bool {
        let a = self.a.to_f64();
        let xc = -self.b.to_f64() / a / 2.0;
        let yc = -self.c.to_f64() / a / 2.0;
        let r2 = xc * xc + yc * yc - self.d.to_f64() / a;
        let r = r2.max(0.0).sqrt();
        let hw = w.to_f64() / 2.0;
        let hh = h.to_f64() / 2.0;
        let dx = (xc - p.re.to_f64()).abs();
        let dy = (yc - p.im.to_f64()).abs();
        if dx > hw + r || dy > hh + r {
            false
        } else if dx < hw || dy < hh {
            true
        } else {
            (dx - hw) * (dx - hw) + (dy - hh) * (dy - hh) < r * r
        }
    }

    /// Swaps inside and outside.
    pub fn flip(&self) -> Self {
        ImplicitCircle::new(-self.a.clone(), -self.b.clone(), -self.c.clone(), -self.d.clone())
    }

    /// The circle, or line for collinear points, through p, q and r.
    pub fn from_points(p: &Complex<T>, q: &Complex<T>, r: &Complex<T>) -> Self {
        let one = T::one();
        let (xp, yp) = (p.re.clone(), p.im.clone());
        let (xq, yq) = (q.re.clone(), q.im.clone());
        let (xr, yr) = (r.re.clone(), r.im.clone());
        let (np, nq, nr) = (p.norm(), q.norm(), r.norm());

        let a = det33([
            [xp.clone(), yp.clone(), one.clone()],
            [xq.clone(), yq.clone(), one.clone()],
            [xr.clone(), yr.clone(), one.clone()],
        ]);
        let b = -det33([
            [np.clone(), yp.clone(), one.clone()],
            [nq.clone(), yq.clone(), one.clone()],
            [nr.clone(), yr.clone(), one.clone()],
        ]);
        let c = det33([
            [np.clone(), xp.clone(), one.clone()],
            [nq.clone(), xq.clone(), one.clone()],
            [nr.clone(), xr.clone(), one],
        ]);
        let d = -det33([[np, xp, yp], [nq, xq, yq], [nr, xr, yr]]);
        ImplicitCircle::new(a, b, c, d)
    }

    pub fn coefficients(&self) -> (&T, &T, &T, &T) {
        (&self.a, &self.b, &self.c, &self.d)
    }
}

fn det33<T: Field>(m: [[T; 3]; 3]) -> T {
    let e = |i: usize, j: usize| m[i][j].clone();
    e(0, 0) * e(1, 1) * e(2, 2) + e(0, 1) * e(1, 2) * e(2, 0) + e(0, 2) * e(1, 0) * e(2, 1)
        - e(0, 0) * e(1, 2) * e(2, 1)
        - e(0, 1) * e(1, 0) * e(2, 2)
        - e(0, 2) * e(1, 1) * e(2, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Rational;
    use num_traits::Zero;

    fn cq(x: (i64, i64), y: (i64, i64)) -> Complex<Rational> {
        Complex::new(Rational::from_ratio(x.0, x.1), Rational::from_ratio(y.0, y.1))
    }

    fn unit_circle() -> ImplicitCircle<f64> {
        // Counter-clockwise points give the disc interior.
        ImplicitCircle::from_points(
            &Complex::new(1.0, 0.0),
            &Complex::new(0.0, 1.0),
            &Complex::new(-1.0, 0.0),
        )
    }

    #[test]
    fn exact_points_lie_on_their_circle() {
        let pts = [cq((3, 5), (4, 5)), cq((-1, 1), (0, 1)), cq((7, 3), (-2, 9))];
        let circle = ImplicitCircle::from_points(&pts[0], &pts[1], &pts[2]);
        for p in &pts {
            assert!(circle.value_at(p).is_zero());
        }
    }

    #[test]
    fn collinear_points_give_a_line() {
        let circle = ImplicitCircle::from_points(
            &cq((0, 1), (0, 1)),
            &cq((1, 1), (1, 1)),
            &cq((2, 1), (2, 1)),
        );
        assert!(circle.coefficients().0.is_zero());
        assert!(circle.value_at(&cq((5, 1), (5, 1))).is_zero());
    }

    #[test]
    fn orientation_and_flip() {
        let circle = unit_circle();
        assert!(*circle.coefficients().0 > 0.0);
        assert!(circle.inside(&Complex::new(0.1, 0.2)));
        assert!(!circle.inside(&Complex::new(2.0, 0.0)));
        let outside = circle.flip();
        assert!(!outside.inside(&Complex::new(0.1, 0.2)));
        assert!(outside.inside(&Complex::new(2.0, 0.0)));
    }

    #[test]
    fn rect_inside_disc() {
        let circle = unit_circle();
        let c = Complex::new(0.0, 0.0);
        assert!(circle.rect_inside(&c, &1.0, &1.0));
        assert!(!circle.rect_inside(&c, &1.5, &1.5));
    }

    #[test]
    fn rect_near_excluded_disc_is_rejected() {
        // The corners of a 3x3 square around the origin are all outside the
        // unit disc but the square swallows it.
        let outside = unit_circle().flip();
        let c = Complex::new(0.0, 0.0);
        assert!(!outside.rect_inside(&c, &3.0, &3.0));
        assert!(outside.circ_rect_collision(&c, &3.0, &3.0));
        let far = Complex::new(5.0, 0.0);
        assert!(outside.rect_inside(&far, &1.0, &1.0));
    }

    #[test]
    fn rect_inside_is_monotone() {
        let circles = [unit_circle(), unit_circle().flip()];
        let centers = [Complex::new(0.2, -0.1), Complex::new(1.6, 0.4)];
        for circle in &circles {
            for p in &centers {
                let sizes: Vec<f64> = (1..60).map(|k| k as f64 * 0.05).collect();
                let inside: Vec<bool> = sizes
                    .iter()
                    .map(|s| circle.rect_inside(p, &(s * 16.0 / 9.0), s))
                    .collect();
                // Once a size fails, every larger size fails too.
                if let Some(first_fail) = inside.iter().position(|ok| !ok) {
                    assert!(inside[first_fail..].iter().all(|ok| !ok));
                }
            }
        }
    }
}
