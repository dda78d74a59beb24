use crate::error::{Error, Result};
use crate::field::{self, Field};

/// Table-driven evaluation of exp(initial_logscale + step * n).
///
/// `lookup[i]` holds exp(step * 2^i), so any n up to `num_steps` is a product
/// of the entries selected by its binary digits.
#[derive(Clone, Debug)]
pub struct Scaler<T> {
    pub initial_logscale: T,
    pub step: T,
    pub num_steps: u32,
    base: T,
    lookup: Vec<T>,
}

impl<T: Field> Scaler<T> {
    pub fn new(initial_logscale: T, step: T, num_steps: u32, precision_digits: u32) -> Result<Self> {
        if num_steps == 0 {
            return Err(Error::InvalidConfig("step count must be positive".into()));
        }
        if !initial_logscale.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "initial logscale must be finite, got {initial_logscale}"
            )));
        }
        if !(step.is_finite() && step > T::zero()) {
            return Err(Error::InvalidConfig(format!("step must be positive, got {step}")));
        }
        let prec: T = field::precision(precision_digits);
        let base = initial_logscale.exp_within(&prec)?;

        let table_len = (u32::BITS - num_steps.leading_zeros()) as usize;
        let mut lookup = Vec::with_capacity(table_len);
        let mut multiple = step.clone();
        for _ in 0..table_len {
            lookup.push(multiple.exp_within(&prec)?);
            multiple = multiple.clone() + multiple;
        }

        Ok(Scaler {
            initial_logscale,
            step,
            num_steps,
            base,
            lookup,
        })
    }

    pub fn lookup_exp(&self, n: u32) -> Result<T> {
        if n > self.num_steps {
            return Err(Error::StepOutOfRange {
                step: n,
                max: self.num_steps,
            });
        }
        let mut ans = self.base.clone();
        let mut rest = n;
        while rest > 0 {
            ans = ans * self.lookup[rest.trailing_zeros() as usize].clone();
            rest &= rest - 1;
        }
        Ok(ans)
    }

    /// initial_logscale + step * n, exactly in the field.
    pub fn logscale(&self, n: u32) -> T {
        self.initial_logscale.clone() + T::from_ratio(n as i64, 1) * self.step.clone()
    }

    pub fn table_len(&self) -> usize {
        self.lookup.len()
    }
}
