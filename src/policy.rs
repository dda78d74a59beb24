use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::field::Field;
use crate::mobius::Mobius;
use crate::snapshot::{bracket, SnapshotMap};

/// Picks the branch taken at each dive.
///
/// The first call (with the identity accumulator) may return 0..=5, where
/// 3..=5 selects the inverse dive orientation; later calls return 0..=2.
pub trait Diver<T: Field> {
    fn choose_dive(&mut self, acc: &Mobius<T>) -> usize;
    fn depth(&self) -> usize;
}

/// Per-transform blend weights in [0, 1], one per transform of the key
/// gasket in effect at the requested logscale.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorParams {
    pub values: Vec<f64>,
}

pub trait Colorer {
    /// Called once, after the search, with the finished key-gasket map.
    fn process_snapshots(&mut self, snapshots: &SnapshotMap);
    fn color_at(&self, logscale: f64, dive_transform: usize) -> Result<ColorParams>;
}

pub struct RandomDiver {
    depth: usize,
    rng: StdRng,
}

impl RandomDiver {
    pub fn new(depth: usize, seed: u64) -> Self {
        RandomDiver {
            depth,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<T: Field> Diver<T> for RandomDiver {
    fn choose_dive(&mut self, acc: &Mobius<T>) -> usize {
        if acc.is_identity() {
            let inverse = self.rng.gen_bool(0.5) as usize;
            return inverse * 3 + self.rng.gen_range(0..3);
        }
        self.rng.gen_range(0..3)
    }

    fn depth(&self) -> usize {
        self.depth
    }
}

/// Replays an explicit branch list; its length is the depth.
#[derive(Clone, Debug)]
pub struct FixedDiver {
    path: Vec<usize>,
    next: usize,
}

impl FixedDiver {
    pub fn new(path: Vec<usize>) -> Self {
        FixedDiver { path, next: 0 }
    }
}

impl<T: Field> Diver<T> for FixedDiver {
    fn choose_dive(&mut self, _acc: &Mobius<T>) -> usize {
        let k = self.path.get(self.next).copied().unwrap_or(0);
        self.next += 1;
        k
    }

    fn depth(&self) -> usize {
        self.path.len()
    }
}

/// Fades the dive transform in over the first half of each key interval and
/// the remaining transforms over the second half.
#[derive(Clone, Debug, Default)]
pub struct CrossfadeColorer {
    snapshots: SnapshotMap,
}

impl CrossfadeColorer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Colorer for CrossfadeColorer {
    fn process_snapshots(&mut self, snapshots: &SnapshotMap) {
        self.snapshots = snapshots.clone();
    }

    fn color_at(&self, logscale: f64, dive_transform: usize) -> Result<ColorParams> {
        let ((lo, gasket), (hi, _)) =
            bracket(&self.snapshots, logscale).ok_or(Error::OutsideKeySpan(logscale))?;

        let f = (logscale - lo.0) / (hi.0 - lo.0);
        let dive_val = (2.0 * f).min(1.0);
        let other_val = (2.0 * f - 1.0).max(0.0);
        let values = (0..gasket.num_transforms())
            .map(|i| if i == dive_transform { dive_val } else { other_val })
            .collect();
        Ok(ColorParams { values })
    }
}
