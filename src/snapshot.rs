use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::ops::Bound;
use std::path::Path;

use bincode::{Decode, Encode};

use crate::error::Result;
use crate::mobius::Mobius;

/// Map key: the logscale at which a key gasket takes over. Ordered by
/// `f64::total_cmp` so it can key a `BTreeMap`.
#[derive(Clone, Copy, Debug, Encode, Decode)]
pub struct Logscale(pub f64);

impl PartialEq for Logscale {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Logscale {}

impl PartialOrd for Logscale {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Logscale {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// IFS transforms generating the gasket as seen from one zoom level.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct KeyGasket {
    pub level: usize,
    transforms: Vec<Mobius<f64>>,
}

impl KeyGasket {
    pub fn new(transforms: Vec<Mobius<f64>>, level: usize) -> Self {
        KeyGasket { level, transforms }
    }

    pub fn transforms(&self) -> &[Mobius<f64>] {
        &self.transforms
    }

    pub fn num_transforms(&self) -> usize {
        self.transforms.len()
    }
}

pub type SnapshotMap = BTreeMap<Logscale, KeyGasket>;

/// Inserts `gasket` unless the key already holds one of equal or higher
/// level. Returns whether the map changed.
pub fn merge_snapshot(map: &mut SnapshotMap, key: Logscale, gasket: KeyGasket) -> bool {
    match map.get(&key) {
        Some(existing) if existing.level >= gasket.level => false,
        _ => {
            map.insert(key, gasket);
            true
        }
    }
}

/// The key gaskets surrounding `logscale`: the last key at or below it and
/// the first key above it.
pub fn bracket(
    map: &SnapshotMap,
    logscale: f64,
) -> Option<((Logscale, &KeyGasket), (Logscale, &KeyGasket))> {
    let at = Logscale(logscale);
    let (lo_key, lo) = map.range(..=at).next_back()?;
    let (hi_key, hi) = map.range((Bound::Excluded(at), Bound::Unbounded)).next()?;
    Some(((*lo_key, lo), (*hi_key, hi)))
}

pub fn save_snapshots<P: AsRef<Path>>(map: &SnapshotMap, path: P) -> Result<()> {
    let cfg = bincode::config::standard();
    let encoded = bincode::encode_to_vec(map, cfg)?;
    fs::write(path, encoded)?;
    log::info!("saved {} key gaskets", map.len());
    Ok(())
}

pub fn load_snapshots<P: AsRef<Path>>(path: P) -> Result<SnapshotMap> {
    let data = fs::read(path)?;
    let cfg = bincode::config::standard();
    let (map, _len): (SnapshotMap, usize) = bincode::decode_from_slice(&data, cfg)?;
    log::info!("loaded {} key gaskets", map.len());
    Ok(map)
}
