use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::complex::Complex;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::mobius::Mobius;
use crate::policy::{ColorParams, Colorer, Diver};
use crate::scaler::Scaler;
use crate::searcher::{Searcher, DEFAULT_THREADS};
use crate::shape::GasketShape;
use crate::snapshot::{self, Logscale, SnapshotMap};

pub const DEFAULT_PRECISION_DIGITS: u32 = 10;

#[derive(Clone, Debug)]
pub struct ShapeParams<T> {
    pub r1: T,
    pub r2: T,
    pub phase: Complex<T>,
    pub mirror: bool,
}

#[derive(Clone, Debug)]
pub struct ScaleParams<T> {
    pub initial_logscale: T,
    pub step: T,
    pub num_steps: u32,
    pub precision_digits: u32,
}

/// Collects the zoom parameters; nothing is checked until `build`.
#[derive(Clone, Debug)]
pub struct ZoomBuilder<T> {
    shape: Option<ShapeParams<T>>,
    scales: Option<ScaleParams<T>>,
    image_size: Option<(u32, u32)>,
    threads: usize,
}

impl<T: Field> Default for ZoomBuilder<T> {
    fn default() -> Self {
        ZoomBuilder {
            shape: None,
            scales: None,
            image_size: None,
            threads: DEFAULT_THREADS,
        }
    }
}

impl<T: Field> ZoomBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shape(mut self, r1: T, r2: T, phase: Complex<T>, mirror: bool) -> Self {
        self.shape = Some(ShapeParams {
            r1,
            r2,
            phase,
            mirror,
        });
        self
    }

    pub fn with_scales(
        mut self,
        initial_logscale: T,
        step: T,
        num_steps: u32,
        precision_digits: u32,
    ) -> Self {
        self.scales = Some(ScaleParams {
            initial_logscale,
            step,
            num_steps,
            precision_digits,
        });
        self
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = Some((width, height));
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Validates the collected parameters, chooses the dive path and runs the
    /// scale search.
    pub fn build<D, C>(self, mut diver: D, mut colorer: C) -> Result<ZoomPath<T, C>>
    where
        D: Diver<T>,
        C: Colorer,
    {
        let shape_params = self.shape.ok_or(Error::MissingConfig("Shape"))?;
        let scales = self.scales.ok_or(Error::MissingConfig("Scales"))?;
        let (width, height) = self.image_size.ok_or(Error::MissingConfig("Aspect ratio"))?;
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!(
                "image size must be positive, got {width}x{height}"
            )));
        }
        let depth = diver.depth();
        if depth == 0 {
            return Err(Error::InvalidConfig("dive depth must be positive".into()));
        }

        let shape = Arc::new(GasketShape::new(
            shape_params.r1,
            shape_params.r2,
            shape_params.phase,
            shape_params.mirror,
        )?);
        let scaler = Arc::new(Scaler::new(
            scales.initial_logscale,
            scales.step,
            scales.num_steps,
            scales.precision_digits,
        )?);
        info!("gasket shape built, scaler has {} table entries", scaler.table_len());

        let mut acc = Mobius::identity();
        let first = diver.choose_dive(&acc);
        if first >= 6 {
            return Err(Error::InvalidConfig(format!("first dive index {first} not in 0..6")));
        }
        let inverse_dive = first >= 3;
        let arr = shape.dive_array(inverse_dive)?;
        let mut dive_indices = vec![first];
        acc = acc.compose(&arr[first % 3]);
        let mut zoom_transforms = vec![acc.clone()];
        for _ in 1..depth {
            let k = diver.choose_dive(&acc);
            if k >= 3 {
                return Err(Error::InvalidConfig(format!("dive index {k} not in 0..3")));
            }
            dive_indices.push(k);
            acc = acc.compose(&arr[k]);
            zoom_transforms.push(acc.clone());
        }
        info!("dive path {dive_indices:?} (inverse dive: {inverse_dive})");

        let mut center = Complex::zero();
        for p in shape.starting_points(inverse_dive) {
            center = center + acc.apply(&p)?;
        }
        let center = center.scale(&T::from_ratio(1, 3));
        let aspect_ratio = T::from_ratio(i64::from(width), i64::from(height));

        let mut searcher = Searcher::new(
            Arc::clone(&shape),
            Arc::clone(&scaler),
            center.clone(),
            inverse_dive,
            zoom_transforms,
            aspect_ratio,
            self.threads,
        )?;
        searcher.start()?;
        searcher.block()?;
        let snapshots = searcher.snapshots();
        let found_end = searcher.found_end();

        colorer.process_snapshots(&snapshots);
        let dive_index_map = snapshots
            .iter()
            .filter_map(|(key, g)| dive_indices.get(g.level + 1).map(|k| (*key, *k)))
            .collect();

        Ok(ZoomPath {
            shape,
            scaler,
            colorer,
            width,
            height,
            inverse_dive,
            center,
            dive_indices,
            snapshots,
            dive_index_map,
            found_end,
        })
    }
}

/// A finished zoom: the chosen dive path and the key gaskets along it.
pub struct ZoomPath<T, C> {
    shape: Arc<GasketShape<T>>,
    scaler: Arc<Scaler<T>>,
    colorer: C,
    width: u32,
    height: u32,
    inverse_dive: bool,
    center: Complex<T>,
    dive_indices: Vec<usize>,
    snapshots: SnapshotMap,
    dive_index_map: BTreeMap<Logscale, usize>,
    found_end: bool,
}

impl<T: Field, C: Colorer> ZoomPath<T, C> {
    pub fn snapshots(&self) -> &SnapshotMap {
        &self.snapshots
    }

    /// Branch chosen at each level; the first entry may be 3..=5.
    pub fn dive_indices(&self) -> &[usize] {
        &self.dive_indices
    }

    pub fn dive_index_map(&self) -> &BTreeMap<Logscale, usize> {
        &self.dive_index_map
    }

    /// Branch taken below the key gasket in effect at `logscale`, if that
    /// gasket is not the deepest level.
    pub fn dive_index_at(&self, logscale: f64) -> Option<usize> {
        let (key, _) = self.snapshots.range(..=Logscale(logscale)).next_back()?;
        self.dive_index_map.get(key).copied()
    }

    pub fn color_at(&self, logscale: f64) -> Result<ColorParams> {
        let dive = self
            .dive_index_at(logscale)
            .ok_or(Error::OutsideKeySpan(logscale))?;
        self.colorer.color_at(logscale, dive)
    }

    pub fn save_snapshots<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        snapshot::save_snapshots(&self.snapshots, path)
    }

    pub fn inverse_dive(&self) -> bool {
        self.inverse_dive
    }

    pub fn center(&self) -> &Complex<T> {
        &self.center
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn shape(&self) -> &GasketShape<T> {
        &self.shape
    }

    pub fn scaler(&self) -> &Scaler<T> {
        &self.scaler
    }

    pub fn colorer(&self) -> &C {
        &self.colorer
    }

    /// Whether the search stopped at the step ceiling rather than at the end
    /// of the dive path.
    pub fn found_end(&self) -> bool {
        self.found_end
    }
}
