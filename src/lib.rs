pub mod error;
pub mod field;
pub mod complex;
pub mod mobius;
pub mod scaler;
pub mod sdf;
pub mod shape;
pub mod snapshot;
pub mod searcher;
pub mod policy;
pub mod zoom;
pub mod config;

pub use error::{Error, Result};
pub use field::{Field, Rational};
pub use complex::Complex;
pub use mobius::{Affine, Decomposition, Mobius};
pub use scaler::Scaler;
pub use sdf::ImplicitCircle;
pub use shape::GasketShape;
pub use snapshot::{
    KeyGasket, Logscale, SnapshotMap, bracket, load_snapshots, merge_snapshot, save_snapshots
};
pub use searcher::{Searcher, TaskOutcome, DEFAULT_THREADS};
pub use policy::{ColorParams, Colorer, CrossfadeColorer, Diver, FixedDiver, RandomDiver};
pub use zoom::{ScaleParams, ShapeParams, ZoomBuilder, ZoomPath, DEFAULT_PRECISION_DIGITS};
pub use config::{PhaseConfig, ZoomConfig};
