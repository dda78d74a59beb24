use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::Result;
use crate::field::Field;
use crate::policy::RandomDiver;
use crate::searcher::DEFAULT_THREADS;
use crate::zoom::{ZoomBuilder, DEFAULT_PRECISION_DIGITS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    pub re: String,
    pub im: String,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        PhaseConfig {
            re: "1".into(),
            im: "0".into(),
        }
    }
}

/// One zoom, as read from a JSON file. Values that must stay exact are
/// strings like "6/11" or "-0.5".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub r1: String,
    pub r2: String,
    pub phase: PhaseConfig,
    pub mirror: bool,
    pub initial_logscale: String,
    pub step: String,
    pub num_steps: u32,
    pub precision_digits: u32,
    pub width: u32,
    pub height: u32,
    pub threads: usize,
    pub depth: usize,
    pub seed: u64,
    pub exact: bool,
    pub output: Option<PathBuf>,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        ZoomConfig {
            r1: "6/11".into(),
            r2: "3/7".into(),
            phase: PhaseConfig::default(),
            mirror: false,
            initial_logscale: "-50/150".into(),
            step: "1/150".into(),
            num_steps: 22050,
            precision_digits: DEFAULT_PRECISION_DIGITS,
            width: 480,
            height: 270,
            threads: DEFAULT_THREADS,
            depth: 5,
            seed: 314159,
            exact: false,
            output: None,
        }
    }
}

impl ZoomConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// A builder with every section filled in, values parsed in field `T`.
    pub fn builder<T: Field>(&self) -> Result<ZoomBuilder<T>> {
        let phase = Complex::new(T::parse(&self.phase.re)?, T::parse(&self.phase.im)?);
        Ok(ZoomBuilder::new()
            .with_shape(T::parse(&self.r1)?, T::parse(&self.r2)?, phase, self.mirror)
            .with_scales(
                T::parse(&self.initial_logscale)?,
                T::parse(&self.step)?,
                self.num_steps,
                self.precision_digits,
            )
            .with_image_size(self.width, self.height)
            .with_threads(self.threads))
    }

    pub fn diver(&self) -> RandomDiver {
        RandomDiver::new(self.depth, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::field::Rational;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ZoomConfig =
            serde_json::from_str(r#"{ "r1": "1/2", "phase": { "im": "0" }, "exact": true }"#)
                .unwrap();
        assert_eq!(config.r1, "1/2");
        assert_eq!(config.r2, "3/7");
        assert_eq!(config.phase, PhaseConfig::default());
        assert!(config.exact);
        assert_eq!(config.num_steps, 22050);
        assert_eq!(config.output, None);
    }

    #[test]
    fn builder_parses_exact_values() {
        let config = ZoomConfig::default();
        assert!(config.builder::<Rational>().is_ok());
        assert!(config.builder::<f64>().is_ok());
    }

    #[test]
    fn bad_numbers_are_reported() {
        let config = ZoomConfig {
            step: "one/150".into(),
            ..ZoomConfig::default()
        };
        assert!(matches!(config.builder::<f64>(), Err(Error::InvalidNumber(_))));
    }

    #[test]
    fn non_finite_radius_stops_the_build() {
        let config = ZoomConfig {
            r1: "NaN".into(),
            depth: 2,
            ..ZoomConfig::default()
        };
        assert!(matches!(config.builder::<f64>(), Err(Error::InvalidNumber(_))));

        // Values that bypass parsing are caught by the shape itself.
        let err = ZoomBuilder::new()
            .with_shape(f64::NAN, 3.0 / 7.0, Complex::one(), false)
            .with_scales(-1.0 / 3.0, 1.0 / 150.0, 100, 10)
            .with_image_size(480, 270)
            .build(config.diver(), crate::policy::CrossfadeColorer::new())
            .err();
        assert!(matches!(err, Some(Error::InvalidShape(_))));
    }

    #[test]
    fn config_file_round_trip() {
        let config = ZoomConfig {
            depth: 12,
            output: Some(PathBuf::from("keys.bin")),
            ..ZoomConfig::default()
        };
        let path = std::env::temp_dir().join(format!("gasket-config-{}.json", std::process::id()));
        config.save(&path).unwrap();
        let loaded = ZoomConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
