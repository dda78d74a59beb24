use std::env;

use anyhow::{Context, Result};
use log::info;

use gasket_zoom::{CrossfadeColorer, Field, Rational, ZoomConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1) {
        Some(path) => ZoomConfig::load(&path)
            .with_context(|| format!("Failed to load zoom config from {path}"))?,
        None => {
            info!("no config file given, using the built-in zoom");
            ZoomConfig::default()
        }
    };

    if config.exact {
        run::<Rational>(&config)
    } else {
        run::<f64>(&config)
    }
}

fn run<T: Field>(config: &ZoomConfig) -> Result<()> {
    let zoom = config
        .builder::<T>()
        .context("Invalid zoom parameters")?
        .build(config.diver(), CrossfadeColorer::new())
        .context("Zoom search failed")?;

    println!("dive path: {:?}", zoom.dive_indices());
    println!("{:>14}  {:>5}  {:>10}  {:>4}", "logscale", "level", "transforms", "dive");
    for (key, gasket) in zoom.snapshots() {
        let dive = zoom
            .dive_index_map()
            .get(key)
            .map_or("-".to_string(), |k| k.to_string());
        println!(
            "{:>14.6}  {:>5}  {:>10}  {:>4}",
            key.0,
            gasket.level,
            gasket.num_transforms(),
            dive
        );
    }
    if !zoom.found_end() {
        println!("(dive path ended before the zoom reached its last step)");
    }

    if let Some(path) = &config.output {
        zoom.save_snapshots(path)
            .with_context(|| format!("Failed to save key gaskets to {}", path.display()))?;
        println!("key gaskets written to {}", path.display());
    }
    Ok(())
}
