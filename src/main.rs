use std::path::{Path, PathBuf};

use activation_plots::activations::{random_batch, Mlp};
use activation_plots::config::{Backend, Config};
use activation_plots::distribution::DistributionOutput;
use activation_plots::{plot_distribution, render_interactive_surface, render_static_surface};
use anyhow::Result;

const DEFAULT_CONFIG: &str = "activation-plots.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = if Path::new(&path).exists() {
        Config::from_file(&path)?
    } else {
        log::warn!("No config at '{}', using defaults", path);
        Config::default()
    };
    config.log_summary();

    // Surface
    let field = config.surface.field;
    match config.surface.backend {
        Backend::Static => {
            let rendered = render_static_surface(&field, &config.surface.static_options()?)?;
            log::info!(
                "Rendered {}x{} static surface",
                rendered.figure.width,
                rendered.figure.height
            );
        }
        Backend::Interactive => {
            let options = config.surface.interactive_options();
            if render_interactive_surface(&field, &options)?.is_some() {
                log::info!("Built interactive surface for {}", field.name());
            }
        }
    }

    // Activations of every layer
    let network = &config.network;
    let mlp = Mlp::new(&network.layer_sizes, network.seed)?;
    let batch = random_batch(network.batch_size, mlp.input_size(), network.seed);
    let (_, trace) = mlp.forward(&batch)?;

    for (idx, (name, tensor)) in trace.iter().enumerate() {
        let mut options = config.distribution.clone();
        if let DistributionOutput::Save { prefix } = &config.distribution.output {
            let layer_prefix = format!("{}_{}_{}", prefix.display(), idx, name);
            options.output = DistributionOutput::Save {
                prefix: PathBuf::from(layer_prefix),
            };
        }
        let rendered = plot_distribution(tensor, &options)?;
        log::info!("{}: {} histogram(s)", name, rendered.len());
    }

    Ok(())
}
