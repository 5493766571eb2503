//! tgarender: render a textured OBJ mesh into a TGA image
//!
//! Usage: tgarender <mesh.obj> <diffuse texture> <output.tga> [config.ron]

use std::path::PathBuf;

use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use tgarender::config::{load_config, RenderConfig};
use tgarender::model::load_obj;
use tgarender::rasterizer::render_model;
use tgarender::{tga, VERSION};

/// Positional command-line arguments
struct Args {
    mesh: PathBuf,
    texture: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let program = args.next().unwrap_or_else(|| "tgarender".to_string());
        let positional: Vec<String> = args.collect();
        if positional.len() < 3 || positional.len() > 4 {
            bail!(
                "Usage: {} <mesh.obj> <texture> <output.tga> [config.ron]",
                program
            );
        }
        let mut it = positional.into_iter().map(PathBuf::from);
        Ok(Self {
            mesh: it.next().unwrap_or_default(),
            texture: it.next().unwrap_or_default(),
            output: it.next().unwrap_or_default(),
            config: it.next(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("tgarender v{}", VERSION);
    let args = Args::parse(std::env::args())?;

    let config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RenderConfig::default(),
    };

    let mut model = load_obj(&args.mesh)
        .with_context(|| format!("Failed to load mesh {}", args.mesh.display()))?;
    info!(
        "Loaded mesh: {} ({} vertices, {} faces)",
        args.mesh.display(),
        model.vertices.len(),
        model.faces.len()
    );

    // Rendering continues untextured (white) when the diffuse map is unusable.
    if let Err(e) = model.load_diffuse_map(&args.texture) {
        warn!(
            "Diffuse map {} not loaded: {}",
            args.texture.display(),
            e
        );
    }

    let progress = ProgressBar::new(model.faces.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} faces ({elapsed})")?
            .progress_chars("=> "),
    );
    let image = render_model(&model, &config, &progress).context("Render failed")?;
    progress.finish_and_clear();

    tga::write_file(&image, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Saved {}", args.output.display());

    Ok(())
}
