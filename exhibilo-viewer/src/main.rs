/// Exhibilo Viewer - terminal preview for 3D models
///
/// Loads .glb, .gltf, .obj and .stl files or URLs, centers and scales them,
/// and renders them as ASCII art.
/// Controls:
///   - WASD / Arrow Keys: Rotate the model
///   - E/R: Roll rotation
///   - Space: Toggle auto rotation
///   - F: Toggle wireframe
///   - O: Toggle orthographic projection
///   - B: Toggle background
///   - N/P: Next / previous model
///   - Q/ESC: Quit
use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use exhibilo_core::Decoders;
use exhibilo_viewer::asset::collect_sources;
use exhibilo_viewer::{
    AppOptions, AssetLoader, AssetReference, LoadSession, Resolver, TerminalApp, ViewerConfig,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "exhibilo-viewer", version, about = "Terminal preview for .glb, .gltf, .obj and .stl models")]
struct Cli {
    /// Model files or URLs. Files take priority over URLs.
    sources: Vec<String>,

    /// Page URL whose `model` query parameter names a model to load
    #[arg(long)]
    page_url: Option<String>,

    /// TOML config file
    #[arg(long, env = "EXHIBILO_VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Origin that relative model paths are resolved against
    #[arg(long)]
    origin: Option<String>,

    /// Directory holding the Draco decoding tool
    #[arg(long, env = "EXHIBILO_DRACO_PATH")]
    draco_path: Option<PathBuf>,

    /// Load every source, print a report and exit without opening the viewer
    #[arg(long)]
    headless: bool,

    /// Write logs to this file while the viewer is open
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let mut config = ViewerConfig::load(cli.config.as_deref())?;
    if let Some(origin) = &cli.origin {
        config.origin = origin.clone();
    }
    if let Some(path) = &cli.draco_path {
        config.draco_decoder_path = Some(path.clone());
    }

    let decoders = Decoders::from_config(&config.decoder_config())
        .context("failed to set up the Draco decoder")?;
    let loader = AssetLoader::new(Resolver::new(config.origin_url()?), decoders);
    let sources = collect_sources(&cli.sources, cli.page_url.as_deref())
        .context("failed to read model file")?;
    debug!(count = sources.len(), "collected model sources");

    let runtime = tokio::runtime::Runtime::new()?;
    if cli.headless {
        return runtime.block_on(report(&loader, sources));
    }

    let (session, updates) = LoadSession::new(runtime.handle().clone(), loader);
    let mut app = TerminalApp::new(session, updates, sources, AppOptions::from(&config))?;
    app.run()?;
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if cli.headless {
        builder.with_writer(std::io::stderr).init();
    } else if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
    // otherwise logging stays off: it would draw over the terminal view
    Ok(())
}

async fn report(loader: &AssetLoader, sources: Vec<AssetReference>) -> Result<()> {
    if sources.is_empty() {
        bail!("no model given: pass a file, a URL, or --page-url with ?model=");
    }

    let mut failures = 0;
    for reference in sources {
        let name = reference.name().to_owned();
        match loader
            .load(reference, |phase| debug!(%name, phase = phase.label(), "load phase"))
            .await
        {
            Ok(model) => {
                let size = model.normalization.original_size;
                println!(
                    "{name}: {} | {} meshes | {} triangles | original size {:.3} x {:.3} x {:.3} | scale {:.4} | extent {:.3} | floor {:.3}",
                    model.format(),
                    model.asset.mesh_count(),
                    model.asset.triangle_count(),
                    size.x,
                    size.y,
                    size.z,
                    model.normalization.scale,
                    model.extent(),
                    model.floor_height(),
                );
            }
            Err(err) => {
                failures += 1;
                println!("{name}: error: {err}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} model(s) failed to load");
    }
    Ok(())
}
