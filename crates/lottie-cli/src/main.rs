//! # Lottie Inspect
//!
//! Loads a Lottie scene and reports what the engine builds from it.
//!
//! ## Commands
//! - `info`: Scene size, frame range, layers and markers
//! - `frames`: Per-frame draw count and bounds over a frame range
//! - `keypaths`: Key paths a pattern resolves to

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lottie_core::composition::supported_layers;
use lottie_core::{KeyPath, LottieAsset, LottiePlayer, PlayerConfig, RecordingSurface};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lottie-inspect")]
#[command(about = "Inspect how Lottie scenes are built and drawn")]
#[command(version)]
struct Cli {
    /// Log engine decisions (skipped shapes, merge fallbacks, cache misses)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fail on unsupported shape items instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    /// Player settings as JSON; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show scene metadata
    Info {
        /// Path to the Lottie JSON file
        file: PathBuf,
    },

    /// Draw a range of frames and summarize each
    Frames {
        /// Path to the Lottie JSON file
        file: PathBuf,

        /// First frame (defaults to the in point)
        #[arg(long)]
        from: Option<f32>,

        /// Last frame, exclusive (defaults to the out point)
        #[arg(long)]
        to: Option<f32>,

        /// Frame increment
        #[arg(long, default_value = "1")]
        step: f32,

        /// Start at this marker instead of `--from`
        #[arg(long)]
        marker: Option<String>,

        /// Render partially transparent groups through offscreen layers
        #[arg(long)]
        layer_opacity: bool,
    },

    /// List the key paths a pattern resolves to
    Keypaths {
        /// Path to the Lottie JSON file
        file: PathBuf,

        /// Dot-separated pattern; `*` matches one level, `**` any number
        #[arg(default_value = "**")]
        pattern: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "lottie_core=debug,lottie_inspect=debug"
    } else {
        "lottie_core=warn,lottie_inspect=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            PlayerConfig::from_json_str(&json)
                .with_context(|| format!("invalid player config {}", path.display()))?
        }
        None => PlayerConfig::default(),
    };
    config.strict |= cli.strict;

    match cli.command {
        Commands::Info { file } => cmd_info(&file, config),
        Commands::Frames {
            file,
            from,
            to,
            step,
            marker,
            layer_opacity,
        } => {
            config.apply_opacity_to_layers |= layer_opacity;
            cmd_frames(&file, config, from, to, step, marker.as_deref())
        }
        Commands::Keypaths { file, pattern } => cmd_keypaths(&file, config, &pattern),
    }
}

fn load_asset(path: &Path) -> Result<Arc<LottieAsset>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let asset = LottieAsset::from_json_str(&json)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Arc::new(asset))
}

fn load_player(asset: &Arc<LottieAsset>, config: PlayerConfig) -> Result<LottiePlayer> {
    let mut player = LottiePlayer::with_config(config);
    player
        .load(Arc::clone(asset))
        .context("failed to build the scene")?;
    Ok(player)
}

fn cmd_info(file: &Path, config: PlayerConfig) -> Result<()> {
    let asset = load_asset(file)?;
    let model = &asset.model;
    println!("{}", model.nm.as_deref().unwrap_or("(unnamed)"));
    println!("==========================");
    println!("  size:      {} x {}", asset.width, asset.height);
    println!(
        "  frames:    {} .. {} at {} fps ({:.2}s)",
        model.ip,
        model.op,
        asset.frame_rate,
        if asset.frame_rate > 0.0 {
            asset.duration_frames / asset.frame_rate
        } else {
            0.0
        }
    );
    println!(
        "  layers:    {} ({} supported)",
        model.layers.len(),
        supported_layers(model)
    );

    let player = load_player(&asset, config)?;
    if let Some(composition) = player.composition() {
        println!("  nodes:     {}", composition.graph().len());
        for layer in composition.layers() {
            let (ip, op) = layer.frame_range();
            let kind = if layer.root().is_some() { "shape" } else { "null" };
            println!(
                "  • {} [{kind}] frames {ip} .. {op}, {} nodes",
                layer.name,
                layer.node_count()
            );
        }
    }

    if !model.markers.is_empty() {
        println!("  markers:");
        for marker in &model.markers {
            println!(
                "  • {} at {} for {}",
                marker.cm.as_deref().unwrap_or("(unnamed)"),
                marker.tm,
                marker.dr
            );
        }
    }
    Ok(())
}

/// Frames from `from` up to, not including, `to`.
fn frame_steps(from: f32, to: f32, step: f32) -> Result<Vec<f32>> {
    if step <= 0.0 {
        bail!("step must be positive, got {step}");
    }
    let count = ((to - from) / step).ceil().max(0.0) as usize;
    Ok((0..count).map(|i| from + i as f32 * step).collect())
}

fn cmd_frames(
    file: &Path,
    config: PlayerConfig,
    from: Option<f32>,
    to: Option<f32>,
    step: f32,
    marker: Option<&str>,
) -> Result<()> {
    let asset = load_asset(file)?;
    let from = match marker {
        Some(name) => asset
            .marker_frame(name)
            .with_context(|| format!("no marker named {name:?}"))?,
        None => from.unwrap_or(asset.model.ip),
    };
    let to = to.unwrap_or(asset.model.op);
    let frames = frame_steps(from, to, step)?;
    tracing::info!(from, to, step, count = frames.len(), "drawing frames");

    let mut player = load_player(&asset, config)?;
    let mut surface = RecordingSurface::new();
    for frame in frames {
        player.set_frame(frame);
        surface.clear();
        player.draw(&mut surface);
        let bounds = match player.composition().and_then(|c| c.bounds()) {
            Some(r) => format!(
                "({:.1}, {:.1}) .. ({:.1}, {:.1})",
                r.x0, r.y0, r.x1, r.y1
            ),
            None => "empty".to_string(),
        };
        println!(
            "frame {frame:>7.2}  draws {:>4}  commands {:>5}  bounds {bounds}",
            surface.draw_count(),
            surface.commands.len()
        );
    }
    Ok(())
}

fn cmd_keypaths(file: &Path, config: PlayerConfig, pattern: &str) -> Result<()> {
    let asset = load_asset(file)?;
    let player = load_player(&asset, config)?;
    let key_path =
        KeyPath::parse(pattern).with_context(|| format!("invalid key path {pattern:?}"))?;
    let resolved = player.resolve_key_path(&key_path)?;
    println!("Key paths matching '{pattern}':");
    println!("================================");
    for r in &resolved {
        println!("  • {}", r.path);
    }
    println!("\nTotal: {} matches", resolved.len());
    Ok(())
}
