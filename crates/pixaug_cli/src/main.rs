//! pixaug CLI: preview augmentations, infer shapes and pack images.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ndarray::Array4;
use pixaug_core::backend::NdArray;
use pixaug_core::{alloc_blob, ImageTensor, Phase, Seed};
use pixaug_transforms::{DataTransformer, Frame, TransformConfig};

#[derive(Parser)]
#[command(name = "pixaug")]
#[command(author, version)]
#[command(about = "Seeded image augmentation and channel-major packing")]
#[command(long_about = "pixaug: randomized augmentation and packing of 8-bit images.

EXAMPLES:
  # Write eight augmented variants of an image
  pixaug preview --config aug.json --input cat.png --output-dir out --count 8

  # Print the packed shape of a batch
  pixaug shape --config aug.json --input a.png --input b.png

  # Pack one image and print per-channel statistics
  pixaug pack --config aug.json --input cat.png --phase test

CONFIGURATION:
  A JSON object with any of: scale, mirror, crop_size, mean_file,
  mean_value, force_color, force_gray, apply_probability, smooth_filtering,
  max_smooth, max_rotation_angle, contrast_brightness_adjustment,
  min_contrast, max_contrast, max_brightness_shift, max_color_shift,
  min_side, min_side_min, min_side_max, affine_min_scale, affine_max_scale,
  random_erasing_low, random_erasing_high, random_erasing_ratio,
  debug_params. Missing fields take their defaults.")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write augmented variants of one image (no crop, no mirror)
    Preview {
        /// Transformer configuration (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Source image
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Directory for the PNG outputs
        #[arg(long, default_value = "./preview", value_name = "DIR")]
        output_dir: PathBuf,

        /// Number of variants
        #[arg(long, default_value = "4", value_name = "N")]
        count: usize,

        /// Phase: train or test
        #[arg(long, default_value = "train", value_name = "PHASE")]
        phase: Phase,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42", value_name = "SEED")]
        seed: u64,
    },
    /// Print the packed [N, C, H, W] shape of a batch
    Shape {
        /// Transformer configuration (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Source images; the first one decides C, H and W
        #[arg(long, value_name = "FILE", required = true)]
        input: Vec<PathBuf>,
    },
    /// Pack one image and print per-channel statistics of the tensor
    Pack {
        /// Transformer configuration (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Source image
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Phase: train or test
        #[arg(long, default_value = "train", value_name = "PHASE")]
        phase: Phase,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42", value_name = "SEED")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Preview {
            config,
            input,
            output_dir,
            count,
            phase,
            seed,
        } => handle_preview(config, &input, &output_dir, count, phase, seed),
        Commands::Shape { config, input } => handle_shape(config, &input),
        Commands::Pack {
            config,
            input,
            phase,
            seed,
        } => handle_pack(config, &input, phase, seed),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<TransformConfig> {
    match path {
        Some(path) => TransformConfig::from_file(&path)
            .with_context(|| format!("Failed to load config '{}'", path.display())),
        None => Ok(TransformConfig::default()),
    }
}

fn load_image(path: &Path) -> Result<image::DynamicImage> {
    image::open(path).with_context(|| format!("Failed to open image '{}'", path.display()))
}

fn handle_preview(
    config: Option<PathBuf>,
    input: &Path,
    output_dir: &Path,
    count: usize,
    phase: Phase,
    seed: u64,
) -> Result<()> {
    if count == 0 {
        bail!("--count must be at least 1");
    }
    let config = load_config(config)?;
    let mut transformer = DataTransformer::new(config, phase)?.with_seed(Seed::new(seed));
    let frame = Frame::from_dynamic(load_image(input)?)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create '{}'", output_dir.display()))?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    println!("Writing {count} variant(s) of '{}' to '{}'", input.display(), output_dir.display());
    for i in 0..count {
        let (out, record) = transformer.augment(frame.clone())?;
        let path = output_dir.join(format!("{stem}_{i:03}.png"));
        out.into_dynamic()
            .save(&path)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        let fired: Vec<&str> = pixaug_transforms::Candidate::ORDER
            .iter()
            .filter(|c| record.gates.is_open(**c))
            .map(|c| c.name())
            .collect();
        println!("  {} [{}]", path.display(), fired.join(", "));
        let json = serde_json::to_string(&record)?;
        tracing::debug!(record = %json, "augmentation record");
    }
    Ok(())
}

fn handle_shape(config: Option<PathBuf>, inputs: &[PathBuf]) -> Result<()> {
    let config = load_config(config)?;
    let transformer = DataTransformer::new(config, Phase::Test)?;
    let images = inputs
        .iter()
        .map(|p| load_image(p))
        .collect::<Result<Vec<_>>>()?;
    let shape = transformer.infer_shape_images(&images)?;
    println!("{shape}");
    Ok(())
}

fn handle_pack(config: Option<PathBuf>, input: &Path, phase: Phase, seed: u64) -> Result<()> {
    let config = load_config(config)?;
    let mut transformer = DataTransformer::new(config, phase)?.with_seed(Seed::new(seed));
    let image = load_image(input)?;

    let shape = transformer.infer_shape(&image)?;
    let mut blob: Array4<f32> = alloc_blob(shape);
    let records = transformer.transform_images(std::slice::from_ref(&image), &mut blob)?;

    let device = Default::default();
    let tensor = ImageTensor::<NdArray>::from_array(&blob, &device)?;

    println!("Packed '{}' into {}", input.display(), tensor.shape());
    if let Some(record) = records.first() {
        println!(
            "  crop offset (h, w): ({}, {}), mirrored: {}",
            record.crop.h_off,
            record.crop.w_off,
            record.mirrored()
        );
    }
    println!("  {:<8} {:>10} {:>10} {:>10}", "channel", "min", "max", "mean");
    for (c, stats) in tensor.channel_stats().iter().enumerate() {
        println!(
            "  {:<8} {:>10.3} {:>10.3} {:>10.3}",
            c, stats.min, stats.max, stats.mean
        );
    }
    Ok(())
}
