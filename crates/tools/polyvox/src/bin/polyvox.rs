//! Polyvox CLI - dense voxel grid to MagicaVoxel conversion and pipeline runs

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use polyvox::{
    build_prompt, convert_file, to_snake_case, DetailLevel, Pipeline, PipelineConfig, VoxSummary,
};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polyvox")]
#[command(
    author,
    version,
    about = "Convert dense voxel grid dumps to MagicaVoxel .vox files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a dense voxel grid dump to a .vox file
    Convert {
        /// Dense grid dump written by the mesh rasterizer
        input: PathBuf,

        /// Output .vox path (overwritten if it exists)
        output: PathBuf,

        /// Print the conversion summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a .vox file
    Inspect {
        /// .vox file to read
        file: PathBuf,
    },

    /// Show the image prompt and file name derived from a subject
    Prompt {
        /// Subject of the model, e.g. "a red dragon"
        subject: String,

        /// Detail level: high or low
        #[arg(short, long, default_value = "high")]
        detail: DetailLevel,
    },

    /// Rasterize a mesh at three resolutions and convert each to .vox
    Voxelize {
        /// Textured mesh (.glb) from the image-to-3D stage
        mesh: PathBuf,

        /// Subject the output files are named after
        #[arg(short, long)]
        name: String,

        /// Detail level: high (96/80/64) or low (64/48/32)
        #[arg(short, long, default_value = "high")]
        detail: DetailLevel,

        /// Output directory (defaults to POLYVOX_OUTPUT_DIR or the mesh directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            json,
        } => convert_command(input, output, json),
        Commands::Inspect { file } => inspect_command(file),
        Commands::Prompt { subject, detail } => {
            println!("Prompt: {}", build_prompt(&subject, detail));
            println!("Name:   {}", to_snake_case(&subject));
            Ok(())
        }
        Commands::Voxelize {
            mesh,
            name,
            detail,
            output_dir,
            json,
        } => voxelize_command(mesh, name, detail, output_dir, json),
    }
}

fn convert_command(input: PathBuf, output: PathBuf, json: bool) -> anyhow::Result<()> {
    let summary = convert_file(&input, &output)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("✓ Saved to {}", output.display());
    println!(
        "  Size: {}x{}x{}",
        summary.size[0], summary.size[1], summary.size[2]
    );
    println!(
        "  Voxels: {} ({} interior)",
        summary.voxel_count, summary.interior_count
    );
    println!("  Bytes: {}", summary.bytes_written);
    Ok(())
}

fn inspect_command(file: PathBuf) -> anyhow::Result<()> {
    let bytes = fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let summary = VoxSummary::from_bytes(&bytes)
        .with_context(|| format!("Failed to inspect {}", file.display()))?;

    println!("File: {}", file.display());
    println!("Version: {}", summary.version);
    println!("Models: {}", summary.model_count);
    println!(
        "Size: {}x{}x{}",
        summary.size[0], summary.size[1], summary.size[2]
    );
    println!("Voxels: {}", summary.voxel_count);
    println!("Distinct colors: {}", summary.distinct_colors);
    println!("Palette entries: {}", summary.palette_len);
    Ok(())
}

fn voxelize_command(
    mesh: PathBuf,
    name: String,
    detail: DetailLevel,
    output_dir: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(dir) = output_dir {
        config = config.with_output_dir(dir);
    }
    let pipeline = Pipeline::from_config(&config);

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));

    let result = pipeline.run_with_progress(&mesh, &name, detail, |stage| {
        progress.set_message(stage.to_string());
    });

    let output = match result {
        Ok(output) => {
            progress.finish_with_message("✓ Voxelization complete");
            output
        }
        Err(e) => {
            progress.finish_with_message("✗ Voxelization failed");
            return Err(e).with_context(|| format!("Failed to voxelize {}", mesh.display()));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for variant in &output.variants {
        println!(
            "✓ {} ({}^3): {} voxels → {}",
            variant.size,
            variant.resolution,
            variant.summary.voxel_count,
            variant.path.display()
        );
    }
    if let Some(glb) = &output.preview_glb {
        println!("✓ Preview: {}", glb.display());
    }
    Ok(())
}
