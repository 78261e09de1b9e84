//! Mesh to `.vox` pipeline
//!
//! Takes a textured mesh produced by the image-to-3D stage, rasterizes it at
//! three resolutions with the external `glb2vox` script and converts each
//! dense grid dump into a MagicaVoxel file.
//!
//! ```text
//! prompt ──build_prompt──▶ (text-to-image, image-to-mesh: external)
//!                                   │
//!                                 mesh.glb
//!                                   │ glb2vox.sh <mesh> <res> <out>
//!                         <stem>_<size>.vox  (dense grid dump)
//!                                   │ convert_file (in place)
//!                         <stem>_<size>.vox  (MagicaVoxel)
//!                                   │ rename
//!                         <name>_<size>.vox, <name>.vox.glb, <name>.vox.gltf
//! ```

use crate::config::PipelineConfig;
use crate::convert::{convert_file, ConversionSummary};
use crate::types::{PolyvoxError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

/// Maximum length of a generated file base name
pub const MAX_NAME_LEN: usize = 50;

/// Target detail of the generated voxel models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Blocky, low resolution models
    Low,
    /// Detailed, high resolution models
    #[default]
    High,
}

impl DetailLevel {
    /// Prompt template for the text-to-image stage; `{}` is the subject
    pub fn prompt_template(self) -> &'static str {
        match self {
            DetailLevel::High => {
                "A high quality iconic 3/4 perspective 3D render of {} in a cel shaded game engine."
            }
            DetailLevel::Low => {
                "A isometric view of {} made out of large Minecraft cubes. Black background, floating in space."
            }
        }
    }

    /// Voxel resolutions for the large, medium and small variants
    pub fn resolutions(self) -> [u32; 3] {
        match self {
            DetailLevel::High => [96, 80, 64],
            DetailLevel::Low => [64, 48, 32],
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailLevel::Low => write!(f, "low"),
            DetailLevel::High => write!(f, "high"),
        }
    }
}

impl FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(DetailLevel::Low),
            "high" => Ok(DetailLevel::High),
            other => Err(format!("Invalid detail level '{}' (expected low or high)", other)),
        }
    }
}

/// Output size variant, one per resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeVariant {
    Large,
    Medium,
    Small,
}

impl SizeVariant {
    pub const ALL: [SizeVariant; 3] = [SizeVariant::Large, SizeVariant::Medium, SizeVariant::Small];

    pub fn as_str(self) -> &'static str {
        match self {
            SizeVariant::Large => "large",
            SizeVariant::Medium => "medium",
            SizeVariant::Small => "small",
        }
    }
}

impl fmt::Display for SizeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the text-to-image prompt for `subject`
///
/// The first word is lower-cased at its first character so the subject reads
/// naturally mid-sentence. Whitespace is collapsed to single spaces.
pub fn build_prompt(subject: &str, level: DetailLevel) -> String {
    let mut words: Vec<String> = subject.split_whitespace().map(str::to_string).collect();

    let modified = match words.first_mut() {
        Some(first) => {
            let mut chars = first.chars();
            if let Some(c) = chars.next() {
                *first = c.to_lowercase().chain(chars).collect();
            }
            words.join(" ")
        }
        None => subject.to_string(),
    };

    level.prompt_template().replacen("{}", &modified, 1)
}

/// Derive a file-system friendly base name from a prompt
///
/// # Example
///
/// ```
/// use polyvox::pipeline::to_snake_case;
///
/// assert_eq!(to_snake_case("A Red  Dragon!"), "a_red_dragon");
/// assert_eq!(to_snake_case("3 little pigs"), "obj_3_little_pigs");
/// ```
pub fn to_snake_case(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();

    let mut name = mapped
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert_str(0, "obj_");
    }

    name.chars().take(MAX_NAME_LEN).collect()
}

/// Paths for one size variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantPlan {
    pub size: SizeVariant,
    pub resolution: u32,
    /// Where the rasterizer writes its dump, beside the mesh
    pub temp_vox: PathBuf,
    /// Final `.vox` location
    pub final_vox: PathBuf,
}

/// A `(from, to)` rename of a rasterizer side product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Every file the pipeline reads, writes and renames for one mesh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPlan {
    pub variants: Vec<VariantPlan>,
    /// Preview glTF written next to the large variant
    pub preview_gltf: Rename,
    /// Preview binary glTF written next to the large variant
    pub preview_glb: Rename,
}

impl OutputPlan {
    /// Plan outputs for `mesh` under base name `name`
    ///
    /// Final files go to `output_dir`, or beside the mesh when `None`.
    pub fn new(mesh: &Path, name: &str, level: DetailLevel, output_dir: Option<&Path>) -> Self {
        let stem = mesh
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| mesh.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        let variants: Vec<VariantPlan> = SizeVariant::ALL
            .iter()
            .zip(level.resolutions())
            .map(|(&size, resolution)| VariantPlan {
                size,
                resolution,
                temp_vox: mesh.with_file_name(format!("{}_{}.vox", stem, size)),
                final_vox: dir.join(format!("{}_{}.vox", name, size)),
            })
            .collect();

        let large = mesh.with_file_name(format!("{}_{}.vox", stem, SizeVariant::Large));
        let side_product = |ext: &str| {
            let mut path = large.clone().into_os_string();
            path.push(".");
            path.push(ext);
            PathBuf::from(path)
        };

        Self {
            variants,
            preview_gltf: Rename {
                from: side_product("gltf"),
                to: dir.join(format!("{}.vox.gltf", name)),
            },
            preview_glb: Rename {
                from: side_product("glb"),
                to: dir.join(format!("{}.vox.glb", name)),
            },
        }
    }
}

/// Turns a mesh into a dense voxel grid dump at a given resolution
pub trait Rasterizer {
    fn rasterize(&self, mesh: &Path, resolution: u32, output: &Path) -> Result<()>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn rasterize(&self, mesh: &Path, resolution: u32, output: &Path) -> Result<()> {
        (**self).rasterize(mesh, resolution, output)
    }
}

/// Runs the external `glb2vox` script
#[derive(Debug, Clone)]
pub struct Glb2Vox {
    script: PathBuf,
    shell: String,
}

impl Glb2Vox {
    pub fn new(script: impl Into<PathBuf>, shell: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            shell: shell.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.glb2vox_script.clone(), config.shell.clone())
    }

    /// Command line: `<shell> <script> <mesh> <resolution> <output>`
    pub fn command(&self, mesh: &Path, resolution: u32, output: &Path) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.script)
            .arg(mesh)
            .arg(resolution.to_string())
            .arg(output);
        cmd
    }
}

impl Rasterizer for Glb2Vox {
    fn rasterize(&self, mesh: &Path, resolution: u32, output: &Path) -> Result<()> {
        let status = self
            .command(mesh, resolution, output)
            .status()
            .map_err(|e| PolyvoxError::io(&self.script, e))?;

        if !status.success() {
            return Err(PolyvoxError::ScriptFailed {
                script: self.script.clone(),
                status,
            });
        }
        Ok(())
    }
}

/// Progress notifications emitted by [`Pipeline::run_with_progress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Rasterize { size: SizeVariant, resolution: u32 },
    Convert { size: SizeVariant },
    Finalize,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Rasterize { size, resolution } => {
                write!(f, "Rasterizing {} variant at {}^3...", size, resolution)
            }
            PipelineStage::Convert { size } => write!(f, "Converting {} variant to .vox...", size),
            PipelineStage::Finalize => write!(f, "Renaming outputs..."),
        }
    }
}

/// One converted variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantOutput {
    pub size: SizeVariant,
    pub resolution: u32,
    pub path: PathBuf,
    pub summary: ConversionSummary,
}

/// Files produced by a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineOutput {
    pub name: String,
    pub detail: DetailLevel,
    pub preview_glb: Option<PathBuf>,
    pub preview_gltf: Option<PathBuf>,
    pub variants: Vec<VariantOutput>,
}

impl PipelineOutput {
    /// Final paths: preview glb first (if any), then large, medium, small
    pub fn paths(&self) -> Vec<PathBuf> {
        self.preview_glb
            .iter()
            .cloned()
            .chain(self.variants.iter().map(|v| v.path.clone()))
            .collect()
    }
}

/// Mesh to `.vox` pipeline over a [`Rasterizer`]
pub struct Pipeline<R = Glb2Vox> {
    rasterizer: R,
    output_dir: Option<PathBuf>,
}

impl Pipeline<Glb2Vox> {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            rasterizer: Glb2Vox::from_config(config),
            output_dir: config.output_dir.clone(),
        }
    }
}

impl<R: Rasterizer> Pipeline<R> {
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Plan outputs for `mesh`, naming them after `subject`
    pub fn plan(&self, mesh: &Path, subject: &str, level: DetailLevel) -> Result<(String, OutputPlan)> {
        let name = to_snake_case(subject);
        if name.is_empty() {
            return Err(PolyvoxError::InvalidPrompt(format!(
                "'{}' does not yield a usable file name",
                subject
            )));
        }
        let plan = OutputPlan::new(mesh, &name, level, self.output_dir.as_deref());
        Ok((name, plan))
    }

    pub fn run(&self, mesh: &Path, subject: &str, level: DetailLevel) -> Result<PipelineOutput> {
        self.run_with_progress(mesh, subject, level, |_| {})
    }

    /// Rasterize, convert and rename, reporting each stage to `progress`
    pub fn run_with_progress(
        &self,
        mesh: &Path,
        subject: &str,
        level: DetailLevel,
        mut progress: impl FnMut(PipelineStage),
    ) -> Result<PipelineOutput> {
        let (name, plan) = self.plan(mesh, subject, level)?;

        if let Some(dir) = &self.output_dir {
            fs::create_dir_all(dir).map_err(|e| PolyvoxError::io(dir, e))?;
        }

        let mut summaries = Vec::with_capacity(plan.variants.len());
        for (index, variant) in plan.variants.iter().enumerate() {
            match self.produce_variant(mesh, variant, &mut progress) {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    discard_intermediates(&plan, index + 1);
                    return Err(e);
                }
            }
        }

        progress(PipelineStage::Finalize);
        let mut variants = Vec::with_capacity(plan.variants.len());
        for (variant, summary) in plan.variants.iter().zip(summaries) {
            move_file(&variant.temp_vox, &variant.final_vox)?;
            variants.push(VariantOutput {
                size: variant.size,
                resolution: variant.resolution,
                path: variant.final_vox.clone(),
                summary,
            });
        }

        let preview_gltf = move_side_product(&plan.preview_gltf)?;
        let preview_glb = move_side_product(&plan.preview_glb)?;

        tracing::info!(name = %name, variants = variants.len(), "pipeline complete");

        Ok(PipelineOutput {
            name,
            detail: level,
            preview_glb,
            preview_gltf,
            variants,
        })
    }

    /// Rasterize one variant and convert its dump in place
    fn produce_variant(
        &self,
        mesh: &Path,
        variant: &VariantPlan,
        progress: &mut impl FnMut(PipelineStage),
    ) -> Result<ConversionSummary> {
        progress(PipelineStage::Rasterize {
            size: variant.size,
            resolution: variant.resolution,
        });
        tracing::info!(
            mesh = %mesh.display(),
            size = %variant.size,
            resolution = variant.resolution,
            "rasterizing"
        );
        self.rasterizer
            .rasterize(mesh, variant.resolution, &variant.temp_vox)?;

        if !variant.temp_vox.exists() {
            return Err(PolyvoxError::MissingOutput {
                path: variant.temp_vox.clone(),
            });
        }

        progress(PipelineStage::Convert { size: variant.size });
        convert_file(&variant.temp_vox, &variant.temp_vox)
    }
}

/// Remove the dumps of the first `started` variants and the preview side products
fn discard_intermediates(plan: &OutputPlan, started: usize) {
    let temps = plan.variants.iter().take(started).map(|v| &v.temp_vox);
    for path in temps.chain([&plan.preview_gltf.from, &plan.preview_glb.from]) {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed intermediate file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove intermediate file"),
        }
    }
}

/// Rename, falling back to copy + remove across file systems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).map_err(|e| PolyvoxError::io(to, e))?;
    fs::remove_file(from).map_err(|e| PolyvoxError::io(from, e))
}

fn move_side_product(rename: &Rename) -> Result<Option<PathBuf>> {
    if !rename.from.exists() {
        tracing::warn!(path = %rename.from.display(), "preview not produced, skipping");
        return Ok(None);
    }
    move_file(&rename.from, &rename.to)?;
    Ok(Some(rename.to.clone()))
}
