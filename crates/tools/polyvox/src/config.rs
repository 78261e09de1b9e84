use std::{env, path::PathBuf};

/// Default location of the mesh rasterizer script
pub const DEFAULT_GLB2VOX_SCRIPT: &str = "./glb2vox.sh";

/// Default interpreter used to run the rasterizer script
pub const DEFAULT_SHELL: &str = "bash";

/// Configuration for the mesh-to-voxel pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Script that rasterizes a mesh into a dense voxel grid dump.
    pub glb2vox_script: PathBuf,
    /// Interpreter the script is run with.
    pub shell: String,
    /// Directory for final outputs. `None` places them beside the mesh.
    pub output_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            glb2vox_script: PathBuf::from(DEFAULT_GLB2VOX_SCRIPT),
            shell: DEFAULT_SHELL.to_string(),
            output_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Builds a configuration from `POLYVOX_*` environment variables, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`PipelineConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let glb2vox_script = lookup("POLYVOX_GLB2VOX_SCRIPT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GLB2VOX_SCRIPT));
        let shell = lookup("POLYVOX_SHELL").unwrap_or_else(|| DEFAULT_SHELL.to_string());
        if shell.trim().is_empty() {
            anyhow::bail!("POLYVOX_SHELL must not be empty");
        }
        let output_dir = lookup("POLYVOX_OUTPUT_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            glb2vox_script,
            shell,
            output_dir,
        })
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}
